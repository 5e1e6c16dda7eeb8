use std::io;

use thiserror::Error;

use crate::discretization::mesh::{FaceId, Side, ThreadId, ZoneId};
use crate::physics::Location;

pub type Result<T> = std::result::Result<T, CroError>;

#[derive(Debug, Error)]
pub enum CroError {
    #[error("zone {zone} contains no cells")]
    EmptyZone { zone: ZoneId },

    #[error("zone {0} does not exist in the mesh")]
    UnknownZone(ZoneId),

    #[error("face thread {0} does not exist in the mesh")]
    UnknownThread(ThreadId),

    #[error(
        "numerical instability in {context}: denominator {denominator:.6e} within threshold {threshold:.6e}"
    )]
    NumericalInstability {
        context: String,
        denominator: f64,
        threshold: f64,
    },

    #[error("field '{field}' is not available on {location}")]
    MissingField { field: String, location: Location },

    #[error("face {face} has no adjacent cell on side {side:?}")]
    MissingAdjacentCell { face: FaceId, side: Side },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed output record on line {line}: '{content}'")]
    MalformedRecord { line: usize, content: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
