pub mod bc;
pub mod closures;
pub mod fields;
pub mod locator;
pub mod membrane;

use std::fmt;

use glam::DVec3;

use crate::discretization::mesh::{CellId, FaceId, FaceThread, Side, ThreadId, Zone, ZoneId};
use crate::error::Result;

/// Where a scalar lives: on a cell or on a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Cell(CellId),
    Face(FaceId),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Cell(c) => write!(f, "cell {c}"),
            Location::Face(face) => write!(f, "face {face}"),
        }
    }
}

/// Read/write view of the solver's geometry and fields.
///
/// Everything the closures and boundary models touch goes through this trait, so the
/// same physics runs against the in-memory [`fields::MeshFields`] or an adapter over a
/// host solver's data.
pub trait FieldAccessor {
    fn scalar(&self, at: Location, field: &str) -> Result<f64>;

    fn set_scalar(&mut self, at: Location, field: &str, value: f64) -> Result<()>;

    fn centroid(&self, at: Location) -> Result<[f64; 3]>;

    fn area_vector(&self, face: FaceId) -> Result<DVec3>;

    fn lookup_zone(&self, zone: ZoneId) -> Result<&Zone>;

    /// Cells of a zone in their iteration order.
    fn cells_in(&self, zone: ZoneId) -> Result<&[CellId]> {
        Ok(&self.lookup_zone(zone)?.cells)
    }

    fn zone_ids(&self) -> Vec<ZoneId>;

    fn lookup_thread(&self, thread: ThreadId) -> Result<&FaceThread>;

    fn faces_in(&self, thread: ThreadId) -> Result<&[FaceId]> {
        Ok(&self.lookup_thread(thread)?.faces)
    }

    fn adjacent_cell(&self, face: FaceId, side: Side) -> Result<Option<CellId>>;

    fn current_timestep(&self) -> f64;

    fn current_step_index(&self) -> u64;
}

/// The flow solver the closures are coupled to. Called once per time step before the
/// closures and boundary profiles are evaluated.
pub trait HostSolver {
    fn advance(&mut self, fields: &mut fields::MeshFields, dt: f64) -> Result<()>;
}

/// Host stand-in that leaves the flow untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrozenFlow;

impl HostSolver for FrozenFlow {
    fn advance(&mut self, _fields: &mut fields::MeshFields, _dt: f64) -> Result<()> {
        Ok(())
    }
}

impl<F> HostSolver for F
where
    F: FnMut(&mut fields::MeshFields, f64) -> Result<()>,
{
    fn advance(&mut self, fields: &mut fields::MeshFields, dt: f64) -> Result<()> {
        self(fields, dt)
    }
}
