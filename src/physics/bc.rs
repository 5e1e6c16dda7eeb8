use std::borrow::Borrow;
use std::sync::Arc;

use super::{FieldAccessor, Location};
use crate::discretization::mesh::{Side, ThreadId};
use crate::error::{CroError, Result};

/// Field identifier stored as a runtime string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field(pub Arc<str>);

impl Field {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }
}

impl<T: Into<Arc<str>>> From<T> for Field {
    fn from(name: T) -> Self {
        Field::new(name)
    }
}

impl Borrow<str> for Field {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How a face thread receives its value for one field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryProfile {
    /// Fixed value on every face of the thread.
    Dirichlet(f64),
    /// Copy the side-0 interior cell value onto the face.
    ZeroGradient,
}

/// Apply `profile` for `field` on every face of `thread`. Returns the number of faces set.
pub fn apply_profile<A: FieldAccessor + ?Sized>(
    fields: &mut A,
    thread: ThreadId,
    field: &str,
    profile: BoundaryProfile,
) -> Result<usize> {
    let faces = fields.faces_in(thread)?.to_vec();
    for &f in &faces {
        let value = match profile {
            BoundaryProfile::Dirichlet(v) => v,
            BoundaryProfile::ZeroGradient => {
                let c = fields
                    .adjacent_cell(f, Side::Zero)?
                    .ok_or(CroError::MissingAdjacentCell {
                        face: f,
                        side: Side::Zero,
                    })?;
                fields.scalar(Location::Cell(c), field)?
            }
        };
        fields.set_scalar(Location::Face(f), field, value)?;
    }
    Ok(faces.len())
}

/// Write one value per face of `thread`, in thread order.
pub fn apply_face_values<A: FieldAccessor + ?Sized>(
    fields: &mut A,
    thread: ThreadId,
    field: &str,
    values: &[f64],
) -> Result<()> {
    let faces = fields.faces_in(thread)?.to_vec();
    if faces.len() != values.len() {
        return Err(CroError::InvalidConfig(format!(
            "thread {thread} has {} faces but {} values were supplied",
            faces.len(),
            values.len()
        )));
    }
    for (f, &v) in faces.into_iter().zip(values) {
        fields.set_scalar(Location::Face(f), field, v)?;
    }
    Ok(())
}
