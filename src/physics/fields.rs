use std::collections::HashMap;

use glam::DVec3;
use nalgebra::DVector;

use super::bc::Field;
use super::{FieldAccessor, Location};
use crate::discretization::mesh::{CellId, FaceId, FaceThread, Mesh, Side, ThreadId, Zone, ZoneId};
use crate::error::{CroError, Result};

pub const PRESSURE: &str = "pressure";
pub const DENSITY: &str = "density";
pub const MASS_FRACTION: &str = "mass_fraction";
pub const VISCOSITY: &str = "viscosity";
pub const DIFFUSIVITY: &str = "diffusivity";
pub const RESISTANCE: &str = "resistance";
pub const NORMAL_VELOCITY: &str = "normal_velocity";

const CELL_FIELDS: [&str; 7] = [
    PRESSURE,
    DENSITY,
    MASS_FRACTION,
    VISCOSITY,
    DIFFUSIVITY,
    RESISTANCE,
    NORMAL_VELOCITY,
];
const FACE_FIELDS: [&str; 3] = [PRESSURE, MASS_FRACTION, NORMAL_VELOCITY];

/// Solver clock as seen by the hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Clock {
    pub time: f64,
    pub dt: f64,
    pub step: u64,
}

/// In-memory mesh plus cell and face scalar fields.
pub struct MeshFields {
    pub mesh: Mesh,
    cell_fields: HashMap<Field, DVector<f64>>,
    face_fields: HashMap<Field, DVector<f64>>,
    clock: Clock,
}

impl MeshFields {
    /// Wrap a mesh and register the standard fields, all zero.
    pub fn new(mesh: Mesh) -> Self {
        let mut fields = Self::bare(mesh);
        for name in CELL_FIELDS {
            fields.register_cell_field(name);
        }
        for name in FACE_FIELDS {
            fields.register_face_field(name);
        }
        fields
    }

    /// Wrap a mesh without registering any field.
    pub fn bare(mesh: Mesh) -> Self {
        Self {
            mesh,
            cell_fields: HashMap::new(),
            face_fields: HashMap::new(),
            clock: Clock::default(),
        }
    }

    pub fn register_cell_field(&mut self, name: impl Into<Field>) {
        let n = self.mesh.cells.len();
        self.cell_fields
            .entry(name.into())
            .or_insert_with(|| DVector::zeros(n));
    }

    pub fn register_face_field(&mut self, name: impl Into<Field>) {
        let n = self.mesh.faces.len();
        self.face_fields
            .entry(name.into())
            .or_insert_with(|| DVector::zeros(n));
    }

    pub fn cell_field(&self, name: &str) -> Result<&DVector<f64>> {
        self.cell_fields
            .get(name)
            .ok_or_else(|| missing(name, Location::Cell(0)))
    }

    pub fn face_field(&self, name: &str) -> Result<&DVector<f64>> {
        self.face_fields
            .get(name)
            .ok_or_else(|| missing(name, Location::Face(0)))
    }

    /// Set every cell of `zone` to `value`.
    pub fn fill_zone(&mut self, zone: ZoneId, field: &str, value: f64) -> Result<()> {
        let cells = self.mesh.zone(zone)?.cells.clone();
        for c in cells {
            self.set_scalar(Location::Cell(c), field, value)?;
        }
        Ok(())
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Start a new time step of size `dt`.
    pub fn advance_clock(&mut self, dt: f64) {
        self.clock.dt = dt;
        self.clock.time += dt;
        self.clock.step += 1;
    }

    pub fn reset_clock(&mut self, t_start: f64) {
        self.clock = Clock {
            time: t_start,
            dt: 0.0,
            step: 0,
        };
    }

    fn slot(&self, at: Location, field: &str) -> Result<(&DVector<f64>, usize)> {
        let (store, i) = match at {
            Location::Cell(c) => (&self.cell_fields, c),
            Location::Face(f) => (&self.face_fields, f),
        };
        let values = store.get(field).ok_or_else(|| missing(field, at))?;
        if i >= values.len() {
            return Err(missing(field, at));
        }
        Ok((values, i))
    }
}

fn missing(field: &str, location: Location) -> CroError {
    CroError::MissingField {
        field: field.to_string(),
        location,
    }
}

impl FieldAccessor for MeshFields {
    fn scalar(&self, at: Location, field: &str) -> Result<f64> {
        let (values, i) = self.slot(at, field)?;
        Ok(values[i])
    }

    fn set_scalar(&mut self, at: Location, field: &str, value: f64) -> Result<()> {
        let (store, i) = match at {
            Location::Cell(c) => (&mut self.cell_fields, c),
            Location::Face(f) => (&mut self.face_fields, f),
        };
        match store.get_mut(field) {
            Some(values) if i < values.len() => {
                values[i] = value;
                Ok(())
            }
            _ => Err(missing(field, at)),
        }
    }

    fn centroid(&self, at: Location) -> Result<[f64; 3]> {
        let centroid = match at {
            Location::Cell(c) => self.mesh.cells.get(c).map(|cell| cell.centroid),
            Location::Face(f) => self.mesh.faces.get(f).map(|face| face.centroid),
        };
        centroid.ok_or_else(|| missing("centroid", at))
    }

    fn area_vector(&self, face: FaceId) -> Result<DVec3> {
        self.mesh
            .faces
            .get(face)
            .map(|f| f.area_vector())
            .ok_or_else(|| missing("area", Location::Face(face)))
    }

    fn lookup_zone(&self, zone: ZoneId) -> Result<&Zone> {
        self.mesh.zone(zone)
    }

    fn zone_ids(&self) -> Vec<ZoneId> {
        self.mesh.zones.keys().copied().collect()
    }

    fn lookup_thread(&self, thread: ThreadId) -> Result<&FaceThread> {
        self.mesh.thread(thread)
    }

    fn adjacent_cell(&self, face: FaceId, side: Side) -> Result<Option<CellId>> {
        if face >= self.mesh.faces.len() {
            return Err(missing("adjacency", Location::Face(face)));
        }
        Ok(self.mesh.adjacent_cell(face, side))
    }

    fn current_timestep(&self) -> f64 {
        self.clock.dt
    }

    fn current_step_index(&self) -> u64 {
        self.clock.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{create_layered_channel, ChannelLayout, Layer};

    fn fields() -> MeshFields {
        let layout = ChannelLayout {
            length: 1.0,
            columns: 2,
            depth: 1.0,
            layers: vec![Layer {
                zone: 7,
                name: "feed".into(),
                thickness: 1.0,
                rows: 1,
            }],
        };
        MeshFields::new(create_layered_channel(&layout).unwrap())
    }

    #[test]
    fn scalar_round_trip_on_cells_and_faces() {
        let mut f = fields();
        f.set_scalar(Location::Cell(1), DENSITY, 1000.0).unwrap();
        f.set_scalar(Location::Face(0), PRESSURE, 2.0e5).unwrap();
        assert_eq!(f.scalar(Location::Cell(1), DENSITY).unwrap(), 1000.0);
        assert_eq!(f.scalar(Location::Cell(0), DENSITY).unwrap(), 0.0);
        assert_eq!(f.scalar(Location::Face(0), PRESSURE).unwrap(), 2.0e5);
    }

    #[test]
    fn unknown_field_is_reported() {
        let mut f = fields();
        let err = f.scalar(Location::Cell(0), "temperature").unwrap_err();
        assert!(matches!(err, CroError::MissingField { ref field, .. } if field == "temperature"));

        // Resistance is a cell-only field.
        assert!(f.set_scalar(Location::Face(0), RESISTANCE, 1.0).is_err());
        // Out of range handles are missing too.
        assert!(f.scalar(Location::Cell(99), DENSITY).is_err());
    }

    #[test]
    fn clock_advances_per_step() {
        let mut f = fields();
        f.advance_clock(0.5);
        f.advance_clock(0.25);
        assert_eq!(f.current_step_index(), 2);
        assert_eq!(f.current_timestep(), 0.25);
        assert_eq!(f.clock().time, 0.75);
    }

    #[test]
    fn fill_zone_writes_every_cell() {
        let mut f = fields();
        f.fill_zone(7, MASS_FRACTION, 0.01).unwrap();
        assert!(f.cell_field(MASS_FRACTION).unwrap().iter().all(|&y| y == 0.01));
        assert!(matches!(
            f.fill_zone(8, MASS_FRACTION, 0.0),
            Err(CroError::UnknownZone(8))
        ));
    }
}
