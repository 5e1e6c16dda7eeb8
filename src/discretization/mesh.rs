use std::collections::BTreeMap;
use std::sync::Arc;

use glam::DVec3;

use crate::error::{CroError, Result};

pub type CellId = usize;
pub type FaceId = usize;
pub type ZoneId = u32;
pub type ThreadId = u32;

/// The complete computational grid, partitioned into cell zones and face threads.
pub struct Mesh {
    pub cells: Vec<Cell>,
    pub faces: Vec<Face>,
    pub zones: BTreeMap<ZoneId, Zone>,
    pub threads: BTreeMap<ThreadId, FaceThread>,
}

/// A single control volume.
pub struct Cell {
    pub id: CellId,
    pub zone: ZoneId,
    pub volume: f64,
    pub centroid: [f64; 3],
    pub face_ids: Vec<FaceId>,
}

/// An interface between two cells, or between a cell and the domain boundary.
pub struct Face {
    pub area: f64,
    /// Unit normal pointing from side 0 towards side 1 (outward on the boundary).
    pub normal: [f64; 3],
    /// Tuple of (side-0 cell, optional side-1 cell). `None` marks a boundary face.
    pub neighbor_cell_ids: (CellId, Option<CellId>),
    pub centroid: [f64; 3],
}

impl Face {
    pub fn area_vector(&self) -> DVec3 {
        DVec3::from_array(self.normal) * self.area
    }

    pub fn is_boundary(&self) -> bool {
        self.neighbor_cell_ids.1.is_none()
    }
}

/// Named partition of cells (feed channel, membrane, polarization layers, ...).
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub cells: Vec<CellId>,
}

/// Named set of faces on which a boundary profile is applied.
#[derive(Clone, Debug)]
pub struct FaceThread {
    pub id: ThreadId,
    pub name: String,
    pub faces: Vec<FaceId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Zero,
    One,
}

/// Rule deciding which faces belong to a thread.
#[derive(Clone)]
pub enum FaceSelector {
    /// Interior faces whose side-0 cell lies in the first zone and side-1 cell in the second.
    Interface { side0: ZoneId, side1: ZoneId },
    /// Boundary faces accepted by the predicate, which sees the face and its interior cell.
    BoundaryWhere(Arc<dyn Fn(&Face, &Cell) -> bool + Send + Sync>),
}

impl FaceSelector {
    pub fn boundary_where<F>(pred: F) -> Self
    where
        F: Fn(&Face, &Cell) -> bool + Send + Sync + 'static,
    {
        FaceSelector::BoundaryWhere(Arc::new(pred))
    }
}

impl Mesh {
    pub fn zone(&self, id: ZoneId) -> Result<&Zone> {
        self.zones.get(&id).ok_or(CroError::UnknownZone(id))
    }

    pub fn thread(&self, id: ThreadId) -> Result<&FaceThread> {
        self.threads.get(&id).ok_or(CroError::UnknownThread(id))
    }

    pub fn adjacent_cell(&self, face: FaceId, side: Side) -> Option<CellId> {
        let f = self.faces.get(face)?;
        match side {
            Side::Zero => Some(f.neighbor_cell_ids.0),
            Side::One => f.neighbor_cell_ids.1,
        }
    }

    /// Collect the faces matching `selector` into a new thread. Returns the number of faces.
    /// An existing thread with the same id is replaced.
    pub fn add_face_thread(
        &mut self,
        id: ThreadId,
        name: impl Into<String>,
        selector: &FaceSelector,
    ) -> usize {
        let faces: Vec<FaceId> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| match (selector, face.neighbor_cell_ids) {
                (FaceSelector::Interface { side0, side1 }, (k, Some(l))) => {
                    self.cells[k].zone == *side0 && self.cells[l].zone == *side1
                }
                (FaceSelector::BoundaryWhere(pred), (k, None)) => pred(face, &self.cells[k]),
                _ => false,
            })
            .map(|(i, _)| i)
            .collect();

        let count = faces.len();
        self.threads.insert(
            id,
            FaceThread {
                id,
                name: name.into(),
                faces,
            },
        );
        count
    }

    /// Smallest and largest centroid spacing across interior faces.
    pub fn spacing_range(&self) -> Option<(f64, f64)> {
        self.faces
            .iter()
            .filter_map(|face| match face.neighbor_cell_ids {
                (k, Some(l)) => {
                    let a = DVec3::from_array(self.cells[k].centroid);
                    let b = DVec3::from_array(self.cells[l].centroid);
                    Some(a.distance(b))
                }
                _ => None,
            })
            .fold(None, |acc, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
    }
}
