//! Nearest-cell lookup across zones that do not share mesh topology.
//!
//! Distances are measured in the x-y plane only; the mesh is 2D or an extrusion of
//! one. The linear scan is the reference answer: ties go to the first cell in the
//! zone's iteration order. The R-tree path returns the same cell.

use std::collections::HashMap;

use log::debug;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use super::{FieldAccessor, Location};
use crate::discretization::mesh::{CellId, ZoneId};
use crate::error::{CroError, Result};

/// Indexed centroid: data is (position in zone iteration order, cell).
type IndexedCentroid = GeomWithData<[f64; 2], (usize, CellId)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    #[default]
    LinearScan,
    RTree,
}

#[inline]
pub fn horizontal_distance_2(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    dx * dx + dy * dy
}

/// Cell of `zone` whose centroid is nearest to `point` (linear scan).
pub fn find_nearest<A: FieldAccessor + ?Sized>(
    fields: &A,
    point: [f64; 3],
    zone: ZoneId,
) -> Result<CellId> {
    let mut best: Option<(CellId, f64)> = None;
    for &c in fields.cells_in(zone)? {
        let d2 = horizontal_distance_2(point, fields.centroid(Location::Cell(c))?);
        best = match best {
            None => Some((c, d2)),
            Some((_, best_d2)) if d2 < best_d2 => Some((c, d2)),
            keep => keep,
        };
    }
    best.map(|(c, _)| c).ok_or(CroError::EmptyZone { zone })
}

/// Nearest-cell lookup with an optional per-zone R-tree.
pub struct ZoneLocator {
    strategy: LocatorStrategy,
    indices: HashMap<ZoneId, RTree<IndexedCentroid>>,
}

impl ZoneLocator {
    pub fn new(strategy: LocatorStrategy) -> Self {
        Self {
            strategy,
            indices: HashMap::new(),
        }
    }

    /// Prepare lookups into `zones`. With [`LocatorStrategy::RTree`] each zone is indexed
    /// once; mesh geometry is assumed static for the lifetime of the locator.
    pub fn build<A: FieldAccessor + ?Sized>(
        fields: &A,
        zones: &[ZoneId],
        strategy: LocatorStrategy,
    ) -> Result<Self> {
        let mut locator = Self::new(strategy);
        if strategy == LocatorStrategy::RTree {
            for &zone in zones {
                locator.index_zone(fields, zone)?;
            }
        }
        Ok(locator)
    }

    pub fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    pub fn index_zone<A: FieldAccessor + ?Sized>(&mut self, fields: &A, zone: ZoneId) -> Result<()> {
        let cells = fields.cells_in(zone)?;
        if cells.is_empty() {
            return Err(CroError::EmptyZone { zone });
        }
        let entries = cells
            .iter()
            .enumerate()
            .map(|(pos, &c)| {
                let [x, y, _] = fields.centroid(Location::Cell(c))?;
                Ok(GeomWithData::new([x, y], (pos, c)))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("indexed zone {zone} ({} cells)", entries.len());
        self.indices.insert(zone, RTree::bulk_load(entries));
        Ok(())
    }

    pub fn find_nearest<A: FieldAccessor + ?Sized>(
        &self,
        fields: &A,
        point: [f64; 3],
        zone: ZoneId,
    ) -> Result<CellId> {
        match (self.strategy, self.indices.get(&zone)) {
            (LocatorStrategy::RTree, Some(tree)) => Self::query_tree(tree, point, zone),
            _ => find_nearest(fields, point, zone),
        }
    }

    fn query_tree(tree: &RTree<IndexedCentroid>, point: [f64; 3], zone: ZoneId) -> Result<CellId> {
        let mut candidates = tree.nearest_neighbor_iter_with_distance_2(&[point[0], point[1]]);
        let (first, d_min) = candidates.next().ok_or(CroError::EmptyZone { zone })?;
        // Equidistant cells resolve to the earliest in iteration order.
        let (_, cell) = candidates
            .take_while(|(_, d2)| *d2 == d_min)
            .map(|(entry, _)| entry.data)
            .fold(first.data, |best, cand| if cand.0 < best.0 { cand } else { best });
        Ok(cell)
    }
}
