use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mesh::{Cell, Face, Mesh, Zone, ZoneId};
use crate::error::{CroError, Result};

/// One horizontal band of cells belonging to a single zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Layer {
    pub zone: ZoneId,
    pub name: String,
    pub thickness: f64,
    pub rows: usize,
}

/// Extruded 2D channel: `columns` cells along x, layers stacked in y.
/// Layers are listed from the top of the channel down to the bottom.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub length: f64,
    pub columns: usize,
    pub depth: f64,
    pub layers: Vec<Layer>,
}

impl ChannelLayout {
    pub fn height(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }

    /// y coordinate of the top edge of the lowest layer assigned to `zone`.
    pub fn top_of_zone(&self, zone: ZoneId) -> Option<f64> {
        let idx = self.layers.iter().rposition(|l| l.zone == zone)?;
        Some(self.layers[idx..].iter().map(|l| l.thickness).sum())
    }
}

/// Build a structured mesh for the layered channel.
///
/// Horizontal interior faces are oriented with the upper cell on side 0, so their
/// normal is `-y`. Vertical interior faces have the left cell on side 0 and normal `+x`.
pub fn create_layered_channel(layout: &ChannelLayout) -> Result<Mesh> {
    if layout.columns == 0 || layout.layers.is_empty() {
        return Err(CroError::InvalidConfig(
            "channel layout needs at least one column and one layer".into(),
        ));
    }
    if layout.length <= 0.0 || layout.depth <= 0.0 {
        return Err(CroError::InvalidConfig(format!(
            "channel length ({}) and depth ({}) must be positive",
            layout.length, layout.depth
        )));
    }
    if let Some(bad) = layout
        .layers
        .iter()
        .find(|l| l.rows == 0 || l.thickness <= 0.0)
    {
        return Err(CroError::InvalidConfig(format!(
            "layer '{}' needs positive thickness and at least one row",
            bad.name
        )));
    }

    // Rows ordered bottom to top: (y_low, y_high, zone)
    let mut rows: Vec<(f64, f64, ZoneId)> = Vec::new();
    let mut y = 0.0;
    for layer in layout.layers.iter().rev() {
        let dy = layer.thickness / layer.rows as f64;
        for _ in 0..layer.rows {
            rows.push((y, y + dy, layer.zone));
            y += dy;
        }
    }

    let nx = layout.columns;
    let dx = layout.length / nx as f64;
    let zc = 0.5 * layout.depth;
    let idx = |row: usize, col: usize| row * nx + col;

    let mut cells = Vec::with_capacity(rows.len() * nx);
    let mut zones: BTreeMap<ZoneId, Zone> = BTreeMap::new();
    for (r, &(y0, y1, zone)) in rows.iter().enumerate() {
        for i in 0..nx {
            let id = idx(r, i);
            cells.push(Cell {
                id,
                zone,
                volume: dx * (y1 - y0) * layout.depth,
                centroid: [(i as f64 + 0.5) * dx, 0.5 * (y0 + y1), zc],
                face_ids: Vec::new(),
            });
            zones
                .entry(zone)
                .or_insert_with(|| Zone {
                    id: zone,
                    name: zone_name(layout, zone),
                    cells: Vec::new(),
                })
                .cells
                .push(id);
        }
    }

    let mut faces = Vec::new();
    let mut push_face = |cells: &mut Vec<Cell>, face: Face| {
        let id = faces.len();
        cells[face.neighbor_cell_ids.0].face_ids.push(id);
        if let Some(l) = face.neighbor_cell_ids.1 {
            cells[l].face_ids.push(id);
        }
        faces.push(face);
    };

    for (r, &(y0, y1, _)) in rows.iter().enumerate() {
        let yc = 0.5 * (y0 + y1);
        let area = (y1 - y0) * layout.depth;

        push_face(
            &mut cells,
            Face {
                area,
                normal: [-1.0, 0.0, 0.0],
                neighbor_cell_ids: (idx(r, 0), None),
                centroid: [0.0, yc, zc],
            },
        );
        for i in 0..nx - 1 {
            push_face(
                &mut cells,
                Face {
                    area,
                    normal: [1.0, 0.0, 0.0],
                    neighbor_cell_ids: (idx(r, i), Some(idx(r, i + 1))),
                    centroid: [(i + 1) as f64 * dx, yc, zc],
                },
            );
        }
        push_face(
            &mut cells,
            Face {
                area,
                normal: [1.0, 0.0, 0.0],
                neighbor_cell_ids: (idx(r, nx - 1), None),
                centroid: [layout.length, yc, zc],
            },
        );
    }

    let area = dx * layout.depth;
    let top = rows.len() - 1;
    for i in 0..nx {
        let xc = (i as f64 + 0.5) * dx;
        push_face(
            &mut cells,
            Face {
                area,
                normal: [0.0, -1.0, 0.0],
                neighbor_cell_ids: (idx(0, i), None),
                centroid: [xc, 0.0, zc],
            },
        );
        for r in 0..top {
            push_face(
                &mut cells,
                Face {
                    area,
                    normal: [0.0, -1.0, 0.0],
                    neighbor_cell_ids: (idx(r + 1, i), Some(idx(r, i))),
                    centroid: [xc, rows[r].1, zc],
                },
            );
        }
        push_face(
            &mut cells,
            Face {
                area,
                normal: [0.0, 1.0, 0.0],
                neighbor_cell_ids: (idx(top, i), None),
                centroid: [xc, rows[top].1, zc],
            },
        );
    }

    Ok(Mesh {
        cells,
        faces,
        zones,
        threads: BTreeMap::new(),
    })
}

fn zone_name(layout: &ChannelLayout, zone: ZoneId) -> String {
    layout
        .layers
        .iter()
        .find(|l| l.zone == zone)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("zone-{zone}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer() -> ChannelLayout {
        ChannelLayout {
            length: 1.0,
            columns: 4,
            depth: 1.0,
            layers: vec![
                Layer {
                    zone: 1,
                    name: "feed".into(),
                    thickness: 2.0,
                    rows: 2,
                },
                Layer {
                    zone: 2,
                    name: "membrane".into(),
                    thickness: 0.5,
                    rows: 1,
                },
            ],
        }
    }

    #[test]
    fn layered_channel_counts() {
        let mesh = create_layered_channel(&two_layer()).unwrap();
        assert_eq!(mesh.cells.len(), 12);
        // 3 rows * 5 vertical faces + 4 columns * 4 horizontal faces
        assert_eq!(mesh.faces.len(), 15 + 16);
        assert_eq!(mesh.zones[&1].cells.len(), 8);
        assert_eq!(mesh.zones[&2].cells.len(), 4);
        assert_eq!(mesh.zones[&2].name, "membrane");

        let total: f64 = mesh.cells.iter().map(|c| c.volume).sum();
        assert!((total - 2.5).abs() < 1e-12);
    }

    #[test]
    fn interface_faces_point_from_upper_to_lower() {
        let mut mesh = create_layered_channel(&two_layer()).unwrap();
        let n = mesh.add_face_thread(
            24,
            "membrane-surface",
            &crate::discretization::mesh::FaceSelector::Interface { side0: 1, side1: 2 },
        );
        assert_eq!(n, 4);
        for &f in &mesh.threads[&24].faces {
            let face = &mesh.faces[f];
            assert_eq!(face.normal, [0.0, -1.0, 0.0]);
            assert!((face.centroid[1] - 0.5).abs() < 1e-12);
            let (k, l) = face.neighbor_cell_ids;
            assert_eq!(mesh.cells[k].zone, 1);
            assert_eq!(mesh.cells[l.unwrap()].zone, 2);
        }
    }

    #[test]
    fn top_of_zone_measures_from_bottom() {
        let layout = two_layer();
        assert_eq!(layout.top_of_zone(2), Some(0.5));
        assert_eq!(layout.top_of_zone(1), Some(2.5));
        assert_eq!(layout.top_of_zone(9), None);
    }

    #[test]
    fn rejects_empty_layout() {
        let mut layout = two_layer();
        layout.columns = 0;
        assert!(create_layered_channel(&layout).is_err());
    }
}
