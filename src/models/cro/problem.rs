use log::{info, warn};

use crate::config::CroConfig;
use crate::discretization::generator::create_layered_channel;
use crate::discretization::mesh::{FaceSelector, Mesh};
use crate::error::{CroError, Result};
use crate::physics::fields::MeshFields;

/// Build the layered channel described by `config.geometry` and tag its face threads.
///
/// The membrane surface is the interface between the surface zone and the membrane
/// zone; the permeate boundary is the bottom of the membrane; inlet and outlet are the
/// left and right ends of the feed side.
pub fn cro_problem_def(config: &CroConfig) -> Result<MeshFields> {
    let layout = &config.geometry;
    let mut mesh = create_layered_channel(layout)?;

    let membrane = config.zones.membrane;
    if layout.top_of_zone(membrane).is_none() {
        return Err(CroError::UnknownZone(membrane));
    }

    tag_threads(&mut mesh, config);

    let (min_dx, max_dx) = mesh.spacing_range().unwrap_or((0.0, 0.0));
    info!(
        "layered channel: {} x {:.3e} m, {} cells, spacing {:.3e}..{:.3e} m",
        layout.length,
        layout.height(),
        mesh.cells.len(),
        min_dx,
        max_dx
    );
    Ok(MeshFields::new(mesh))
}

fn tag_threads(mesh: &mut Mesh, config: &CroConfig) {
    let threads = &config.threads;
    let membrane = config.zones.membrane;

    let counts = [
        (
            "membrane-surface",
            mesh.add_face_thread(
                threads.membrane_surface,
                "membrane-surface",
                &FaceSelector::Interface {
                    side0: config.zones.surface,
                    side1: membrane,
                },
            ),
        ),
        (
            "permeate",
            mesh.add_face_thread(
                threads.permeate,
                "permeate",
                &FaceSelector::boundary_where(move |face, cell| {
                    face.normal[1] < -0.5 && cell.zone == membrane
                }),
            ),
        ),
        (
            "inlet",
            mesh.add_face_thread(
                threads.inlet,
                "inlet",
                &FaceSelector::boundary_where(move |face, cell| {
                    face.normal[0] < -0.5 && cell.zone != membrane
                }),
            ),
        ),
        (
            "outlet",
            mesh.add_face_thread(
                threads.outlet,
                "outlet",
                &FaceSelector::boundary_where(move |face, cell| {
                    face.normal[0] > 0.5 && cell.zone != membrane
                }),
            ),
        ),
        (
            "top-wall",
            mesh.add_face_thread(
                threads.top_wall,
                "top-wall",
                &FaceSelector::boundary_where(|face, _| face.normal[1] > 0.5),
            ),
        ),
    ];

    for (name, n) in counts {
        if n == 0 {
            warn!("face thread '{name}' is empty");
        }
    }
}
