//! Membrane surface boundary model.
//!
//! At each face of the membrane surface the salt concentration follows a one-sided,
//! second-order balance between back-diffusion and convective flux through the
//! membrane:
//!
//! ```text
//! C_m = D (4 C_a - C_b) / (3 D - 2 J dz)
//! ```
//!
//! with `C_a`, `C_b` the concentrations in the first and second cells off the membrane
//! and `J = K (p - p_atm - p_osm)` the permeate flux. The permeate side pressure is tied
//! to the local osmotic pressure so the flux law holds across the membrane.

use log::debug;
use serde::{Deserialize, Serialize};

use super::bc::apply_face_values;
use super::closures::Closures;
use super::fields::{DENSITY, MASS_FRACTION, NORMAL_VELOCITY, PRESSURE};
use super::locator::ZoneLocator;
use super::{FieldAccessor, Location};
use crate::discretization::mesh::{CellId, FaceId, Side, ThreadId, ZoneId};
use crate::error::{CroError, Result};
use crate::numerics::StabilityGuard;

/// Converts the osmotic coefficient (bar m^3/kg) to Pa per kg/m^3.
pub const BAR_TO_PA: f64 = 1e5;

/// Where the membrane flux `J` comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxSource {
    /// `J = K (p - p_atm - p_osm)`
    #[default]
    OsmoticPressure,
    /// `J = -v`, with `v` the host's normal velocity in the membrane-adjacent cell.
    NormalVelocity,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneParams {
    pub thickness_m: f64,
    pub permeability_m2: f64,
    pub atmospheric_pressure_pa: f64,
    /// bar per kg/m^3 of salt
    pub osmotic_coefficient: f64,
    pub flux_source: FluxSource,
    pub stability: StabilityGuard,
}

impl Default for MembraneParams {
    fn default() -> Self {
        Self {
            thickness_m: 0.04e-3,
            permeability_m2: 1.1467e-11,
            atmospheric_pressure_pa: 101_325.0,
            osmotic_coefficient: 0.523,
            flux_source: FluxSource::OsmoticPressure,
            stability: StabilityGuard::default(),
        }
    }
}

/// Osmotic pressure (Pa) of a solution with density `rho` and salt mass fraction `y`.
#[inline]
pub fn osmotic_pressure(coefficient: f64, rho: f64, y: f64) -> f64 {
    coefficient * rho * y * BAR_TO_PA
}

/// Volume flux through the membrane (m/s).
#[inline]
pub fn membrane_flux(permeability: f64, pressure: f64, p_atm: f64, p_osm: f64) -> f64 {
    permeability * ((pressure - p_atm) - p_osm)
}

/// Salt mass concentration on the membrane surface.
pub fn polarization_concentration(
    d: f64,
    c_a: f64,
    c_b: f64,
    j: f64,
    dz: f64,
    guard: &StabilityGuard,
) -> Result<f64> {
    let denominator = 3.0 * d - 2.0 * j * dz;
    let scale = 3.0 * d.abs() + 2.0 * (j * dz).abs();
    let denominator = guard.check_denominator(denominator, scale, "concentration polarization")?;
    guard.check_finite(d * (4.0 * c_a - c_b) / denominator, "concentration polarization")
}

/// Zones and threads the membrane model works on.
#[derive(Clone, Copy, Debug)]
pub struct MembraneTopology {
    pub surface_thread: ThreadId,
    pub permeate_thread: ThreadId,
    /// Feed-side cells adjacent to the membrane.
    pub surface_zone: ZoneId,
    pub zone_a: ZoneId,
    pub zone_b: ZoneId,
}

/// Evaluated state at one membrane face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MembraneFaceState {
    pub face: FaceId,
    pub cell: CellId,
    pub cell_a: CellId,
    pub cell_b: CellId,
    pub c_a: f64,
    pub c_b: f64,
    pub flux: f64,
    pub diffusivity: f64,
    pub c_m: f64,
    pub mass_fraction: f64,
}

/// Result of one pass over the membrane surface.
#[derive(Clone, Debug, Default)]
pub struct MembraneSweep {
    pub faces: Vec<MembraneFaceState>,
}

impl MembraneSweep {
    pub fn mass_fraction_range(&self) -> Option<(f64, f64)> {
        self.faces.iter().map(|s| s.mass_fraction).fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }

    pub fn mean_flux(&self) -> f64 {
        if self.faces.is_empty() {
            return 0.0;
        }
        self.faces.iter().map(|s| s.flux).sum::<f64>() / self.faces.len() as f64
    }
}

pub struct MembraneModel<'a> {
    params: &'a MembraneParams,
    closures: &'a Closures,
    topology: MembraneTopology,
    locator: &'a ZoneLocator,
}

impl<'a> MembraneModel<'a> {
    pub fn new(
        params: &'a MembraneParams,
        closures: &'a Closures,
        topology: MembraneTopology,
        locator: &'a ZoneLocator,
    ) -> Self {
        Self {
            params,
            closures,
            topology,
            locator,
        }
    }

    /// Evaluate the polarization relation at one membrane face without writing anything.
    pub fn evaluate_face<A: FieldAccessor + ?Sized>(
        &self,
        fields: &A,
        face: FaceId,
    ) -> Result<MembraneFaceState> {
        let cell = fields
            .adjacent_cell(face, Side::Zero)?
            .ok_or(CroError::MissingAdjacentCell {
                face,
                side: Side::Zero,
            })?;
        let here = Location::Cell(cell);
        let x = fields.centroid(here)?;

        let cell_a = self.locator.find_nearest(fields, x, self.topology.zone_a)?;
        let cell_b = self.locator.find_nearest(fields, x, self.topology.zone_b)?;
        let c_a = concentration(fields, cell_a)?;
        let c_b = concentration(fields, cell_b)?;

        let rho = fields.scalar(here, DENSITY)?;
        let y = fields.scalar(here, MASS_FRACTION)?;
        let flux = match self.params.flux_source {
            FluxSource::OsmoticPressure => membrane_flux(
                self.params.permeability_m2,
                fields.scalar(here, PRESSURE)?,
                self.params.atmospheric_pressure_pa,
                osmotic_pressure(self.params.osmotic_coefficient, rho, y),
            ),
            FluxSource::NormalVelocity => -fields.scalar(here, NORMAL_VELOCITY)?,
        };
        let d = self.closures.diffusivity(rho, y);

        let c_m = polarization_concentration(
            d,
            c_a,
            c_b,
            flux,
            self.params.thickness_m,
            &self.params.stability,
        )
        .map_err(|e| at_face(e, face))?;
        let mass_fraction = self
            .params
            .stability
            .check_finite(c_m / rho, "membrane mass fraction")
            .map_err(|e| at_face(e, face))?;

        Ok(MembraneFaceState {
            face,
            cell,
            cell_a,
            cell_b,
            c_a,
            c_b,
            flux,
            diffusivity: d,
            c_m,
            mass_fraction,
        })
    }

    /// Set the membrane surface mass fraction and permeate velocity on every face.
    ///
    /// Every face is evaluated before any is written, so a failure leaves the fields
    /// untouched.
    pub fn apply_concentration<A: FieldAccessor + ?Sized>(&self, fields: &mut A) -> Result<MembraneSweep> {
        let faces = fields.faces_in(self.topology.surface_thread)?.to_vec();
        let states = faces
            .iter()
            .map(|&f| self.evaluate_face(&*fields, f))
            .collect::<Result<Vec<_>>>()?;

        for s in &states {
            fields.set_scalar(Location::Face(s.face), MASS_FRACTION, s.mass_fraction)?;
            fields.set_scalar(Location::Face(s.face), NORMAL_VELOCITY, -s.flux)?;
        }

        let sweep = MembraneSweep { faces: states };
        if let Some((lo, hi)) = sweep.mass_fraction_range() {
            debug!(
                "membrane sweep: {} faces, Y_m in [{lo:.6e}, {hi:.6e}], mean J {:.6e} m/s",
                sweep.faces.len(),
                sweep.mean_flux()
            );
        }
        Ok(sweep)
    }

    /// Assign each permeate face the osmotic pressure of the nearest membrane-adjacent cell.
    pub fn apply_permeate_pressure<A: FieldAccessor + ?Sized>(&self, fields: &mut A) -> Result<usize> {
        let faces = fields.faces_in(self.topology.permeate_thread)?.to_vec();
        let mut pressures = Vec::with_capacity(faces.len());
        for &f in &faces {
            let x = fields.centroid(Location::Face(f))?;
            let c = self
                .locator
                .find_nearest(&*fields, x, self.topology.surface_zone)?;
            let rho = fields.scalar(Location::Cell(c), DENSITY)?;
            let y = fields.scalar(Location::Cell(c), MASS_FRACTION)?;
            pressures.push(osmotic_pressure(self.params.osmotic_coefficient, rho, y));
        }
        apply_face_values(fields, self.topology.permeate_thread, PRESSURE, &pressures)?;
        Ok(faces.len())
    }
}

fn concentration<A: FieldAccessor + ?Sized>(fields: &A, cell: CellId) -> Result<f64> {
    let at = Location::Cell(cell);
    Ok(fields.scalar(at, MASS_FRACTION)? * fields.scalar(at, DENSITY)?)
}

fn at_face(err: CroError, face: FaceId) -> CroError {
    match err {
        CroError::NumericalInstability {
            context,
            denominator,
            threshold,
        } => CroError::NumericalInstability {
            context: format!("{context} at face {face}"),
            denominator,
            threshold,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::InstabilityPolicy;

    #[test]
    fn zero_flux_reduces_to_one_sided_extrapolation() {
        let c_m =
            polarization_concentration(1.0, 4.0, 2.0, 0.0, 0.04e-3, &StabilityGuard::default())
                .unwrap();
        assert_eq!(c_m, 14.0 / 3.0);
    }

    #[test]
    fn positive_flux_raises_surface_concentration() {
        let guard = StabilityGuard::default();
        let d = 1.16e-9;
        let no_flux = polarization_concentration(d, 6.0, 6.0, 0.0, 0.04e-3, &guard).unwrap();
        let with_flux = polarization_concentration(d, 6.0, 6.0, 8e-6, 0.04e-3, &guard).unwrap();
        assert!((no_flux - 6.0).abs() < 1e-12);
        assert!(with_flux > no_flux);
    }

    #[test]
    fn singular_denominator_is_reported() {
        // 3 D = 2 J dz
        let (d, dz) = (1.0e-9, 1.0e-4);
        let j = 3.0 * d / (2.0 * dz);
        let err = polarization_concentration(d, 4.0, 2.0, j, dz, &StabilityGuard::default())
            .unwrap_err();
        assert!(matches!(err, CroError::NumericalInstability { .. }));

        let clamp = StabilityGuard {
            policy: InstabilityPolicy::Clamp,
            relative_tolerance: 1e-6,
        };
        let c_m = polarization_concentration(d, 4.0, 2.0, j, dz, &clamp).unwrap();
        assert!(c_m.is_finite());
    }

    #[test]
    fn osmotic_pressure_of_feed() {
        // 6 kg/m^3 of salt
        let p = osmotic_pressure(0.523, 1002.554, 6.0 / 1002.554);
        assert!((p - 0.523 * 6.0 * 1e5).abs() < 1e-6);
    }

    #[test]
    fn flux_vanishes_at_osmotic_balance() {
        let p_atm = 101_325.0;
        let p_osm = 3.138e5;
        assert_eq!(membrane_flux(1.1467e-11, p_atm + p_osm, p_atm, p_osm), 0.0);
        assert!(membrane_flux(1.1467e-11, p_atm + 2.0 * p_osm, p_atm, p_osm) > 0.0);
    }

    #[test]
    fn sweep_statistics() {
        let state = |face, y, j| MembraneFaceState {
            face,
            cell: 0,
            cell_a: 0,
            cell_b: 0,
            c_a: 0.0,
            c_b: 0.0,
            flux: j,
            diffusivity: 0.0,
            c_m: 0.0,
            mass_fraction: y,
        };
        let sweep = MembraneSweep {
            faces: vec![state(0, 0.01, 1.0), state(1, 0.03, 3.0)],
        };
        assert_eq!(sweep.mass_fraction_range(), Some((0.01, 0.03)));
        assert_eq!(sweep.mean_flux(), 2.0);
        assert_eq!(MembraneSweep::default().mass_fraction_range(), None);
    }
}
