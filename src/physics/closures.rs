//! Property closures of the salt solution.
//!
//! Every closure is linear in the local mass concentration `c = rho * Y` (kg/m^3).
//! The coefficients come from configuration so they can be recalibrated for other
//! feeds (e.g. sea water) without recompiling.

use log::debug;
use serde::{Deserialize, Serialize};

use super::fields::{DENSITY, DIFFUSIVITY, MASS_FRACTION, RESISTANCE, VISCOSITY};
use super::{FieldAccessor, Location};
use crate::discretization::mesh::ZoneId;
use crate::error::Result;

/// `a + b * c`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearCoefficients {
    pub a: f64,
    pub b: f64,
}

impl LinearCoefficients {
    pub const fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn eval(&self, concentration: f64) -> f64 {
        self.a + self.b * concentration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Closures {
    /// kg/m^3
    pub density: LinearCoefficients,
    /// Pa s
    pub viscosity: LinearCoefficients,
    /// m^2/s
    pub diffusivity: LinearCoefficients,
}

impl Default for Closures {
    fn default() -> Self {
        Self {
            density: LinearCoefficients::new(997.1, 0.909),
            viscosity: LinearCoefficients::new(8.9e-4, 3.133e-6),
            diffusivity: LinearCoefficients::new(1.16e-9, -3.9e-12),
        }
    }
}

impl Closures {
    #[inline]
    pub fn density(&self, rho: f64, y: f64) -> f64 {
        self.density.eval(rho * y)
    }

    #[inline]
    pub fn viscosity(&self, rho: f64, y: f64) -> f64 {
        self.viscosity.eval(rho * y)
    }

    #[inline]
    pub fn diffusivity(&self, rho: f64, y: f64) -> f64 {
        self.diffusivity.eval(rho * y)
    }

    /// Solution density at a known mass concentration.
    #[inline]
    pub fn density_at_concentration(&self, c: f64) -> f64 {
        self.density.eval(c)
    }

    /// Salt mass fraction of a feed with mass concentration `c0`.
    pub fn feed_mass_fraction(&self, c0: f64) -> f64 {
        c0 / self.density_at_concentration(c0)
    }
}

/// Momentum resistance of a porous layer with permeability `k` (m^2), effective
/// viscosity `mu_eff` and thickness `dz`.
#[inline]
pub fn porous_resistance(k: f64, mu_eff: f64, dz: f64) -> f64 {
    1.0 / (k * mu_eff * dz)
}

/// Update density, viscosity and diffusivity on every cell.
///
/// All three closures see the density and mass fraction from before this call.
pub fn apply_cell_properties<A: FieldAccessor + ?Sized>(
    fields: &mut A,
    closures: &Closures,
) -> Result<usize> {
    let mut count = 0;
    for zone in fields.zone_ids() {
        let cells = fields.cells_in(zone)?.to_vec();
        for c in cells {
            let at = Location::Cell(c);
            let rho = fields.scalar(at, DENSITY)?;
            let y = fields.scalar(at, MASS_FRACTION)?;
            let (density, mu, d) = (
                closures.density(rho, y),
                closures.viscosity(rho, y),
                closures.diffusivity(rho, y),
            );
            fields.set_scalar(at, DENSITY, density)?;
            fields.set_scalar(at, VISCOSITY, mu)?;
            fields.set_scalar(at, DIFFUSIVITY, d)?;
            count += 1;
        }
    }
    debug!("closures evaluated on {count} cells");
    Ok(count)
}

/// Write the porous resistance of every cell of `zone` from its current viscosity.
pub fn apply_porous_resistance<A: FieldAccessor + ?Sized>(
    fields: &mut A,
    zone: ZoneId,
    permeability: f64,
    thickness: f64,
) -> Result<usize> {
    let cells = fields.cells_in(zone)?.to_vec();
    for &c in &cells {
        let mu_eff = fields.scalar(Location::Cell(c), VISCOSITY)?;
        fields.set_scalar(
            Location::Cell(c),
            RESISTANCE,
            porous_resistance(permeability, mu_eff, thickness),
        )?;
    }
    Ok(cells.len())
}
