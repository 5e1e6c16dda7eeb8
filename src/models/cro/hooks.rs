use log::{info, warn};

use crate::config::CroConfig;
use crate::discretization::mesh::ThreadId;
use crate::error::Result;
use crate::physics::bc::{apply_profile, BoundaryProfile};
use crate::physics::fields::{DENSITY, MASS_FRACTION, NORMAL_VELOCITY, PRESSURE};
use crate::physics::{FieldAccessor, Location};
use crate::processing::flux_log::{FluxLog, FluxRecord};

/// Running permeate total. Owned by the caller and passed to the end-of-step hook.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationState {
    pub cumulative_volume: f64,
    pub step_index: u64,
    pub steps_recorded: u64,
}

impl SimulationState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Add one step's permeate volume.
    pub fn record_step(&mut self, increment: f64, step_index: u64) {
        self.cumulative_volume += increment;
        self.step_index = step_index;
        self.steps_recorded += 1;
    }

    /// Combine the increments computed on separate mesh partitions for one step.
    pub fn reduce<I: IntoIterator<Item = f64>>(increments: I) -> f64 {
        increments.into_iter().sum()
    }

    pub fn record(&self) -> FluxRecord {
        FluxRecord {
            cumulative_volume: self.cumulative_volume,
            step_index: self.step_index,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitReport {
    pub feed_mass_fraction: f64,
    pub feed_cells: usize,
    pub membrane_cells: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub step_index: u64,
    pub increment: f64,
    pub cumulative_volume: f64,
    /// false when the sink write failed; the state is updated regardless.
    pub persisted: bool,
}

/// Set the salt field at simulation start: feed concentration everywhere outside the
/// membrane, pure water inside it.
pub fn initialize<A: FieldAccessor + ?Sized>(fields: &mut A, config: &CroConfig) -> Result<InitReport> {
    let closures = &config.closures;
    let c0 = config.feed_concentration;
    let rho_feed = closures.density_at_concentration(c0);
    let y0 = closures.feed_mass_fraction(c0);
    let rho_water = closures.density_at_concentration(0.0);

    let mut report = InitReport {
        feed_mass_fraction: y0,
        feed_cells: 0,
        membrane_cells: 0,
    };
    for zone in fields.zone_ids() {
        let in_membrane = zone == config.zones.membrane;
        let (y, rho) = if in_membrane {
            (0.0, rho_water)
        } else {
            (y0, rho_feed)
        };
        let cells = fields.cells_in(zone)?.to_vec();
        for &c in &cells {
            let at = Location::Cell(c);
            fields.set_scalar(at, MASS_FRACTION, y)?;
            fields.set_scalar(at, DENSITY, rho)?;
            fields.set_scalar(at, PRESSURE, config.initial_pressure_pa)?;
        }
        if in_membrane {
            report.membrane_cells += cells.len();
        } else {
            report.feed_cells += cells.len();
        }
    }

    info!(
        "initialized {} feed cells at Y0 = {:.6e} ({} kg/m^3), {} membrane cells at 0",
        report.feed_cells, y0, c0, report.membrane_cells
    );
    Ok(report)
}

/// Zero-gradient outlet: each outlet face takes its interior cell's value.
pub fn extrapolate_outlet<A: FieldAccessor + ?Sized>(
    fields: &mut A,
    thread: ThreadId,
    field: &str,
) -> Result<usize> {
    apply_profile(fields, thread, field, BoundaryProfile::ZeroGradient)
}

/// Permeate volume produced through `thread` during the current step.
pub fn permeate_increment<A: FieldAccessor + ?Sized>(fields: &A, thread: ThreadId) -> Result<f64> {
    let dt = fields.current_timestep();
    let mut volume = 0.0;
    for &f in fields.faces_in(thread)? {
        let v = fields.scalar(Location::Face(f), NORMAL_VELOCITY)?.abs();
        volume += v * fields.area_vector(f)?.length() * dt;
    }
    Ok(volume)
}

/// Integrate the membrane flux over the step, add it to `state` and persist the
/// running total. A failing sink is logged, not fatal.
pub fn accumulate_permeate<A: FieldAccessor + ?Sized>(
    fields: &A,
    thread: ThreadId,
    state: &mut SimulationState,
    sink: Option<&FluxLog>,
) -> Result<StepReport> {
    let increment = permeate_increment(fields, thread)?;
    Ok(commit_step(increment, fields.current_step_index(), state, sink))
}

/// Record an already reduced increment and append it to the sink.
pub fn commit_step(
    increment: f64,
    step_index: u64,
    state: &mut SimulationState,
    sink: Option<&FluxLog>,
) -> StepReport {
    state.record_step(increment, step_index);

    let persisted = match sink {
        Some(log) => match log.append(&state.record()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "step {step_index}: could not append to {}: {e}",
                    log.path().display()
                );
                false
            }
        },
        None => false,
    };

    StepReport {
        step_index,
        increment,
        cumulative_volume: state.cumulative_volume,
        persisted,
    }
}
