use std::time::Instant;

use log::{error, info};

use super::timing::{finalize_and_print, record_phase, reset_timing, Phase};
use crate::config::TimeParams;
use crate::error::Result;
use crate::models::cro::hooks::{SimulationState, StepReport};
use crate::models::cro::CroSimulation;
use crate::physics::HostSolver;

/// Owned time loop: initialize once, then per step advance the host, run the
/// closures and boundary profiles, and accumulate the permeate.
pub struct TransientDriver {
    pub t_start: f64,
    pub t_end: f64,
    pub dt: f64,
    pub iterations_per_step: usize,
}

impl Default for TransientDriver {
    fn default() -> Self {
        Self::from_params(&TimeParams::default())
    }
}

impl TransientDriver {
    pub fn from_params(time: &TimeParams) -> Self {
        Self {
            t_start: time.t_start,
            t_end: time.t_end,
            dt: time.dt,
            iterations_per_step: time.iterations_per_step,
        }
    }

    /// Number of steps needed to reach `t_end`; a final partial step counts as one.
    pub fn num_steps(&self) -> u64 {
        if self.dt <= 0.0 || self.t_end <= self.t_start {
            return 0;
        }
        ((self.t_end - self.t_start) / self.dt - 1e-9).ceil().max(0.0) as u64
    }

    pub fn run<H: HostSolver>(
        &self,
        sim: &mut CroSimulation,
        host: &mut H,
        mut callback: impl FnMut(&StepReport),
    ) -> Result<SimulationState> {
        let started = Instant::now();
        reset_timing();

        sim.initialize()?;
        let steps = self.num_steps();
        info!(
            "Starting transient run: t = {:.3e} -> {:.3e}, dt = {:.3e}, {} steps",
            self.t_start, self.t_end, self.dt, steps
        );

        for _ in 0..steps {
            sim.fields.advance_clock(self.dt);
            let step = sim.fields.clock().step;

            let outcome = record_phase(Phase::Host, || host.advance(&mut sim.fields, self.dt))
                .and_then(|_| (0..self.iterations_per_step).try_for_each(|_| sim.iterate()))
                .and_then(|_| sim.end_step());

            match outcome {
                Ok(report) => {
                    info!(
                        "Step {:>4} | t = {:.4e} | dV = {:.4e} m^3 | V = {:.4e} m^3",
                        step,
                        sim.fields.clock().time,
                        report.increment,
                        report.cumulative_volume
                    );
                    callback(&report);
                }
                Err(e) => {
                    error!("Step {:>4} | FAILED: {}", step, e);
                    return Err(e);
                }
            }
        }

        finalize_and_print(started.elapsed());
        Ok(sim.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_covers_interval() {
        let driver = |t_end, dt| TransientDriver {
            t_start: 0.0,
            t_end,
            dt,
            iterations_per_step: 1,
        };
        assert_eq!(driver(10.0, 0.5).num_steps(), 20);
        assert_eq!(driver(1.0, 0.1).num_steps(), 10);
        assert_eq!(driver(1.05, 0.5).num_steps(), 3);
        assert_eq!(driver(0.0, 0.5).num_steps(), 0);
        assert_eq!(driver(1.0, 0.0).num_steps(), 0);
    }
}
