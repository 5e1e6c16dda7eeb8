pub mod hooks;
pub mod problem;

use log::{debug, info};

use self::hooks::{InitReport, SimulationState, StepReport};
use crate::config::CroConfig;
use crate::error::Result;
use crate::numerics::timing::{record_phase, Phase};
use crate::physics::closures::{apply_cell_properties, apply_porous_resistance};
use crate::physics::fields::{MeshFields, MASS_FRACTION};
use crate::physics::locator::ZoneLocator;
use crate::physics::membrane::{MembraneModel, MembraneSweep};
use crate::processing::flux_log::FluxLog;

/// Centrifugal reverse osmosis case: mesh fields, locator, output sink and the
/// running permeate state.
pub struct CroSimulation {
    pub config: CroConfig,
    pub fields: MeshFields,
    pub state: SimulationState,
    locator: ZoneLocator,
    sink: FluxLog,
    last_sweep: MembraneSweep,
}

impl CroSimulation {
    /// Validate `config` against the mesh and prepare the nearest-cell lookups.
    pub fn new(config: CroConfig, fields: MeshFields) -> Result<Self> {
        config.validate_against(&fields)?;
        let locator = ZoneLocator::build(&fields, &config.located_zones(), config.locator)?;
        let sink = FluxLog::new(&config.output_sink_path);
        info!(
            "case ready: {} cells, {} faces, locator {:?}, output {}",
            fields.mesh.cells.len(),
            fields.mesh.faces.len(),
            locator.strategy(),
            sink.path().display()
        );
        Ok(Self {
            config,
            fields,
            state: SimulationState::default(),
            locator,
            sink,
            last_sweep: MembraneSweep::default(),
        })
    }

    pub fn sink(&self) -> &FluxLog {
        &self.sink
    }

    /// Membrane state from the latest iteration.
    pub fn last_sweep(&self) -> &MembraneSweep {
        &self.last_sweep
    }

    /// Initialization hook: salt field, clock and permeate total start from scratch.
    pub fn initialize(&mut self) -> Result<InitReport> {
        self.fields.reset_clock(self.config.time.t_start);
        self.state.reset();
        if self.config.truncate_output_on_start {
            self.sink.truncate()?;
        }
        hooks::initialize(&mut self.fields, &self.config)
    }

    /// One solver iteration worth of closures and boundary profiles.
    pub fn iterate(&mut self) -> Result<()> {
        let config = &self.config;
        let fields = &mut self.fields;

        record_phase(Phase::Closures, || -> Result<()> {
            apply_cell_properties(fields, &config.closures)?;
            apply_porous_resistance(
                fields,
                config.zones.membrane,
                config.membrane.permeability_m2,
                config.membrane.thickness_m,
            )?;
            Ok(())
        })?;

        let model = MembraneModel::new(
            &config.membrane,
            &config.closures,
            config.topology(),
            &self.locator,
        );
        self.last_sweep = record_phase(Phase::Membrane, || -> Result<MembraneSweep> {
            let sweep = model.apply_concentration(fields)?;
            model.apply_permeate_pressure(fields)?;
            Ok(sweep)
        })?;

        let n = hooks::extrapolate_outlet(fields, config.threads.outlet, MASS_FRACTION)?;
        debug!("outlet: {n} faces extrapolated");
        Ok(())
    }

    /// End-of-step hook.
    pub fn end_step(&mut self) -> Result<StepReport> {
        let fields = &self.fields;
        let thread = self.config.threads.membrane_surface;
        let state = &mut self.state;
        let sink = &self.sink;
        record_phase(Phase::Accumulation, || {
            hooks::accumulate_permeate(fields, thread, state, Some(sink))
        })
    }
}
