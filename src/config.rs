use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::discretization::generator::{ChannelLayout, Layer};
use crate::discretization::mesh::{ThreadId, ZoneId};
use crate::error::{CroError, Result};
use crate::physics::closures::Closures;
use crate::physics::locator::LocatorStrategy;
use crate::physics::membrane::{MembraneParams, MembraneTopology};
use crate::physics::FieldAccessor;
use crate::processing::flux_log::FluxLog;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneIds {
    pub feed: ZoneId,
    /// Porous membrane layer.
    pub membrane: ZoneId,
    /// Feed-side cells touching the membrane.
    pub surface: ZoneId,
    /// First cell layer off the membrane surface.
    pub permeate_a: ZoneId,
    /// Second cell layer off the membrane surface.
    pub permeate_b: ZoneId,
}

impl Default for ZoneIds {
    fn default() -> Self {
        Self {
            feed: 12,
            membrane: 16,
            surface: 13,
            permeate_a: 14,
            permeate_b: 15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadIds {
    pub inlet: ThreadId,
    pub outlet: ThreadId,
    pub top_wall: ThreadId,
    pub permeate: ThreadId,
    pub membrane_surface: ThreadId,
}

impl Default for ThreadIds {
    fn default() -> Self {
        Self {
            inlet: 20,
            outlet: 21,
            top_wall: 22,
            permeate: 23,
            membrane_surface: 24,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeParams {
    pub t_start: f64,
    pub t_end: f64,
    pub dt: f64,
    pub iterations_per_step: usize,
}

impl Default for TimeParams {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 10.0,
            dt: 0.5,
            iterations_per_step: 1,
        }
    }
}

/// Run configuration. Every section has defaults, so a JSON file only needs the
/// values it changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CroConfig {
    /// Salt mass concentration of the feed (kg/m^3).
    pub feed_concentration: f64,
    pub initial_pressure_pa: f64,
    pub zones: ZoneIds,
    pub threads: ThreadIds,
    pub membrane: MembraneParams,
    pub closures: Closures,
    pub locator: LocatorStrategy,
    pub output_sink_path: PathBuf,
    pub truncate_output_on_start: bool,
    pub time: TimeParams,
    pub geometry: ChannelLayout,
}

impl Default for CroConfig {
    fn default() -> Self {
        let zones = ZoneIds::default();
        Self {
            feed_concentration: 6.0,
            initial_pressure_pa: 101_325.0 + 10.0e5,
            zones,
            threads: ThreadIds::default(),
            membrane: MembraneParams::default(),
            closures: Closures::default(),
            locator: LocatorStrategy::LinearScan,
            output_sink_path: PathBuf::from("output/main/flux.txt"),
            truncate_output_on_start: true,
            time: TimeParams::default(),
            geometry: default_channel(&zones),
        }
    }
}

/// Feed channel over the membrane, with the three cell layers nearest the membrane
/// split into their own zones.
pub fn default_channel(zones: &ZoneIds) -> ChannelLayout {
    let layer = |zone, name: &str, thickness, rows| Layer {
        zone,
        name: name.to_string(),
        thickness,
        rows,
    };
    ChannelLayout {
        length: 0.05,
        columns: 40,
        depth: 1.0,
        layers: vec![
            layer(zones.feed, "feed", 1.0e-3, 8),
            layer(zones.permeate_b, "bracket-b", 0.1e-3, 1),
            layer(zones.permeate_a, "bracket-a", 0.1e-3, 1),
            layer(zones.surface, "membrane-surface", 0.1e-3, 1),
            layer(zones.membrane, "membrane", 0.04e-3, 1),
        ],
    }
}

impl CroConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: CroConfig = serde_json::from_str(&text)?;
        info!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn topology(&self) -> MembraneTopology {
        MembraneTopology {
            surface_thread: self.threads.membrane_surface,
            permeate_thread: self.threads.permeate,
            surface_zone: self.zones.surface,
            zone_a: self.zones.permeate_a,
            zone_b: self.zones.permeate_b,
        }
    }

    /// Zones the nearest-cell lookups search.
    pub fn located_zones(&self) -> [ZoneId; 3] {
        [self.zones.surface, self.zones.permeate_a, self.zones.permeate_b]
    }

    /// Check parameters that do not depend on the mesh.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("membrane.thickness_m", self.membrane.thickness_m),
            ("membrane.permeability_m2", self.membrane.permeability_m2),
            ("time.dt", self.time.dt),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(CroError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.feed_concentration >= 0.0) {
            return Err(CroError::InvalidConfig(format!(
                "feed_concentration must be non-negative, got {}",
                self.feed_concentration
            )));
        }
        if self.time.t_end < self.time.t_start {
            return Err(CroError::InvalidConfig(format!(
                "time.t_end ({}) precedes time.t_start ({})",
                self.time.t_end, self.time.t_start
            )));
        }
        if self.time.iterations_per_step == 0 {
            return Err(CroError::InvalidConfig(
                "time.iterations_per_step must be at least 1".into(),
            ));
        }
        if !(self.membrane.stability.relative_tolerance >= 0.0) {
            return Err(CroError::InvalidConfig(
                "membrane.stability.relative_tolerance must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Check every referenced zone and thread against the mesh and that the output
    /// sink can be written.
    pub fn validate_against<A: FieldAccessor + ?Sized>(&self, fields: &A) -> Result<()> {
        self.validate()?;

        let zones = [
            self.zones.membrane,
            self.zones.surface,
            self.zones.permeate_a,
            self.zones.permeate_b,
        ];
        for zone in zones {
            if fields.cells_in(zone)?.is_empty() {
                return Err(CroError::EmptyZone { zone });
            }
        }
        for thread in [
            self.threads.membrane_surface,
            self.threads.permeate,
            self.threads.outlet,
        ] {
            fields.lookup_thread(thread)?;
        }

        FluxLog::new(&self.output_sink_path)
            .check_writable()
            .map_err(|e| {
                CroError::InvalidConfig(format!(
                    "output sink {} is not writable: {e}",
                    self.output_sink_path.display()
                ))
            })?;
        Ok(())
    }
}
