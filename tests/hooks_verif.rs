use std::path::Path;

use cro_rs::config::TimeParams;
use cro_rs::models::cro::hooks::{commit_step, permeate_increment, SimulationState};
use cro_rs::models::cro::problem::cro_problem_def;
use cro_rs::models::cro::CroSimulation;
use cro_rs::numerics::transient::TransientDriver;
use cro_rs::physics::fields::{MeshFields, DENSITY, MASS_FRACTION, NORMAL_VELOCITY};
use cro_rs::physics::locator::LocatorStrategy;
use cro_rs::physics::{FieldAccessor, FrozenFlow, Location};
use cro_rs::processing::flux_log::{read_records, FluxLog};
use cro_rs::{CroConfig, Result};

fn case(dir: &Path) -> CroConfig {
    let mut config = CroConfig::default();
    config.output_sink_path = dir.join("flux.txt");
    config.time = TimeParams {
        t_start: 0.0,
        t_end: 2.0,
        dt: 0.5,
        iterations_per_step: 2,
    };
    config
}

fn simulation(config: CroConfig) -> CroSimulation {
    let fields = cro_problem_def(&config).unwrap();
    CroSimulation::new(config, fields).unwrap()
}

#[test]
fn verify_initial_salt_field() {
    println!("Test: initial salt field");
    let dir = tempfile::tempdir().unwrap();
    let mut sim = simulation(case(dir.path()));
    let report = sim.initialize().unwrap();

    let y0 = 6.0 / 1002.554;
    assert!((report.feed_mass_fraction - y0).abs() < 1e-15);

    let membrane = sim.config.zones.membrane;
    let mut membrane_cells = 0;
    for zone in sim.fields.zone_ids() {
        for &c in sim.fields.cells_in(zone).unwrap() {
            let y = sim.fields.scalar(Location::Cell(c), MASS_FRACTION).unwrap();
            if zone == membrane {
                assert_eq!(y, 0.0);
                membrane_cells += 1;
            } else {
                assert_eq!(y, report.feed_mass_fraction);
                let rho = sim.fields.scalar(Location::Cell(c), DENSITY).unwrap();
                assert!((rho * y - 6.0).abs() < 1e-12);
            }
        }
    }
    assert_eq!(membrane_cells, report.membrane_cells);
    assert_eq!(
        report.feed_cells + report.membrane_cells,
        sim.fields.mesh.cells.len()
    );
}

#[test]
fn verify_permeate_increment() {
    println!("Test: permeate increment integrates |v| A dt over the membrane");
    let config = CroConfig::default();
    let mut fields = cro_problem_def(&config).unwrap();
    let thread = config.threads.membrane_surface;
    let faces = fields.faces_in(thread).unwrap().to_vec();
    for &f in &faces {
        fields
            .set_scalar(Location::Face(f), NORMAL_VELOCITY, -2.0e-6)
            .unwrap();
    }
    fields.advance_clock(0.5);

    let area: f64 = faces
        .iter()
        .map(|&f| fields.area_vector(f).unwrap().length())
        .sum();
    // 0.05 m channel, unit depth
    assert!((area - 0.05).abs() < 1e-12);

    let dv = permeate_increment(&fields, thread).unwrap();
    assert!((dv - 2.0e-6 * 0.05 * 0.5).abs() < 1e-18);
}

#[test]
fn verify_accumulation_is_additive() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FluxLog::new(dir.path().join("flux.txt"));

    let mut split = SimulationState::default();
    commit_step(0.25, 1, &mut split, Some(&sink));
    let last = commit_step(0.5, 2, &mut split, Some(&sink));
    assert!(last.persisted);

    let mut merged = SimulationState::default();
    commit_step(0.75, 2, &mut merged, None);
    assert_eq!(split.cumulative_volume, merged.cumulative_volume);

    // Two partitions contributing to one step.
    let mut reduced = SimulationState::default();
    commit_step(SimulationState::reduce([0.25, 0.5]), 1, &mut reduced, None);
    assert_eq!(reduced.cumulative_volume, 0.75);

    let records = sink.read_records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].cumulative_volume, 0.75);
    assert_eq!(records[1].step_index, 2);
}

#[test]
fn verify_driver_writes_monotone_log() {
    println!("Test: driver output sink");
    let dir = tempfile::tempdir().unwrap();
    let config = case(dir.path());
    let driver = TransientDriver::from_params(&config.time);
    let mut sim = simulation(config);

    let mut reports = Vec::new();
    let state = driver
        .run(&mut sim, &mut FrozenFlow, |r| reports.push(*r))
        .unwrap();

    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.persisted && r.increment > 0.0));
    assert_eq!(state.steps_recorded, 4);
    assert_eq!(state.step_index, 4);

    let records = read_records(sim.sink().path()).unwrap();
    assert_eq!(records.len(), 4);
    for (i, pair) in records.windows(2).enumerate() {
        assert_eq!(pair[0].step_index, i as u64 + 1);
        assert!(pair[1].cumulative_volume >= pair[0].cumulative_volume);
    }
    let last = records[3].cumulative_volume;
    assert!((last - state.cumulative_volume).abs() <= 1e-6 * state.cumulative_volume);

    // A second run starts the sink over.
    driver.run(&mut sim, &mut FrozenFlow, |_| {}).unwrap();
    assert_eq!(read_records(sim.sink().path()).unwrap().len(), 4);
}

#[test]
fn verify_host_runs_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = case(dir.path());
    let driver = TransientDriver::from_params(&config.time);
    let mut sim = simulation(config);

    let mut calls = 0;
    let mut host = |fields: &mut MeshFields, dt: f64| -> Result<()> {
        assert_eq!(fields.current_timestep(), dt);
        calls += 1;
        Ok(())
    };
    driver.run(&mut sim, &mut host, |_| {}).unwrap();
    assert_eq!(calls, 4);
}

#[test]
fn verify_locator_strategies_agree() {
    println!("Test: linear scan and R-tree give the same run");
    let run = |strategy: LocatorStrategy| {
        let dir = tempfile::tempdir().unwrap();
        let mut config = case(dir.path());
        config.locator = strategy;
        let driver = TransientDriver::from_params(&config.time);
        let mut sim = simulation(config);
        let state = driver.run(&mut sim, &mut FrozenFlow, |_| {}).unwrap();
        let picks: Vec<_> = sim
            .last_sweep()
            .faces
            .iter()
            .map(|s| (s.cell_a, s.cell_b))
            .collect();
        (state.cumulative_volume, picks)
    };

    let (v_linear, picks_linear) = run(LocatorStrategy::LinearScan);
    let (v_tree, picks_tree) = run(LocatorStrategy::RTree);
    assert_eq!(picks_linear, picks_tree);
    assert_eq!(v_linear, v_tree);
}
