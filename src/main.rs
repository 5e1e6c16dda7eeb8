use std::fs;
use std::path::Path;

use cro_rs::models::cro::problem::cro_problem_def;
use cro_rs::models::cro::CroSimulation;
use cro_rs::numerics::transient::TransientDriver;
use cro_rs::physics::FrozenFlow;
use cro_rs::processing::csv_writer;
use cro_rs::processing::flux_log::read_records;
use cro_rs::processing::summary::SimulationSummary;
use cro_rs::{CroConfig, Result};
use log::{error, info};

const OUTPUT_DIR: &str = "output/main";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    fs::create_dir_all(OUTPUT_DIR)?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading case from {}", path);
            CroConfig::from_json_file(&path)?
        }
        None => CroConfig::default(),
    };
    config.validate()?;

    let fields = cro_problem_def(&config)?;
    let mut summary = SimulationSummary::from_problem(&fields.mesh, &config);
    let driver = TransientDriver::from_params(&config.time);

    let mut sim = CroSimulation::new(config, fields)?;
    let state = driver.run(&mut sim, &mut FrozenFlow, |report| {
        if !report.persisted {
            info!("Step {} not persisted to the output sink", report.step_index);
        }
    })?;

    save_membrane_profile(&sim)?;

    let records = read_records(sim.sink().path())?;
    info!(
        "{} records in {}",
        records.len(),
        sim.sink().path().display()
    );

    summary.add_run(&state, sim.last_sweep());
    let summary_path = Path::new(OUTPUT_DIR).join("simulation_summary.txt");
    summary.write_to_file(&summary_path)?;
    summary.print_to_console();

    println!("Summary saved to {}", summary_path.display());
    Ok(())
}

fn save_membrane_profile(sim: &CroSimulation) -> Result<()> {
    let sweep = sim.last_sweep();
    let x_positions: Vec<f64> = sweep
        .faces
        .iter()
        .map(|s| sim.fields.mesh.faces[s.face].centroid[0])
        .collect();

    let path = Path::new(OUTPUT_DIR).join("membrane_profile.csv");
    csv_writer::write_membrane_profile(&path, &x_positions, sweep)?;
    info!("Membrane profile saved to {}", path.display());
    Ok(())
}
