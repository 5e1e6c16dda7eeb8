use crate::config::CroConfig;
use crate::discretization::mesh::Mesh;
use crate::models::cro::hooks::SimulationState;
use crate::physics::membrane::MembraneSweep;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub struct SimulationSummary {
    // Mesh info
    pub num_cells: usize,
    pub num_faces: usize,
    pub num_membrane_faces: usize,
    pub channel_extent: (f64, f64),
    pub min_cell_spacing: f64,
    pub max_cell_spacing: f64,

    // Feed and membrane
    pub feed_concentration: f64,
    pub feed_mass_fraction: f64,
    pub permeability: f64,
    pub membrane_thickness: f64,

    // Time loop
    pub dt: f64,
    pub t_end: f64,

    // Results
    pub steps_recorded: Option<u64>,
    pub cumulative_volume: Option<f64>,
    pub mean_flux: Option<f64>,
    pub surface_mass_fraction: Option<(f64, f64)>,
}

impl SimulationSummary {
    pub fn from_problem(mesh: &Mesh, config: &CroConfig) -> Self {
        let (min_spacing, max_spacing) = mesh.spacing_range().unwrap_or((0.0, 0.0));
        let num_membrane_faces = mesh
            .threads
            .get(&config.threads.membrane_surface)
            .map_or(0, |t| t.faces.len());

        Self {
            num_cells: mesh.cells.len(),
            num_faces: mesh.faces.len(),
            num_membrane_faces,
            channel_extent: (config.geometry.length, config.geometry.height()),
            min_cell_spacing: min_spacing,
            max_cell_spacing: max_spacing,
            feed_concentration: config.feed_concentration,
            feed_mass_fraction: config.closures.feed_mass_fraction(config.feed_concentration),
            permeability: config.membrane.permeability_m2,
            membrane_thickness: config.membrane.thickness_m,
            dt: config.time.dt,
            t_end: config.time.t_end,
            steps_recorded: None,
            cumulative_volume: None,
            mean_flux: None,
            surface_mass_fraction: None,
        }
    }

    pub fn add_run(&mut self, state: &SimulationState, sweep: &MembraneSweep) {
        self.steps_recorded = Some(state.steps_recorded);
        self.cumulative_volume = Some(state.cumulative_volume);
        if !sweep.faces.is_empty() {
            self.mean_flux = Some(sweep.mean_flux());
        }
        self.surface_mass_fraction = sweep.mass_fraction_range();
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file, "CENTRIFUGAL RO SIMULATION SUMMARY")?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;

        writeln!(file, "MESH STATISTICS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Number of cells:     {}", self.num_cells)?;
        writeln!(file, "Number of faces:     {}", self.num_faces)?;
        writeln!(file, "Membrane faces:      {}", self.num_membrane_faces)?;
        writeln!(
            file,
            "Channel extent:      {:.6e} x {:.6e} m",
            self.channel_extent.0, self.channel_extent.1
        )?;
        writeln!(file, "Min cell spacing:    {:.6e} m", self.min_cell_spacing)?;
        writeln!(file, "Max cell spacing:    {:.6e} m", self.max_cell_spacing)?;
        writeln!(file)?;

        writeln!(file, "FEED AND MEMBRANE")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Feed concentration:  {:.6e} kg/m^3", self.feed_concentration)?;
        writeln!(file, "Feed mass fraction:  {:.6e}", self.feed_mass_fraction)?;
        writeln!(file, "Permeability:        {:.6e} m^2", self.permeability)?;
        writeln!(file, "Membrane thickness:  {:.6e} m", self.membrane_thickness)?;
        writeln!(file)?;

        writeln!(file, "TIME LOOP")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Time step:           {:.6e} s", self.dt)?;
        writeln!(file, "End time:            {:.6e} s", self.t_end)?;
        writeln!(file)?;

        if let (Some(steps), Some(volume)) = (self.steps_recorded, self.cumulative_volume) {
            writeln!(file, "PERMEATE")?;
            writeln!(file, "{}", "-".repeat(60))?;
            writeln!(file, "Steps recorded:      {}", steps)?;
            writeln!(file, "Cumulative volume:   {:.6e} m^3", volume)?;
            if let Some(flux) = self.mean_flux {
                writeln!(file, "Mean flux:           {:.6e} m/s", flux)?;
            }
            if let Some((lo, hi)) = self.surface_mass_fraction {
                writeln!(file, "Surface Y range:     {:.6e} .. {:.6e}", lo, hi)?;
            }
            writeln!(file)?;
        }

        writeln!(file, "{}", "=".repeat(60))?;

        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SIMULATION SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Mesh:          {} cells, {} membrane faces",
            self.num_cells, self.num_membrane_faces
        );
        println!("Feed Y0:       {:.6e}", self.feed_mass_fraction);
        if let Some(volume) = self.cumulative_volume {
            println!("Permeate:      {:.4e} m^3", volume);
        }
        if let Some(flux) = self.mean_flux {
            println!("Mean flux:     {:.4e} m/s", flux);
        }
        println!("{}\n", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cro::problem::cro_problem_def;

    #[test]
    fn summary_lists_permeate_after_run() {
        let config = CroConfig::default();
        let fields = cro_problem_def(&config).unwrap();
        let mut summary = SimulationSummary::from_problem(&fields.mesh, &config);
        assert_eq!(summary.num_membrane_faces, config.geometry.columns);

        let mut state = SimulationState::default();
        state.record_step(3.0e-7, 1);
        summary.add_run(&state, &MembraneSweep::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        summary.write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Cumulative volume:   3.000000e-7 m^3"));
        assert!(!text.contains("Mean flux"));
    }
}
