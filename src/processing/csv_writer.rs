use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::physics::membrane::{MembraneFaceState, MembraneSweep};

/// Write equal-length columns to a CSV file with a header row.
pub fn write_csv<P: AsRef<Path>>(path: P, headers: &[&str], data: &[Vec<f64>]) -> io::Result<()> {
    if headers.len() != data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Headers count ({}) doesn't match data columns ({})",
                headers.len(),
                data.len()
            ),
        ));
    }
    let n_rows = data.first().map_or(0, Vec::len);
    if let Some(col) = data.iter().position(|c| c.len() != n_rows) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Column '{}' has {} rows, expected {}",
                headers[col],
                data[col].len(),
                n_rows
            ),
        ));
    }

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", headers.join(","))?;
    for i in 0..n_rows {
        let row: Vec<String> = data.iter().map(|col| format!("{:.15e}", col[i])).collect();
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()
}

/// Membrane surface profile along the channel: position, bracketing concentrations,
/// flux and surface mass fraction per face.
pub fn write_membrane_profile<P: AsRef<Path>>(
    path: P,
    x_positions: &[f64],
    sweep: &MembraneSweep,
) -> io::Result<()> {
    if x_positions.len() != sweep.faces.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} positions for {} membrane faces",
                x_positions.len(),
                sweep.faces.len()
            ),
        ));
    }
    let column = |f: fn(&MembraneFaceState) -> f64| {
        sweep.faces.iter().map(f).collect::<Vec<f64>>()
    };
    write_csv(
        path,
        &["x", "c_a", "c_b", "flux", "c_m", "y_m"],
        &[
            x_positions.to_vec(),
            column(|s| s.c_a),
            column(|s| s.c_b),
            column(|s| s.flux),
            column(|s| s.c_m),
            column(|s| s.mass_fraction),
        ],
    )
}
