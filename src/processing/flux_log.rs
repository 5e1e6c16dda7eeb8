//! Append-only record of the cumulative permeate volume, one line per time step:
//!
//! ```text
//! 1.234560e-05, 3
//! ```
//!
//! Each record is written with a single `write_all` on a freshly opened append handle
//! and synced before the handle is dropped, so a crash can only lose the record being
//! written.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::{CroError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxRecord {
    pub cumulative_volume: f64,
    pub step_index: u64,
}

impl fmt::Display for FluxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            format_scientific(self.cumulative_volume),
            self.step_index
        )
    }
}

impl FromStr for FluxRecord {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (volume, step) = s
            .split_once(',')
            .ok_or_else(|| "expected '<volume>, <step>'".to_string())?;
        let cumulative_volume = volume
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("volume: {e}"))?;
        let step_index = step
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("step: {e}"))?;
        Ok(Self {
            cumulative_volume,
            step_index,
        })
    }
}

/// `%e` style: six decimals and an exponent with sign and at least two digits.
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{value:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // inf / NaN
        None => formatted,
    }
}

/// Shared sink for per-step records. Appends are serialized, so one sink can be used
/// from several partitions behind an `Arc`.
pub struct FluxLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FluxLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the sink for appending without writing anything.
    pub fn check_writable(&self) -> io::Result<()> {
        self.open().map(drop)
    }

    /// Discard previous records.
    pub fn truncate(&self) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        File::create(&self.path).map(drop)
    }

    pub fn append(&self, record: &FluxRecord) -> io::Result<()> {
        let line = format!("{record}\n");
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = self.open()?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_data()
    }

    pub fn read_records(&self) -> Result<Vec<FluxRecord>> {
        read_records(&self.path)
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<FluxRecord>> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<FluxRecord>()
                .map_err(|_| CroError::MalformedRecord {
                    line: i + 1,
                    content: line.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn c_style_exponent() {
        assert_eq!(format_scientific(1.23456e-5), "1.234560e-05");
        assert_eq!(format_scientific(0.0), "0.000000e+00");
        assert_eq!(format_scientific(2.5e12), "2.500000e+12");
        assert_eq!(format_scientific(1.0e-120), "1.000000e-120");
    }

    #[test]
    fn record_line_format() {
        let r = FluxRecord {
            cumulative_volume: 3.5e-7,
            step_index: 12,
        };
        assert_eq!(r.to_string(), "3.500000e-07, 12");
        assert_eq!("3.500000e-07, 12".parse::<FluxRecord>().unwrap(), r);
        assert!("3.5e-7".parse::<FluxRecord>().is_err());
    }

    #[test]
    fn appends_are_kept_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let log = FluxLog::new(dir.path().join("flux.txt"));
        for step in 1..=5u64 {
            log.append(&FluxRecord {
                cumulative_volume: step as f64 * 1e-6,
                step_index: step,
            })
            .unwrap();
        }
        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].step_index, 5);
        assert!((records[4].cumulative_volume - 5e-6).abs() < 1e-15);

        log.truncate().unwrap();
        assert!(log.read_records().unwrap().is_empty());
    }

    #[test]
    fn malformed_line_is_located() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flux.txt");
        fs::write(&path, "1.000000e-06, 1\ngarbage\n").unwrap();
        match read_records(&path) {
            Err(CroError::MalformedRecord { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "garbage");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(FluxLog::new(dir.path().join("flux.txt")));
        let handles: Vec<_> = (0..4u64)
            .map(|partition| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for step in 0..25u64 {
                        log.append(&FluxRecord {
                            cumulative_volume: (partition * 100 + step) as f64 * 1e-9,
                            step_index: step,
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.read_records().unwrap().len(), 100);
    }

    #[test]
    fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = FluxLog::new(dir.path().join("missing").join("flux.txt"));
        assert!(log.check_writable().is_err());
    }
}
