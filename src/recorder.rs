use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::config::ProcessingConfig;
use crate::pulse::{DerivedSeries, PulseError};

/// Writes derived capture series to timestamped CSV files in one directory.
pub struct CaptureRecorder {
    dir: PathBuf,
}

impl CaptureRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PulseError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name carries the label and a timestamp so repeated runs don't collide.
    pub fn record(
        &self,
        label: &str,
        series: &DerivedSeries,
        config: &ProcessingConfig,
    ) -> Result<PathBuf, PulseError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.dir.join(format!("capture_{label}_{timestamp}.csv"));
        let mut w = BufWriter::new(File::create(&path)?);
        write_series_csv(&mut w, series, config)?;
        w.flush()?;
        info!("💾 wrote {} samples to {}", series.len(), path.display());
        Ok(path)
    }
}

/// Header names each column with its display unit.
pub fn write_series_csv(
    w: &mut impl Write,
    series: &DerivedSeries,
    config: &ProcessingConfig,
) -> Result<(), PulseError> {
    writeln!(
        w,
        "time[{}],v1[V],v2[V],current[{}],conductance[{}]",
        config.time_unit.label(),
        config.current_unit.label(),
        config.conductance_unit.label()
    )?;
    for i in 0..series.len() {
        writeln!(
            w,
            "{},{},{},{},{}",
            series.time[i], series.v1[i], series.v2[i], series.current[i], series.conductance[i]
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConductanceUnit, CurrentUnit, TimeUnit};
    use crate::pulse::{derive_series, UnitDivisors};

    #[test]
    fn csv_has_unit_header_and_one_row_per_sample() {
        let config = ProcessingConfig {
            time_unit: TimeUnit::Seconds,
            current_unit: CurrentUnit::Amps,
            conductance_unit: ConductanceUnit::Siemens,
            ..ProcessingConfig::default()
        };
        let series =
            derive_series(&[1.0, 2.0], &[0.5, 1.0], 1_000.0, 100.0, &UnitDivisors::default())
                .unwrap();
        let mut out = Vec::new();
        write_series_csv(&mut out, &series, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time[s],v1[V],v2[V],current[A],conductance[S]");
        assert_eq!(lines[1], "0,1,0.5,0.005,0.01");
    }

    #[test]
    fn recorder_creates_directory_and_file() {
        let dir = std::env::temp_dir().join(format!("memristor-pulse-rec-{}", std::process::id()));
        let recorder = CaptureRecorder::new(&dir).unwrap();
        let series = derive_series(&[1.0], &[0.5], 1_000.0, 100.0, &UnitDivisors::default())
            .unwrap();
        let path = recorder
            .record("dc", &series, &ProcessingConfig::default())
            .unwrap();
        assert!(path.starts_with(recorder.dir()));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
        fs::remove_dir_all(&dir).ok();
    }
}
