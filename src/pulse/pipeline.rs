use log::debug;

use crate::config::ProcessingConfig;
use crate::pulse::device::SampleBuffer;
use crate::pulse::error::PulseError;
use crate::pulse::series::{derive_series, DerivedSeries};
use crate::pulse::summary::{summarize, CaptureSummary};
use crate::pulse::trim::trim_idle;

/// Everything derived from one capture, handed to the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedCapture {
    /// Sample range `[start, end)` of the raw capture kept after trimming.
    pub trimmed_range: (usize, usize),
    pub raw_len: usize,
    pub series: DerivedSeries,
    pub summary: CaptureSummary,
}

/// Stateless post-processor: trim idle samples, then derive plot series and readouts.
#[derive(Clone, Debug)]
pub struct CaptureProcessor {
    config: ProcessingConfig,
}
impl CaptureProcessor {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }
    pub fn process(&self, buffer: &SampleBuffer) -> Result<ProcessedCapture, PulseError> {
        buffer.validate()?;
        let trimmed = trim_idle(
            &buffer.v1,
            &buffer.v2,
            self.config.idle_threshold_volts,
            self.config.idle_min_run,
        )?;
        let series = derive_series(
            &trimmed.v1,
            &trimmed.v2,
            buffer.sample_frequency_hz,
            self.config.series_resistance_ohms,
            &self.config.divisors(),
        )?;
        let summary = summarize(
            &trimmed.v1,
            &trimmed.v2,
            buffer.sample_frequency_hz,
            self.config.series_resistance_ohms,
        )?;
        debug!(
            "processed capture: kept {} of {} samples, peak {:.3} V",
            trimmed.len(),
            buffer.len(),
            summary.applied_amplitude_v
        );
        Ok(ProcessedCapture {
            trimmed_range: (trimmed.start, trimmed.end),
            raw_len: buffer.len(),
            series,
            summary,
        })
    }
}
