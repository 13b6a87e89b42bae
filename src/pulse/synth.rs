//! Discretised pulse waveforms for the arbitrary waveform generator.
//!
//! One period of the pulse is synthesised at the capture sample rate; the device
//! repeats it `pulse_count` times at `1 / period` Hz.
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::pulse::error::{check_sample_frequency, PulseError};

/// Largest single period the generator buffer is allowed to hold.
pub const MAX_PERIOD_SAMPLES: usize = 1 << 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformShape {
    Sine,
    Triangle,
    Square,
}
impl WaveformShape {
    /// Normalised value in `[-1, 1]` at `phase` in `[0, 1)`.
    fn unit_value(self, phase: f64) -> f64 {
        match self {
            WaveformShape::Sine => (2.0 * PI * phase).sin(),
            WaveformShape::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            WaveformShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// User parameters for one pulse experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformSpec {
    pub shape: WaveformShape,
    /// Peak amplitude in volts.
    pub amplitude: f64,
    pub offset_voltage: f64,
    pub period_us: u32,
    pub pulse_count: u32,
}
impl Default for WaveformSpec {
    fn default() -> Self {
        Self {
            shape: WaveformShape::Triangle,
            amplitude: 0.8,
            offset_voltage: 0.0,
            period_us: 1_000,
            pulse_count: 1,
        }
    }
}
impl WaveformSpec {
    pub fn validate(&self) -> Result<(), PulseError> {
        if self.period_us == 0 {
            return Err(PulseError::invalid("period_us", "must be greater than zero"));
        }
        if self.pulse_count == 0 {
            return Err(PulseError::invalid("pulse_count", "must be at least one"));
        }
        if !self.amplitude.is_finite() {
            return Err(PulseError::invalid("amplitude", "must be finite"));
        }
        if !self.offset_voltage.is_finite() {
            return Err(PulseError::invalid("offset_voltage", "must be finite"));
        }
        Ok(())
    }
    pub fn frequency_hz(&self) -> f64 {
        1.0e6 / self.period_us as f64
    }
    pub fn period_seconds(&self) -> f64 {
        self.period_us as f64 / 1.0e6
    }
    /// Number of samples in one period at `sample_frequency_hz`, rounded to nearest.
    ///
    /// Fails when the period rounds to zero samples or exceeds [`MAX_PERIOD_SAMPLES`].
    pub fn samples_per_period(&self, sample_frequency_hz: f64) -> Result<usize, PulseError> {
        let count = (sample_frequency_hz * self.period_seconds()).round();
        if count < 1.0 {
            return Err(PulseError::invalid(
                "period_us",
                format!(
                    "a {} µs period is shorter than one sample at {sample_frequency_hz} Hz",
                    self.period_us
                ),
            ));
        }
        if !count.is_finite() || count > MAX_PERIOD_SAMPLES as f64 {
            return Err(PulseError::invalid(
                "sample_frequency_hz",
                format!(
                    "{count} samples per period exceeds the {MAX_PERIOD_SAMPLES} sample limit"
                ),
            ));
        }
        Ok(count as usize)
    }
}

/// A synthesised period plus the repetition parameters the generator needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseTrain {
    pub samples: Vec<f64>,
    pub frequency_hz: f64,
    pub pulse_count: u32,
}

/// One period of the waveform against time, for the idle-state preview chart.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformPreview {
    pub time: Vec<f64>,
    pub amplitude: Vec<f64>,
}

/// Generate one period of `spec` sampled at `sample_frequency_hz`.
///
/// The result is a pure function of the inputs; repeated calls yield bit-identical
/// sequences.
pub fn generate(spec: &WaveformSpec, sample_frequency_hz: f64) -> Result<Vec<f64>, PulseError> {
    check_sample_frequency(sample_frequency_hz)?;
    spec.validate()?;
    let len = spec.samples_per_period(sample_frequency_hz)?;
    let samples = (0..len)
        .map(|i| {
            let phase = i as f64 / len as f64;
            spec.shape.unit_value(phase) * spec.amplitude + spec.offset_voltage
        })
        .collect();
    Ok(samples)
}

pub fn pulse_train(spec: &WaveformSpec, sample_frequency_hz: f64) -> Result<PulseTrain, PulseError> {
    let samples = generate(spec, sample_frequency_hz)?;
    Ok(PulseTrain {
        samples,
        frequency_hz: spec.frequency_hz(),
        pulse_count: spec.pulse_count,
    })
}

/// Waveform preview with time scaled by `time_divisor` (1e3 for milliseconds).
pub fn preview(
    spec: &WaveformSpec,
    sample_frequency_hz: f64,
    time_divisor: f64,
) -> Result<WaveformPreview, PulseError> {
    let amplitude = generate(spec, sample_frequency_hz)?;
    let step = time_divisor / sample_frequency_hz;
    let time = (0..amplitude.len()).map(|i| i as f64 * step).collect();
    Ok(WaveformPreview { time, amplitude })
}
