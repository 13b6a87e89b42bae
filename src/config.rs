use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pulse::{PulseError, UnitDivisors, WaveformSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
}
impl TimeUnit {
    pub fn divisor(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1.0e3,
            TimeUnit::Microseconds => 1.0e6,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "µs",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentUnit {
    Amps,
    Milliamps,
    Microamps,
    Nanoamps,
}
impl CurrentUnit {
    pub fn divisor(self) -> f64 {
        match self {
            CurrentUnit::Amps => 1.0,
            CurrentUnit::Milliamps => 1.0e3,
            CurrentUnit::Microamps => 1.0e6,
            CurrentUnit::Nanoamps => 1.0e9,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            CurrentUnit::Amps => "A",
            CurrentUnit::Milliamps => "mA",
            CurrentUnit::Microamps => "µA",
            CurrentUnit::Nanoamps => "nA",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConductanceUnit {
    Siemens,
    Millisiemens,
    Microsiemens,
}
impl ConductanceUnit {
    pub fn divisor(self) -> f64 {
        match self {
            ConductanceUnit::Siemens => 1.0,
            ConductanceUnit::Millisiemens => 1.0e3,
            ConductanceUnit::Microsiemens => 1.0e6,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            ConductanceUnit::Siemens => "S",
            ConductanceUnit::Millisiemens => "mS",
            ConductanceUnit::Microsiemens => "µS",
        }
    }
}

/// Everything the post-processor needs to turn a raw capture into plot series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub series_resistance_ohms: f64,
    /// Samples with both channels below this magnitude count as idle.
    pub idle_threshold_volts: f64,
    /// Shortest idle run at either end that gets trimmed.
    pub idle_min_run: usize,
    pub time_unit: TimeUnit,
    pub current_unit: CurrentUnit,
    pub conductance_unit: ConductanceUnit,
}
impl ProcessingConfig {
    pub fn divisors(&self) -> UnitDivisors {
        UnitDivisors {
            time: self.time_unit.divisor(),
            current: self.current_unit.divisor(),
            conductance: self.conductance_unit.divisor(),
        }
    }
}
impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            series_resistance_ohms: 5_000.0,
            idle_threshold_volts: 0.02,
            idle_min_run: 10,
            time_unit: TimeUnit::Milliseconds,
            current_unit: CurrentUnit::Microamps,
            conductance_unit: ConductanceUnit::Millisiemens,
        }
    }
}

/// Parameters of the simulated memristor circuit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub r_on_ohms: f64,
    pub r_off_ohms: f64,
    /// Initial memristor state in `[0, 1]`; 1 is fully on.
    pub initial_state: f64,
    /// State change per volt-second above the switching threshold.
    pub mobility: f64,
    pub switching_threshold_volts: f64,
    pub noise_volts: f64,
    /// Idle samples recorded before and after the pulse train.
    pub idle_padding: usize,
}
impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            r_on_ohms: 2_000.0,
            r_off_ohms: 50_000.0,
            initial_state: 0.2,
            mobility: 400.0,
            switching_threshold_volts: 0.2,
            noise_volts: 0.002,
            idle_padding: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub waveform: WaveformSpec,
    pub processing: ProcessingConfig,
    /// Capture rate as a multiple of the pulse frequency.
    pub sample_frequency_multiplier: f64,
    /// Level-trigger magnitude; its sign follows the waveform amplitude.
    pub trigger_level_volts: f64,
    pub arm_delay_ms: u64,
    pub output_dir: PathBuf,
    pub simulation: SimulationConfig,
}
impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PulseError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    pub fn from_json(text: &str) -> Result<Self, PulseError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), PulseError> {
        self.waveform.validate()?;
        if !self.sample_frequency_multiplier.is_finite() || self.sample_frequency_multiplier <= 0.0
        {
            return Err(PulseError::invalid(
                "sample_frequency_multiplier",
                "must be greater than zero",
            ));
        }
        let resistance = self.processing.series_resistance_ohms;
        if !resistance.is_finite() || resistance == 0.0 {
            return Err(PulseError::invalid(
                "series_resistance_ohms",
                "must be finite and non-zero",
            ));
        }
        Ok(())
    }
    /// Capture sample rate for the configured pulse frequency.
    pub fn capture_frequency_hz(&self, spec: &WaveformSpec) -> f64 {
        spec.frequency_hz() * self.sample_frequency_multiplier
    }
    /// Trigger level pointing the same way as the pulse. Zero amplitude triggers on the falling side.
    pub fn trigger_level(&self, spec: &WaveformSpec) -> f64 {
        let sign = if spec.amplitude > 0.0 { 1.0 } else { -1.0 };
        self.trigger_level_volts.abs() * sign
    }
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            waveform: WaveformSpec::default(),
            processing: ProcessingConfig::default(),
            sample_frequency_multiplier: 200.0,
            trigger_level_volts: 0.02,
            arm_delay_ms: 20,
            output_dir: PathBuf::from("capture-output"),
            simulation: SimulationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::WaveformShape;
    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = ExperimentConfig::from_json(
            r#"{ "processing": { "series_resistance_ohms": 100.0, "current_unit": "milliamps" } }"#,
        )
        .unwrap();
        assert_eq!(config.processing.series_resistance_ohms, 100.0);
        assert_eq!(config.processing.current_unit, CurrentUnit::Milliamps);
        assert_eq!(config.processing.idle_min_run, 10);
        assert_eq!(config.sample_frequency_multiplier, 200.0);
        assert_eq!(config.waveform.shape, WaveformShape::Triangle);
    }
    #[test]
    fn partial_waveform_keeps_remaining_defaults() {
        let config = ExperimentConfig::from_json(
            r#"{ "waveform": { "shape": "sine", "pulse_count": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.waveform.shape, WaveformShape::Sine);
        assert_eq!(config.waveform.pulse_count, 5);
        assert_eq!(config.waveform.period_us, 1_000);
    }
    #[test]
    fn zero_period_is_rejected() {
        let err = ExperimentConfig::from_json(r#"{ "waveform": { "period_us": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            PulseError::InvalidArgument {
                name: "period_us",
                ..
            }
        ));
    }
    #[test]
    fn bundled_demo_config_parses() {
        let config =
            ExperimentConfig::from_json(include_str!("../demos/pulse-experiment.json")).unwrap();
        assert_eq!(config.waveform.shape, WaveformShape::Square);
        assert_eq!(config.processing.time_unit, TimeUnit::Microseconds);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.idle_padding, 64);
    }
    #[test]
    fn zero_resistance_is_rejected() {
        let err = ExperimentConfig::from_json(
            r#"{ "processing": { "series_resistance_ohms": 0.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PulseError::InvalidArgument {
                name: "series_resistance_ohms",
                ..
            }
        ));
    }
    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ExperimentConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PulseError::Config(_)));
    }
    #[test]
    fn trigger_follows_amplitude_sign() {
        let config = ExperimentConfig::default();
        let mut spec = config.waveform.clone();
        spec.amplitude = 1.5;
        assert_eq!(config.trigger_level(&spec), 0.02);
        spec.amplitude = -0.4;
        assert_eq!(config.trigger_level(&spec), -0.02);
        spec.amplitude = 0.0;
        assert_eq!(config.trigger_level(&spec), -0.02);
    }
    #[test]
    fn capture_frequency_scales_pulse_frequency() {
        let config = ExperimentConfig::default();
        // 1000 µs period -> 1 kHz pulses -> 200 kHz capture
        assert!((config.capture_frequency_hz(&config.waveform) - 200_000.0).abs() < 1e-6);
    }
    #[test]
    fn divisors_follow_units() {
        let divisors = ProcessingConfig::default().divisors();
        assert_eq!(divisors.time, 1.0e3);
        assert_eq!(divisors.current, 1.0e6);
        assert_eq!(divisors.conductance, 1.0e3);
    }
}
