use std::collections::VecDeque;

use crate::pulse::error::{check_equal_length, check_sample_frequency, PulseError};
use crate::pulse::synth::PulseTrain;

/// Raw dual-channel capture on a shared timebase.
///
/// `v1` is the applied voltage (scope channel 1), `v2` the voltage over the series
/// resistor (scope channel 2).
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    pub sample_frequency_hz: f64,
    pub v1: Vec<f64>,
    pub v2: Vec<f64>,
}
impl SampleBuffer {
    pub fn validate(&self) -> Result<(), PulseError> {
        check_sample_frequency(self.sample_frequency_hz)?;
        check_equal_length(&self.v1, &self.v2)
    }
    pub fn len(&self) -> usize {
        self.v1.len()
    }
    pub fn is_empty(&self) -> bool {
        self.v1.is_empty()
    }
    pub fn duration_seconds(&self) -> f64 {
        self.v1.len() as f64 / self.sample_frequency_hz
    }
}

/// Instrument that plays a pulse train on its waveform generator and records both
/// scope channels.
pub trait PulseDevice {
    /// Arm a level-triggered capture of both scope channels.
    fn arm_capture(&mut self, sample_frequency_hz: f64, trigger_level_v: f64)
        -> Result<(), PulseError>;
    fn start_pulse_train(&mut self, train: &PulseTrain) -> Result<(), PulseError>;
    /// Block until the armed capture completes and return its samples.
    fn read_capture(&mut self) -> Result<SampleBuffer, PulseError>;
}

/// Replays queued captures; useful for tests and offline reprocessing.
#[derive(Default)]
pub struct ManualDevice {
    queue: VecDeque<SampleBuffer>,
    armed: Option<(f64, f64)>,
    dispatched: Vec<PulseTrain>,
}
impl ManualDevice {
    pub fn new(captures: impl IntoIterator<Item = SampleBuffer>) -> Self {
        Self {
            queue: captures.into_iter().collect(),
            ..Self::default()
        }
    }
    /// Sample frequency and trigger level of the last arm request.
    pub fn armed(&self) -> Option<(f64, f64)> {
        self.armed
    }
    pub fn dispatched(&self) -> &[PulseTrain] {
        &self.dispatched
    }
}
impl PulseDevice for ManualDevice {
    fn arm_capture(
        &mut self,
        sample_frequency_hz: f64,
        trigger_level_v: f64,
    ) -> Result<(), PulseError> {
        self.armed = Some((sample_frequency_hz, trigger_level_v));
        Ok(())
    }
    fn start_pulse_train(&mut self, train: &PulseTrain) -> Result<(), PulseError> {
        if self.armed.is_none() {
            return Err(PulseError::Device("pulse train started before capture was armed".into()));
        }
        self.dispatched.push(train.clone());
        Ok(())
    }
    fn read_capture(&mut self) -> Result<SampleBuffer, PulseError> {
        self.armed = None;
        self.queue
            .pop_front()
            .ok_or_else(|| PulseError::Device("no capture queued".into()))
    }
}
