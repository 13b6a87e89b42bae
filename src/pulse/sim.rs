//! Simulated pulse setup: a voltage-controlled memristor in series with a known
//! resistor, observed by a level-triggered two-channel scope.
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::pulse::device::{PulseDevice, SampleBuffer};
use crate::pulse::error::{check_sample_frequency, PulseError};
use crate::pulse::series::check_series_resistance;
use crate::pulse::synth::PulseTrain;

pub struct SimulatedDevice {
    config: SimulationConfig,
    series_resistance_ohms: f64,
    /// Memristor state in `[0, 1]`; persists across captures.
    state: f64,
    rng: StdRng,
    armed: Option<(f64, f64)>,
    pending: Option<SampleBuffer>,
}
impl SimulatedDevice {
    pub fn new(config: SimulationConfig, series_resistance_ohms: f64) -> Result<Self, PulseError> {
        check_series_resistance(series_resistance_ohms)?;
        if config.r_on_ohms <= 0.0 || config.r_off_ohms < config.r_on_ohms {
            return Err(PulseError::invalid(
                "r_off_ohms",
                "memristor needs 0 < r_on <= r_off",
            ));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            state: config.initial_state.clamp(0.0, 1.0),
            config,
            series_resistance_ohms,
            armed: None,
            pending: None,
        })
    }
    pub fn state(&self) -> f64 {
        self.state
    }
    fn memristance(&self) -> f64 {
        self.config.r_off_ohms - self.state * (self.config.r_off_ohms - self.config.r_on_ohms)
    }
    /// Voltage the generator drives onto the circuit, sampled at the capture rate.
    fn drive_signal(train: &PulseTrain, sample_frequency_hz: f64, padding: usize) -> Vec<f64> {
        let active = (train.pulse_count as f64 * sample_frequency_hz / train.frequency_hz).round()
            as usize;
        let period_len = train.samples.len();
        let mut drive = vec![0.0; padding];
        drive.extend((0..active).map(|k| {
            let phase = (k as f64 / sample_frequency_hz * train.frequency_hz).fract();
            let index = ((phase * period_len as f64) as usize).min(period_len - 1);
            train.samples[index]
        }));
        drive.resize(drive.len() + padding, 0.0);
        drive
    }
    fn noise(&mut self) -> f64 {
        if self.config.noise_volts > 0.0 {
            self.rng
                .gen_range(-self.config.noise_volts..self.config.noise_volts)
        } else {
            0.0
        }
    }
}
impl PulseDevice for SimulatedDevice {
    fn arm_capture(
        &mut self,
        sample_frequency_hz: f64,
        trigger_level_v: f64,
    ) -> Result<(), PulseError> {
        check_sample_frequency(sample_frequency_hz)?;
        self.armed = Some((sample_frequency_hz, trigger_level_v));
        self.pending = None;
        Ok(())
    }
    fn start_pulse_train(&mut self, train: &PulseTrain) -> Result<(), PulseError> {
        let Some((sample_frequency_hz, trigger_level_v)) = self.armed.take() else {
            return Err(PulseError::Device("pulse train started before capture was armed".into()));
        };
        if train.samples.is_empty() || train.frequency_hz <= 0.0 {
            return Err(PulseError::Device("pulse train has no samples".into()));
        }
        let padding = self.config.idle_padding;
        let drive = Self::drive_signal(train, sample_frequency_hz, padding);
        let crossed = |v: f64| {
            if trigger_level_v >= 0.0 {
                v >= trigger_level_v
            } else {
                v <= trigger_level_v
            }
        };
        let trigger_index = drive.iter().position(|v| crossed(*v)).ok_or_else(|| {
            PulseError::Device(format!(
                "trigger level {trigger_level_v} V never reached by the pulse train"
            ))
        })?;
        let start = trigger_index.saturating_sub(padding);
        let dt = 1.0 / sample_frequency_hz;
        let mut v1 = Vec::with_capacity(drive.len() - start);
        let mut v2 = Vec::with_capacity(drive.len() - start);
        for applied in drive.iter().skip(start).copied() {
            let amps = applied / (self.series_resistance_ohms + self.memristance());
            let resistor_v = amps * self.series_resistance_ohms;
            let device_v = applied - resistor_v;
            let overdrive = device_v.abs() - self.config.switching_threshold_volts;
            if overdrive > 0.0 {
                self.state = (self.state + self.config.mobility * device_v.signum() * overdrive * dt)
                    .clamp(0.0, 1.0);
            }
            v1.push(applied + self.noise());
            v2.push(resistor_v + self.noise());
        }
        debug!(
            "simulated capture: {} samples from index {start}, memristor state now {:.3}",
            v1.len(),
            self.state
        );
        self.pending = Some(SampleBuffer {
            sample_frequency_hz,
            v1,
            v2,
        });
        Ok(())
    }
    fn read_capture(&mut self) -> Result<SampleBuffer, PulseError> {
        self.pending
            .take()
            .ok_or_else(|| PulseError::Device("no pulse train was dispatched".into()))
    }
}
