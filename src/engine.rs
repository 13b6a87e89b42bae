// src/engine.rs
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::config::ExperimentConfig;
use crate::pulse::{
    preview, pulse_train, CaptureProcessor, ProcessedCapture, PulseDevice, PulseError,
    WaveformPreview, WaveformSpec,
};
use crate::types::*;

/// Owns the device and walks it through Idle -> Capturing -> Processing -> Idle.
pub struct Engine<D: PulseDevice> {
    device: D,
    config: ExperimentConfig,
    processor: CaptureProcessor,
    state: ExperimentState,
}

impl<D: PulseDevice> Engine<D> {
    pub fn new(device: D, config: ExperimentConfig) -> Self {
        let processor = CaptureProcessor::new(config.processing.clone());
        Self {
            device,
            config,
            processor,
            state: ExperimentState::Idle,
        }
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn preview(&self, spec: &WaveformSpec) -> Result<WaveformPreview, PulseError> {
        preview(
            spec,
            self.config.capture_frequency_hz(spec),
            self.config.processing.time_unit.divisor(),
        )
    }

    /// One capture cycle: arm the scope, play the pulse train, read back and process.
    ///
    /// `on_state` sees `Capturing` and then `Processing` as the cycle reaches them. The
    /// engine is back in `Idle` when this returns, whether or not it succeeded.
    pub fn run_cycle(
        &mut self,
        spec: &WaveformSpec,
        mut on_state: impl FnMut(ExperimentState),
    ) -> Result<ProcessedCapture, PulseError> {
        let result = self.capture_and_process(spec, &mut on_state);
        self.state = ExperimentState::Idle;
        result
    }

    fn enter(&mut self, state: ExperimentState, on_state: &mut impl FnMut(ExperimentState)) {
        self.state = state;
        on_state(state);
    }

    fn capture_and_process(
        &mut self,
        spec: &WaveformSpec,
        on_state: &mut impl FnMut(ExperimentState),
    ) -> Result<ProcessedCapture, PulseError> {
        spec.validate()?;
        self.enter(ExperimentState::Capturing, on_state);
        let sample_frequency_hz = self.config.capture_frequency_hz(spec);
        let trigger = self.config.trigger_level(spec);
        self.device.arm_capture(sample_frequency_hz, trigger)?;
        // give the scope time to arm before the first pulse
        if self.config.arm_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.arm_delay_ms));
        }
        let train = pulse_train(spec, sample_frequency_hz)?;
        self.device.start_pulse_train(&train)?;
        let buffer = self.device.read_capture()?;
        info!(
            "captured {} samples ({:.3} ms at {:.0} Hz, {} pulse(s))",
            buffer.len(),
            buffer.duration_seconds() * 1.0e3,
            buffer.sample_frequency_hz,
            spec.pulse_count
        );
        self.enter(ExperimentState::Processing, on_state);
        self.processor.process(&buffer)
    }
}

enum Control {
    Continue,
    Exit,
}

fn handle_command<D: PulseDevice>(
    engine: &mut Engine<D>,
    cmd: ExperimentCommand,
    tx: &Sender<ExperimentMessage>,
    rx_cmd: &Receiver<ExperimentCommand>,
) -> Control {
    match cmd {
        ExperimentCommand::Preview(spec) => match engine.preview(&spec) {
            Ok(p) => {
                tx.send(ExperimentMessage::Waveform(spec, p)).ok();
            }
            Err(e) => {
                tx.send(ExperimentMessage::Failed(e.to_string())).ok();
            }
        },
        ExperimentCommand::Start(spec) => {
            let result = engine.run_cycle(&spec, |state| {
                tx.send(ExperimentMessage::State(state)).ok();
            });
            // Commands that queued up during the cycle, in arrival order. A Stop discards
            // this result and any Start queued ahead of it.
            let mut publish = true;
            let mut control = Control::Continue;
            let mut deferred: Vec<ExperimentCommand> = Vec::new();
            loop {
                match rx_cmd.try_recv() {
                    Ok(ExperimentCommand::Stop) => {
                        publish = false;
                        deferred.retain(|c| !matches!(c, ExperimentCommand::Start(_)));
                    }
                    Ok(ExperimentCommand::Shutdown) => {
                        publish = false;
                        control = Control::Exit;
                        break;
                    }
                    Ok(other) => deferred.push(other),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        control = Control::Exit;
                        break;
                    }
                }
            }
            match result {
                Ok(_) if !publish => {
                    tx.send(ExperimentMessage::Log("🛑 Capture discarded".to_owned())).ok();
                }
                Ok(processed) => {
                    tx.send(ExperimentMessage::Capture(spec, Box::new(processed))).ok();
                }
                Err(e) => {
                    warn!("capture cycle failed: {e}");
                    tx.send(ExperimentMessage::Failed(e.to_string())).ok();
                }
            }
            tx.send(ExperimentMessage::State(ExperimentState::Idle)).ok();
            if let Control::Exit = control {
                return Control::Exit;
            }
            for cmd in deferred {
                if let Control::Exit = handle_command(engine, cmd, tx, rx_cmd) {
                    return Control::Exit;
                }
            }
            return Control::Continue;
        }
        ExperimentCommand::Stop => {
            // Cycles run to completion; nothing to stop while idle.
        }
        ExperimentCommand::Shutdown => return Control::Exit,
    }
    Control::Continue
}

/// Run the engine on a worker thread. It exits on `Shutdown` or when every command
/// sender has been dropped.
pub fn spawn_thread<D>(
    device: D,
    config: ExperimentConfig,
    tx: Sender<ExperimentMessage>,
    rx_cmd: Receiver<ExperimentCommand>,
) -> JoinHandle<()>
where
    D: PulseDevice + Send + 'static,
{
    thread::spawn(move || {
        let mut engine = Engine::new(device, config);
        tx.send(ExperimentMessage::Log("⚙️ Pulse engine ready.".to_owned())).ok();
        info!("pulse engine started");
        while let Ok(cmd) = rx_cmd.recv() {
            if let Control::Exit = handle_command(&mut engine, cmd, &tx, &rx_cmd) {
                break;
            }
        }
        info!("pulse engine stopped");
    })
}
