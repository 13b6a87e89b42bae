// src/types.rs
use crate::pulse::{ProcessedCapture, WaveformPreview, WaveformSpec};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ExperimentState {
    Idle,
    Capturing,
    Processing,
}

// front end -> engine
#[derive(Clone, Debug)]
pub enum ExperimentCommand {
    /// Waveform parameters changed while idle: redraw the preview.
    Preview(WaveformSpec),
    /// Run one capture cycle with this waveform.
    Start(WaveformSpec),
    Stop,
    Shutdown,
}

// engine -> front end
#[derive(Clone, Debug)]
pub enum ExperimentMessage {
    Log(String),
    State(ExperimentState),
    Waveform(WaveformSpec, WaveformPreview),
    Capture(WaveformSpec, Box<ProcessedCapture>),
    Failed(String),
}
