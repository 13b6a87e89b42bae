// src/pulse/mod.rs
pub mod device;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod series;
pub mod sim;
pub mod summary;
pub mod synth;
pub mod trim;
pub use device::{ManualDevice, PulseDevice, SampleBuffer};
pub use error::PulseError;
pub use pipeline::{CaptureProcessor, ProcessedCapture};
pub use plot::{render_capture_png, render_gv_png, render_iv_png, render_waveform_png, PlotStyle};
pub use series::{derive_series, DerivedSeries, UnitDivisors};
pub use sim::SimulatedDevice;
pub use summary::{summarize, CaptureSummary};
pub use synth::{generate, preview, pulse_train, PulseTrain, WaveformPreview, WaveformShape, WaveformSpec};
pub use trim::{trim_idle, TrimmedCapture};
