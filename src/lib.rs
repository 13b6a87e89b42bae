//! Pulse waveform synthesis and capture post-processing for memristor experiments.
//!
//! The [`pulse`] module holds the pure transforms (waveform synthesis, idle trimming,
//! current/conductance derivation, energy readouts) plus the device seam. [`engine`]
//! drives a [`pulse::PulseDevice`] through capture cycles on a worker thread.
pub mod config;
pub mod engine;
pub mod pulse;
pub mod recorder;
pub mod types;
