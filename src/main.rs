// src/main.rs
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use memristor_pulse::config::ExperimentConfig;
use memristor_pulse::engine;
use memristor_pulse::pulse::{
    render_capture_png, render_gv_png, render_iv_png, render_waveform_png, PlotStyle,
    ProcessedCapture, PulseError, SimulatedDevice, WaveformSpec,
};
use memristor_pulse::recorder::CaptureRecorder;
use memristor_pulse::types::{ExperimentCommand, ExperimentMessage};

fn write_png(dir: &Path, name: &str, png: Result<Vec<u8>, PulseError>) -> Result<()> {
    match png {
        Ok(bytes) => {
            let path = dir.join(name);
            fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
            info!("🖼 {}", path.display());
        }
        Err(e) => warn!("skipping {name}: {e}"),
    }
    Ok(())
}

fn report(config: &ExperimentConfig, spec: &WaveformSpec, capture: &ProcessedCapture) -> Result<()> {
    let processing = &config.processing;
    let summary = &capture.summary;
    let current = summary.peak_current_a * processing.current_unit.divisor();
    info!("Applied Amplitude [V]: {:.3}", summary.applied_amplitude_v);
    info!("Current [{}]: {:.3}", processing.current_unit.label(), current);
    info!("Energy M+R [nJ]: {:.3}", summary.energy_total_nj());
    info!("Energy M [nJ]: {:.3}", summary.energy_memristor_nj());
    if capture.series.clamped_conductance > 0 {
        info!(
            "{} of {} conductance samples floored to zero",
            capture.series.clamped_conductance,
            capture.series.len()
        );
    }
    let recorder = CaptureRecorder::new(&config.output_dir)?;
    recorder.record("pulse", &capture.series, processing)?;
    let style = PlotStyle::default();
    let dir = recorder.dir();
    let series = &capture.series;
    write_png(dir, "capture.png", render_capture_png(series, spec, processing, &style))?;
    write_png(dir, "iv.png", render_iv_png(series, spec, processing, &style))?;
    write_png(dir, "gv.png", render_gv_png(series, spec, processing, &style))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => ExperimentConfig::load(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => ExperimentConfig::default(),
    };
    let device = SimulatedDevice::new(
        config.simulation.clone(),
        config.processing.series_resistance_ohms,
    )?;
    let spec = config.waveform.clone();

    let (tx, rx) = mpsc::channel();
    let (tx_cmd, rx_cmd) = mpsc::channel();
    let handle = engine::spawn_thread(device, config.clone(), tx, rx_cmd);
    tx_cmd.send(ExperimentCommand::Preview(spec.clone()))?;
    tx_cmd.send(ExperimentCommand::Start(spec))?;

    loop {
        let msg = rx
            .recv_timeout(Duration::from_secs(30))
            .context("pulse engine stopped responding")?;
        match msg {
            ExperimentMessage::Log(line) => info!("{line}"),
            ExperimentMessage::State(state) => info!("state: {state:?}"),
            ExperimentMessage::Waveform(spec, preview) => {
                fs::create_dir_all(&config.output_dir)?;
                let png = render_waveform_png(
                    &preview,
                    &spec,
                    &config.processing,
                    &PlotStyle::default(),
                );
                write_png(&config.output_dir, "waveform.png", png)?;
            }
            ExperimentMessage::Capture(spec, capture) => {
                report(&config, &spec, &capture)?;
                break;
            }
            ExperimentMessage::Failed(reason) => {
                tx_cmd.send(ExperimentCommand::Shutdown).ok();
                return Err(anyhow!("capture failed: {reason}"));
            }
        }
    }
    tx_cmd.send(ExperimentCommand::Shutdown)?;
    handle
        .join()
        .map_err(|_| anyhow!("pulse engine thread panicked"))?;
    Ok(())
}
