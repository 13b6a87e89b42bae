//! Scalar readouts shown next to the pulse charts.
//!
//! Energy is integrated with a rectangle rule over the capture timestep. The total
//! counts the memristor and the series resistor together ("M+R"); the memristor-only
//! figure uses the voltage drop `v1 - v2` across the device.
use crate::pulse::error::{check_equal_length, check_sample_frequency, PulseError};
use crate::pulse::series::check_series_resistance;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CaptureSummary {
    /// Signed `v1` sample with the largest magnitude, in volts.
    pub applied_amplitude_v: f64,
    /// Signed resistor current with the largest magnitude, in amps.
    pub peak_current_a: f64,
    pub energy_total_j: f64,
    pub energy_memristor_j: f64,
}
impl CaptureSummary {
    pub fn energy_total_nj(&self) -> f64 {
        self.energy_total_j * 1.0e9
    }
    pub fn energy_memristor_nj(&self) -> f64 {
        self.energy_memristor_j * 1.0e9
    }
}

fn peak_by_magnitude(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc: f64, v| if v.abs() > acc.abs() { v } else { acc })
}

pub fn summarize(
    v1: &[f64],
    v2: &[f64],
    sample_frequency_hz: f64,
    series_resistance_ohms: f64,
) -> Result<CaptureSummary, PulseError> {
    check_sample_frequency(sample_frequency_hz)?;
    check_series_resistance(series_resistance_ohms)?;
    check_equal_length(v1, v2)?;
    let dt = 1.0 / sample_frequency_hz;
    let mut energy_total_j = 0.0;
    let mut energy_memristor_j = 0.0;
    for (a, b) in v1.iter().zip(v2) {
        let amps = b / series_resistance_ohms;
        energy_total_j += a * amps * dt;
        energy_memristor_j += (a - b) * amps * dt;
    }
    Ok(CaptureSummary {
        applied_amplitude_v: peak_by_magnitude(v1.iter().copied()),
        peak_current_a: peak_by_magnitude(v2.iter().map(|b| b / series_resistance_ohms)),
        energy_total_j,
        energy_memristor_j,
    })
}
