use log::debug;

use crate::pulse::error::{check_equal_length, check_sample_frequency, PulseError};

/// Unit scale factors applied to the derived series (1e3 turns seconds into ms).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitDivisors {
    pub time: f64,
    pub current: f64,
    pub conductance: f64,
}
impl Default for UnitDivisors {
    fn default() -> Self {
        Self {
            time: 1.0,
            current: 1.0,
            conductance: 1.0,
        }
    }
}

/// Index-aligned series ready for the V-t, I-V and G-V charts.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedSeries {
    pub time: Vec<f64>,
    pub v1: Vec<f64>,
    pub v2: Vec<f64>,
    pub current: Vec<f64>,
    pub conductance: Vec<f64>,
    /// Samples whose raw conductance came out negative or non-finite and was floored to 0.
    pub clamped_conductance: usize,
}
impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

pub(crate) fn check_series_resistance(series_resistance_ohms: f64) -> Result<(), PulseError> {
    if !series_resistance_ohms.is_finite() || series_resistance_ohms == 0.0 {
        return Err(PulseError::invalid(
            "series_resistance_ohms",
            format!("must be finite and non-zero, got {series_resistance_ohms}"),
        ));
    }
    Ok(())
}

/// Derive time, current and conductance from trimmed channel voltages.
///
/// `v1` is the voltage applied across memristor and series resistor, `v2` the
/// voltage over the series resistor alone. Conductance is the resistor current over
/// the memristor voltage `v1 - v2`; where that ratio is negative or not finite
/// (`v1 ≈ v2`) it is floored to zero and counted in `clamped_conductance`.
pub fn derive_series(
    v1: &[f64],
    v2: &[f64],
    sample_frequency_hz: f64,
    series_resistance_ohms: f64,
    units: &UnitDivisors,
) -> Result<DerivedSeries, PulseError> {
    check_sample_frequency(sample_frequency_hz)?;
    check_series_resistance(series_resistance_ohms)?;
    check_equal_length(v1, v2)?;
    let time_step = 1.0 / sample_frequency_hz * units.time;
    let time = (0..v1.len()).map(|i| i as f64 * time_step).collect();
    let current = v2
        .iter()
        .map(|v| v / series_resistance_ohms * units.current)
        .collect();
    let mut clamped_conductance = 0;
    let conductance = v1
        .iter()
        .zip(v2)
        .map(|(a, b)| {
            let amps = b / series_resistance_ohms;
            let g = amps / (a - b) * units.conductance;
            if g.is_finite() && g >= 0.0 {
                g
            } else {
                clamped_conductance += 1;
                0.0
            }
        })
        .collect();
    if clamped_conductance > 0 {
        debug!(
            "floored {clamped_conductance} of {} conductance samples to zero",
            v1.len()
        );
    }
    Ok(DerivedSeries {
        time,
        v1: v1.to_vec(),
        v2: v2.to_vec(),
        current,
        conductance,
        clamped_conductance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b)
                .all(|(x, y)| (x - y).abs() <= 1e-9 * y.abs().max(1.0))
    }
    #[test]
    fn reference_values() {
        let series = derive_series(
            &[1.0, 2.0],
            &[0.5, 1.0],
            1_000.0,
            100.0,
            &UnitDivisors::default(),
        )
        .unwrap();
        assert!(close(&series.time, &[0.0, 0.001]));
        assert!(close(&series.current, &[0.005, 0.01]));
        assert!(close(&series.conductance, &[0.01, 0.01]));
        assert_eq!(series.v1, vec![1.0, 2.0]);
        assert_eq!(series.v2, vec![0.5, 1.0]);
        assert_eq!(series.clamped_conductance, 0);
    }
    #[test]
    fn divisors_scale_each_series() {
        let units = UnitDivisors {
            time: 1.0e3,
            current: 1.0e6,
            conductance: 1.0e3,
        };
        let series = derive_series(&[1.0, 2.0], &[0.5, 1.0], 1_000.0, 100.0, &units).unwrap();
        assert!(close(&series.time, &[0.0, 1.0]));
        assert!(close(&series.current, &[5_000.0, 10_000.0]));
        assert!(close(&series.conductance, &[10.0, 10.0]));
    }
    #[test]
    fn conductance_is_never_negative() {
        let v1 = [1.0, 0.2, -0.5, 0.3, 0.0, 0.4, -1.0];
        let v2 = [0.5, 0.4, -0.1, 0.3, 0.0, -0.2, -0.5];
        let series = derive_series(&v1, &v2, 10_000.0, 1_000.0, &UnitDivisors::default()).unwrap();
        assert_eq!(series.len(), v1.len());
        assert!(series.conductance.iter().all(|g| *g >= 0.0));
        // v1 < v2, v1 == v2 (inf), 0/0 (NaN), and v2 < 0 with v1 > v2
        assert_eq!(series.clamped_conductance, 4);
        assert_eq!(series.conductance[1], 0.0);
        assert_eq!(series.conductance[5], 0.0);
        assert!(series.conductance[0] > 0.0);
        assert!(series.conductance[2] > 0.0);
        assert!(series.conductance[6] > 0.0);
    }
    #[test]
    fn clamping_never_raises() {
        let v = [0.25; 16];
        let series = derive_series(&v, &v, 1_000.0, 50.0, &UnitDivisors::default()).unwrap();
        assert!(series.conductance.iter().all(|g| *g == 0.0));
        assert_eq!(series.clamped_conductance, 16);
    }
    #[test]
    fn empty_input_gives_empty_series() {
        let series = derive_series(&[], &[], 1_000.0, 100.0, &UnitDivisors::default()).unwrap();
        assert!(series.is_empty());
        assert!(series.conductance.is_empty());
    }
    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = derive_series(&[1.0, 2.0], &[0.5], 1_000.0, 100.0, &UnitDivisors::default())
            .unwrap_err();
        assert!(matches!(err, PulseError::LengthMismatch { v1: 2, v2: 1 }));
    }
    #[test]
    fn non_physical_parameters_are_rejected() {
        let units = UnitDivisors::default();
        assert!(matches!(
            derive_series(&[1.0], &[0.5], 1_000.0, 0.0, &units),
            Err(PulseError::InvalidArgument { name: "series_resistance_ohms", .. })
        ));
        assert!(matches!(
            derive_series(&[1.0], &[0.5], 0.0, 100.0, &units),
            Err(PulseError::InvalidArgument { name: "sample_frequency_hz", .. })
        ));
        assert!(derive_series(&[1.0], &[0.5], -1.0, 100.0, &units).is_err());
    }
}
