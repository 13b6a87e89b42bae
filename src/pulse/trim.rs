use log::debug;

use crate::pulse::error::{check_equal_length, PulseError};

/// Contiguous sub-range `[start, end)` cut identically from both channels.
#[derive(Clone, Debug, PartialEq)]
pub struct TrimmedCapture {
    pub start: usize,
    pub end: usize,
    pub v1: Vec<f64>,
    pub v2: Vec<f64>,
}
impl TrimmedCapture {
    pub fn len(&self) -> usize {
        self.v1.len()
    }
    pub fn is_empty(&self) -> bool {
        self.v1.is_empty()
    }
}

/// Remove idle runs from both ends of a dual-channel capture.
///
/// A sample is idle when both `|v1[i]|` and `|v2[i]|` are below `threshold`. An idle
/// run at either end is removed only when it spans at least `min_run_length` samples,
/// so a short noise dip right at the edge is kept. A capture that is idle
/// everywhere trims down to an empty pair.
pub fn trim_idle(
    v1: &[f64],
    v2: &[f64],
    threshold: f64,
    min_run_length: usize,
) -> Result<TrimmedCapture, PulseError> {
    check_equal_length(v1, v2)?;
    if threshold.is_nan() || threshold < 0.0 {
        return Err(PulseError::invalid(
            "threshold",
            format!("must be a non-negative voltage, got {threshold}"),
        ));
    }
    let is_idle = |i: usize| v1[i].abs() < threshold && v2[i].abs() < threshold;
    let len = v1.len();
    let Some(first_active) = (0..len).find(|&i| !is_idle(i)) else {
        debug!("capture of {len} samples is idle throughout");
        return Ok(TrimmedCapture {
            start: 0,
            end: 0,
            v1: Vec::new(),
            v2: Vec::new(),
        });
    };
    // `first_active` exists, so a last active sample does too.
    let last_active = (0..len).rev().find(|&i| !is_idle(i)).unwrap_or(first_active);
    let start = if first_active >= min_run_length {
        first_active
    } else {
        0
    };
    let trailing_run = len - 1 - last_active;
    let end = if trailing_run >= min_run_length {
        last_active + 1
    } else {
        len
    };
    debug!(
        "trimmed capture to [{start}, {end}) of {len} samples (leading idle {first_active}, trailing idle {trailing_run})"
    );
    Ok(TrimmedCapture {
        start,
        end,
        v1: v1[start..end].to_vec(),
        v2: v2[start..end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn all_zero_capture_trims_to_empty() {
        let zeros = vec![0.0; 64];
        let trimmed = trim_idle(&zeros, &zeros, 0.02, 10).unwrap();
        assert!(trimmed.is_empty());
        assert!(trimmed.v2.is_empty());
    }
    #[test]
    fn empty_capture_is_not_an_error() {
        let trimmed = trim_idle(&[], &[], 0.02, 10).unwrap();
        assert!(trimmed.is_empty());
    }
    #[test]
    fn idle_shorter_than_run_length_is_still_empty_when_everything_is_idle() {
        let quiet = [0.001, -0.003, 0.0];
        let trimmed = trim_idle(&quiet, &quiet, 0.02, 10).unwrap();
        assert!(trimmed.is_empty());
    }
    #[test]
    fn keeps_active_middle_region() {
        let mut v1 = vec![0.0; 40];
        let mut v2 = vec![0.0; 40];
        for i in 15..25 {
            v1[i] = 0.5;
            v2[i] = 0.1;
        }
        let trimmed = trim_idle(&v1, &v2, 0.02, 10).unwrap();
        assert_eq!((trimmed.start, trimmed.end), (15, 25));
        assert_eq!(trimmed.v1, vec![0.5; 10]);
        assert_eq!(trimmed.v2, vec![0.1; 10]);
    }
    #[test]
    fn short_idle_runs_are_kept() {
        let mut v1 = vec![0.0; 30];
        let v2 = vec![0.0; 30];
        // 5 idle samples in front, 20 active, 5 idle at the back
        for sample in v1.iter_mut().take(25).skip(5) {
            *sample = -0.3;
        }
        let trimmed = trim_idle(&v1, &v2, 0.02, 10).unwrap();
        assert_eq!((trimmed.start, trimmed.end), (0, 30));
        let trimmed = trim_idle(&v1, &v2, 0.02, 5).unwrap();
        assert_eq!((trimmed.start, trimmed.end), (5, 25));
    }
    #[test]
    fn either_channel_keeps_a_sample_active() {
        let v1 = [0.0, 0.0, 0.0, 0.0, 0.0];
        let v2 = [0.0, 0.0, 0.05, 0.0, 0.0];
        let trimmed = trim_idle(&v1, &v2, 0.02, 2).unwrap();
        assert_eq!((trimmed.start, trimmed.end), (2, 3));
        assert_eq!(trimmed.v1, vec![0.0]);
        assert_eq!(trimmed.v2, vec![0.05]);
    }
    #[test]
    fn ends_are_trimmed_independently() {
        let v1 = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let trimmed = trim_idle(&v1, &v1, 0.02, 3).unwrap();
        assert_eq!((trimmed.start, trimmed.end), (3, 6));
    }
    #[test]
    fn mismatched_channels_are_rejected() {
        let err = trim_idle(&[1.0, 2.0], &[1.0], 0.02, 10).unwrap_err();
        assert!(matches!(err, PulseError::LengthMismatch { v1: 2, v2: 1 }));
    }
    #[test]
    fn negative_threshold_is_rejected() {
        assert!(matches!(
            trim_idle(&[1.0], &[1.0], -0.1, 1),
            Err(PulseError::InvalidArgument { name: "threshold", .. })
        ));
    }
}
