use thiserror::Error;
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("channel length mismatch: v1 has {v1} samples, v2 has {v2}")]
    LengthMismatch { v1: usize, v2: usize },
    #[error("device error: {0}")]
    Device(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
impl PulseError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PulseError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
/// Reject sample frequencies that cannot describe a timebase.
pub(crate) fn check_sample_frequency(sample_frequency_hz: f64) -> Result<(), PulseError> {
    if !sample_frequency_hz.is_finite() || sample_frequency_hz <= 0.0 {
        return Err(PulseError::invalid(
            "sample_frequency_hz",
            format!("must be finite and greater than zero, got {sample_frequency_hz}"),
        ));
    }
    Ok(())
}
pub(crate) fn check_equal_length(v1: &[f64], v2: &[f64]) -> Result<(), PulseError> {
    if v1.len() != v2.len() {
        return Err(PulseError::LengthMismatch {
            v1: v1.len(),
            v2: v2.len(),
        });
    }
    Ok(())
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PulseError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PulseError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for PulseError {
    fn from(value: image::ImageError) -> Self {
        PulseError::Plot(value.to_string())
    }
}
