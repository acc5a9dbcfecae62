use thiserror::Error;
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("cutoff {cutoff_hz} Hz must be above 0 and below the Nyquist frequency {nyquist_hz} Hz")]
    InvalidCutoff { cutoff_hz: f64, nyquist_hz: f64 },
    #[error("filter order {order} is outside 1..={max}")]
    InvalidOrder { order: usize, max: usize },
    #[error("sample rate must be a positive finite number, got {0}")]
    InvalidSampleRate(f64),
}
