use crate::drivers::DaqError;
/// Effective sampling frequency reconstructed from a capture's elapsed-time column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateEstimate {
    pub median_interval_ms: f64,
    pub sample_rate_hz: f64,
}
/// Median of consecutive timestamp differences, converted to Hz.
///
/// The median keeps one long scheduling gap from dragging the estimate down,
/// which a mean would not.
pub fn estimate_sampling_rate(elapsed_ms: &[f64]) -> Result<RateEstimate, DaqError> {
    if elapsed_ms.len() < 2 {
        return Err(DaqError::InsufficientData {
            found: elapsed_ms.len(),
        });
    }
    let mut diffs: Vec<f64> = elapsed_ms.windows(2).map(|w| w[1] - w[0]).collect();
    let median_ms = median(&mut diffs);
    if median_ms.is_nan() || median_ms <= 0.0 {
        return Err(DaqError::DegenerateSampling { median_ms });
    }
    Ok(RateEstimate {
        median_interval_ms: median_ms,
        sample_rate_hz: 1000.0 / median_ms,
    })
}
/// Even-length input averages the two middle values.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
