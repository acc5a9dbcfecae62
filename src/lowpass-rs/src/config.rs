use super::error::FilterError;
/// Highest Butterworth order accepted. Beyond this the cascaded sections lose
/// too much precision at low normalized cutoffs.
pub const MAX_ORDER: usize = 8;
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LowpassSpec {
    pub cutoff_hz: f64,
    pub order: usize,
    pub sample_rate_hz: f64,
}
impl LowpassSpec {
    pub fn new(cutoff_hz: f64, order: usize, sample_rate_hz: f64) -> Self {
        Self {
            cutoff_hz,
            order,
            sample_rate_hz,
        }
    }
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz * 0.5
    }
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(FilterError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.order == 0 || self.order > MAX_ORDER {
            return Err(FilterError::InvalidOrder {
                order: self.order,
                max: MAX_ORDER,
            });
        }
        let nyquist_hz = self.nyquist_hz();
        if !self.cutoff_hz.is_finite() || self.cutoff_hz <= 0.0 || self.cutoff_hz >= nyquist_hz {
            return Err(FilterError::InvalidCutoff {
                cutoff_hz: self.cutoff_hz,
                nyquist_hz,
            });
        }
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn cutoff_must_sit_below_nyquist() {
        assert!(LowpassSpec::new(5.0, 4, 500.0).validate().is_ok());
        assert_eq!(
            LowpassSpec::new(250.0, 4, 500.0).validate(),
            Err(FilterError::InvalidCutoff {
                cutoff_hz: 250.0,
                nyquist_hz: 250.0
            })
        );
        assert!(matches!(
            LowpassSpec::new(0.0, 4, 500.0).validate(),
            Err(FilterError::InvalidCutoff { .. })
        ));
    }
    #[test]
    fn rejects_bad_order_and_rate() {
        assert!(matches!(
            LowpassSpec::new(5.0, 0, 500.0).validate(),
            Err(FilterError::InvalidOrder { order: 0, .. })
        ));
        assert!(matches!(
            LowpassSpec::new(5.0, 9, 500.0).validate(),
            Err(FilterError::InvalidOrder { order: 9, .. })
        ));
        assert!(matches!(
            LowpassSpec::new(5.0, 4, f64::INFINITY).validate(),
            Err(FilterError::InvalidSampleRate(_))
        ));
    }
}
