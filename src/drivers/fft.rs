use std::fmt;
use rustfft::{num_complex::Complex64, FftPlanner};
use crate::lowpass::LowPassFilter;
/// Floor applied before converting to dB so the stopband never reaches -inf.
const MAGNITUDE_FLOOR: f64 = 1e-12;
/// Magnitude response of a low-pass filter, sampled on the FFT grid from DC to Nyquist.
#[derive(Clone, Debug)]
pub struct FrequencyResponse {
    pub sample_rate_hz: f64,
    pub cutoff_hz: f64,
    pub order: usize,
    pub frequencies_hz: Vec<f64>,
    /// One causal pass, in dB.
    pub single_pass_db: Vec<f64>,
}
/// Headline numbers for a response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseSummary {
    pub cutoff_gain_db: f64,
    pub zero_phase_cutoff_gain_db: f64,
    /// `None` when 10x the cutoff lies beyond Nyquist.
    pub rolloff_db_per_decade: Option<f64>,
}
/// Computes the response from the FFT of the filter's impulse response.
pub struct ResponseAnalyzer {
    fft_size: usize,
}
impl ResponseAnalyzer {
    pub fn with_size(fft_size: usize) -> Self {
        Self {
            fft_size: fft_size.max(16),
        }
    }
    pub fn compute(&self, filter: &LowPassFilter) -> FrequencyResponse {
        let spec = filter.spec();
        let mut impulse = vec![0.0; self.fft_size];
        impulse[0] = 1.0;
        let response = filter.apply_causal(&impulse);
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(self.fft_size);
        let mut buffer: Vec<Complex64> = response.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        fft.process(&mut buffer);
        let bins = self.fft_size / 2 + 1;
        let bin_hz = spec.sample_rate_hz / self.fft_size as f64;
        FrequencyResponse {
            sample_rate_hz: spec.sample_rate_hz,
            cutoff_hz: spec.cutoff_hz,
            order: spec.order,
            frequencies_hz: (0..bins).map(|k| k as f64 * bin_hz).collect(),
            single_pass_db: buffer
                .iter()
                .take(bins)
                .map(|c| 20.0 * c.norm().max(MAGNITUDE_FLOOR).log10())
                .collect(),
        }
    }
}
impl Default for ResponseAnalyzer {
    fn default() -> Self {
        Self::with_size(16_384)
    }
}
impl FrequencyResponse {
    /// Single-pass gain at `freq_hz`, linearly interpolated between bins.
    pub fn gain_db_at(&self, freq_hz: f64) -> Option<f64> {
        let last = *self.frequencies_hz.last()?;
        if !(0.0..=last).contains(&freq_hz) {
            return None;
        }
        let bin_hz = self.frequencies_hz.get(1)? - self.frequencies_hz[0];
        let pos = freq_hz / bin_hz;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(self.single_pass_db.len() - 1);
        let frac = pos - lo as f64;
        Some(self.single_pass_db[lo] * (1.0 - frac) + self.single_pass_db[hi] * frac)
    }
    /// Forward and backward passes multiply, so the dB value doubles.
    pub fn zero_phase_gain_db_at(&self, freq_hz: f64) -> Option<f64> {
        self.gain_db_at(freq_hz).map(|db| 2.0 * db)
    }
    /// Slope of the single-pass response between 2x and 10x the cutoff.
    pub fn rolloff_db_per_decade(&self) -> Option<f64> {
        let near = 2.0 * self.cutoff_hz;
        let far = 10.0 * self.cutoff_hz;
        let drop = self.gain_db_at(far)? - self.gain_db_at(near)?;
        Some(drop / (far / near).log10())
    }
    pub fn summary(&self) -> Option<ResponseSummary> {
        Some(ResponseSummary {
            cutoff_gain_db: self.gain_db_at(self.cutoff_hz)?,
            zero_phase_cutoff_gain_db: self.zero_phase_gain_db_at(self.cutoff_hz)?,
            rolloff_db_per_decade: self.rolloff_db_per_decade(),
        })
    }
}
impl fmt::Display for ResponseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "gain at cutoff (single pass): {:.2} dB", self.cutoff_gain_db)?;
        writeln!(f, "gain at cutoff (zero phase):  {:.2} dB", self.zero_phase_cutoff_gain_db)?;
        match self.rolloff_db_per_decade {
            Some(slope) => write!(f, "roll-off 2x..10x cutoff:      {slope:.1} dB/decade"),
            None => write!(f, "roll-off 2x..10x cutoff:      n/a (beyond Nyquist)"),
        }
    }
}
