//! Digital Butterworth low-pass filtering.
//!
//! Design: the analog Butterworth prototype of order `N` is mapped to the
//! z-plane with the bilinear transform, pre-warping the cutoff with
//! `K = tan(pi * fc / fs)`. Conjugate pole pairs become second-order sections
//! with `Q_k = 1 / (2 cos(theta_k))`, where `theta_k = (2k + 1) pi / 2N` for
//! even `N` and `theta_k = (k + 1) pi / N` for odd `N`; odd orders add the real
//! pole as one first-order section. Every section has unity gain at DC.
//!
//! Application: [`LowPassFilter::apply_zero_phase`] runs the cascade forward,
//! then backward over the reversed output. The signal is padded on both ends
//! by odd reflection (`3 * (N + 1)` samples, at most `len - 1`), and each pass
//! starts from the steady state of its first sample, so a constant series
//! comes back unchanged. The combined magnitude response is the square of a
//! single pass (-6 dB at the cutoff) with no phase shift.
use std::f64::consts::PI;
use super::config::LowpassSpec;
use super::error::FilterError;
#[derive(Clone, Copy, Debug, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}
impl BiquadCoeffs {
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}
#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}
#[derive(Clone, Copy, Debug)]
struct BiquadFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}
impl BiquadFilter {
    fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: BiquadState::default(),
        }
    }
    fn process(&mut self, input: f64) -> f64 {
        // Transposed direct form II
        let y = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * y + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * y;
        y
    }
    /// Puts the section in the state it would reach after a constant `input` forever.
    fn settle(&mut self, input: f64) -> f64 {
        let c = self.coeffs;
        let y = c.dc_gain() * input;
        self.state = BiquadState {
            z1: y - c.b0 * input,
            z2: c.b2 * input - c.a2 * y,
        };
        y
    }
}
/// Cascade of sections with running state.
#[derive(Clone, Debug, Default)]
pub struct FilterChain {
    sections: Vec<BiquadFilter>,
}
impl FilterChain {
    pub fn process_sample(&mut self, mut value: f64) -> f64 {
        for section in &mut self.sections {
            value = section.process(value);
        }
        value
    }
    /// Steady-state initial conditions for a series that starts at `value`.
    pub fn settle(&mut self, value: f64) {
        let mut level = value;
        for section in &mut self.sections {
            level = section.settle(level);
        }
    }
    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }
}
#[derive(Clone, Debug)]
pub struct LowPassFilter {
    spec: LowpassSpec,
    sections: Vec<BiquadCoeffs>,
}
impl LowPassFilter {
    pub fn butterworth(order: usize, cutoff_hz: f64, sample_rate_hz: f64) -> Result<Self, FilterError> {
        Self::from_spec(LowpassSpec::new(cutoff_hz, order, sample_rate_hz))
    }
    pub fn from_spec(spec: LowpassSpec) -> Result<Self, FilterError> {
        spec.validate()?;
        Ok(Self {
            spec,
            sections: design_sections(&spec),
        })
    }
    pub fn spec(&self) -> &LowpassSpec {
        &self.spec
    }
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
    /// Fresh cascade at rest.
    pub fn chain(&self) -> FilterChain {
        FilterChain {
            sections: self.sections.iter().copied().map(BiquadFilter::new).collect(),
        }
    }
    pub fn dc_gain(&self) -> f64 {
        self.sections.iter().map(BiquadCoeffs::dc_gain).product()
    }
    /// Single causal pass from rest.
    pub fn apply_causal(&self, input: &[f64]) -> Vec<f64> {
        self.chain().process_block(input)
    }
    /// Forward-backward pass; output length always equals input length.
    pub fn apply_zero_phase(&self, input: &[f64]) -> Vec<f64> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = (3 * (self.spec.order + 1)).min(n - 1);
        let extended = odd_extend(input, pad);
        let mut chain = self.chain();
        chain.settle(extended[0]);
        let mut forward = chain.process_block(&extended);
        forward.reverse();
        chain.settle(forward[0]);
        let mut backward = chain.process_block(&forward);
        backward.reverse();
        backward.drain(..pad);
        backward.truncate(n);
        backward
    }
}
fn odd_extend(input: &[f64], pad: usize) -> Vec<f64> {
    let n = input.len();
    let first = input[0];
    let last = input[n - 1];
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
    out.extend_from_slice(input);
    out.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i]));
    out
}
fn design_sections(spec: &LowpassSpec) -> Vec<BiquadCoeffs> {
    let order = spec.order;
    let k = (PI * spec.cutoff_hz / spec.sample_rate_hz).tan();
    let mut sections: Vec<BiquadCoeffs> = (0..order / 2)
        .map(|i| {
            // pole angle measured from the negative real axis
            let angle = if order % 2 == 0 {
                (2 * i + 1) as f64 * PI / (2 * order) as f64
            } else {
                (i + 1) as f64 * PI / order as f64
            };
            let q = 1.0 / (2.0 * angle.cos());
            second_order_section(k, q)
        })
        .collect();
    if order % 2 == 1 {
        sections.push(first_order_section(k));
    }
    sections
}
fn second_order_section(k: f64, q: f64) -> BiquadCoeffs {
    let k2 = k * k;
    let b0 = k2;
    let b1 = 2.0 * k2;
    let b2 = k2;
    let a0 = 1.0 + k / q + k2;
    let a1 = 2.0 * (k2 - 1.0);
    let a2 = 1.0 - k / q + k2;
    normalize(b0, b1, b2, a0, a1, a2)
}
fn first_order_section(k: f64) -> BiquadCoeffs {
    normalize(k, k, 0.0, 1.0 + k, k - 1.0, 0.0)
}
fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> BiquadCoeffs {
    let a0_inv = 1.0 / a0;
    BiquadCoeffs {
        b0: b0 * a0_inv,
        b1: b1 * a0_inv,
        b2: b2 * a0_inv,
        a1: a1 * a0_inv,
        a2: a2 * a0_inv,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sine(freq_hz: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / fs).sin())
            .collect()
    }
    #[test]
    fn section_layout_follows_order() {
        for order in 1..=8 {
            let f = LowPassFilter::butterworth(order, 5.0, 500.0).unwrap();
            assert_eq!(f.section_count(), order / 2 + order % 2);
            assert!((f.dc_gain() - 1.0).abs() < 1e-9);
        }
    }
    /// |H(e^jw)| of the cascade, evaluated directly from the coefficients.
    fn magnitude_at(f: &LowPassFilter, freq_hz: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / f.spec().sample_rate_hz;
        let (c1, s1) = (w.cos(), -w.sin());
        let (c2, s2) = ((2.0 * w).cos(), -(2.0 * w).sin());
        f.sections
            .iter()
            .map(|s| {
                let num = (s.b0 + s.b1 * c1 + s.b2 * c2).hypot(s.b1 * s1 + s.b2 * s2);
                let den = (1.0 + s.a1 * c1 + s.a2 * c2).hypot(s.a1 * s1 + s.a2 * s2);
                num / den
            })
            .product()
    }
    #[test]
    fn every_order_is_half_power_at_cutoff() {
        for order in 1..=8 {
            let f = LowPassFilter::butterworth(order, 5.0, 500.0).unwrap();
            let db = 20.0 * magnitude_at(&f, 5.0).log10();
            assert!((db + 3.0103).abs() < 1e-6, "order {order}: {db} dB");
        }
    }
    #[test]
    fn third_order_uses_unit_q_pair() {
        // butter(3, 0.5): real pole at the origin plus a pair with Q = 1
        let f = LowPassFilter::butterworth(3, 50.0, 200.0).unwrap();
        let pair = f.sections[0];
        assert!((pair.b0 - 1.0 / 3.0).abs() < 1e-12);
        assert!(pair.a1.abs() < 1e-12);
        assert!((pair.a2 - 1.0 / 3.0).abs() < 1e-12);
        let real = f.sections[1];
        assert!((real.b0 - 0.5).abs() < 1e-12);
        assert!(real.a1.abs() < 1e-12);
    }
    #[test]
    fn matches_reference_second_order_design() {
        // scipy.signal.butter(2, 0.5) -> b = [0.2929, 0.5858, 0.2929], a = [1, 0, 0.1716]
        let f = LowPassFilter::butterworth(2, 50.0, 200.0).unwrap();
        let c = f.sections[0];
        assert!((c.b0 - 0.292_893_218_8).abs() < 1e-9);
        assert!((c.b1 - 0.585_786_437_6).abs() < 1e-9);
        assert!(c.a1.abs() < 1e-12);
        assert!((c.a2 - 0.171_572_875_3).abs() < 1e-9);
    }
    #[test]
    fn output_length_matches_input() {
        let f = LowPassFilter::butterworth(4, 5.0, 500.0).unwrap();
        for n in [0usize, 1, 2, 3, 7, 15, 16, 100, 2500] {
            let x: Vec<f64> = (0..n).map(|i| (i % 7) as f64).collect();
            assert_eq!(f.apply_zero_phase(&x).len(), n);
            assert_eq!(f.apply_causal(&x).len(), n);
        }
    }
    #[test]
    fn constant_series_is_reproduced_at_both_edges() {
        let f = LowPassFilter::butterworth(4, 5.0, 500.0).unwrap();
        let x = vec![2.5; 300];
        let y = f.apply_zero_phase(&x);
        for v in y {
            assert!((v - 2.5).abs() < 1e-9, "{v}");
        }
    }
    #[test]
    fn step_edge_is_symmetric_without_delay() {
        let f = LowPassFilter::butterworth(4, 5.0, 500.0).unwrap();
        let n = 2000;
        let x: Vec<f64> = (0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }).collect();
        let y = f.apply_zero_phase(&x);
        let mid = n / 2;
        // zero phase: y - 0.5 is odd around the step
        for d in 0..50 {
            let pair = y[mid - 1 - d] + y[mid + d];
            assert!((pair - 1.0).abs() < 1e-6, "offset {d}: {pair}");
        }
        assert!(y[0].abs() < 1e-9);
        assert!((y[n - 1] - 1.0).abs() < 1e-9);
        assert!(y[mid - 1] > 0.3 && y[mid - 1] < 0.5);
    }
    #[test]
    fn passes_slow_and_removes_fast_components() {
        let fs = 500.0;
        let f = LowPassFilter::butterworth(4, 5.0, fs).unwrap();
        let slow = sine(0.5, fs, 4000);
        let fast = sine(100.0, fs, 4000);
        let mixed: Vec<f64> = slow.iter().zip(&fast).map(|(a, b)| a + b).collect();
        let y = f.apply_zero_phase(&mixed);
        for i in 200..3800 {
            assert!((y[i] - slow[i]).abs() < 1e-2, "sample {i}: {} vs {}", y[i], slow[i]);
        }
    }
    #[test]
    fn odd_extension_reflects_about_the_edge_values() {
        let ext = odd_extend(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }
    #[test]
    fn causal_pass_lags_but_zero_phase_does_not() {
        let fs = 500.0;
        let f = LowPassFilter::butterworth(2, 5.0, fs).unwrap();
        let x = sine(1.0, fs, 3000);
        let causal = f.apply_causal(&x);
        let zero = f.apply_zero_phase(&x);
        // peak of the 1 Hz sine sits at sample 125 + k*500
        let peak = 1125;
        assert!((zero[peak] - x[peak]).abs() < 1e-2);
        assert!(causal[peak] < zero[peak]);
    }
}
