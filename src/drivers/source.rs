#[cfg(test)]
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::Instant;
use rand::{rngs::StdRng, Rng, SeedableRng};
use crate::types::CHANNEL_COUNT;
/// Something that can produce a raw converter reading for one analog input.
pub trait ChannelReader {
    /// Raw reading in `0..=max_raw_value` for input `channel` (`0..CHANNEL_COUNT`).
    fn read_raw(&mut self, channel: usize) -> u16;
}
/// Monotonic millisecond counter. Wraps like a 32-bit hardware tick counter.
pub trait Clock {
    fn now_ms(&mut self) -> u32;
}
/// Wall clock measured from construction.
pub struct SystemClock {
    origin: Instant,
}
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock for SystemClock {
    fn now_ms(&mut self) -> u32 {
        // truncation is the intended wrap-around
        self.origin.elapsed().as_millis() as u32
    }
}
#[cfg(test)]
/// Deterministic clock: every read returns the current value, then advances by `step_ms`.
pub struct SteppedClock {
    now: u32,
    step_ms: u32,
}
#[cfg(test)]
impl SteppedClock {
    pub fn new(start_ms: u32, step_ms: u32) -> Self {
        Self {
            now: start_ms,
            step_ms,
        }
    }
}
#[cfg(test)]
impl Clock for SteppedClock {
    fn now_ms(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step_ms);
        now
    }
}
#[cfg(test)]
/// Replays a fixed list of timestamps, then keeps returning the last one.
pub struct ScriptedClock {
    ticks: VecDeque<u32>,
    last: u32,
}
#[cfg(test)]
impl ScriptedClock {
    pub fn new(ticks: impl IntoIterator<Item = u32>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
            last: 0,
        }
    }
}
#[cfg(test)]
impl Clock for ScriptedClock {
    fn now_ms(&mut self) -> u32 {
        if let Some(t) = self.ticks.pop_front() {
            self.last = t;
        }
        self.last
    }
}
#[cfg(test)]
/// Fixed readings per channel.
#[derive(Clone, Debug)]
pub struct FixedReader {
    values: [u16; CHANNEL_COUNT],
}
#[cfg(test)]
impl FixedReader {
    pub fn new(values: [u16; CHANNEL_COUNT]) -> Self {
        Self { values }
    }
}
#[cfg(test)]
impl ChannelReader for FixedReader {
    fn read_raw(&mut self, channel: usize) -> u16 {
        self.values.get(channel).copied().unwrap_or(0)
    }
}
/// Simulated converter: each channel is a slow sine around mid-scale plus uniform noise.
pub struct SimulatedAdc {
    rng: StdRng,
    max_raw: u16,
    phase: f32,
    phase_step: f32,
    noise_counts: f32,
}
impl SimulatedAdc {
    /// `signal_hz` is the sine frequency assuming one full scan of the channels per `sample_interval_ms`.
    pub fn new(seed: u64, max_raw: u16, signal_hz: f32, sample_interval_ms: u32) -> Self {
        let step = 2.0 * PI * signal_hz * sample_interval_ms as f32 / 1000.0;
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_raw,
            phase: 0.0,
            phase_step: step,
            noise_counts: max_raw as f32 * 0.02,
        }
    }
}
impl ChannelReader for SimulatedAdc {
    fn read_raw(&mut self, channel: usize) -> u16 {
        if channel == 0 {
            self.phase = (self.phase + self.phase_step) % (2.0 * PI);
        }
        let mid = self.max_raw as f32 / 2.0;
        let amplitude = mid * 0.8 / (channel as f32 + 1.0);
        let noise = self.rng.gen_range(-self.noise_counts..=self.noise_counts);
        let value = mid + amplitude * (self.phase + channel as f32 * PI / 4.0).sin() + noise;
        value.round().clamp(0.0, self.max_raw as f32) as u16
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn stepped_clock_advances_per_read_and_wraps() {
        let mut clock = SteppedClock::new(u32::MAX - 1, 2);
        assert_eq!(clock.now_ms(), u32::MAX - 1);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 2);
    }
    #[test]
    fn scripted_clock_holds_last_value() {
        let mut clock = ScriptedClock::new([5, 9]);
        assert_eq!(clock.now_ms(), 5);
        assert_eq!(clock.now_ms(), 9);
        assert_eq!(clock.now_ms(), 9);
    }
    #[test]
    fn simulated_adc_stays_in_range() {
        let mut adc = SimulatedAdc::new(7, 1023, 0.5, 2);
        for _ in 0..2000 {
            for ch in 0..CHANNEL_COUNT {
                assert!(adc.read_raw(ch) <= 1023);
            }
        }
    }
}
