// src/engine.rs
use crate::config::DeviceConfig;
use crate::drivers::source::{ChannelReader, Clock};
use crate::drivers::transport::LineTransport;
use crate::drivers::DaqError;
use crate::types::{Command, DeviceMessage, SampleRow, CHANNEL_COUNT};
use log::{debug, info};
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
}

/// The single recording context of the sampler.
#[derive(Clone, Debug)]
pub struct Session {
    pub state: SessionState,
    pub start_ms: u32,
    pub last_sample_ms: u32,
    pub sample_index: u32,
}

impl Session {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            start_ms: 0,
            last_sample_ms: 0,
            sample_index: 0,
        }
    }
}

/// Owns the session and decides when a row is sampled and what goes on the wire.
///
/// Every call to [`tick`](Self::tick) is one pass of the polling loop:
/// the clock is read once, then at most one inbound command is handled,
/// then the sampling check runs with the same timestamp.
pub struct SamplingController<R, C, T> {
    config: DeviceConfig,
    reader: R,
    clock: C,
    transport: T,
    session: Session,
}

impl<R: ChannelReader, C: Clock, T: LineTransport> SamplingController<R, C, T> {
    pub fn new(config: DeviceConfig, reader: R, clock: C, transport: T) -> Self {
        Self {
            config,
            reader,
            clock,
            transport,
            session: Session::idle(),
        }
    }

    /// Power-on banner.
    pub fn boot(&mut self) -> Result<(), DaqError> {
        self.emit(DeviceMessage::Ready)
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_recording(&self) -> bool {
        self.session.state == SessionState::Recording
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn tick(&mut self) -> Result<(), DaqError> {
        let now = self.clock.now_ms();

        // 1. 命令处理
        if let Some(line) = self.transport.try_recv_line()? {
            match Command::parse(&line) {
                Some(Command::Start) => self.start_session(now)?,
                None => debug!("ignoring unrecognized input {line:?}"),
            }
        }

        // 2. 采样
        if self.is_recording() {
            let elapsed = now.wrapping_sub(self.session.start_ms);
            if elapsed <= self.config.duration_ms {
                if now.wrapping_sub(self.session.last_sample_ms) >= self.config.sample_interval_ms {
                    self.session.last_sample_ms = now;
                    self.session.sample_index += 1;
                    let row = self.read_row(elapsed);
                    self.emit(DeviceMessage::Row(row))?;
                }
            } else {
                self.finish_session()?;
            }
        }
        Ok(())
    }

    fn start_session(&mut self, now: u32) -> Result<(), DaqError> {
        if self.is_recording() {
            debug!(
                "restart requested, discarding session at sample {}",
                self.session.sample_index
            );
        }
        self.transport.clear_input()?;
        self.session.sample_index = 0;
        self.emit(DeviceMessage::Header)?;
        self.session.state = SessionState::Recording;
        self.session.start_ms = now;
        self.session.last_sample_ms = now;
        self.emit(DeviceMessage::RecordingStarted)?;
        debug!("recording started at {now} ms");
        Ok(())
    }

    fn finish_session(&mut self) -> Result<(), DaqError> {
        self.session.state = SessionState::Idle;
        let count = self.session.sample_index;
        self.emit(DeviceMessage::RecordingComplete)?;
        self.emit(DeviceMessage::SamplesCollected(count))?;
        self.emit(DeviceMessage::EndOfData)?;
        debug!("recording complete, {count} samples");
        Ok(())
    }

    fn read_row(&mut self, elapsed_ms: u32) -> SampleRow {
        let scale = self.config.volts_per_count();
        let mut voltages = [0.0f32; CHANNEL_COUNT];
        for (channel, v) in voltages.iter_mut().enumerate() {
            *v = self.reader.read_raw(channel) as f32 * scale;
        }
        SampleRow {
            index: self.session.sample_index,
            elapsed_ms,
            voltages,
        }
    }

    fn emit(&mut self, msg: DeviceMessage) -> Result<(), DaqError> {
        self.transport.send_line(&msg.to_string())
    }
}

/// Runs the polling loop on its own thread until the transport peer goes away.
pub fn spawn_device<R, C, T>(
    mut controller: SamplingController<R, C, T>,
    poll_interval: Duration,
) -> thread::JoinHandle<Result<(), DaqError>>
where
    R: ChannelReader + Send + 'static,
    C: Clock + Send + 'static,
    T: LineTransport + Send + 'static,
{
    thread::spawn(move || {
        controller.boot()?;
        info!("device loop running");
        loop {
            match controller.tick() {
                Ok(()) => {}
                Err(DaqError::Disconnected) => {
                    info!("host disconnected, device loop stopping");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            thread::sleep(poll_interval);
        }
    })
}
