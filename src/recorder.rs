use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::HostConfig;
use crate::drivers::pipeline::with_suffix;
use crate::drivers::transport::LineTransport;
use crate::types::{Command, DeviceMessage, HEADER_LINE};

/// What one capture produced.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureReport {
    pub path: PathBuf,
    /// Lines written to the file, header excluded.
    pub lines_written: usize,
    /// Lines that parsed as well-formed sample rows.
    pub rows_received: usize,
    /// Count announced by the device in its summary, if it arrived.
    pub reported_samples: Option<u32>,
    /// `RECORDING_COMPLETE` was seen before the capture timeout.
    pub completed: bool,
}

impl CaptureReport {
    pub fn count_matches(&self) -> bool {
        self.reported_samples
            .map_or(false, |n| n as usize == self.rows_received)
    }
}

/// Host end of the line protocol: waits for the banner, starts a recording and persists it.
pub struct CaptureSession<T> {
    transport: T,
    config: HostConfig,
}

impl<T: LineTransport> CaptureSession<T> {
    pub fn new(transport: T, config: HostConfig) -> Self {
        Self { transport, config }
    }

    #[cfg(test)]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns `false` if the banner did not arrive in time; the caller may still try to record.
    pub fn wait_for_ready(&mut self) -> Result<bool> {
        let deadline = Instant::now() + Duration::from_secs(self.config.ready_timeout_secs);
        loop {
            match self.transport.try_recv_line().context("waiting for ready banner")? {
                Some(line) if DeviceMessage::parse(&line) == Some(DeviceMessage::Ready) => {
                    info!("device is ready");
                    return Ok(true);
                }
                Some(line) => debug!("before ready: {line:?}"),
                None => {
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    self.idle();
                }
            }
        }
    }

    /// Sends `START` and writes every comma-separated line to `output` until the
    /// device closes the session or the capture timeout expires.
    pub fn capture(&mut self, output: &Path) -> Result<CaptureReport> {
        let file = File::create(output)
            .with_context(|| format!("creating capture file {}", output.display()))?;
        let mut writer = BufWriter::new(file);
        self.transport
            .send_line(Command::Start.as_line())
            .context("sending START")?;
        info!("recording to {}", output.display());

        let mut report = CaptureReport {
            path: output.to_path_buf(),
            lines_written: 0,
            rows_received: 0,
            reported_samples: None,
            completed: false,
        };
        let deadline = Instant::now() + Duration::from_secs(self.config.capture_timeout_secs);
        while Instant::now() < deadline {
            let Some(line) = self.transport.try_recv_line().context("reading capture")? else {
                self.idle();
                continue;
            };
            let line = line.trim();
            match DeviceMessage::parse(line) {
                Some(DeviceMessage::RecordingComplete) => {
                    info!("recording complete");
                    report.completed = true;
                }
                Some(DeviceMessage::SamplesCollected(n)) => {
                    info!("device collected {n} samples");
                    report.reported_samples = Some(n);
                }
                Some(DeviceMessage::EndOfData) => break,
                Some(DeviceMessage::Header) => {
                    writeln!(writer, "{line}")?;
                }
                Some(DeviceMessage::Row(_)) => {
                    writeln!(writer, "{line}")?;
                    report.lines_written += 1;
                    report.rows_received += 1;
                    if report.rows_received % 500 == 0 {
                        debug!("received {} rows", report.rows_received);
                    }
                }
                _ if line.contains(',') => {
                    // Damaged row: kept in the raw file, removed by cleaning.
                    writeln!(writer, "{line}")?;
                    report.lines_written += 1;
                }
                _ => debug!("not persisted: {line:?}"),
            }
        }
        writer.flush()?;

        if !report.completed {
            warn!("capture timed out before RECORDING_COMPLETE");
        }
        match report.reported_samples {
            Some(n) if !report.count_matches() => warn!(
                "device reported {n} samples but {} rows were received",
                report.rows_received
            ),
            None => warn!("device sample count was not received"),
            _ => {}
        }
        info!(
            "saved {} rows to {}",
            report.rows_received,
            output.display()
        );
        Ok(report)
    }

    fn idle(&self) {
        thread::sleep(Duration::from_millis(self.config.poll_interval_ms));
    }
}

/// `daq_capture_<unix seconds>.csv` in `dir`.
pub fn default_capture_path(dir: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    dir.join(format!("daq_capture_{secs}.csv"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanReport {
    pub path: PathBuf,
    pub header_found: bool,
    pub rows_kept: usize,
    pub lines_dropped: usize,
}

/// Keeps the header and data-looking lines; a missing header is supplied.
pub fn clean_capture_text(text: &str) -> (String, bool, usize, usize) {
    let mut out = Vec::new();
    let mut header_found = false;
    let mut rows = 0;
    let mut dropped = 0;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.contains("Sample,Time") {
            header_found = true;
            out.push(line);
        } else if looks_like_row(line) {
            rows += 1;
            out.push(line);
        } else {
            dropped += 1;
        }
    }
    if !header_found && !out.is_empty() {
        out.insert(0, HEADER_LINE);
    }
    let mut cleaned = out.join("\n");
    if !cleaned.is_empty() {
        cleaned.push('\n');
    }
    (cleaned, header_found, rows, dropped)
}

/// Writes `<stem>_clean<ext>` next to `input`.
pub fn clean_capture_file(input: &Path) -> Result<CleanReport> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading capture file {}", input.display()))?;
    let (cleaned, header_found, rows_kept, lines_dropped) = clean_capture_text(&text);
    let path = with_suffix(input, "_clean");
    fs::write(&path, cleaned).with_context(|| format!("writing {}", path.display()))?;
    if lines_dropped > 0 {
        warn!("removed {lines_dropped} malformed line(s) from {}", input.display());
    }
    info!("cleaned data saved to {}", path.display());
    Ok(CleanReport {
        path,
        header_found,
        rows_kept,
        lines_dropped,
    })
}

fn looks_like_row(line: &str) -> bool {
    line.split(',').count() == 6 && line.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, FilterConfig};
    use crate::drivers::pipeline::FilterPipeline;
    use crate::drivers::source::{SimulatedAdc, SystemClock};
    use crate::drivers::transport::{ChannelTransport, MemoryTransport};
    use crate::engine::{spawn_device, SamplingController};

    fn quick_host() -> HostConfig {
        HostConfig {
            ready_timeout_secs: 2,
            capture_timeout_secs: 5,
            poll_interval_ms: 1,
        }
    }

    fn scripted_device(lines: &[&str]) -> MemoryTransport {
        let mut t = MemoryTransport::new();
        for line in lines {
            t.push_inbound(*line);
        }
        t
    }

    #[test]
    fn capture_writes_header_and_rows() {
        let transport = scripted_device(&[
            "ARDUINO_DAQ_READY",
            "Sample,Time(ms),A0(V),A1(V),A2(V),A3(V)",
            "RECORDING_STARTED",
            "1,2,0.000,5.000,2.502,1.002",
            "2,4,0.000,5.000,2.502,1.002",
            "3,6,0.000,5.000,2.502,1.002",
            "RECORDING_COMPLETE",
            "SAMPLES_COLLECTED:3",
            "END_OF_DATA",
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let mut session = CaptureSession::new(transport, quick_host());
        assert!(session.wait_for_ready().unwrap());
        let report = session.capture(&path).unwrap();
        assert!(report.completed);
        assert_eq!(report.rows_received, 3);
        assert_eq!(report.reported_samples, Some(3));
        assert!(report.count_matches());
        assert_eq!(session.transport_mut().sent(), &["START".to_string()]);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with(HEADER_LINE));
        assert!(!text.contains("RECORDING"));
    }

    #[test]
    fn count_mismatch_is_reported() {
        let transport = scripted_device(&[
            "1,2,0.000,5.000,2.502,1.002",
            "RECORDING_COMPLETE",
            "SAMPLES_COLLECTED:2",
            "END_OF_DATA",
        ]);
        let dir = tempfile::tempdir().unwrap();
        let mut session = CaptureSession::new(transport, quick_host());
        let report = session.capture(&dir.path().join("short.csv")).unwrap();
        assert_eq!(report.rows_received, 1);
        assert!(!report.count_matches());
    }

    #[test]
    fn missing_banner_times_out() {
        let mut session = CaptureSession::new(
            scripted_device(&["garbage"]),
            HostConfig {
                ready_timeout_secs: 0,
                ..quick_host()
            },
        );
        assert!(!session.wait_for_ready().unwrap());
    }

    #[test]
    fn cleaning_keeps_header_and_rows_only() {
        let raw = "Sample,Time(ms),A0(V),A1(V),A2(V),A3(V)\n\
            RECORDING_STARTED\n\
            1,2,0.010,4.995,2.502,1.002\n\
            2,4,0.015,4.9\n\
            ,,,,,\n\
            3,6,0.020,4.985,2.498,0.998\n";
        let (cleaned, header_found, rows, dropped) = clean_capture_text(raw);
        assert!(header_found);
        assert_eq!(rows, 2);
        assert_eq!(dropped, 3);
        assert_eq!(
            cleaned,
            "Sample,Time(ms),A0(V),A1(V),A2(V),A3(V)\n\
             1,2,0.010,4.995,2.502,1.002\n\
             3,6,0.020,4.985,2.498,0.998\n"
        );
    }

    #[test]
    fn cleaning_inserts_missing_header() {
        let (cleaned, header_found, rows, _) = clean_capture_text("1,2,0.1,0.2,0.3,0.4\r\n");
        assert!(!header_found);
        assert_eq!(rows, 1);
        assert_eq!(cleaned, format!("{HEADER_LINE}\n1,2,0.1,0.2,0.3,0.4\n"));
        assert_eq!(clean_capture_text("noise only\n").0, "");
    }

    #[test]
    fn clean_file_lands_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, "1,2,0.1,0.2,0.3,0.4\nEND_OF_DATA\n").unwrap();
        let report = clean_capture_file(&input).unwrap();
        assert_eq!(report.path, dir.path().join("raw_clean.csv"));
        assert_eq!(report.rows_kept, 1);
        assert_eq!(report.lines_dropped, 1);
        assert!(report.path.exists());
    }

    #[test]
    fn simulated_device_round_trip() {
        let device_cfg = DeviceConfig {
            duration_ms: 300,
            ..DeviceConfig::default()
        };
        let (device_end, host_end) = ChannelTransport::pair();
        let adc = SimulatedAdc::new(7, device_cfg.max_raw_value, 1.0, device_cfg.sample_interval_ms);
        let controller = SamplingController::new(device_cfg, adc, SystemClock::new(), device_end);
        let handle = spawn_device(controller, Duration::from_millis(1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.csv");
        let mut session = CaptureSession::new(host_end, quick_host());
        assert!(session.wait_for_ready().unwrap());
        let report = session.capture(&path).unwrap();
        drop(session);
        handle.join().unwrap().unwrap();

        assert!(report.completed);
        assert!(report.rows_received > 10);
        assert!(report.count_matches());

        let outcome = FilterPipeline::new(FilterConfig::default()).run(&path).unwrap();
        assert_eq!(outcome.load.rows_dropped, 0);
        assert_eq!(outcome.load.rows_kept, report.rows_received);
        assert_eq!(outcome.filtered_channels.len(), 4);
    }
}
