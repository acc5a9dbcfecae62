#[cfg(test)]
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;
use log::debug;
use serialport::{ClearBuffer, SerialPort};
use crate::drivers::DaqError;
/// Newline-terminated text frames over a byte stream. Lines are passed without the terminator.
pub trait LineTransport {
    fn send_line(&mut self, line: &str) -> Result<(), DaqError>;
    /// Next complete inbound line, or `None` if nothing complete has arrived yet.
    fn try_recv_line(&mut self) -> Result<Option<String>, DaqError>;
    /// Drops everything received but not yet consumed.
    fn clear_input(&mut self) -> Result<(), DaqError>;
}
/// In-memory transport: inbound lines are queued by hand, outbound lines are kept.
#[cfg(test)]
#[derive(Default, Debug)]
pub struct MemoryTransport {
    inbound: VecDeque<String>,
    outbound: Vec<String>,
}
#[cfg(test)]
impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push_inbound(&mut self, line: impl Into<String>) {
        self.inbound.push_back(line.into());
    }
    pub fn sent(&self) -> &[String] {
        &self.outbound
    }
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbound)
    }
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}
#[cfg(test)]
impl LineTransport for MemoryTransport {
    fn send_line(&mut self, line: &str) -> Result<(), DaqError> {
        self.outbound.push(line.to_owned());
        Ok(())
    }
    fn try_recv_line(&mut self) -> Result<Option<String>, DaqError> {
        Ok(self.inbound.pop_front())
    }
    fn clear_input(&mut self) -> Result<(), DaqError> {
        self.inbound.clear();
        Ok(())
    }
}
/// One end of an in-process link. Build both ends with [`ChannelTransport::pair`].
pub struct ChannelTransport {
    tx: Sender<String>,
    rx: Receiver<String>,
}
impl ChannelTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }
}
impl LineTransport for ChannelTransport {
    fn send_line(&mut self, line: &str) -> Result<(), DaqError> {
        self.tx
            .send(line.to_owned())
            .map_err(|_| DaqError::Disconnected)
    }
    fn try_recv_line(&mut self) -> Result<Option<String>, DaqError> {
        match self.rx.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(DaqError::Disconnected),
        }
    }
    fn clear_input(&mut self) -> Result<(), DaqError> {
        while let Ok(line) = self.rx.try_recv() {
            debug!("discarding buffered input {line:?}");
        }
        Ok(())
    }
}
/// Serial port framed into lines. Bytes that are not valid UTF-8 are replaced, not fatal.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}
impl SerialTransport {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, DaqError> {
        let port = serialport::new(path, baud_rate).timeout(timeout).open()?;
        Ok(Self::from_port(port))
    }
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            pending: Vec::new(),
        }
    }
}
/// Splits the first complete line off `pending`. CR before the newline is dropped
/// and invalid UTF-8 is replaced; a trailing partial line stays buffered.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let raw: Vec<u8> = pending.drain(..=end).collect();
    let text = String::from_utf8_lossy(&raw[..end]);
    Some(text.trim_end_matches('\r').to_owned())
}
impl LineTransport for SerialTransport {
    fn send_line(&mut self, line: &str) -> Result<(), DaqError> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }
    fn try_recv_line(&mut self) -> Result<Option<String>, DaqError> {
        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(None);
        }
        let mut chunk = vec![0u8; available];
        match self.port.read(&mut chunk) {
            Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        Ok(take_line(&mut self.pending))
    }
    fn clear_input(&mut self) -> Result<(), DaqError> {
        self.pending.clear();
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
/// Names of the serial ports the OS reports.
pub fn available_ports() -> Result<Vec<String>, DaqError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
