use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use crate::parser::source::LineSource;
use crate::parser::ParserError;
const LINE_TERMINATOR: u8 = b'\n';
/// Upper bound on bytes held while waiting for a terminator.
const MAX_PENDING_BYTES: usize = 4096;
/// Names of the serial ports currently present on the system.
pub fn available_ports() -> Result<Vec<String>, ParserError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
/// Line-oriented reader over a serial port (8N1, no flow control).
///
/// Bytes that arrive without a terminator are kept until the rest of the line
/// shows up, so a timeout never splits a reading in two.
pub struct SerialSession {
    port_name: String,
    port: Box<dyn SerialPort>,
    timeout: Duration,
    pending: LineAssembler,
}
/// Collects raw bytes and hands out complete lines.
///
/// A device that never sends a terminator would otherwise grow the buffer
/// without bound, so only the newest `MAX_PENDING_BYTES` are kept.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}
impl LineAssembler {
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_PENDING_BYTES {
            let excess = self.pending.len() - MAX_PENDING_BYTES;
            warn!("no line terminator in {} bytes, dropping the oldest {excess}", self.pending.len());
            self.pending.drain(..excess);
        }
    }
    /// Removes and returns the oldest complete line, terminator stripped.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == LINE_TERMINATOR)?;
        let line: Vec<u8> = self.pending.drain(..=end).take(end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
    pub fn clear(&mut self) {
        self.pending.clear();
    }
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
impl SerialSession {
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ParserError> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|source| ParserError::PortUnavailable {
                port: port_name.to_string(),
                source,
            })?;
        info!("opened {port_name} at {baud_rate} baud");
        Ok(Self {
            port_name: port_name.to_string(),
            port,
            timeout,
            pending: LineAssembler::default(),
        })
    }
}
impl LineSource for SerialSession {
    fn read_line(&mut self) -> Result<Option<String>, ParserError> {
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; 256];
        loop {
            if let Some(line) = self.pending.take_line() {
                return Ok(Some(line));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.pending.push(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
    fn discard_input(&mut self) -> Result<(), ParserError> {
        debug!(
            "discarding {} buffered bytes on {}",
            self.pending.len(),
            self.port_name
        );
        self.pending.clear();
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), ParserError> {
        self.port.set_baud_rate(baud_rate)?;
        info!("{} baud rate set to {baud_rate}", self.port_name);
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn line_split_across_reads_is_joined() {
        let mut lines = LineAssembler::default();
        lines.push(b"1.0,2.");
        assert_eq!(lines.take_line(), None);
        lines.push(b"5,\n");
        assert_eq!(lines.take_line().as_deref(), Some("1.0,2.5,"));
        assert_eq!(lines.len(), 0);
    }
    #[test]
    fn partial_line_survives_a_timeout() {
        let mut lines = LineAssembler::default();
        lines.push(b"7,8");
        // a read timeout only means take_line found nothing this round
        assert_eq!(lines.take_line(), None);
        assert_eq!(lines.len(), 3);
        lines.push(b",9,\n");
        assert_eq!(lines.take_line().as_deref(), Some("7,8,9,"));
    }
    #[test]
    fn several_lines_in_one_chunk_come_out_in_order() {
        let mut lines = LineAssembler::default();
        lines.push(b"1,\n2,\n\n3");
        assert_eq!(lines.take_line().as_deref(), Some("1,"));
        assert_eq!(lines.take_line().as_deref(), Some("2,"));
        assert_eq!(lines.take_line().as_deref(), Some(""));
        assert_eq!(lines.take_line(), None);
        assert_eq!(lines.len(), 1);
    }
    #[test]
    fn clear_drops_partial_line() {
        let mut lines = LineAssembler::default();
        lines.push(b"stale,4");
        lines.clear();
        lines.push(b"5,\n");
        assert_eq!(lines.take_line().as_deref(), Some("5,"));
    }
    #[test]
    fn invalid_utf8_is_replaced() {
        let mut lines = LineAssembler::default();
        lines.push(b"1,\xff,2,\n");
        assert_eq!(lines.take_line().as_deref(), Some("1,\u{FFFD},2,"));
    }
    #[test]
    fn unterminated_input_is_capped() {
        let mut lines = LineAssembler::default();
        lines.push(&[b'9'; MAX_PENDING_BYTES]);
        lines.push(b"1,2,");
        assert_eq!(lines.len(), MAX_PENDING_BYTES);
        lines.push(b"\n");
        let line = lines.take_line().unwrap_or_default();
        assert_eq!(line.len(), MAX_PENDING_BYTES - 1);
        assert!(line.ends_with("1,2,"));
    }
}
