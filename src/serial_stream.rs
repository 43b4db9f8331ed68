use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;

/// Baud rate the N56FU family transmits at.
pub const DEFAULT_BAUDRATE: u32 = 2400;

/// Read timeout used both for probing and for frame acquisition.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Receive side of an open serial endpoint.
///
/// The endpoint is closed when the implementor is dropped.
pub trait ByteStream {
    /// Number of bytes queued and ready to be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Read up to `buf.len()` bytes, blocking up to the stream timeout.
    ///
    /// Returns `Ok(0)` when nothing arrived before the timeout elapsed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Drop any received but not yet read input.
    fn discard_input(&mut self) -> Result<(), TransportError>;
}

/// Host side capability: list serial endpoints and open them.
pub trait SerialHost {
    type Stream: ByteStream;

    fn list_candidate_endpoints(&self) -> Result<Vec<String>, TransportError>;

    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self::Stream, TransportError>;
}

#[derive(Debug)]
pub struct SerialByteStream {
    serial: Box<dyn SerialPort>,
}

impl SerialByteStream {
    /// Open a serial port for reading meter frames
    pub fn new(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let serial = serialport::new(port, baud_rate).timeout(timeout).open()?;
        log::debug!("Opened {} at {} baud", port, baud_rate);
        Ok(Self { serial })
    }
}

impl ByteStream for SerialByteStream {
    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        Ok(self.serial.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.serial.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.serial.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

/// The serial ports of the machine we are running on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerial;

impl SerialHost for SystemSerial {
    type Stream = SerialByteStream;

    fn list_candidate_endpoints(&self) -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self::Stream, TransportError> {
        SerialByteStream::new(port, baud_rate, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err: TransportError = io::Error::new(io::ErrorKind::BrokenPipe, "unplugged").into();
        assert_eq!(err.to_string(), "IO error: unplugged");
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SystemSerial.open("/dev/does-not-exist-n56fu", DEFAULT_BAUDRATE, DEFAULT_TIMEOUT);
        assert!(result.is_err());
    }
}
