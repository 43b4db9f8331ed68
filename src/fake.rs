use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::serial_stream::{ByteStream, SerialHost, TransportError};

#[derive(Debug, Clone)]
enum Arrival {
    Bytes(Vec<u8>),
    Silence,
    Fail,
}

/// What happened to a fake stream, shared so tests can look at it after the
/// stream has been moved or dropped.
#[derive(Debug, Default)]
pub(crate) struct StreamLog {
    pub reads: usize,
    pub discards: usize,
    pub closed: bool,
}

/// Scripted `ByteStream`. Bytes given to `buffered` are already queued when
/// the stream is opened; `then*` calls describe later arrivals, consumed by
/// `read` (and by `bytes_available` for data) in order. An exhausted script
/// behaves like a silent device.
#[derive(Debug, Default)]
pub(crate) struct FakeStream {
    queued: VecDeque<u8>,
    arrivals: VecDeque<Arrival>,
    log: Rc<RefCell<StreamLog>>,
}

impl FakeStream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn buffered(mut self, bytes: &[u8]) -> Self {
        self.queued.extend(bytes);
        self
    }

    pub(crate) fn then(mut self, bytes: &[u8]) -> Self {
        self.arrivals.push_back(Arrival::Bytes(bytes.to_vec()));
        self
    }

    pub(crate) fn then_silence(mut self) -> Self {
        self.arrivals.push_back(Arrival::Silence);
        self
    }

    pub(crate) fn then_fail(mut self) -> Self {
        self.arrivals.push_back(Arrival::Fail);
        self
    }

    pub(crate) fn log(&self) -> Rc<RefCell<StreamLog>> {
        Rc::clone(&self.log)
    }

    fn failure() -> TransportError {
        io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged").into()
    }
}

impl ByteStream for FakeStream {
    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        match self.arrivals.front() {
            Some(Arrival::Bytes(_)) => {
                if let Some(Arrival::Bytes(bytes)) = self.arrivals.pop_front() {
                    self.queued.extend(bytes);
                }
            }
            Some(Arrival::Fail) => {
                self.arrivals.pop_front();
                return Err(Self::failure());
            }
            Some(Arrival::Silence) | None => {}
        }
        Ok(self.queued.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.log.borrow_mut().reads += 1;
        if self.queued.is_empty() {
            match self.arrivals.pop_front() {
                Some(Arrival::Bytes(bytes)) => self.queued.extend(bytes),
                Some(Arrival::Fail) => return Err(Self::failure()),
                Some(Arrival::Silence) | None => return Ok(0),
            }
        }
        let n = buf.len().min(self.queued.len());
        for (slot, byte) in buf.iter_mut().zip(self.queued.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.log.borrow_mut().discards += 1;
        self.queued.clear();
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

/// Scripted `SerialHost`: lists its ports in insertion order. Each open of a
/// port takes the next stream queued for it; opening an unknown port, or one
/// whose streams are used up, fails like a missing device node.
#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    ports: Vec<String>,
    streams: RefCell<HashMap<String, VecDeque<FakeStream>>>,
    opened: RefCell<Vec<(String, u32, Duration)>>,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue `stream` for the next open of `name`, listing the port once.
    pub(crate) fn with_port(mut self, name: &str, stream: FakeStream) -> Self {
        if !self.ports.iter().any(|port| port == name) {
            self.ports.push(name.to_string());
        }
        self.streams
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push_back(stream);
        self
    }

    /// Port that shows up in the listing but cannot be opened.
    pub(crate) fn with_dead_port(mut self, name: &str) -> Self {
        self.ports.push(name.to_string());
        self
    }

    pub(crate) fn opened(&self) -> Vec<(String, u32, Duration)> {
        self.opened.borrow().clone()
    }
}

impl SerialHost for FakeHost {
    type Stream = FakeStream;

    fn list_candidate_endpoints(&self) -> Result<Vec<String>, TransportError> {
        Ok(self.ports.clone())
    }

    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self::Stream, TransportError> {
        self.opened
            .borrow_mut()
            .push((port.to_string(), baud_rate, timeout));
        self.streams
            .borrow_mut()
            .get_mut(port)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                TransportError::from(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such port {port}"),
                ))
            })
    }
}

/// Build a 14-byte frame from its display characters, decimal point digit and
/// status group.
pub(crate) fn frame(digits: &[u8; 5], dp: u8, status: [u8; 5]) -> Vec<u8> {
    let mut bytes = digits.to_vec();
    bytes.push(b' ');
    bytes.push(dp);
    bytes.extend_from_slice(&status);
    bytes.extend_from_slice(b"\r\n");
    bytes
}
