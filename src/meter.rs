use std::collections::HashSet;

use crate::frame_decoder::{decode, device_id, DecodedState, Function};
use crate::frame_reader::{read_frame, AcquireError, RawFrame, FRAME_LEN};
use crate::serial_stream::{
    ByteStream, SerialByteStream, TransportError, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT,
};

/// An N56FU meter on an open serial stream.
#[derive(Debug)]
pub struct N56fuMeter<S: ByteStream = SerialByteStream> {
    stream: S,
    port: String,
    id: String,
}

impl N56fuMeter<SerialByteStream> {
    /// Open the meter on `port` with the protocol's baud rate and timeout
    pub fn open(port: &str) -> Result<Self, TransportError> {
        let stream = SerialByteStream::new(port, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT)?;
        Ok(Self::new(stream, port))
    }
}

impl<S: ByteStream> N56fuMeter<S> {
    /// Wrap an already opened stream. `port` is only used for the device id.
    pub fn new(stream: S, port: &str) -> Self {
        Self {
            stream,
            port: port.to_string(),
            id: device_id(port),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Give back the stream, closing nothing.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Read one frame, usually discarding queued input first so the frame
    /// reflects what the meter shows now.
    ///
    /// A frame of the wrong length is retried once; a timeout is not retried.
    /// When the retry itself times out the frame is reported as zero bytes long.
    pub fn get_raw(&mut self, flush: bool) -> Result<RawFrame, AcquireError> {
        if flush {
            self.stream.discard_input()?;
        }

        let mut line = read_frame(&mut self.stream)?;
        if line.len() != FRAME_LEN {
            log::debug!(
                "Got a {} byte frame on {}, reading again",
                line.len(),
                self.port
            );
            line = match read_frame(&mut self.stream) {
                Err(AcquireError::Timeout) => Vec::new(),
                other => other?,
            };
        }

        RawFrame::try_from(line.as_slice())
    }

    /// Read and decode the current meter state
    pub fn get_state(&mut self, flush: bool) -> Result<DecodedState, AcquireError> {
        let raw = self.get_raw(flush)?;
        Ok(decode(&raw, &self.port))
    }

    /// Current reading as text, e.g. `+012.34 mV auto dc`, or the error tag
    /// when no reading could be taken.
    pub fn get_reading(&mut self, flush: bool) -> String {
        match self.get_state(flush) {
            Ok(state) => state.to_string(),
            Err(e) => {
                log::debug!("No reading from {}: {}", self.port, e);
                e.tag().to_string()
            }
        }
    }

    /// Check that the meter is in `function` with exactly `modes` active.
    ///
    /// Both comparisons ignore case; mode order does not matter.
    pub fn is_set<M: AsRef<str>>(
        &mut self,
        function: &str,
        modes: &[M],
        flush: bool,
    ) -> Result<bool, AcquireError> {
        let state = self.get_state(flush)?;
        if matches!(state.function, Function::Unknown(_))
            || !state.function.as_str().eq_ignore_ascii_case(function)
        {
            return Ok(false);
        }

        let wanted: HashSet<String> = modes
            .iter()
            .map(|mode| mode.as_ref().to_lowercase())
            .collect();
        let active: HashSet<String> = state
            .modes
            .iter()
            .map(|mode| mode.as_str().to_string())
            .collect();

        Ok(wanted == active)
    }
}
