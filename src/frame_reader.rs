use crate::serial_stream::{ByteStream, TransportError};

/// Length of a complete frame, terminator included.
pub const FRAME_LEN: usize = 14;

/// Every frame ends with CR LF.
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// Give up on a line that grew this long without a terminator.
pub const MAX_LINE_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("Timeout: the meter sent no data")]
    Timeout,

    #[error("Frame length mismatch: expected 14 bytes but got {length}")]
    LengthMismatch { length: usize },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}

impl AcquireError {
    /// Short tag shown in place of a reading.
    pub fn tag(&self) -> &'static str {
        match self {
            AcquireError::Timeout => "!timeout",
            AcquireError::LengthMismatch { .. } => "!length",
            AcquireError::TransportFailure(_) => "!transport",
        }
    }
}

/// A complete, length-checked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The five display characters.
    pub fn digits(&self) -> &[u8] {
        &self.0[..5]
    }

    /// The raw decimal point byte.
    pub fn decimal_point(&self) -> u8 {
        self.0[6]
    }

    /// The status group preceding the terminator.
    pub fn status(&self) -> [u8; 5] {
        [self.0[7], self.0[8], self.0[9], self.0[10], self.0[11]]
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = AcquireError;

    fn try_from(line: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; FRAME_LEN] = line
            .try_into()
            .map_err(|_| AcquireError::LengthMismatch { length: line.len() })?;
        Ok(Self(bytes))
    }
}

/// Read bytes until the line terminator.
///
/// Only a first read that returns nothing counts as a timeout. Once a line has
/// started, empty reads are retried, each one waiting for the stream timeout.
pub fn read_frame<S: ByteStream + ?Sized>(stream: &mut S) -> Result<Vec<u8>, AcquireError> {
    let mut line = Vec::with_capacity(FRAME_LEN);
    let mut byte = [0u8; 1];

    while !line.ends_with(TERMINATOR) {
        if stream.read(&mut byte)? == 0 {
            if line.is_empty() {
                return Err(AcquireError::Timeout);
            }
            continue;
        }
        line.push(byte[0]);

        if line.len() >= MAX_LINE_LEN {
            log::debug!("No terminator after {} bytes, giving up on line", line.len());
            break;
        }
    }

    log::trace!("Read line {:02X?}", line);
    Ok(line)
}

/// Read bytes until the line terminator, but stop at the first read that
/// returns nothing.
///
/// `Ok(None)` means the line went quiet before its terminator arrived, so the
/// whole call never waits longer than one stream timeout past the last byte.
pub fn read_line_until_quiet<S: ByteStream + ?Sized>(
    stream: &mut S,
) -> Result<Option<Vec<u8>>, TransportError> {
    let mut line = Vec::with_capacity(FRAME_LEN);
    let mut byte = [0u8; 1];

    while !line.ends_with(TERMINATOR) && line.len() < MAX_LINE_LEN {
        if stream.read(&mut byte)? == 0 {
            log::trace!("Line went quiet after {:02X?}", line);
            return Ok(None);
        }
        line.push(byte[0]);
    }
    Ok(Some(line))
}

/// The shape check used to recognise a meter: one full frame led by a sign.
pub fn is_frame_signature(line: &[u8]) -> bool {
    line.len() == FRAME_LEN && matches!(line.first(), Some(b'+' | b'-'))
}
