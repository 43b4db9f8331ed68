//! # N56FU RS
//!
//! A Rust library for reading the Precision Gold N56FU USB multimeter (and its
//! rebadges) over its serial link.
//!
//! The meter streams 14-byte frames at 2400 baud without being asked. This
//! library finds the port a meter is attached to, splits the stream into
//! frames and decodes each frame into the value, unit, multiplier, function
//! and display modes the meter shows.
//!
//! ## Features
//!
//! - **Port discovery**: Uses `serialport` to list ports and recognises a meter
//!   by listening for a frame
//! - **Frame decoding**: Decimal point placement, multipliers, mode flags and
//!   function selectors
//! - **Readings**: Human readable reading lines, or the full decoded state
//! - **State checks**: Confirm the meter is in a given function with a given
//!   set of modes, for automated test setups
//! - **Testable**: All protocol logic runs on the [`ByteStream`] and
//!   [`SerialHost`] traits, so it works against any byte source
//!
//! ## Examples
//!
//! ### Discovery and Readings
//!
//! ```rust,no_run
//! use n56fu_rs::MeterConnector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = MeterConnector::new();
//!
//! for port in connector.find_ports()? {
//!     println!("Found meter at {}", port);
//! }
//!
//! // Connect to the first meter found, or use Some("/dev/ttyUSB0")
//! let mut meter = connector.connect(None)?;
//! let reading = meter.get_reading(true);
//! println!("{}: {}", meter.id(), reading);
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoded State
//!
//! ```rust,no_run
//! use n56fu_rs::{Function, Mode, N56fuMeter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut meter = N56fuMeter::open("/dev/ttyUSB0")?;
//!
//! let state = meter.get_state(true)?;
//! if state.function == Function::Voltage && state.modes.contains(&Mode::Dc) {
//!     println!("{} V DC", state.value);
//! }
//!
//! // Is the meter on auto-ranging DC volts, and nothing else?
//! assert!(meter.is_set("voltage", &["auto", "dc"], true)?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoding a Frame
//!
//! ```rust
//! use n56fu_rs::{decode, Function, RawFrame};
//!
//! let bytes = b"+0123 2\x30\x00\x40\x80\x05\r\n";
//! let raw = RawFrame::try_from(bytes.as_slice()).unwrap();
//! let state = decode(&raw, "/dev/ttyUSB0");
//!
//! assert_eq!(state.id, "n56fu-ttyUSB0");
//! assert_eq!(state.function, Function::Voltage);
//! assert_eq!(state.to_string(), "+01.23 mV auto dc");
//! ```

pub mod frame_decoder;
pub mod frame_reader;
pub mod meter;
pub mod meter_connector;
pub mod serial_stream;

#[cfg(test)]
pub(crate) mod fake;

pub use frame_decoder::{decode, DecodedState, Function, Mode, Multiplier};

pub use frame_reader::{read_frame, read_line_until_quiet, AcquireError, RawFrame, FRAME_LEN};

pub use meter::N56fuMeter;

pub use meter_connector::{MeterConnector, MeterConnectorError, ProbeConfig};

pub use serial_stream::{
    ByteStream, SerialByteStream, SerialHost, SystemSerial, TransportError, DEFAULT_BAUDRATE,
    DEFAULT_TIMEOUT,
};
