use std::thread;
use std::time::{Duration, Instant};

use crate::frame_reader::{is_frame_signature, read_line_until_quiet, FRAME_LEN};
use crate::meter::N56fuMeter;
use crate::serial_stream::{
    ByteStream, SerialHost, SystemSerial, TransportError, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT,
};

/// Settings for recognising a meter on a port.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub baud_rate: u32,
    /// How long to wait for a full frame, also used as the read timeout
    pub timeout: Duration,
    /// Pause between checks of the input queue while waiting
    pub poll_interval: Duration,
    /// Ports whose name does not start with this are skipped without opening
    pub port_name_prefix: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let port_name_prefix = if cfg!(target_os = "linux") {
            Some("/dev/ttyUSB".to_string())
        } else {
            None
        };

        Self {
            baud_rate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_millis(10),
            port_name_prefix,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MeterConnectorError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Port {port} is not an N56FU meter")]
    InvalidPort { port: String },

    #[error("No N56FU meter found. Please connect a meter or specify the port manually")]
    DeviceNotFound,
}

pub struct MeterConnector<H: SerialHost = SystemSerial> {
    host: H,
    config: ProbeConfig,
}

impl MeterConnector<SystemSerial> {
    /// Connector for the serial ports of this machine
    pub fn new() -> Self {
        Self::with_host(SystemSerial, ProbeConfig::default())
    }
}

impl Default for MeterConnector<SystemSerial> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: SerialHost> MeterConnector<H> {
    pub fn with_host(host: H, config: ProbeConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Connect to a meter
    ///
    /// With a port given it is probed first; without one the first port
    /// found by [`Self::find_ports`] is used.
    pub fn connect(&self, port: Option<&str>) -> Result<N56fuMeter<H::Stream>, MeterConnectorError> {
        let port = if let Some(port) = port {
            log::debug!("Connecting to N56FU on port {}", port);
            if !self.probe(port) {
                return Err(MeterConnectorError::InvalidPort {
                    port: port.to_string(),
                });
            }
            port.to_string()
        } else {
            self.find_ports()?
                .into_iter()
                .next()
                .ok_or(MeterConnectorError::DeviceNotFound)?
        };

        let stream = self
            .host
            .open(&port, self.config.baud_rate, self.config.timeout)?;
        Ok(N56fuMeter::new(stream, &port))
    }

    /// All ports with a meter attached, in the order the host lists them
    pub fn find_ports(&self) -> Result<Vec<String>, MeterConnectorError> {
        log::debug!("Looking for ports");
        let ports = self.host.list_candidate_endpoints()?;

        Ok(ports
            .into_iter()
            .filter(|port| {
                log::debug!("Found port {}", port);
                self.probe(port)
            })
            .collect())
    }

    /// Listen on a port for meter frames. Never fails: any transport problem
    /// counts as "no meter here".
    pub fn probe(&self, port: &str) -> bool {
        if let Some(prefix) = &self.config.port_name_prefix {
            if !port.starts_with(prefix.as_str()) {
                return false;
            }
        }

        log::debug!("Testing port {}", port);
        match self.try_probe(port) {
            Ok(true) => {
                log::debug!("Found an N56FU on port {}", port);
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("An error occurred whilst testing port {}: {}", port, e);
                false
            }
        }
    }

    fn try_probe(&self, port: &str) -> Result<bool, TransportError> {
        let mut stream = self
            .host
            .open(port, self.config.baud_rate, self.config.timeout)?;

        if !self.wait_for_frame(&mut stream)? {
            log::debug!("Not enough data on {} within {:?}", port, self.config.timeout);
            return Ok(false);
        }

        let Some(line) = read_line_until_quiet(&mut stream)? else {
            log::debug!("Line on {} stopped before its terminator", port);
            return Ok(false);
        };
        drop(stream);

        Ok(is_frame_signature(&line))
    }

    /// Poll the input queue until a whole frame is waiting or the timeout
    /// runs out.
    fn wait_for_frame(&self, stream: &mut H::Stream) -> Result<bool, TransportError> {
        let deadline = Instant::now() + self.config.timeout;

        while stream.bytes_available()? < FRAME_LEN {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            thread::sleep(self.config.poll_interval.min(deadline - now));
        }
        Ok(true)
    }
}
