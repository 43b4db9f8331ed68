use std::fmt;

use crate::frame_reader::RawFrame;

/// Prefix of every device id.
pub const DEVICE_TAG: &str = "n56fu";

/// Value of the second status byte that selects the nano multiplier.
///
/// Compared for equality, not as a bit. A variant setting this bit together
/// with the max/min bits would decode as max/min with the third byte's
/// multiplier.
pub const NANO_MARKER: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Auto,
    Dc,
    Ac,
    Rel,
    Hold,
    Max,
    Min,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Dc => "dc",
            Mode::Ac => "ac",
            Mode::Rel => "rel",
            Mode::Hold => "hold",
            Mode::Max => "max",
            Mode::Min => "min",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Emission order of the flags is part of the reading text.
const MODE_FLAGS_A: [(u8, Mode); 5] = [
    (32, Mode::Auto),
    (16, Mode::Dc),
    (8, Mode::Ac),
    (4, Mode::Rel),
    (2, Mode::Hold),
];

const MODE_FLAGS_B: [(u8, Mode); 2] = [(32, Mode::Max), (16, Mode::Min)];

fn flags_set(byte: u8, table: &[(u8, Mode)]) -> impl Iterator<Item = Mode> + '_ {
    table
        .iter()
        .filter(move |(bit, _)| byte & bit == *bit)
        .map(|(_, mode)| *mode)
}

/// What the meter is measuring, selected by the fourth status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Voltage,
    Current,
    Resistance,
    Hfe,
    Frequency,
    Capacitance,
    Centigrade,
    Fahrenheit,
    DutyCycle,
    /// Selector value outside the known table.
    Unknown(u8),
}

impl Function {
    pub fn from_selector(selector: u8) -> Self {
        match selector {
            128 => Function::Voltage,
            64 => Function::Current,
            32 => Function::Resistance,
            16 => Function::Hfe,
            8 => Function::Frequency,
            4 => Function::Capacitance,
            2 => Function::Centigrade,
            1 => Function::Fahrenheit,
            0 => Function::DutyCycle,
            other => Function::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Voltage => "Voltage",
            Function::Current => "Current",
            Function::Resistance => "Resistance",
            Function::Hfe => "hFE",
            Function::Frequency => "Frequency",
            Function::Capacitance => "Capacitance",
            Function::Centigrade => "Centigrade",
            Function::Fahrenheit => "Fahrenheit",
            Function::DutyCycle => "DutyCycle",
            Function::Unknown(_) => "Unknown",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Function::Voltage => "V",
            Function::Current => "A",
            Function::Resistance => "R",
            Function::Hfe => "hFE",
            Function::Frequency => "Hz",
            Function::Capacitance => "F",
            Function::Centigrade => "tC",
            Function::Fahrenheit => "tF",
            Function::DutyCycle | Function::Unknown(_) => "",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Unknown(selector) => write!(f, "Unknown(0x{:02X})", selector),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Scale between the displayed digits and the physical value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplier {
    pub symbol: &'static str,
    pub factor: f64,
}

impl Multiplier {
    pub const NONE: Multiplier = Multiplier { symbol: "", factor: 1.0 };
    pub const NANO: Multiplier = Multiplier { symbol: "n", factor: 1e-9 };
    pub const MICRO: Multiplier = Multiplier { symbol: "u", factor: 1e-6 };
    pub const MILLI: Multiplier = Multiplier { symbol: "m", factor: 1e-3 };
    pub const KILO: Multiplier = Multiplier { symbol: "k", factor: 1e3 };
    pub const MEGA: Multiplier = Multiplier { symbol: "M", factor: 1e6 };
    pub const PERCENT: Multiplier = Multiplier { symbol: "%", factor: 1.0 };

    /// Multiplier for the third status byte. Unknown selectors scale by one.
    pub fn from_selector(selector: u8) -> Self {
        match selector {
            128 => Self::MICRO,
            64 => Self::MILLI,
            32 => Self::KILO,
            16 => Self::MEGA,
            2 => Self::PERCENT,
            _ => Self::NONE,
        }
    }
}

/// Everything one frame tells about the meter.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    pub id: String,
    /// Display text with the decimal point placed.
    pub display: String,
    /// Physical value; zero while the display shows `?`, NaN if the display
    /// is not a number.
    pub value: f64,
    pub multiplier: Multiplier,
    pub function: Function,
    pub modes: Vec<Mode>,
    pub bargraph: u8,
}

impl DecodedState {
    pub fn units(&self) -> &'static str {
        self.function.units()
    }

    pub fn multiplier_symbol(&self) -> &'static str {
        self.multiplier.symbol
    }
}

impl fmt::Display for DecodedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.display,
            self.multiplier.symbol,
            self.function.units()
        )?;
        for mode in &self.modes {
            write!(f, " {mode}")?;
        }
        Ok(())
    }
}

/// Device id for a port: the device tag followed by the port name without
/// its `/dev/` directory.
pub fn device_id(port: &str) -> String {
    format!("{}-{}", DEVICE_TAG, port.strip_prefix("/dev/").unwrap_or(port))
}

/// Display text of a frame with the decimal point inserted.
pub fn decode_display(raw: &RawFrame) -> String {
    let digits = raw.digits();
    let dp = match raw.decimal_point() {
        b @ b'0'..=b'9' => usize::from(b - b'0'),
        _ => 0,
    };
    // The meter reports position 4 when it shows position 3.
    let dp = if dp == 4 { 3 } else { dp };

    if dp == 0 {
        return String::from_utf8_lossy(digits).into_owned();
    }
    let split = (dp + 1).min(digits.len());
    format!(
        "{}.{}",
        String::from_utf8_lossy(&digits[..split]),
        String::from_utf8_lossy(&digits[split..])
    )
}

/// Decode a frame read from `port`. Never fails.
pub fn decode(raw: &RawFrame, port: &str) -> DecodedState {
    let status = raw.status();
    let display = decode_display(raw);
    let function = Function::from_selector(status[3]);

    let mut modes: Vec<Mode> = flags_set(status[0], &MODE_FLAGS_A).collect();
    let multiplier = if status[1] == NANO_MARKER {
        Multiplier::NANO
    } else {
        modes.extend(flags_set(status[1], &MODE_FLAGS_B));
        Multiplier::from_selector(status[2])
    };

    let value = if display.chars().nth(1) == Some('?') {
        0.0
    } else {
        display
            .trim()
            .parse::<f64>()
            .map_or(f64::NAN, |shown| shown * multiplier.factor)
    };

    DecodedState {
        id: device_id(port),
        display,
        value,
        multiplier,
        function,
        modes,
        bargraph: status[4],
    }
}
