use std::{error, fmt};

/// Logic level on a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// Bank of numbered digital lines, addressed by pin offset.
pub trait DigitalIo {
    type Error;

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Self::Error>;
    fn read_level(&mut self, pin: u8) -> Result<Level, Self::Error>;
}

/// Fixed-grid character panel addressed by (column, row).
pub trait TextScreen {
    type Error;

    /// Blanks the grid and homes the cursor.
    fn clear(&mut self) -> Result<(), Self::Error>;
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error>;
    fn write_byte(&mut self, b: u8) -> Result<(), Self::Error>;
    /// Shows or blanks the panel without touching its contents.
    fn set_visible(&mut self, visible: bool) -> Result<(), Self::Error>;
}

/// One combined temperature/humidity measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Percent relative humidity.
    pub humidity: f32,
}

/// Combined temperature/humidity probe.
pub trait HygroProbe {
    fn read(&mut self) -> Result<Reading, ProbeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    Checksum,
    Timeout,
    Bus,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Checksum => write!(f, "probe reply failed checksum"),
            ProbeError::Timeout => write!(f, "probe did not answer in time"),
            ProbeError::Bus => write!(f, "could not drive the probe line"),
        }
    }
}

impl error::Error for ProbeError {}
