//! Real-line wiring over the gpio character device. Everything here is
//! compiled only with the `hardware` feature; the rest of the crate runs
//! against the in-memory seams.

use std::collections::HashMap;
use std::{error, fmt};

use linux_embedded_hal::gpio_cdev::errors::Error as GpioError;
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};

use greenbutler_driver::dht::Dht11Probe;
use greenbutler_driver::hal::{DigitalIo, Level};
use greenbutler_driver::lcd::{self, Screen4bit};

use crate::config::PinConfig;

const CONSUMER: &str = "greenbutler";

#[derive(Debug)]
pub enum HwError {
    Gpio(GpioError),
    UnmappedLine(u8),
    Lcd(lcd::Error),
}

impl From<GpioError> for HwError {
    fn from(value: GpioError) -> Self {
        HwError::Gpio(value)
    }
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwError::Gpio(_) => write!(f, "gpio character device error"),
            HwError::UnmappedLine(pin) => write!(f, "line {pin} was never requested"),
            HwError::Lcd(_) => write!(f, "LCD bring-up error"),
        }
    }
}

impl error::Error for HwError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            HwError::Gpio(e) => Some(e),
            HwError::Lcd(e) => Some(e),
            HwError::UnmappedLine(_) => None,
        }
    }
}

fn raw_level(level: Level) -> u8 {
    match level {
        Level::Low => 0,
        Level::High => 1,
    }
}

/// A handful of lines requested individually on one gpio chip, addressed by
/// their offsets.
pub struct CdevIo {
    lines: HashMap<u8, LineHandle>,
}

impl CdevIo {
    /// Requests `outputs` (with their initial levels) and `inputs` on the
    /// chip at `path`.
    pub fn open(path: &str, outputs: &[(u8, Level)], inputs: &[u8]) -> Result<Self, HwError> {
        let mut chip = Chip::new(path)?;
        let mut lines = HashMap::new();

        for &(offset, level) in outputs {
            let handle = chip.get_line(u32::from(offset))?.request(
                LineRequestFlags::OUTPUT,
                raw_level(level),
                CONSUMER,
            )?;
            lines.insert(offset, handle);
        }
        for &offset in inputs {
            let handle =
                chip.get_line(u32::from(offset))?
                    .request(LineRequestFlags::INPUT, 0, CONSUMER)?;
            lines.insert(offset, handle);
        }

        Ok(CdevIo { lines })
    }

    fn line(&self, pin: u8) -> Result<&LineHandle, HwError> {
        self.lines.get(&pin).ok_or(HwError::UnmappedLine(pin))
    }
}

impl DigitalIo for CdevIo {
    type Error = HwError;

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), HwError> {
        self.line(pin)?.set_value(raw_level(level))?;
        Ok(())
    }

    fn read_level(&mut self, pin: u8) -> Result<Level, HwError> {
        let raw = self.line(pin)?.get_value()?;
        Ok(if raw == 0 { Level::Low } else { Level::High })
    }
}

/// Relay coil lines, parked at the OFF level.
pub fn open_relays(path: &str, pins: &PinConfig) -> Result<CdevIo, HwError> {
    CdevIo::open(
        path,
        &[
            (pins.relay_lamp, Level::High),
            (pins.relay_humidifier, Level::High),
            (pins.relay_fan, Level::High),
        ],
        &[],
    )
}

/// Buzzer output (silent) and the mode-switch input.
pub fn open_panel(path: &str, pins: &PinConfig) -> Result<CdevIo, HwError> {
    CdevIo::open(path, &[(pins.buzzer, Level::Low)], &[pins.mode_switch])
}

/// Brings the panel up on the six configured LCD lines.
pub fn open_screen(path: &str, pins: &PinConfig) -> Result<Screen4bit<CdevPin, Delay>, HwError> {
    let mut chip = Chip::new(path)?;
    let mut out = |offset: u8| -> Result<CdevPin, HwError> {
        let handle =
            chip.get_line(u32::from(offset))?
                .request(LineRequestFlags::OUTPUT, 0, CONSUMER)?;
        Ok(CdevPin::new(handle)?)
    };

    let mut screen = Screen4bit::new_4bit(
        out(pins.lcd_rs)?,
        out(pins.lcd_enable)?,
        out(pins.lcd_d4)?,
        out(pins.lcd_d5)?,
        out(pins.lcd_d6)?,
        out(pins.lcd_d7)?,
        Delay,
    )
    .map_err(HwError::Lcd)?;
    screen.initialize().map_err(HwError::Lcd)?;

    Ok(screen)
}

/// The probe's data line, requested open-drain and released high.
pub fn open_probe(path: &str, pins: &PinConfig) -> Result<Dht11Probe<CdevPin, Delay>, HwError> {
    let mut chip = Chip::new(path)?;
    let handle = chip.get_line(u32::from(pins.dht_data))?.request(
        LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
        1,
        CONSUMER,
    )?;
    let pin = CdevPin::new(handle)?;

    Ok(Dht11Probe::new(pin, Delay))
}
