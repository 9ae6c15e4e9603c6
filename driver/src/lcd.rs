use std::{error, fmt};

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;
use hd44780_driver::bus::{DataBus, FourBitBus};
use hd44780_driver::{Cursor, CursorBlink, Display, DisplayMode, HD44780};

use crate::hal::TextScreen;

/// Character panel on an HD44780 controller, fronted by the [`TextScreen`]
/// seam. The stock wiring is the 4-bit bus: rs, enable, and four data lines.
pub struct Hd44780Screen<B: DataBus, D> {
    drv: HD44780<B>,
    delay: D,
}

/// Panel over six same-typed lines, the stock wiring.
pub type Screen4bit<P, D> = Hd44780Screen<FourBitBus<P, P, P, P, P, P>, D>;

#[derive(Debug, Clone)]
pub enum Error {
    Init,
    SetCursorPos,
    WriteStr,
    Clear,
    Visibility,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Init => write!(f, "LCD initialization error"),
            Error::SetCursorPos => write!(f, "could not set cursor pos"),
            Error::WriteStr => write!(f, "could not write string"),
            Error::Clear => write!(f, "could not clear display"),
            Error::Visibility => write!(f, "could not toggle display visibility"),
        }
    }
}

impl error::Error for Error {}

impl<RS, EN, D4, D5, D6, D7, D> Hd44780Screen<FourBitBus<RS, EN, D4, D5, D6, D7>, D>
where
    RS: OutputPin,
    EN: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
    D: DelayMs<u8> + DelayUs<u16>,
{
    pub fn new_4bit(
        rs: RS,
        en: EN,
        d4: D4,
        d5: D5,
        d6: D6,
        d7: D7,
        mut delay: D,
    ) -> Result<Self, Error> {
        let drv =
            HD44780::new_4bit(rs, en, d4, d5, d6, d7, &mut delay).map_err(|_| Error::Init)?;

        Ok(Hd44780Screen { drv, delay })
    }
}

impl<B, D> Hd44780Screen<B, D>
where
    B: DataBus,
    D: DelayMs<u8> + DelayUs<u16>,
{
    pub fn new(drv: HD44780<B>, delay: D) -> Self {
        Hd44780Screen { drv, delay }
    }

    /// Resets the controller into a visible, cursor-less mode.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.drv.reset(&mut self.delay).map_err(|_| Error::Init)?;
        self.drv.clear(&mut self.delay).map_err(|_| Error::Init)?;
        self.drv
            .set_display_mode(
                DisplayMode {
                    display: Display::On,
                    cursor_visibility: Cursor::Invisible,
                    cursor_blink: CursorBlink::Off,
                },
                &mut self.delay,
            )
            .map_err(|_| Error::Init)?;

        Ok(())
    }
}

impl<B, D> TextScreen for Hd44780Screen<B, D>
where
    B: DataBus,
    D: DelayMs<u8> + DelayUs<u16>,
{
    type Error = Error;

    fn clear(&mut self) -> Result<(), Error> {
        self.drv.clear(&mut self.delay).map_err(|_| Error::Clear)
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error> {
        // DDRAM rows sit 0x40 apart.
        self.drv
            .set_cursor_pos(row * 0x40 + col, &mut self.delay)
            .map_err(|_| Error::SetCursorPos)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Error> {
        for c in text.chars() {
            if c.is_ascii() {
                self.drv
                    .write_byte(c as u8, &mut self.delay)
                    .map_err(|_| Error::WriteStr)?;
            }
        }

        Ok(())
    }

    fn write_byte(&mut self, glyph: u8) -> Result<(), Error> {
        self.drv
            .write_byte(glyph, &mut self.delay)
            .map_err(|_| Error::WriteStr)
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), Error> {
        let display = if visible { Display::On } else { Display::Off };
        self.drv
            .set_display_mode(
                DisplayMode {
                    display,
                    cursor_visibility: Cursor::Invisible,
                    cursor_blink: CursorBlink::Off,
                },
                &mut self.delay,
            )
            .map_err(|_| Error::Visibility)
    }
}
