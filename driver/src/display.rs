use embedded_hal::blocking::delay::DelayMs;

use crate::hal::TextScreen;

// Status layout.
const LAMP_LABEL: (u8, u8) = (0, 0);
const LAMP_VALUE: (u8, u8) = (5, 0);
const HUMIDIFIER_LABEL: (u8, u8) = (0, 1);
const HUMIDIFIER_VALUE: (u8, u8) = (11, 1);
const FAN_LABEL: (u8, u8) = (9, 0);
const FAN_VALUE: (u8, u8) = (13, 0);

// Readings layout.
const TEMPERATURE_CELL: (u8, u8) = (0, 0);
const DEGREE_CELL: (u8, u8) = (2, 0);
const AT_CELL: (u8, u8) = (4, 0);
const HUMIDITY_CELL: (u8, u8) = (6, 0);
const PERCENT_CELL: (u8, u8) = (8, 0);
const DAY_LABEL_CELL: (u8, u8) = (10, 0);
const DAY_VALUE_CELL: (u8, u8) = (14, 0);
const DATE_CELL: (u8, u8) = (0, 1);
const TIME_CELL: (u8, u8) = (10, 1);
const INDICATOR_CELL: (u8, u8) = (15, 1);

/// Degree symbol in the HD44780 character ROM.
const DEGREE_GLYPH: u8 = 223;

const SPLASH_HOLD_MS: u16 = 2000;

/// Strings shown by the splash sequence.
#[derive(Debug, Clone)]
pub struct Banner {
    pub greeting: String,
    pub name_version: String,
}

impl Default for Banner {
    fn default() -> Self {
        Banner {
            greeting: "Hatch'em'All".into(),
            name_version: "MeerkatEgger v1.1".into(),
        }
    }
}

fn onoff(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Fixed-layout renderer for the appliance's two 16x2 screens. Every update
/// clears and redraws the whole grid; there is no partial update path.
pub struct Display<S, D> {
    screen: S,
    delay: D,
    banner: Banner,
    muted: bool,
}

impl<S, D, E> Display<S, D>
where
    S: TextScreen<Error = E>,
    D: DelayMs<u16>,
{
    pub fn new(screen: S, delay: D, banner: Banner) -> Self {
        Display {
            screen,
            delay,
            banner,
            muted: false,
        }
    }

    /// Two-screen splash: greeting, hold, name/version, hold. Blocks for the
    /// holds on purpose.
    pub fn begin(&mut self) -> Result<(), E> {
        self.screen.clear()?;
        self.screen.write_str(&self.banner.greeting)?;
        self.delay.delay_ms(SPLASH_HOLD_MS);
        self.screen.set_cursor(0, 1)?;
        self.screen.write_str(&self.banner.name_version)?;
        self.delay.delay_ms(SPLASH_HOLD_MS);
        Ok(())
    }

    /// Clears the grid and homes the cursor.
    pub fn reset(&mut self) -> Result<(), E> {
        self.screen.clear()
    }

    /// Blanks or restores the panel. Two calls cancel out.
    pub fn mute(&mut self) -> Result<(), E> {
        self.screen.set_visible(self.muted)?;
        self.muted = !self.muted;
        Ok(())
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Full redraw of the status layout.
    pub fn update_statuses(&mut self, lamp: bool, humidifier: bool, fan: bool) -> Result<(), E> {
        self.screen.clear()?;
        self.text_at(LAMP_LABEL, "Lamp")?;
        self.text_at(HUMIDIFIER_LABEL, "Humidifier")?;
        self.text_at(FAN_LABEL, "Fan")?;
        self.text_at(LAMP_VALUE, onoff(lamp))?;
        self.text_at(HUMIDIFIER_VALUE, onoff(humidifier))?;
        self.text_at(FAN_VALUE, onoff(fan))
    }

    /// Full redraw of the readings layout. Temperature and humidity are
    /// truncated toward zero, never rounded.
    #[allow(clippy::cast_possible_truncation)]
    pub fn update_sensor_readings(
        &mut self,
        temperature: f32,
        humidity: f32,
        date: &str,
        time: &str,
    ) -> Result<(), E> {
        self.screen.clear()?;
        self.text_at(TEMPERATURE_CELL, &format!("{}", temperature as i32))?;
        self.glyph_at(DEGREE_CELL, DEGREE_GLYPH)?;
        self.glyph_at(AT_CELL, b'@')?;
        self.text_at(HUMIDITY_CELL, &format!("{}", humidity as i32))?;
        self.glyph_at(PERCENT_CELL, b'%')?;
        self.text_at(DAY_LABEL_CELL, "Day")?;
        // TODO: wire a real value in once elapsed-day tracking exists.
        self.text_at(DAY_VALUE_CELL, "99")?;
        self.text_at(DATE_CELL, date)?;
        self.text_at(TIME_CELL, time)
    }

    /// Heartbeat glyph marking "a reading just happened".
    pub fn show_reading_indicator(&mut self) -> Result<(), E> {
        self.glyph_at(INDICATOR_CELL, b'*')
    }

    pub fn clear_reading_indicator(&mut self) -> Result<(), E> {
        self.glyph_at(INDICATOR_CELL, b' ')
    }

    fn text_at(&mut self, (col, row): (u8, u8), text: &str) -> Result<(), E> {
        self.screen.set_cursor(col, row)?;
        self.screen.write_str(text)
    }

    fn glyph_at(&mut self, (col, row): (u8, u8), glyph: u8) -> Result<(), E> {
        self.screen.set_cursor(col, row)?;
        self.screen.write_byte(glyph)
    }
}
