use std::error;
use std::thread;
use std::time::Duration;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use eyre::Result;
use log::{debug, info};

use greenbutler_driver::{
    Device, DigitalIo, Display, HygroProbe, Level, Relay, Sensors, TextScreen,
};

use crate::config::AppConfig;
use crate::control::{self, Thresholds};

/// How long the reading indicator stays up after a successful poll.
const INDICATOR_HOLD_MS: u64 = 1000;
/// Length of one alarm chirp.
const CHIRP_MS: u16 = 200;

/// Which screen the mode switch selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Statuses,
    Readings,
}

/// Buzzer and mode-switch line offsets.
#[derive(Debug, Clone, Copy)]
pub struct PanelPins {
    pub buzzer: u8,
    pub mode_switch: u8,
}

fn onoff(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// The assembled appliance. An external loop advances it by calling
/// [`Butler::process`] with the current time and wall-clock strings; screen
/// selection, poll cadence, threshold decisions, the reading indicator, and
/// the failure alarm all live here.
pub struct Butler<IO, S, D, P> {
    relay: Relay<IO>,
    display: Display<S, D>,
    sensors: Sensors<P>,
    panel: IO,
    panel_pins: PanelPins,
    thresholds: Thresholds,
    read_interval_ms: u64,
    alarm_after: u32,
    delay: D,
    last_poll_at: Option<u64>,
    indicator_until: Option<u64>,
    rendered_mode: Option<ScreenMode>,
}

impl<IO, S, D, P, EIO, ES> Butler<IO, S, D, P>
where
    IO: DigitalIo<Error = EIO>,
    S: TextScreen<Error = ES>,
    D: DelayMs<u16>,
    P: HygroProbe,
    EIO: error::Error + Send + Sync + 'static,
    ES: error::Error + Send + Sync + 'static,
{
    pub fn new(
        relay: Relay<IO>,
        display: Display<S, D>,
        sensors: Sensors<P>,
        panel: IO,
        delay: D,
        cfg: &AppConfig,
    ) -> Self {
        Butler {
            relay,
            display,
            sensors,
            panel,
            panel_pins: PanelPins {
                buzzer: cfg.pins.buzzer,
                mode_switch: cfg.pins.mode_switch,
            },
            thresholds: cfg.thresholds(),
            read_interval_ms: cfg.sensor.read_interval_ms,
            alarm_after: cfg.sensor.alarm_after_failures,
            delay,
            last_poll_at: None,
            indicator_until: None,
            rendered_mode: None,
        }
    }

    /// Splash sequence, relay park, buzzer silent. Blocks for the splash
    /// holds.
    pub fn begin(&mut self) -> Result<()> {
        self.display.begin()?;
        self.relay.begin()?;
        self.panel.write_level(self.panel_pins.buzzer, Level::Low)?;
        Ok(())
    }

    /// One tick. A failed poll holds every actuator where it is and keeps
    /// the previous frame; the screen redraws on a fresh reading, a mode
    /// flip, or the first tick.
    pub fn process(&mut self, now_ms: u64, date: &str, time: &str) -> Result<()> {
        let mode = self.read_mode()?;
        let mut dirty = self.rendered_mode != Some(mode);

        if let Some(until) = self.indicator_until {
            if now_ms >= until {
                self.display.clear_reading_indicator()?;
                self.indicator_until = None;
            }
        }

        let mut polled_ok = false;
        if self.poll_due(now_ms) {
            self.last_poll_at = Some(now_ms);
            match self.sensors.poll() {
                Ok(()) => {
                    polled_ok = true;
                    dirty = true;
                    self.apply_decisions()?;
                }
                Err(_) => {
                    // Stale reading: hold state, alarm once past the limit.
                    if self.sensors.consecutive_failures() >= self.alarm_after {
                        self.chirp()?;
                    }
                }
            }
        }

        if dirty {
            self.render(mode, date, time)?;
            self.rendered_mode = Some(mode);
        }

        if polled_ok {
            self.indicator_until = Some(now_ms + INDICATOR_HOLD_MS);
        }
        // A full redraw blanks the indicator cell. Repaint while the hold
        // window is still open.
        if dirty && self.indicator_until.is_some() {
            self.display.show_reading_indicator()?;
        }

        Ok(())
    }

    fn read_mode(&mut self) -> Result<ScreenMode> {
        let level = self.panel.read_level(self.panel_pins.mode_switch)?;
        Ok(if level.is_high() {
            ScreenMode::Readings
        } else {
            ScreenMode::Statuses
        })
    }

    fn poll_due(&self, now_ms: u64) -> bool {
        self.last_poll_at
            .map_or(true, |at| now_ms.saturating_sub(at) >= self.read_interval_ms)
    }

    fn apply_decisions(&mut self) -> Result<()> {
        let Some(reading) = self.sensors.reading() else {
            return Ok(());
        };
        let current = self.relay.snapshot()?;
        let desired = control::evaluate(&self.thresholds, reading, current);

        for dev in Device::ALL {
            let (was, want) = (current.get(dev), desired.get(dev));
            if was != want {
                info!("{dev:?}: {} -> {}", onoff(was), onoff(want));
            }
            // Unconditional idempotent writes, changed or not.
            if want {
                self.relay.start(dev)?;
            } else {
                self.relay.stop(dev)?;
            }
        }

        debug!(
            "decisions for {:.1}C/{:.1}%: lamp {}, humidifier {}, fan {}",
            reading.temperature,
            reading.humidity,
            onoff(desired.lamp),
            onoff(desired.humidifier),
            onoff(desired.fan)
        );

        Ok(())
    }

    fn render(&mut self, mode: ScreenMode, date: &str, time: &str) -> Result<()> {
        match (mode, self.sensors.reading()) {
            (ScreenMode::Readings, Some(reading)) => {
                self.display
                    .update_sensor_readings(reading.temperature, reading.humidity, date, time)?;
            }
            // Status layout doubles as the fallback until a first reading
            // exists.
            _ => {
                let st = self.relay.snapshot()?;
                self.display.update_statuses(st.lamp, st.humidifier, st.fan)?;
            }
        }
        Ok(())
    }

    fn chirp(&mut self) -> Result<()> {
        info!(
            "sensor alarm: {} consecutive failed polls",
            self.sensors.consecutive_failures()
        );
        self.panel.write_level(self.panel_pins.buzzer, Level::High)?;
        self.delay.delay_ms(CHIRP_MS);
        self.panel.write_level(self.panel_pins.buzzer, Level::Low)?;
        Ok(())
    }
}

/// Millisecond/microsecond delays over `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayMs<u16> for StdDelay {
    fn delay_ms(&mut self, ms: u16) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl DelayUs<u16> for StdDelay {
    fn delay_us(&mut self, us: u16) {
        thread::sleep(Duration::from_micros(u64::from(us)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenbutler_driver::mem::{MemDelay, MemIo, MemScreen, ScriptedProbe};
    use greenbutler_driver::{ProbeError, Reading};

    fn reading(temperature: f32, humidity: f32) -> Reading {
        Reading {
            temperature,
            humidity,
        }
    }

    struct Rig {
        butler: Butler<MemIo, MemScreen, MemDelay, ScriptedProbe>,
        io: MemIo,
        screen: MemScreen,
        delay: MemDelay,
    }

    fn rig(script: Vec<Result<Reading, ProbeError>>) -> Rig {
        let cfg = AppConfig::default();
        let io = MemIo::new();
        let screen = MemScreen::new();
        let delay = MemDelay::new();
        let relay = Relay::new(io.clone(), cfg.relay_pins());
        let display = Display::new(screen.clone(), delay.clone(), cfg.banner());
        let sensors = Sensors::new(ScriptedProbe::new(script));
        let mut butler = Butler::new(relay, display, sensors, io.clone(), delay.clone(), &cfg);
        butler.begin().unwrap();
        Rig {
            butler,
            io,
            screen,
            delay,
        }
    }

    #[test]
    fn begin_runs_the_splash_and_parks_everything() {
        let r = rig(vec![]);
        assert_eq!(r.io.level(10), Level::High);
        assert_eq!(r.io.level(11), Level::High);
        assert_eq!(r.io.level(8), Level::High);
        assert_eq!(r.io.level(13), Level::Low);
        assert_eq!(r.delay.total_ms(), 4000);
    }

    #[test]
    fn cold_reading_fires_the_lamp() {
        let mut r = rig(vec![Ok(reading(26.0, 55.0))]);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.io.level(10), Level::Low);
        assert_eq!(r.io.level(8), Level::High);
    }

    #[test]
    fn status_screen_reflects_the_snapshot() {
        let mut r = rig(vec![Ok(reading(26.0, 40.0))]);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.screen.text_at(5, 0, 2), "on");
        assert_eq!(r.screen.text_at(11, 1, 2), "on");
        assert_eq!(r.screen.text_at(13, 0, 3), "off");
    }

    #[test]
    fn mode_switch_selects_the_readings_screen() {
        let mut r = rig(vec![Ok(reading(28.7, 51.2))]);
        r.io.force(17, Level::High);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.screen.text_at(0, 0, 2), "28");
        assert_eq!(r.screen.byte_at(4, 0), b'@');
        assert_eq!(r.screen.text_at(10, 1, 5), "10:30");
    }

    #[test]
    fn flipping_the_switch_redraws_between_polls() {
        let mut r = rig(vec![Ok(reading(28.5, 50.0))]);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert!(r.screen.line(0).contains("Lamp"));

        r.io.force(17, Level::High);
        r.butler.process(250, "2024-01-01", "10:30").unwrap();
        assert!(!r.screen.line(0).contains("Lamp"));
        assert_eq!(r.screen.byte_at(8, 0), b'%');
    }

    #[test]
    fn failed_polls_hold_state_then_chirp() {
        let mut r = rig(vec![Ok(reading(26.0, 55.0)), Err(ProbeError::Timeout)]);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.io.level(10), Level::Low);

        // Three failures at the poll cadence; the third trips the alarm.
        for (i, at) in [5000_u64, 10_000, 15_000].into_iter().enumerate() {
            r.butler.process(at, "2024-01-01", "10:30").unwrap();
            assert_eq!(r.io.level(10), Level::Low);
            let chirps = r
                .io
                .writes(13)
                .iter()
                .filter(|level| **level == Level::High)
                .count();
            assert_eq!(chirps, usize::from(i >= 2));
        }
    }

    #[test]
    fn indicator_blinks_after_each_successful_poll() {
        let mut r = rig(vec![Ok(reading(28.5, 50.0))]);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.screen.byte_at(15, 1), b'*');

        r.butler.process(500, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.screen.byte_at(15, 1), b'*');

        r.butler.process(1000, "2024-01-01", "10:30").unwrap();
        assert_eq!(r.screen.byte_at(15, 1), b' ');
    }

    #[test]
    fn readings_screen_waits_for_a_first_reading() {
        let mut r = rig(vec![Err(ProbeError::Checksum), Ok(reading(28.5, 50.0))]);
        r.io.force(17, Level::High);
        r.butler.process(0, "2024-01-01", "10:30").unwrap();
        assert!(r.screen.line(0).contains("Lamp"));

        r.butler.process(5000, "2024-01-01", "10:30").unwrap();
        assert!(!r.screen.line(0).contains("Lamp"));
        assert_eq!(r.screen.text_at(0, 0, 2), "28");
    }
}
