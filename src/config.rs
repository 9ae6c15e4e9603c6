use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use directories::ProjectDirs;
use eyre::{Result, WrapErr};
use serde::Deserialize;

use greenbutler_driver::{Banner, RelayPins};

use crate::control::{Band, Thresholds};

/// Runtime settings, defaulting to the stock incubator parameter set.
/// Sections absent from the file keep their defaults; a band override must
/// spell out all four of its fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub system: SystemConfig,
    pub display: DisplayConfig,
    pub pins: PinConfig,
    pub actuators: ActuatorsConfig,
    pub sensor: SensorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub greeting: String,
    pub name_version: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            greeting: "Hatch'em'All".into(),
            name_version: "MeerkatEgger v1.1".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub columns: u8,
    pub lines: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            columns: 16,
            lines: 2,
        }
    }
}

/// Line offsets on the gpio chip.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub relay_lamp: u8,
    pub relay_humidifier: u8,
    pub relay_fan: u8,
    pub lcd_rs: u8,
    pub lcd_enable: u8,
    pub lcd_d4: u8,
    pub lcd_d5: u8,
    pub lcd_d6: u8,
    pub lcd_d7: u8,
    pub dht_data: u8,
    pub buzzer: u8,
    pub mode_switch: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        PinConfig {
            relay_lamp: 10,
            relay_humidifier: 11,
            relay_fan: 8,
            lcd_rs: 2,
            lcd_enable: 3,
            lcd_d4: 4,
            lcd_d5: 5,
            lcd_d6: 6,
            lcd_d7: 7,
            dht_data: 12,
            buzzer: 13,
            mode_switch: 17,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BandConfig {
    pub enabled: bool,
    pub min: f32,
    pub max: f32,
    pub slack: f32,
}

/// Per-actuator trigger bands: lamp and fan act on temperature, the
/// humidifier on relative humidity.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ActuatorsConfig {
    pub lamp: BandConfig,
    pub humidifier: BandConfig,
    pub fan: BandConfig,
}

impl Default for ActuatorsConfig {
    fn default() -> Self {
        ActuatorsConfig {
            lamp: BandConfig {
                enabled: true,
                min: 28.0,
                max: 29.0,
                slack: 0.0,
            },
            humidifier: BandConfig {
                enabled: true,
                min: 45.0,
                max: 65.0,
                slack: 0.0,
            },
            fan: BandConfig {
                enabled: true,
                min: 28.0,
                max: 29.0,
                slack: 0.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Milliseconds between probe polls.
    pub read_interval_ms: u64,
    /// Consecutive failed polls before the buzzer starts chirping.
    pub alarm_after_failures: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            read_interval_ms: 5000,
            alarm_after_failures: 3,
        }
    }
}

impl AppConfig {
    /// Loads settings. An explicit path must exist; without one, the
    /// per-user config dir is consulted and silently skipped when empty.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(AppConfig::default()),
            },
        }
    }

    /// Stock per-user location, e.g. `~/.config/greenbutler/config.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "greenbutler").map(|dirs| dirs.config_dir().join("config.json"))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .build()
            .wrap_err_with(|| format!("cannot read config from {}", path.display()))?;

        cfg.try_deserialize()
            .wrap_err_with(|| format!("malformed config in {}", path.display()))
    }

    #[must_use]
    pub fn banner(&self) -> Banner {
        Banner {
            greeting: self.system.greeting.clone(),
            name_version: self.system.name_version.clone(),
        }
    }

    #[must_use]
    pub fn relay_pins(&self) -> RelayPins {
        RelayPins {
            lamp: self.pins.relay_lamp,
            humidifier: self.pins.relay_humidifier,
            fan: self.pins.relay_fan,
        }
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            lamp: band(self.actuators.lamp),
            humidifier: band(self.actuators.humidifier),
            fan: band(self.actuators.fan),
        }
    }
}

fn band(cfg: BandConfig) -> Band {
    Band {
        enabled: cfg.enabled,
        min: cfg.min,
        max: cfg.max,
        slack: cfg.slack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_are_the_stock_parameter_set() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.system.greeting, "Hatch'em'All");
        assert_eq!(cfg.system.name_version, "MeerkatEgger v1.1");
        assert_eq!((cfg.display.columns, cfg.display.lines), (16, 2));
        assert_eq!(cfg.pins.relay_lamp, 10);
        assert_eq!(cfg.pins.relay_humidifier, 11);
        assert_eq!(cfg.pins.relay_fan, 8);
        assert_eq!(cfg.pins.dht_data, 12);
        assert_eq!(cfg.pins.buzzer, 13);
        assert_eq!(cfg.pins.mode_switch, 17);
        assert!(cfg.actuators.lamp.enabled);
        assert_eq!(cfg.actuators.lamp.min, 28.0);
        assert_eq!(cfg.actuators.lamp.max, 29.0);
        assert_eq!(cfg.actuators.humidifier.min, 45.0);
        assert_eq!(cfg.actuators.humidifier.max, 65.0);
        assert_eq!(cfg.actuators.fan.slack, 0.0);
        assert_eq!(cfg.sensor.read_interval_ms, 5000);
        assert_eq!(cfg.sensor.alarm_after_failures, 3);
    }

    #[test]
    fn fragment_overrides_named_fields_only() {
        let cfg = parse(
            r#"{
                "system": { "greeting": "Grow well", "name_version": "GreenButler v0.2" },
                "sensor": { "read_interval_ms": 2500 }
            }"#,
        );
        assert_eq!(cfg.system.greeting, "Grow well");
        assert_eq!(cfg.sensor.read_interval_ms, 2500);
        assert_eq!(cfg.sensor.alarm_after_failures, 3);
        assert_eq!(cfg.pins.relay_lamp, 10);
    }

    #[test]
    fn band_override_replaces_the_whole_band() {
        let cfg = parse(
            r#"{
                "actuators": {
                    "lamp": { "enabled": true, "min": 36.0, "max": 38.0, "slack": 0.5 }
                }
            }"#,
        );
        assert_eq!(cfg.actuators.lamp.min, 36.0);
        assert_eq!(cfg.actuators.lamp.slack, 0.5);
        // Untouched bands keep their stock values.
        assert_eq!(cfg.actuators.humidifier.max, 65.0);
    }

    #[test]
    fn conversions_map_onto_driver_types() {
        let cfg = AppConfig::default();
        let pins = cfg.relay_pins();
        assert_eq!((pins.lamp, pins.humidifier, pins.fan), (10, 11, 8));
        let thresholds = cfg.thresholds();
        assert!(thresholds.fan.enabled);
        assert_eq!(thresholds.humidifier.max, 65.0);
        assert_eq!(cfg.banner().greeting, "Hatch'em'All");
    }
}
