use greenbutler_driver::{ActuatorState, Reading};

/// Trigger band for one actuator. `slack` widens only the release edge, the
/// conventional guard against rapid cycling near a boundary.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub enabled: bool,
    pub min: f32,
    pub max: f32,
    pub slack: f32,
}

/// Bands for all three actuators. Lamp and humidifier raise their quantity;
/// the fan lowers temperature.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub lamp: Band,
    pub humidifier: Band,
    pub fan: Band,
}

/// Desired actuator states for one reading, holding `current` wherever the
/// value sits inside its band.
#[must_use]
pub fn evaluate(thresholds: &Thresholds, reading: Reading, current: ActuatorState) -> ActuatorState {
    ActuatorState {
        lamp: decide_raise(thresholds.lamp, reading.temperature, current.lamp),
        humidifier: decide_raise(thresholds.humidifier, reading.humidity, current.humidifier),
        fan: decide_lower(thresholds.fan, reading.temperature, current.fan),
    }
}

/// Device that raises its quantity: on below the band, off once the value
/// clears max plus slack.
fn decide_raise(band: Band, value: f32, was_on: bool) -> bool {
    if !band.enabled {
        false
    } else if value < band.min {
        true
    } else if value > band.max + band.slack {
        false
    } else {
        was_on
    }
}

/// Device that lowers its quantity: on above the band, off once the value
/// drops below min minus slack.
fn decide_lower(band: Band, value: f32, was_on: bool) -> bool {
    if !band.enabled {
        false
    } else if value > band.max {
        true
    } else if value < band.min - band.slack {
        false
    } else {
        was_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OFF: ActuatorState = ActuatorState {
        lamp: false,
        humidifier: false,
        fan: false,
    };

    fn bands() -> Thresholds {
        Thresholds {
            lamp: Band {
                enabled: true,
                min: 28.0,
                max: 29.0,
                slack: 0.0,
            },
            humidifier: Band {
                enabled: true,
                min: 45.0,
                max: 65.0,
                slack: 0.0,
            },
            fan: Band {
                enabled: true,
                min: 28.0,
                max: 29.0,
                slack: 0.0,
            },
        }
    }

    fn reading(temperature: f32, humidity: f32) -> Reading {
        Reading {
            temperature,
            humidity,
        }
    }

    #[test]
    fn cold_turns_lamp_on_and_fan_off() {
        let next = evaluate(&bands(), reading(27.0, 55.0), ALL_OFF);
        assert!(next.lamp);
        assert!(!next.fan);
    }

    #[test]
    fn hot_turns_fan_on_and_lamp_off() {
        let prev = ActuatorState {
            lamp: true,
            ..ALL_OFF
        };
        let next = evaluate(&bands(), reading(29.5, 55.0), prev);
        assert!(!next.lamp);
        assert!(next.fan);
    }

    #[test]
    fn in_band_holds_previous_state() {
        let prev = ActuatorState {
            lamp: true,
            humidifier: true,
            fan: true,
        };
        let next = evaluate(&bands(), reading(28.5, 55.0), prev);
        assert!(next.lamp);
        assert!(next.humidifier);
        assert!(next.fan);

        let next = evaluate(&bands(), reading(28.5, 55.0), ALL_OFF);
        assert_eq!(next, ALL_OFF);
    }

    #[test]
    fn slack_widens_the_lamp_release_edge() {
        let mut thresholds = bands();
        thresholds.lamp.slack = 1.5;
        let prev = ActuatorState {
            lamp: true,
            ..ALL_OFF
        };
        // Above max but inside the slack: keeps burning.
        assert!(evaluate(&thresholds, reading(30.0, 55.0), prev).lamp);
        assert!(!evaluate(&thresholds, reading(30.6, 55.0), prev).lamp);
    }

    #[test]
    fn fan_runs_until_below_min_minus_slack() {
        let mut thresholds = bands();
        thresholds.fan.slack = 0.5;
        let prev = ActuatorState {
            fan: true,
            ..ALL_OFF
        };
        // Cooled back into the band: keeps spinning.
        assert!(evaluate(&thresholds, reading(28.2, 55.0), prev).fan);
        assert!(evaluate(&thresholds, reading(27.6, 55.0), prev).fan);
        assert!(!evaluate(&thresholds, reading(27.4, 55.0), prev).fan);
    }

    #[test]
    fn humidifier_follows_the_humidity_band() {
        assert!(evaluate(&bands(), reading(28.5, 40.0), ALL_OFF).humidifier);
        let prev = ActuatorState {
            humidifier: true,
            ..ALL_OFF
        };
        assert!(!evaluate(&bands(), reading(28.5, 66.0), prev).humidifier);
    }

    #[test]
    fn disabled_actuator_is_always_off() {
        let mut thresholds = bands();
        thresholds.humidifier.enabled = false;
        let prev = ActuatorState {
            humidifier: true,
            ..ALL_OFF
        };
        // Humidity far below the band would otherwise demand on.
        assert!(!evaluate(&thresholds, reading(28.5, 30.0), prev).humidifier);
    }
}
