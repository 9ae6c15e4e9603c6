use crate::hal::{DigitalIo, Level};

/// The three switched loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Lamp,
    Humidifier,
    Fan,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Lamp, Device::Humidifier, Device::Fan];
}

/// Logical on/off of all three loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    pub lamp: bool,
    pub humidifier: bool,
    pub fan: bool,
}

impl ActuatorState {
    #[must_use]
    pub fn get(self, dev: Device) -> bool {
        match dev {
            Device::Lamp => self.lamp,
            Device::Humidifier => self.humidifier,
            Device::Fan => self.fan,
        }
    }

    fn set(&mut self, dev: Device, on: bool) {
        match dev {
            Device::Lamp => self.lamp = on,
            Device::Humidifier => self.humidifier = on,
            Device::Fan => self.fan = on,
        }
    }
}

/// Line offsets of the three relay coils.
#[derive(Debug, Clone, Copy)]
pub struct RelayPins {
    pub lamp: u8,
    pub humidifier: u8,
    pub fan: u8,
}

/// Level that drives a coil to the given logical state. The board energizes
/// on LOW; this pair is the only place the inversion exists.
fn drive_level(on: bool) -> Level {
    if on {
        Level::Low
    } else {
        Level::High
    }
}

/// Logical state implied by a coil's line level.
fn energized(level: Level) -> bool {
    level == Level::Low
}

/// Three-channel relay bank. The physical line is the source of truth; the
/// cached state is a mirror refreshed on every transition or status read.
pub struct Relay<IO> {
    io: IO,
    pins: RelayPins,
    commanded: ActuatorState,
}

impl<IO, E> Relay<IO>
where
    IO: DigitalIo<Error = E>,
{
    pub fn new(io: IO, pins: RelayPins) -> Self {
        Relay {
            io,
            pins,
            commanded: ActuatorState::default(),
        }
    }

    /// Parks every coil OFF. Safe to call again.
    pub fn begin(&mut self) -> Result<(), E> {
        for dev in Device::ALL {
            self.apply(dev, false)?;
        }
        Ok(())
    }

    pub fn start(&mut self, dev: Device) -> Result<(), E> {
        self.apply(dev, true)
    }

    pub fn stop(&mut self, dev: Device) -> Result<(), E> {
        self.apply(dev, false)
    }

    /// Re-reads the coil's line and reports the logical state, refreshing the
    /// mirror as a side effect.
    pub fn status(&mut self, dev: Device) -> Result<bool, E> {
        let on = energized(self.io.read_level(self.pin(dev))?);
        self.commanded.set(dev, on);
        Ok(on)
    }

    /// Status of all three devices in one pass.
    pub fn snapshot(&mut self) -> Result<ActuatorState, E> {
        Ok(ActuatorState {
            lamp: self.status(Device::Lamp)?,
            humidifier: self.status(Device::Humidifier)?,
            fan: self.status(Device::Fan)?,
        })
    }

    /// Mirror of the last commanded/observed state, without touching hardware.
    #[must_use]
    pub fn last_commanded(&self) -> ActuatorState {
        self.commanded
    }

    fn apply(&mut self, dev: Device, on: bool) -> Result<(), E> {
        self.io.write_level(self.pin(dev), drive_level(on))?;
        self.commanded.set(dev, on);
        Ok(())
    }

    fn pin(&self, dev: Device) -> u8 {
        match dev {
            Device::Lamp => self.pins.lamp,
            Device::Humidifier => self.pins.humidifier,
            Device::Fan => self.pins.fan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::MemIo;

    const PINS: RelayPins = RelayPins {
        lamp: 10,
        humidifier: 11,
        fan: 8,
    };

    fn bank() -> (Relay<MemIo>, MemIo) {
        let io = MemIo::new();
        let mut relay = Relay::new(io.clone(), PINS);
        relay.begin().unwrap();
        (relay, io)
    }

    #[test]
    fn begin_parks_every_coil_off() {
        let (_, io) = bank();
        assert_eq!(io.level(10), Level::High);
        assert_eq!(io.level(11), Level::High);
        assert_eq!(io.level(8), Level::High);
    }

    #[test]
    fn start_then_status_on_stop_then_status_off() {
        let (mut relay, _io) = bank();
        for dev in Device::ALL {
            relay.start(dev).unwrap();
            assert!(relay.status(dev).unwrap());
            relay.stop(dev).unwrap();
            assert!(!relay.status(dev).unwrap());
        }
    }

    #[test]
    fn devices_switch_independently() {
        let (mut relay, io) = bank();
        relay.start(Device::Humidifier).unwrap();
        assert!(!relay.status(Device::Lamp).unwrap());
        assert!(relay.status(Device::Humidifier).unwrap());
        assert!(!relay.status(Device::Fan).unwrap());
        assert_eq!(io.level(11), Level::Low);
        assert_eq!(io.level(10), Level::High);
    }

    #[test]
    fn coil_drive_is_active_low() {
        let (mut relay, io) = bank();
        relay.start(Device::Lamp).unwrap();
        assert_eq!(io.level(10), Level::Low);
        relay.stop(Device::Lamp).unwrap();
        assert_eq!(io.level(10), Level::High);
    }

    #[test]
    fn status_follows_externally_forced_line() {
        let (mut relay, io) = bank();
        relay.start(Device::Fan).unwrap();
        io.force(8, Level::High);
        assert!(!relay.status(Device::Fan).unwrap());
        // The mirror caught up with the line.
        assert!(!relay.last_commanded().fan);
    }

    #[test]
    fn snapshot_reads_all_three_lines() {
        let (mut relay, io) = bank();
        relay.start(Device::Lamp).unwrap();
        io.force(8, Level::Low);
        let st = relay.snapshot().unwrap();
        assert!(st.lamp);
        assert!(!st.humidifier);
        assert!(st.fan);
    }
}
