use dht11::Dht11;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::hal::{HygroProbe, ProbeError, Reading};

/// DHT11 probe on a single open-drain data line.
pub struct Dht11Probe<P, D> {
    dev: Dht11<P>,
    delay: D,
}

impl<P, D, E> Dht11Probe<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayMs<u16> + DelayUs<u16>,
{
    pub fn new(pin: P, delay: D) -> Self {
        Dht11Probe {
            dev: Dht11::new(pin),
            delay,
        }
    }
}

impl<P, D, E> HygroProbe for Dht11Probe<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayMs<u16> + DelayUs<u16>,
{
    fn read(&mut self) -> Result<Reading, ProbeError> {
        let m = self
            .dev
            .perform_measurement(&mut self.delay)
            .map_err(|e| match e {
                dht11::Error::Timeout => ProbeError::Timeout,
                dht11::Error::CrcMismatch => ProbeError::Checksum,
                dht11::Error::Gpio(_) => ProbeError::Bus,
            })?;

        // The device reports tenths of a unit.
        Ok(Reading {
            temperature: f32::from(m.temperature) / 10.0,
            humidity: f32::from(m.humidity) / 10.0,
        })
    }
}
