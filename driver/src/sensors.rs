use log::warn;

use crate::hal::{HygroProbe, ProbeError, Reading};

/// Cached poller over the probe. A failed poll never touches the cache; it
/// only grows the consecutive-failure count.
pub struct Sensors<P> {
    probe: P,
    reading: Option<Reading>,
    failures: u32,
}

impl<P> Sensors<P>
where
    P: HygroProbe,
{
    pub fn new(probe: P) -> Self {
        Sensors {
            probe,
            reading: None,
            failures: 0,
        }
    }

    /// One blocking probe read. Success overwrites the cache and clears the
    /// failure count; failure leaves the cache as-is and reports the error.
    pub fn poll(&mut self) -> Result<(), ProbeError> {
        match self.probe.read() {
            Ok(reading) => {
                self.reading = Some(reading);
                self.failures = 0;
                Ok(())
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                warn!("sensor poll failed: {e}");
                Err(e)
            }
        }
    }

    /// Latest cached reading; `None` until a poll has succeeded.
    #[must_use]
    pub fn reading(&self) -> Option<Reading> {
        self.reading
    }

    #[must_use]
    pub fn last_temperature(&self) -> Option<f32> {
        self.reading.map(|r| r.temperature)
    }

    #[must_use]
    pub fn last_humidity(&self) -> Option<f32> {
        self.reading.map(|r| r.humidity)
    }

    /// Failed polls since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// True when the cache cannot be trusted as current: the last poll
    /// failed, or none has happened yet.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.failures > 0 || self.reading.is_none()
    }
}
