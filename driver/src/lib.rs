//! Hardware components of the GreenButler appliance: a three-channel relay
//! bank, a 16x2 character display, and a cached temperature/humidity poller.
//! Each sits on a small capability seam ([`hal`]) so the daemon can run
//! against real lines or the in-memory stand-ins in [`mem`].

pub mod dht;
pub mod display;
pub mod hal;
pub mod lcd;
pub mod mem;
pub mod relay;
pub mod sensors;

pub use display::{Banner, Display};
pub use hal::{DigitalIo, HygroProbe, Level, ProbeError, Reading, TextScreen};
pub use relay::{ActuatorState, Device, Relay, RelayPins};
pub use sensors::Sensors;
