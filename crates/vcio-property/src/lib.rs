//! Typed Raspberry Pi firmware properties.
//!
//! [`Mailbox`] is the façade over the property interface: one method per
//! property, each issuing a single tag, unwrapping the expected reply and
//! converting it into its natural unit.

pub mod error;
pub mod ids;
pub mod mailbox;
pub mod property;
pub mod tags;
pub mod units;

pub use error::{PropertyError, RequestError, Result};
pub use ids::{ClockId, PowerDeviceId, PowerState, VoltageId};
pub use mailbox::{Mailbox, MailboxConfig, WIRE_TARGET};
pub use property::{MacAddress, Property};
pub use units::{celsius_to_fahrenheit, microvolts_to_volts, millidegrees_to_celsius};

#[cfg(unix)]
pub use mailbox::DeviceMailbox;
