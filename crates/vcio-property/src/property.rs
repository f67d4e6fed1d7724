use std::fmt;

use serde::Serialize;

use crate::ids::{ClockId, PowerDeviceId, VoltageId};

/// A firmware property, used to name what was being fetched when a request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    FirmwareRevision,
    BoardModel,
    BoardRevision,
    BoardMacAddress,
    PowerState(PowerDeviceId),
    ClockRate(ClockId),
    MeasuredClockRate(ClockId),
    Temperature,
    MaxTemperature,
    Voltage(VoltageId),
    MinVoltage(VoltageId),
    MaxVoltage(VoltageId),
    Turbo,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirmwareRevision => f.write_str("firmware revision"),
            Self::BoardModel => f.write_str("board model"),
            Self::BoardRevision => f.write_str("board revision"),
            Self::BoardMacAddress => f.write_str("board MAC address"),
            Self::PowerState(id) => write!(f, "power state of {id}"),
            Self::ClockRate(id) => write!(f, "clock rate of {id}"),
            Self::MeasuredClockRate(id) => write!(f, "measured clock rate of {id}"),
            Self::Temperature => f.write_str("temperature"),
            Self::MaxTemperature => f.write_str("maximum temperature"),
            Self::Voltage(id) => write!(f, "voltage of {id}"),
            Self::MinVoltage(id) => write!(f, "minimum voltage of {id}"),
            Self::MaxVoltage(id) => write!(f, "maximum voltage of {id}"),
            Self::Turbo => f.write_str("turbo"),
        }
    }
}

/// Board Ethernet MAC address, in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
