//! Device, clock and voltage identifiers understood by the firmware.
//!
//! The tables are fixed. Ids outside them are passed through unchanged;
//! the firmware decides what they mean.

use std::fmt;

use serde::Serialize;

/// Peripheral whose power state can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PowerDeviceId(pub u32);

impl PowerDeviceId {
    pub const SD_CARD: Self = Self(0x0000_0000);
    pub const UART0: Self = Self(0x0000_0001);
    pub const UART1: Self = Self(0x0000_0002);
    pub const USB_HCD: Self = Self(0x0000_0003);
    pub const I2C0: Self = Self(0x0000_0004);
    pub const I2C1: Self = Self(0x0000_0005);
    pub const I2C2: Self = Self(0x0000_0006);
    pub const SPI: Self = Self(0x0000_0007);
    pub const CCP2TX: Self = Self(0x0000_0008);

    pub const ALL: [Self; 9] = [
        Self::SD_CARD,
        Self::UART0,
        Self::UART1,
        Self::USB_HCD,
        Self::I2C0,
        Self::I2C1,
        Self::I2C2,
        Self::SPI,
        Self::CCP2TX,
    ];

    /// Metric label for a known device.
    pub fn label(self) -> Option<&'static str> {
        Some(match self {
            Self::SD_CARD => "sd_card",
            Self::UART0 => "uart0",
            Self::UART1 => "uart1",
            Self::USB_HCD => "usb_hcd",
            Self::I2C0 => "i2c0",
            Self::I2C1 => "i2c1",
            Self::I2C2 => "i2c2",
            Self::SPI => "spi",
            Self::CCP2TX => "ccp2tx",
            _ => return None,
        })
    }
}

/// Clock whose rate can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClockId(pub u32);

impl ClockId {
    pub const EMMC: Self = Self(0x0000_0001);
    pub const UART: Self = Self(0x0000_0002);
    pub const ARM: Self = Self(0x0000_0003);
    pub const CORE: Self = Self(0x0000_0004);
    pub const V3D: Self = Self(0x0000_0005);
    pub const H264: Self = Self(0x0000_0006);
    pub const ISP: Self = Self(0x0000_0007);
    pub const SDRAM: Self = Self(0x0000_0008);
    pub const PIXEL: Self = Self(0x0000_0009);
    pub const PWM: Self = Self(0x0000_000A);
    pub const HEVC: Self = Self(0x0000_000B);
    pub const EMMC2: Self = Self(0x0000_000C);
    pub const M2MC: Self = Self(0x0000_000D);
    pub const PIXEL_BVB: Self = Self(0x0000_000E);

    pub const ALL: [Self; 14] = [
        Self::EMMC,
        Self::UART,
        Self::ARM,
        Self::CORE,
        Self::V3D,
        Self::H264,
        Self::ISP,
        Self::SDRAM,
        Self::PIXEL,
        Self::PWM,
        Self::HEVC,
        Self::EMMC2,
        Self::M2MC,
        Self::PIXEL_BVB,
    ];

    pub fn label(self) -> Option<&'static str> {
        Some(match self {
            Self::EMMC => "emmc",
            Self::UART => "uart",
            Self::ARM => "arm",
            Self::CORE => "core",
            Self::V3D => "v3d",
            Self::H264 => "h264",
            Self::ISP => "isp",
            Self::SDRAM => "sdram",
            Self::PIXEL => "pixel",
            Self::PWM => "pwm",
            Self::HEVC => "hevc",
            Self::EMMC2 => "emmc2",
            Self::M2MC => "m2mc",
            Self::PIXEL_BVB => "pixel_bvb",
            _ => return None,
        })
    }
}

/// Voltage rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VoltageId(pub u32);

impl VoltageId {
    pub const CORE: Self = Self(0x0000_0001);
    pub const SDRAM_C: Self = Self(0x0000_0002);
    pub const SDRAM_P: Self = Self(0x0000_0003);
    pub const SDRAM_I: Self = Self(0x0000_0004);

    pub const ALL: [Self; 4] = [Self::CORE, Self::SDRAM_C, Self::SDRAM_P, Self::SDRAM_I];

    pub fn label(self) -> Option<&'static str> {
        Some(match self {
            Self::CORE => "core",
            Self::SDRAM_C => "sdram_c",
            Self::SDRAM_P => "sdram_p",
            Self::SDRAM_I => "sdram_i",
            _ => return None,
        })
    }
}

macro_rules! display_by_label {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    match self.label() {
                        Some(label) => f.write_str(label),
                        None => write!(f, "{:#x}", self.0),
                    }
                }
            }
        )+
    };
}

display_by_label!(PowerDeviceId, ClockId, VoltageId);

/// Power state of a peripheral.
///
/// Bit 0 of the reply is "on", bit 1 is "device missing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Off,
    On,
    Missing,
    Unknown(u32),
}

impl PowerState {
    const MASK: u32 = 0x3;
    const ON: u32 = 0x1;
    const MISSING: u32 = 0x2;

    /// Decode a raw reply word; only the low two bits are significant.
    pub fn from_raw(raw: u32) -> Self {
        match raw & Self::MASK {
            0 => Self::Off,
            Self::ON => Self::On,
            Self::MISSING => Self::Missing,
            bits => Self::Unknown(bits),
        }
    }

    /// The masked bits this state was decoded from.
    pub fn bits(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::On => Self::ON,
            Self::Missing => Self::MISSING,
            Self::Unknown(bits) => bits,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::On => f.write_str("on"),
            Self::Missing => f.write_str("missing"),
            Self::Unknown(bits) => write!(f, "unknown ({bits:#x})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_masks_low_bits() {
        assert_eq!(PowerState::from_raw(0x0000_0011), PowerState::On);
        assert_eq!(PowerState::from_raw(0x0000_0011).bits(), 0x01);
        assert_eq!(PowerState::from_raw(0), PowerState::Off);
        assert_eq!(PowerState::from_raw(0x2), PowerState::Missing);
        assert_eq!(PowerState::from_raw(0xFF), PowerState::Unknown(0x3));
    }

    #[test]
    fn tables_have_labels_for_every_entry() {
        assert!(PowerDeviceId::ALL.iter().all(|id| id.label().is_some()));
        assert!(ClockId::ALL.iter().all(|id| id.label().is_some()));
        assert!(VoltageId::ALL.iter().all(|id| id.label().is_some()));
    }

    #[test]
    fn unknown_ids_display_as_hex() {
        assert_eq!(ClockId::ARM.to_string(), "arm");
        assert_eq!(ClockId(0x42).to_string(), "0x42");
        assert_eq!(PowerDeviceId(9).label(), None);
    }
}
