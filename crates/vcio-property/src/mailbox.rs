use tracing::{debug, Level};
use vcio_frame::{check_response, encode_request, parse_tags, AlignedBuffer, Tag, TAGS_OFFSET};
use vcio_transport::MailboxTransport;
#[cfg(unix)]
use vcio_transport::VcioDevice;

use crate::error::{PropertyError, RequestError, Result};
use crate::ids::{ClockId, PowerDeviceId, PowerState, VoltageId};
use crate::property::{MacAddress, Property};
use crate::tags;
use crate::units::{microvolts_to_volts, millidegrees_to_celsius};

/// Target used for request/response buffer dumps.
pub const WIRE_TARGET: &str = "vcio::wire";

/// Response words included in a buffer dump.
const RX_DUMP_WORDS: usize = 16;

const SCALAR_VALUE_BYTES: u32 = 4;
const KEYED_VALUE_BYTES: u32 = 8;
const MAC_VALUE_BYTES: u32 = 8;

/// Mailbox behavior settings.
#[derive(Debug, Clone, Default)]
pub struct MailboxConfig {
    /// Dump every outgoing and incoming buffer on the [`WIRE_TARGET`] target.
    pub trace_buffers: bool,
}

/// Property client over an open mailbox channel.
///
/// Owns the one request/response buffer. Every request takes `&mut self`,
/// and the tags it returns borrow that buffer, so a response can never be
/// read after the next request has overwritten it.
pub struct Mailbox<T> {
    transport: T,
    buf: AlignedBuffer,
    config: MailboxConfig,
}

/// A mailbox over the `/dev/vcio` device.
#[cfg(unix)]
pub type DeviceMailbox = Mailbox<VcioDevice>;

#[cfg(unix)]
impl Mailbox<VcioDevice> {
    /// Open the default `/dev/vcio` device.
    pub fn open() -> vcio_transport::Result<Self> {
        Ok(Self::new(VcioDevice::open()?))
    }

    /// Open a device at `path` with explicit configuration.
    pub fn open_path(
        path: impl AsRef<std::path::Path>,
        config: MailboxConfig,
    ) -> vcio_transport::Result<Self> {
        Ok(Self::with_config(VcioDevice::open_path(path)?, config))
    }
}

impl<T: MailboxTransport> Mailbox<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MailboxConfig::default())
    }

    pub fn with_config(transport: T, config: MailboxConfig) -> Self {
        Self {
            transport,
            buf: AlignedBuffer::new(),
            config,
        }
    }

    /// Send one tag and return every tag in the response.
    ///
    /// `value_bytes` is widened to fit `args`. The returned tags are only
    /// valid until the next request.
    pub fn request(
        &mut self,
        tag_id: u32,
        value_bytes: u32,
        args: &[u32],
    ) -> std::result::Result<Vec<Tag<'_>>, RequestError> {
        let trace = self.config.trace_buffers;
        let buf = self.buf.acquire();

        let written = encode_request(buf, tag_id, value_bytes, args)?;
        if trace {
            dump_words("tx", &buf[..written]);
        }

        self.transport.exchange(buf)?;
        if trace {
            dump_words("rx", &buf[..RX_DUMP_WORDS.min(buf.len())]);
        }

        let buf: &[u32] = buf;
        check_response(buf)?;
        Ok(parse_tags(&buf[TAGS_OFFSET..])?)
    }

    /// Release the device. Safe to call more than once.
    pub fn close(&mut self) {
        self.transport.close();
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Firmware revision of the VideoCore.
    pub fn firmware_revision(&mut self) -> Result<u32> {
        self.scalar(Property::FirmwareRevision, tags::GET_FIRMWARE_REVISION)
    }

    /// Board model number.
    pub fn board_model(&mut self) -> Result<u32> {
        self.scalar(Property::BoardModel, tags::GET_BOARD_MODEL)
    }

    /// Board revision number.
    pub fn board_revision(&mut self) -> Result<u32> {
        self.scalar(Property::BoardRevision, tags::GET_BOARD_REVISION)
    }

    /// Ethernet MAC address of the board.
    pub fn board_mac_address(&mut self) -> Result<MacAddress> {
        let property = Property::BoardMacAddress;
        let tags = self
            .request(tags::GET_BOARD_MAC, MAC_VALUE_BYTES, &[])
            .map_err(|e| PropertyError::new(property, e))?;
        let tag = expect_tag(&tags, tags::GET_BOARD_MAC)
            .map_err(|e| PropertyError::new(property, e))?;

        let bytes = tag.value_bytes();
        let mac: [u8; 6] = bytes
            .get(..6)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                PropertyError::new(
                    property,
                    RequestError::ValueTooShort {
                        tag_id: tags::GET_BOARD_MAC,
                        needed: 2,
                        available: tag.value().len(),
                    },
                )
            })?;
        Ok(MacAddress(mac))
    }

    /// Power state of a peripheral.
    pub fn power_state(&mut self, id: PowerDeviceId) -> Result<PowerState> {
        let raw = self.keyed(Property::PowerState(id), tags::GET_POWER_STATE, id.0)?;
        Ok(PowerState::from_raw(raw))
    }

    /// Configured clock rate in Hz.
    pub fn clock_rate(&mut self, id: ClockId) -> Result<u32> {
        self.keyed(Property::ClockRate(id), tags::GET_CLOCK_RATE, id.0)
    }

    /// Measured clock rate in Hz.
    pub fn clock_rate_measured(&mut self, id: ClockId) -> Result<u32> {
        self.keyed(
            Property::MeasuredClockRate(id),
            tags::GET_CLOCK_RATE_MEASURED,
            id.0,
        )
    }

    /// SoC temperature in degrees Celsius.
    pub fn temperature(&mut self) -> Result<f64> {
        let raw = self.keyed(Property::Temperature, tags::GET_TEMPERATURE, 0)?;
        Ok(millidegrees_to_celsius(raw))
    }

    /// Maximum safe SoC temperature in degrees Celsius.
    ///
    /// Overclocking may be disabled above this temperature.
    pub fn max_temperature(&mut self) -> Result<f64> {
        let raw = self.keyed(Property::MaxTemperature, tags::GET_MAX_TEMPERATURE, 0)?;
        Ok(millidegrees_to_celsius(raw))
    }

    /// Current voltage of a rail, in volts.
    pub fn voltage(&mut self, id: VoltageId) -> Result<f64> {
        let raw = self.keyed(Property::Voltage(id), tags::GET_VOLTAGE, id.0)?;
        Ok(microvolts_to_volts(raw))
    }

    /// Minimum supported voltage of a rail, in volts.
    pub fn min_voltage(&mut self, id: VoltageId) -> Result<f64> {
        let raw = self.keyed(Property::MinVoltage(id), tags::GET_MIN_VOLTAGE, id.0)?;
        Ok(microvolts_to_volts(raw))
    }

    /// Maximum supported voltage of a rail, in volts.
    pub fn max_voltage(&mut self, id: VoltageId) -> Result<f64> {
        let raw = self.keyed(Property::MaxVoltage(id), tags::GET_MAX_VOLTAGE, id.0)?;
        Ok(microvolts_to_volts(raw))
    }

    /// Whether turbo mode is active.
    pub fn turbo(&mut self) -> Result<bool> {
        let raw = self.keyed(Property::Turbo, tags::GET_TURBO, 0)?;
        Ok(raw == 1)
    }

    /// Single-word property with no arguments.
    fn scalar(&mut self, property: Property, tag_id: u32) -> Result<u32> {
        self.value_word(tag_id, SCALAR_VALUE_BYTES, &[], 0)
            .map_err(|e| PropertyError::new(property, e))
    }

    /// Property keyed by an id; the reply echoes the id in word 0 and carries
    /// the payload in word 1.
    fn keyed(&mut self, property: Property, tag_id: u32, id: u32) -> Result<u32> {
        self.value_word(tag_id, KEYED_VALUE_BYTES, &[id], 1)
            .map_err(|e| PropertyError::new(property, e))
    }

    fn value_word(
        &mut self,
        tag_id: u32,
        value_bytes: u32,
        args: &[u32],
        index: usize,
    ) -> std::result::Result<u32, RequestError> {
        let tags = self.request(tag_id, value_bytes, args)?;
        let tag = expect_tag(&tags, tag_id)?;
        let value = tag.value();
        value
            .get(index)
            .copied()
            .ok_or(RequestError::ValueTooShort {
                tag_id,
                needed: index + 1,
                available: value.len(),
            })
    }
}

impl<T> std::fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("buf", &self.buf)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The first response tag, which must be the one requested.
fn expect_tag<'a>(tags: &[Tag<'a>], tag_id: u32) -> std::result::Result<Tag<'a>, RequestError> {
    let tag = tags
        .first()
        .copied()
        .ok_or(RequestError::MissingExpectedTag { tag_id })?;
    if tag.id() != tag_id {
        return Err(RequestError::UnexpectedTag {
            expected: tag_id,
            actual: tag.id(),
        });
    }
    Ok(tag)
}

fn dump_words(direction: &'static str, words: &[u32]) {
    if !tracing::enabled!(target: WIRE_TARGET, Level::DEBUG) {
        return;
    }
    for (index, word) in words.iter().enumerate() {
        let value = format!("0x{word:08X}");
        debug!(target: WIRE_TARGET, direction, index, value = %value, "mailbox word");
    }
}
