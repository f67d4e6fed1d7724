//! Property tag identifiers.

pub const GET_FIRMWARE_REVISION: u32 = 0x0000_0001;
pub const GET_BOARD_MODEL: u32 = 0x0001_0001;
pub const GET_BOARD_REVISION: u32 = 0x0001_0002;
pub const GET_BOARD_MAC: u32 = 0x0001_0003;
pub const GET_POWER_STATE: u32 = 0x0002_0001;
pub const GET_CLOCK_RATE: u32 = 0x0003_0002;
pub const GET_VOLTAGE: u32 = 0x0003_0003;
pub const GET_MAX_VOLTAGE: u32 = 0x0003_0005;
pub const GET_TEMPERATURE: u32 = 0x0003_0006;
pub const GET_MIN_VOLTAGE: u32 = 0x0003_0008;
pub const GET_TURBO: u32 = 0x0003_0009;
pub const GET_MAX_TEMPERATURE: u32 = 0x0003_000A;
pub const GET_CLOCK_RATE_MEASURED: u32 = 0x0003_0047;
