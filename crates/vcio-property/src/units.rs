/// Firmware temperatures are reported in thousandths of a degree Celsius.
pub fn millidegrees_to_celsius(raw: u32) -> f64 {
    f64::from(raw) / 1000.0
}

/// Firmware voltages are reported in microvolts.
pub fn microvolts_to_volts(raw: u32) -> f64 {
    f64::from(raw) / 1_000_000.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
