//! Prometheus text exposition of the mailbox properties.
//!
//! Format reference: <https://prometheus.io/docs/instrumenting/exposition_formats/>

use std::fmt::Display;
use std::io::{self, Write};

use tracing::debug;
use vcio_property::{
    celsius_to_fahrenheit, ClockId, Mailbox, PowerDeviceId, PropertyError, VoltageId,
};
use vcio_transport::MailboxTransport;

/// Label used for the single SoC temperature sensor.
const SOC_LABEL: &str = "soc";

/// Properties that could not be fetched while writing metrics.
///
/// At most one failure is kept per gauge family.
#[derive(Debug, Default)]
pub struct ExpositionReport {
    pub failures: Vec<PropertyError>,
}

impl ExpositionReport {
    /// Whether every sample was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write every gauge family to `out`.
///
/// Each sample is fetched on its own; a sample whose property fails is left
/// out and the failure is recorded in the report. Only write errors on `out`
/// abort the exposition.
pub fn write_metrics<T, W>(mbox: &mut Mailbox<T>, out: &mut W) -> io::Result<ExpositionReport>
where
    T: MailboxTransport,
    W: Write,
{
    let mut w = ExpWriter::new(out);

    w.write_hardware(mbox)?;
    w.write_power(mbox)?;
    w.write_clocks(mbox)?;
    w.write_temperatures(mbox)?;
    w.write_voltages(mbox)?;

    Ok(w.finish())
}

fn format_temp(celsius: f64) -> String {
    format!("{celsius:.3}")
}

fn format_volts(volts: f64) -> String {
    format!("{volts:.6}")
}

fn format_bool(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

struct ExpWriter<'w, W> {
    out: &'w mut W,
    name: &'static str,
    family_failed: bool,
    report: ExpositionReport,
}

impl<'w, W: Write> ExpWriter<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self {
            out,
            name: "",
            family_failed: false,
            report: ExpositionReport::default(),
        }
    }

    fn finish(self) -> ExpositionReport {
        self.report
    }

    fn gauge(&mut self, name: &'static str, help: &str) -> io::Result<()> {
        self.name = name;
        self.family_failed = false;
        writeln!(self.out, "# HELP {name} {help}")?;
        writeln!(self.out, "# TYPE {name} gauge")
    }

    fn sample(&mut self, label: Option<&str>, value: impl Display) -> io::Result<()> {
        match label {
            Some(id) => writeln!(self.out, "{}{{id=\"{id}\"}} {value}", self.name),
            None => writeln!(self.out, "{} {value}", self.name),
        }
    }

    /// Unwrap a fetch, recording the first failure of the current family.
    fn record<V>(&mut self, result: Result<V, PropertyError>) -> Option<V> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(gauge = self.name, error = %err, "skipping sample");
                if !self.family_failed {
                    self.family_failed = true;
                    self.report.failures.push(err);
                }
                None
            }
        }
    }

    fn write_hardware<T: MailboxTransport>(&mut self, mbox: &mut Mailbox<T>) -> io::Result<()> {
        self.gauge("rpi_vc_revision", "Firmware revision of the VideoCore device.")?;
        if let Some(rev) = self.record(mbox.firmware_revision()) {
            self.sample(None, rev)?;
        }

        self.gauge("rpi_board_model", "Board model.")?;
        if let Some(model) = self.record(mbox.board_model()) {
            self.sample(None, model)?;
        }

        self.gauge("rpi_board_revision", "Board revision.")?;
        if let Some(rev) = self.record(mbox.board_revision()) {
            self.sample(None, rev)?;
        }

        Ok(())
    }

    fn write_power<T: MailboxTransport>(&mut self, mbox: &mut Mailbox<T>) -> io::Result<()> {
        self.gauge(
            "rpi_power_state",
            "Component power state (0: off, 1: on, 2: missing).",
        )?;
        for id in PowerDeviceId::ALL {
            if let Some(state) = self.record(mbox.power_state(id)) {
                self.sample(id.label(), state.bits())?;
            }
        }

        Ok(())
    }

    fn write_clocks<T: MailboxTransport>(&mut self, mbox: &mut Mailbox<T>) -> io::Result<()> {
        self.gauge("rpi_clock_rate_hz", "Clock rate in Hertz.")?;
        for id in ClockId::ALL {
            if let Some(rate) = self.record(mbox.clock_rate(id)) {
                self.sample(id.label(), rate)?;
            }
        }

        self.gauge("rpi_clock_rate_measured_hz", "Measured clock rate in Hertz.")?;
        for id in ClockId::ALL {
            if let Some(rate) = self.record(mbox.clock_rate_measured(id)) {
                self.sample(id.label(), rate)?;
            }
        }

        self.gauge("rpi_turbo", "Turbo state.")?;
        if let Some(turbo) = self.record(mbox.turbo()) {
            self.sample(None, format_bool(turbo))?;
        }

        Ok(())
    }

    fn write_temperatures<T: MailboxTransport>(
        &mut self,
        mbox: &mut Mailbox<T>,
    ) -> io::Result<()> {
        self.gauge(
            "rpi_temperature_c",
            "Temperature of the SoC in degrees celsius.",
        )?;
        let temp = self.record(mbox.temperature());
        if let Some(c) = temp {
            self.sample(Some(SOC_LABEL), format_temp(c))?;
        }

        self.gauge(
            "rpi_temperature_f",
            "Temperature of the SoC in degrees fahrenheit.",
        )?;
        if let Some(c) = temp {
            self.sample(Some(SOC_LABEL), format_temp(celsius_to_fahrenheit(c)))?;
        }

        self.gauge(
            "rpi_max_temperature_c",
            "Maximum temperature of the SoC in degrees celsius.",
        )?;
        let max_temp = self.record(mbox.max_temperature());
        if let Some(c) = max_temp {
            self.sample(Some(SOC_LABEL), format_temp(c))?;
        }

        self.gauge(
            "rpi_max_temperature_f",
            "Maximum temperature of the SoC in degrees fahrenheit.",
        )?;
        if let Some(c) = max_temp {
            self.sample(Some(SOC_LABEL), format_temp(celsius_to_fahrenheit(c)))?;
        }

        Ok(())
    }

    fn write_voltages<T: MailboxTransport>(&mut self, mbox: &mut Mailbox<T>) -> io::Result<()> {
        self.gauge("rpi_voltage", "Current component voltage.")?;
        for id in VoltageId::ALL {
            if let Some(volts) = self.record(mbox.voltage(id)) {
                self.sample(id.label(), format_volts(volts))?;
            }
        }

        self.gauge("rpi_voltage_min", "Minimum supported component voltage.")?;
        for id in VoltageId::ALL {
            if let Some(volts) = self.record(mbox.min_voltage(id)) {
                self.sample(id.label(), format_volts(volts))?;
            }
        }

        self.gauge("rpi_voltage_max", "Maximum supported component voltage.")?;
        for id in VoltageId::ALL {
            if let Some(volts) = self.record(mbox.max_voltage(id)) {
                self.sample(id.label(), format_volts(volts))?;
            }
        }

        Ok(())
    }
}
