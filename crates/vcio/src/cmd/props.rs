use serde::Serialize;
use tracing::warn;
use vcio_property::{
    ClockId, Mailbox, MacAddress, PowerDeviceId, PowerState, PropertyError, VoltageId,
};
use vcio_transport::MailboxTransport;

use crate::cmd::{Context, PropsArgs};
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Debug, Default, Serialize)]
struct PropsOutput {
    firmware_revision: Option<u32>,
    board_model: Option<u32>,
    board_revision: Option<String>,
    mac_address: Option<MacAddress>,
    temperature_c: Option<f64>,
    max_temperature_c: Option<f64>,
    turbo: Option<bool>,
    power: Vec<Reading<PowerState>>,
    clocks_hz: Vec<Reading<u32>>,
    clocks_measured_hz: Vec<Reading<u32>>,
    voltages: Vec<Reading<f64>>,
    voltages_min: Vec<Reading<f64>>,
    voltages_max: Vec<Reading<f64>>,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Reading<T> {
    id: String,
    value: T,
}

pub fn run(_args: PropsArgs, ctx: &Context) -> CliResult<i32> {
    let mut mbox = ctx.open_mailbox()?;
    let mut errors = Vec::new();
    let output = collect(&mut mbox, &mut errors);
    mbox.close();

    for err in &errors {
        warn!(error = %err, "property unavailable");
    }

    print_props(&output, ctx.format);

    if output.errors.is_empty() {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}

fn collect<T: MailboxTransport>(
    mbox: &mut Mailbox<T>,
    errors: &mut Vec<PropertyError>,
) -> PropsOutput {
    let mut out = PropsOutput {
        firmware_revision: fetch(errors, mbox.firmware_revision()),
        board_model: fetch(errors, mbox.board_model()),
        board_revision: fetch(errors, mbox.board_revision()).map(|rev| format!("{rev:#x}")),
        mac_address: fetch(errors, mbox.board_mac_address()),
        ..PropsOutput::default()
    };

    out.temperature_c = fetch(errors, mbox.temperature());
    out.max_temperature_c = fetch(errors, mbox.max_temperature());
    out.turbo = fetch(errors, mbox.turbo());

    for id in PowerDeviceId::ALL {
        if let Some(value) = fetch(errors, mbox.power_state(id)) {
            out.power.push(Reading { id: id.to_string(), value });
        }
    }
    for id in ClockId::ALL {
        if let Some(value) = fetch(errors, mbox.clock_rate(id)) {
            out.clocks_hz.push(Reading { id: id.to_string(), value });
        }
        if let Some(value) = fetch(errors, mbox.clock_rate_measured(id)) {
            out.clocks_measured_hz.push(Reading { id: id.to_string(), value });
        }
    }
    for id in VoltageId::ALL {
        if let Some(value) = fetch(errors, mbox.voltage(id)) {
            out.voltages.push(Reading { id: id.to_string(), value });
        }
        if let Some(value) = fetch(errors, mbox.min_voltage(id)) {
            out.voltages_min.push(Reading { id: id.to_string(), value });
        }
        if let Some(value) = fetch(errors, mbox.max_voltage(id)) {
            out.voltages_max.push(Reading { id: id.to_string(), value });
        }
    }

    out.errors = errors.iter().map(ToString::to_string).collect();
    out
}

fn fetch<V>(errors: &mut Vec<PropertyError>, result: Result<V, PropertyError>) -> Option<V> {
    result.map_err(|err| errors.push(err)).ok()
}

fn rows(output: &PropsOutput) -> Vec<(String, String)> {
    fn show<V: ToString>(value: &Option<V>) -> String {
        value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    }

    let mut rows = vec![
        ("firmware revision".to_string(), show(&output.firmware_revision)),
        ("board model".to_string(), show(&output.board_model)),
        ("board revision".to_string(), show(&output.board_revision)),
        ("mac address".to_string(), show(&output.mac_address)),
        (
            "temperature".to_string(),
            show(&output.temperature_c.map(|c| format!("{c:.3} C"))),
        ),
        (
            "max temperature".to_string(),
            show(&output.max_temperature_c.map(|c| format!("{c:.3} C"))),
        ),
        ("turbo".to_string(), show(&output.turbo)),
    ];

    rows.extend(
        output
            .power
            .iter()
            .map(|r| (format!("power {}", r.id), r.value.to_string())),
    );
    rows.extend(
        output
            .clocks_hz
            .iter()
            .map(|r| (format!("clock {}", r.id), format!("{} Hz", r.value))),
    );
    rows.extend(
        output
            .clocks_measured_hz
            .iter()
            .map(|r| (format!("measured clock {}", r.id), format!("{} Hz", r.value))),
    );
    rows.extend(
        output
            .voltages
            .iter()
            .map(|r| (format!("voltage {}", r.id), format!("{:.6} V", r.value))),
    );
    rows.extend(
        output
            .voltages_min
            .iter()
            .map(|r| (format!("min voltage {}", r.id), format!("{:.6} V", r.value))),
    );
    rows.extend(
        output
            .voltages_max
            .iter()
            .map(|r| (format!("max voltage {}", r.id), format!("{:.6} V", r.value))),
    );
    rows
}

fn print_props(output: &PropsOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PROPERTY", "VALUE"]);
            for (name, value) in rows(output) {
                table.add_row(vec![name, value]);
            }
            println!("{table}");
            for err in &output.errors {
                eprintln!("warning: {err}");
            }
        }
        OutputFormat::Pretty => {
            for (name, value) in rows(output) {
                println!("{name:<28} {value}");
            }
            for err in &output.errors {
                println!("{:<28} {err}", "error");
            }
        }
    }
}
