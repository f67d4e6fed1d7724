use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use serde::Serialize;
use vcio_property::{Mailbox, MailboxConfig};
use vcio_transport::{MailboxTransport, VcioDevice, MBOX_PROPERTY};

use crate::cmd::{Context, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    device: String,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, ctx: &Context) -> CliResult<i32> {
    let checks = run_checks(&ctx.device, ctx.mailbox_config());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        device: ctx.device.display().to_string(),
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, ctx.format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn run_checks(device: &Path, config: MailboxConfig) -> Vec<CheckResult> {
    let mut checks = vec![device_node_check(device)];

    match VcioDevice::open_path(device) {
        Ok(dev) => {
            checks.push(CheckResult::new(
                "device_open",
                CheckStatus::Pass,
                format!(
                    "{} opened read-only via {}",
                    device.display(),
                    dev.transport_name()
                ),
            ));
            checks.push(firmware_query_check(Mailbox::with_config(dev, config)));
        }
        Err(err) => {
            checks.push(CheckResult::new(
                "device_open",
                CheckStatus::Fail,
                err.to_string(),
            ));
            checks.push(CheckResult::new(
                "firmware_query",
                CheckStatus::Skip,
                "device not open",
            ));
        }
    }

    checks.push(CheckResult::new(
        "ioctl_code",
        CheckStatus::Info,
        format!("{MBOX_PROPERTY:#010x} ({}-bit)", usize::BITS),
    ));
    checks
}

fn device_node_check(device: &Path) -> CheckResult {
    match std::fs::metadata(device) {
        Ok(meta) if meta.file_type().is_char_device() => CheckResult::new(
            "device_node",
            CheckStatus::Pass,
            format!("{} is a character device", device.display()),
        ),
        Ok(_) => CheckResult::new(
            "device_node",
            CheckStatus::Warn,
            format!("{} exists but is not a character device", device.display()),
        ),
        Err(err) => CheckResult::new(
            "device_node",
            CheckStatus::Fail,
            format!("{}: {err}", device.display()),
        ),
    }
}

fn firmware_query_check<T: MailboxTransport>(mut mbox: Mailbox<T>) -> CheckResult {
    let result = mbox.firmware_revision();
    mbox.close();

    match result {
        Ok(rev) => CheckResult::new(
            "firmware_query",
            CheckStatus::Pass,
            format!("firmware revision {rev}"),
        ),
        Err(err) => CheckResult::new("firmware_query", CheckStatus::Fail, err.to_string()),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = new_table(vec!["CHECK", "STATUS", "DETAIL"]);
            for c in &output.checks {
                table.add_row(vec![
                    c.name.to_string(),
                    status_text(c.status).to_string(),
                    c.detail.clone(),
                ]);
            }
            println!("{table}");
            println!("overall: {}", output.overall);
        }
        OutputFormat::Pretty => {
            println!("vcio doctor ({})\n", output.device);
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<16} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

#[cfg(test)]
mod tests {
    use vcio_transport::{FakeFirmware, FakeResponse};

    use super::*;

    #[test]
    fn missing_device_fails_and_skips_the_query() {
        let checks = run_checks(
            Path::new("/nonexistent/vcio-doctor-test"),
            MailboxConfig::default(),
        );

        let status: Vec<_> = checks.iter().map(|c| (c.name, c.status)).collect();
        assert_eq!(
            status,
            vec![
                ("device_node", CheckStatus::Fail),
                ("device_open", CheckStatus::Fail),
                ("firmware_query", CheckStatus::Skip),
                ("ioctl_code", CheckStatus::Info),
            ]
        );
    }

    #[test]
    fn regular_file_opens_but_refuses_the_query() {
        let path = std::env::temp_dir().join(format!(
            "vcio-doctor-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::write(&path, b"").expect("placeholder should be writable");

        let checks = run_checks(&path, MailboxConfig::default());
        let _ = std::fs::remove_file(&path);

        assert_eq!(checks[0].status, CheckStatus::Warn);
        assert_eq!(checks[1].status, CheckStatus::Pass);
        assert!(checks[1].detail.ends_with("via vcio-ioctl"));
        assert_eq!(checks[2].name, "firmware_query");
        assert_eq!(checks[2].status, CheckStatus::Fail);
    }

    #[test]
    fn firmware_query_reports_revision() {
        let mbox = Mailbox::new(FakeFirmware::scripted(vec![FakeResponse::Value(vec![
            1_700_000_000,
        ])]));
        let check = firmware_query_check(mbox);

        assert_eq!(check.status, CheckStatus::Pass);
        assert_eq!(check.detail, "firmware revision 1700000000");
    }

    #[test]
    fn firmware_query_failure_names_the_property() {
        let mbox = Mailbox::new(FakeFirmware::scripted(vec![FakeResponse::Malformed]));
        let check = firmware_query_check(mbox);

        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.detail.starts_with("unable to get firmware revision"));
    }

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            device: "/dev/vcio".to_string(),
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }
}
