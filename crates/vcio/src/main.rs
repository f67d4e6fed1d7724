#[cfg(unix)]
mod cmd;
mod exit;
mod logging;
mod output;

#[cfg(unix)]
use std::path::PathBuf;

#[cfg(unix)]
use clap::Parser;
#[cfg(unix)]
use vcio_transport::DEFAULT_DEVICE_PATH;

#[cfg(unix)]
use crate::cmd::{Command, Context};
#[cfg(unix)]
use crate::logging::{init_logging, LogFormat, LogLevel};
#[cfg(unix)]
use crate::output::OutputFormat;

#[cfg(unix)]
#[derive(Parser, Debug)]
#[command(
    name = "vcio",
    version,
    about = "Raspberry Pi firmware telemetry over the VideoCore mailbox"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Mailbox device node.
    #[arg(
        long,
        value_name = "PATH",
        env = "VCIO_DEVICE",
        default_value = DEFAULT_DEVICE_PATH,
        global = true
    )]
    device: PathBuf,

    /// Dump every mailbox buffer and log at debug level.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[cfg(unix)]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level.effective(cli.debug));

    let ctx = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        device: cli.device,
        debug: cli.debug,
    };
    let result = cmd::run(cli.command, &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(not(unix))]
fn main() {
    eprintln!("error: the VideoCore mailbox is only reachable on Linux");
    std::process::exit(exit::UNAVAILABLE);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from(["vcio", "serve", "--addr", "127.0.0.1:9110"])
            .expect("serve args should parse");

        match cli.command {
            Command::Serve(args) => assert_eq!(args.addr, "127.0.0.1:9110"),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "vcio",
            "metrics",
            "--device",
            "/tmp/not-a-mailbox",
            "--debug",
        ])
        .expect("global flags should parse after the subcommand");

        assert!(matches!(cli.command, Command::Metrics(_)));
        assert_eq!(cli.device, PathBuf::from("/tmp/not-a-mailbox"));
        assert!(cli.debug);
    }

    #[test]
    fn rejects_unknown_output_format() {
        let err = Cli::try_parse_from(["vcio", "props", "--format", "xml"])
            .expect_err("unknown format should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
