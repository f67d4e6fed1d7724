use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::debug;
use vcio_property::{DeviceMailbox, MailboxConfig};

use crate::exit::{transport_error, CliResult};
use crate::output::OutputFormat;

pub mod doctor;
pub mod metrics;
pub mod props;
pub mod serve;
pub mod version;

/// Default listen address for `serve`.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9110";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every gauge once in Prometheus text format.
    Metrics(MetricsArgs),
    /// Serve gauges over HTTP at /metrics.
    Serve(ServeArgs),
    /// Print board identity and current readings.
    Props(PropsArgs),
    /// Check that the mailbox device is present and answering.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Global settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub device: PathBuf,
    pub debug: bool,
}

impl Context {
    pub fn mailbox_config(&self) -> MailboxConfig {
        MailboxConfig {
            trace_buffers: self.debug,
        }
    }

    /// Open the configured device, mapping failures to exit codes.
    pub fn open_mailbox(&self) -> CliResult<DeviceMailbox> {
        debug!(device = %self.device.display(), "opening mailbox");
        DeviceMailbox::open_path(&self.device, self.mailbox_config())
            .map_err(|err| transport_error("unable to open mailbox", err))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Metrics(args) => metrics::run(args, ctx),
        Command::Serve(args) => serve::run(args, ctx),
        Command::Props(args) => props::run(args, ctx),
        Command::Doctor(args) => doctor::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct MetricsArgs {}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, value_name = "ADDR", env = "VCIO_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub addr: String,
}

#[derive(Args, Debug, Default)]
pub struct PropsArgs {}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
