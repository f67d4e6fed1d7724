use std::io::Write;

use tracing::warn;
use vcio::write_metrics;

use crate::cmd::{Context, MetricsArgs};
use crate::exit::{io_error, CliResult, FAILURE, SUCCESS};

pub fn run(_args: MetricsArgs, ctx: &Context) -> CliResult<i32> {
    let mut mbox = ctx.open_mailbox()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = write_metrics(&mut mbox, &mut out)
        .and_then(|report| out.flush().map(|()| report))
        .map_err(|err| io_error("unable to write metrics", err))?;
    mbox.close();

    for failure in &report.failures {
        warn!(error = %failure, "gauge incomplete");
    }

    if report.is_complete() {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
