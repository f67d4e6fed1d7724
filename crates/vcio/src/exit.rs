use std::fmt;
use std::io;

use vcio_frame::FrameError;
use vcio_property::{PropertyError, RequestError};
use vcio_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// No mailbox device on this system (sysexits `EX_UNAVAILABLE`).
pub const UNAVAILABLE: i32 = 69;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => USAGE,
        io::ErrorKind::NotFound => UNAVAILABLE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::NotImplemented { .. } => {
            CliError::new(UNAVAILABLE, format!("{context}: {err}"))
        }
        TransportError::Open { source, .. } => io_error(context, source),
        TransportError::Ioctl(ref source)
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::RequestTooLarge { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn property_error(err: PropertyError) -> CliError {
    let context = format!("unable to get {}", err.property);
    match err.error {
        RequestError::Transport(err) => transport_error(&context, err),
        RequestError::Frame(err) => frame_error(&context, err),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
