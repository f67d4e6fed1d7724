use std::path::PathBuf;

/// Errors that can occur while opening or driving the mailbox device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The mailbox device node does not exist on this system.
    #[error("vcio: not implemented ({path} not found)")]
    NotImplemented { path: PathBuf },

    /// Failed to open the mailbox device for any other reason.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The property ioctl itself failed.
    #[error("unable to send message via ioctl: {0}")]
    Ioctl(#[source] std::io::Error),

    /// The buffer handed to the transport does not start on a 16-byte boundary.
    #[error("mailbox buffer at {addr:#x} is not 16-byte aligned")]
    Misaligned { addr: usize },

    /// Header word 0 claims more bytes than the buffer holds.
    #[error("mailbox header declares {declared} bytes but buffer holds {capacity}")]
    SizeMismatch { declared: usize, capacity: usize },

    /// The handle has been closed.
    #[error("mailbox device closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
