//! Raspberry Pi firmware telemetry over the VideoCore mailbox.
//!
//! # Crate Structure
//!
//! - [`transport`]: `/dev/vcio` device access and the property ioctl
//! - [`frame`]: Buffer alignment, request framing, response and tag parsing
//! - [`property`]: Typed property client with unit conversions
//! - [`exposition`]: Prometheus text exposition of every property

pub mod exposition;

/// Re-export transport types.
pub mod transport {
    pub use vcio_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vcio_frame::*;
}

/// Re-export property types.
pub mod property {
    pub use vcio_property::*;
}

pub use exposition::{write_metrics, ExpositionReport};
