//! VideoCore mailbox device access.
//!
//! The lowest layer of vcio: owns the open `/dev/vcio` handle and performs
//! the single blocking property ioctl that hands a word buffer to the
//! firmware and waits for it to be overwritten with the response.
//!
//! Everything else builds on the [`MailboxTransport`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod device;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use error::{Result, TransportError};
pub use traits::{MailboxTransport, BUFFER_ALIGN};

#[cfg(unix)]
pub use device::{VcioDevice, DEFAULT_DEVICE_PATH, MBOX_PROPERTY};

#[cfg(any(test, feature = "fake"))]
pub use fake::{FakeFirmware, FakeResponse};
