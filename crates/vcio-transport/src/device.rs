use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{check_buffer, MailboxTransport};

/// Path of the VideoCore mailbox character device.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/vcio";

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

/// Linux `_IOWR(ty, nr, size)`.
const fn iowr(ty: u8, nr: u8, size: usize) -> u32 {
    ((IOC_READ | IOC_WRITE) << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// Property request code: `_IOWR('d', 0, char *)`.
///
/// The size field is the width of the pointer passed to the driver, not the
/// size of the buffer it points to.
pub const MBOX_PROPERTY: u32 = iowr(b'd', 0, std::mem::size_of::<*mut u8>());

/// The opened `/dev/vcio` device.
///
/// Opened read-only; the property ioctl both reads and writes through the
/// buffer pointer regardless of the open mode.
pub struct VcioDevice {
    file: Option<File>,
    path: PathBuf,
}

impl VcioDevice {
    /// Open the default mailbox device.
    pub fn open() -> Result<Self> {
        Self::open_path(DEFAULT_DEVICE_PATH)
    }

    /// Open a mailbox device at an explicit path.
    ///
    /// A missing path is reported as [`TransportError::NotImplemented`]; any
    /// other failure as [`TransportError::Open`].
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => TransportError::NotImplemented { path: path.clone() },
                _ => TransportError::Open {
                    path: path.clone(),
                    source: e,
                },
            })?;

        debug!(?path, "opened mailbox device");

        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// The path this device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "vcio-ioctl"
    }
}

impl MailboxTransport for VcioDevice {
    fn exchange(&mut self, buf: &mut [u32]) -> Result<()> {
        let file = self.file.as_ref().ok_or(TransportError::Closed)?;
        check_buffer(buf)?;

        // SAFETY: `buf` is a live, exclusively borrowed, 16-byte aligned slice and
        // `check_buffer` verified that the size the driver reads from `buf[0]`
        // does not exceed the slice, so the driver only touches memory we own.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), MBOX_PROPERTY as _, buf.as_mut_ptr()) };
        if rc < 0 {
            return Err(TransportError::Ioctl(std::io::Error::last_os_error()));
        }

        Ok(())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = ?self.path, "closed mailbox device");
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl std::fmt::Debug for VcioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcioDevice")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "vcio-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ))
    }

    #[test]
    fn property_code_matches_kernel_definition() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(MBOX_PROPERTY, 0xC008_6400);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(MBOX_PROPERTY, 0xC004_6400);
    }

    #[test]
    fn missing_device_is_not_implemented() {
        let path = unique_path("missing");
        let err = VcioDevice::open_path(&path).unwrap_err();
        assert!(matches!(err, TransportError::NotImplemented { path: p } if p == path));
    }

    #[test]
    fn other_open_failures_are_open_errors() {
        // A path through a regular file cannot be opened (ENOTDIR).
        let file = unique_path("notdir");
        std::fs::write(&file, b"x").expect("temp file should be writable");
        let err = VcioDevice::open_path(file.join("vcio")).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
        let _ = std::fs::remove_file(&file);
    }

    #[test]
    fn close_is_idempotent_and_blocks_exchange() {
        let file = unique_path("close");
        std::fs::write(&file, b"").expect("temp file should be writable");

        let mut device = VcioDevice::open_path(&file).expect("regular file should open");
        assert!(device.is_open());
        device.close();
        device.close();
        assert!(!device.is_open());

        let mut buf = [0u32; 4];
        let err = device.exchange(&mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Closed));

        let _ = std::fs::remove_file(&file);
    }

    #[test]
    fn ioctl_on_non_device_fails() {
        #[repr(C, align(16))]
        struct Aligned([u32; 8]);

        let file = unique_path("ioctl");
        std::fs::write(&file, b"").expect("temp file should be writable");

        let mut device = VcioDevice::open_path(&file).expect("regular file should open");
        let mut buf = Aligned([0; 8]);
        buf.0[0] = 32;
        let err = device.exchange(&mut buf.0).unwrap_err();
        assert!(matches!(err, TransportError::Ioctl(_)));

        let _ = std::fs::remove_file(&file);
    }
}
