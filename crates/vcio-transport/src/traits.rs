use crate::error::{Result, TransportError};

/// Required alignment, in bytes, of every buffer passed to [`MailboxTransport::exchange`].
pub const BUFFER_ALIGN: usize = 16;

/// A channel to the firmware's property interface.
///
/// Implementations exchange one request buffer for one response, in place.
/// Callers must serialize access; `exchange` takes `&mut self` so a single
/// owner can never have two exchanges in flight.
pub trait MailboxTransport {
    /// Hand `buf` to the firmware and block until it has been overwritten
    /// with the response.
    ///
    /// `buf[0]` must hold the total buffer size in bytes and must not exceed
    /// `buf.len() * 4`. There is no timeout.
    fn exchange(&mut self, buf: &mut [u32]) -> Result<()>;

    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self);

    /// Whether the handle is still usable.
    fn is_open(&self) -> bool;
}

impl<T: MailboxTransport + ?Sized> MailboxTransport for Box<T> {
    fn exchange(&mut self, buf: &mut [u32]) -> Result<()> {
        (**self).exchange(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Checks the invariants every transport relies on before touching `buf`.
pub(crate) fn check_buffer(buf: &[u32]) -> Result<()> {
    let addr = buf.as_ptr() as usize;
    if addr % BUFFER_ALIGN != 0 {
        return Err(TransportError::Misaligned { addr });
    }

    let capacity = buf.len() * 4;
    let declared = buf.first().copied().unwrap_or(0) as usize;
    if declared == 0 || declared > capacity {
        return Err(TransportError::SizeMismatch { declared, capacity });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(16))]
    struct Aligned([u32; 8]);

    #[test]
    fn check_buffer_accepts_aligned_and_sized() {
        let mut backing = Aligned([0; 8]);
        backing.0[0] = 32;
        assert!(check_buffer(&backing.0).is_ok());
    }

    #[test]
    fn check_buffer_rejects_misaligned_view() {
        let mut backing = Aligned([0; 8]);
        backing.0[1] = 16;
        let err = check_buffer(&backing.0[1..5]).unwrap_err();
        assert!(matches!(err, TransportError::Misaligned { .. }));
    }

    #[test]
    fn check_buffer_rejects_oversized_header() {
        let mut backing = Aligned([0; 8]);
        backing.0[0] = 64;
        let err = check_buffer(&backing.0).unwrap_err();
        assert!(matches!(
            err,
            TransportError::SizeMismatch {
                declared: 64,
                capacity: 32
            }
        ));
    }

    #[test]
    fn check_buffer_rejects_empty() {
        let backing = Aligned([0; 8]);
        let err = check_buffer(&backing.0[..0]).unwrap_err();
        assert!(matches!(err, TransportError::SizeMismatch { .. }));
    }
}
