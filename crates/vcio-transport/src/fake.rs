//! Scripted in-memory firmware used in place of `/dev/vcio` in tests.

use std::collections::VecDeque;

use crate::error::{Result, TransportError};
use crate::traits::{check_buffer, MailboxTransport};

const CODE_SUCCESS: u32 = 0x8000_0000;
const CODE_MALFORMED: u32 = 0x8000_0001;
const TAG_RESPONSE: u32 = 0x8000_0000;

/// How the fake firmware answers one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeResponse {
    /// Successful reply carrying these value words, echoed into the request's tag.
    Value(Vec<u32>),
    /// Successful reply whose tag reports `len` bytes but only `cap`-limited words fit.
    Oversized { value: Vec<u32>, len: u32 },
    /// Successful reply whose tag id is replaced by `tag_id`.
    Retagged { tag_id: u32, value: Vec<u32> },
    /// Overwrite the response code with this raw value and leave the rest alone.
    Code(u32),
    /// Reply with the malformed-request code.
    Malformed,
    /// Successful code but the value region starts with the end marker.
    NoTags,
}

/// Called with the tag id and the request's whole declared value region.
///
/// The region is `value_bytes / 4` words long and zero past the arguments
/// the caller wrote, so a request without arguments still sees `[0]`.
type Handler = Box<dyn FnMut(u32, &[u32]) -> FakeResponse + Send>;

/// A [`MailboxTransport`] that decodes each request and answers it from a
/// handler closure, recording every request it sees.
pub struct FakeFirmware {
    handler: Handler,
    failures: VecDeque<std::io::Error>,
    requests: Vec<Vec<u32>>,
    open: bool,
}

impl FakeFirmware {
    /// Answer each request with `handler(tag_id, region)`, where `region` is
    /// the zero-padded value region of the request, not only its arguments.
    pub fn new(handler: impl FnMut(u32, &[u32]) -> FakeResponse + Send + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            failures: VecDeque::new(),
            requests: Vec::new(),
            open: true,
        }
    }

    /// Answer requests in order from `script`; extra requests get [`FakeResponse::Malformed`].
    pub fn scripted(script: Vec<FakeResponse>) -> Self {
        let mut script: VecDeque<FakeResponse> = script.into();
        Self::new(move |_, _| script.pop_front().unwrap_or(FakeResponse::Malformed))
    }

    /// Fail the next exchange with `err` before the handler runs.
    pub fn fail_next(&mut self, err: std::io::Error) {
        self.failures.push_back(err);
    }

    /// Every request seen so far: header words followed by the declared value region.
    pub fn requests(&self) -> &[Vec<u32>] {
        &self.requests
    }

    fn respond(&mut self, buf: &mut [u32]) {
        let tag_id = buf[2];
        let cap_words = (buf[3] / 4) as usize;
        let region_end = (5 + cap_words).min(buf.len());
        self.requests.push(buf[..region_end].to_vec());

        let args = buf[5..region_end].to_vec();
        let (value, len) = match (self.handler)(tag_id, &args) {
            FakeResponse::Value(value) => {
                let len = (value.len() * 4) as u32;
                (value, len)
            }
            FakeResponse::Oversized { value, len } => (value, len),
            FakeResponse::Retagged { tag_id, value } => {
                buf[2] = tag_id;
                let len = (value.len() * 4) as u32;
                (value, len)
            }
            FakeResponse::Code(code) => {
                buf[1] = code;
                return;
            }
            FakeResponse::Malformed => {
                buf[1] = CODE_MALFORMED;
                return;
            }
            FakeResponse::NoTags => {
                buf[1] = CODE_SUCCESS;
                buf[2] = 0;
                return;
            }
        };

        buf[1] = CODE_SUCCESS;
        buf[4] = TAG_RESPONSE | len;
        // Like the firmware, only the tag is rewritten; whatever follows the
        // value region (normally the request's end marker) is left alone.
        for (slot, word) in buf[5..region_end].iter_mut().zip(value) {
            *slot = word;
        }
    }
}

impl MailboxTransport for FakeFirmware {
    fn exchange(&mut self, buf: &mut [u32]) -> Result<()> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        check_buffer(buf)?;

        if let Some(err) = self.failures.pop_front() {
            return Err(TransportError::Ioctl(err));
        }

        if buf.len() < 5 {
            if let Some(code) = buf.get_mut(1) {
                *code = CODE_MALFORMED;
            }
            return Ok(());
        }

        self.respond(buf);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl std::fmt::Debug for FakeFirmware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeFirmware")
            .field("requests", &self.requests.len())
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(16))]
    struct Aligned([u32; 16]);

    fn request(tag: u32, cap: u32, args: &[u32]) -> Aligned {
        let mut buf = Aligned([0; 16]);
        buf.0[0] = 64;
        buf.0[2] = tag;
        buf.0[3] = cap;
        buf.0[5..5 + args.len()].copy_from_slice(args);
        buf
    }

    #[test]
    fn answers_with_value_in_place() {
        let mut fw = FakeFirmware::new(|tag, args| {
            assert_eq!(tag, 0x0003_0047);
            FakeResponse::Value(vec![args[0], 600_000_000])
        });

        let mut buf = request(0x0003_0047, 8, &[3]);
        fw.exchange(&mut buf.0).expect("exchange should succeed");

        assert_eq!(
            &buf.0[..8],
            &[64, 0x8000_0000, 0x0003_0047, 8, 0x8000_0008, 3, 600_000_000, 0]
        );
        assert_eq!(fw.requests(), &[vec![64, 0, 0x0003_0047, 8, 0, 3, 0]]);
    }

    #[test]
    fn handler_sees_the_padded_value_region() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = seen.clone();
        let mut fw = FakeFirmware::new(move |_, region| {
            record.lock().expect("lock").push(region.to_vec());
            FakeResponse::Value(vec![5])
        });

        let mut scalar = request(0x0000_0001, 4, &[]);
        fw.exchange(&mut scalar.0).expect("exchange should succeed");
        let mut keyed = request(0x0003_0002, 8, &[3]);
        fw.exchange(&mut keyed.0).expect("exchange should succeed");

        assert_eq!(*seen.lock().expect("lock"), vec![vec![0], vec![3, 0]]);
    }

    #[test]
    fn oversized_value_is_clipped_to_capacity() {
        let mut fw = FakeFirmware::scripted(vec![FakeResponse::Oversized {
            value: vec![1, 2, 3],
            len: 12,
        }]);

        let mut buf = request(0x0001_0003, 8, &[]);
        buf.0[7] = 0xFFFF_FFFF;
        fw.exchange(&mut buf.0).expect("exchange should succeed");

        assert_eq!(&buf.0[4..8], &[0x8000_000C, 1, 2, 0xFFFF_FFFF]);
    }

    #[test]
    fn queued_failure_surfaces_as_ioctl_error() {
        let mut fw = FakeFirmware::scripted(vec![FakeResponse::Value(vec![1])]);
        fw.fail_next(std::io::Error::other("device gone"));

        let mut buf = request(1, 4, &[]);
        let err = fw.exchange(&mut buf.0).unwrap_err();
        assert!(matches!(err, TransportError::Ioctl(_)));
        assert!(fw.requests().is_empty());

        fw.exchange(&mut buf.0).expect("second exchange should succeed");
        assert_eq!(buf.0[5], 1);
    }

    #[test]
    fn closed_fake_rejects_exchange() {
        let mut fw = FakeFirmware::scripted(vec![]);
        fw.close();
        fw.close();
        let mut buf = request(1, 4, &[]);
        assert!(matches!(
            fw.exchange(&mut buf.0),
            Err(TransportError::Closed)
        ));
    }
}
