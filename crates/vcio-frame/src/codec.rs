use crate::error::{FrameError, Result};
use crate::tag::TAG_HEADER_WORDS;

/// Buffer header (size + code) followed by one tag header: 5 words.
pub const HEADER_WORDS: usize = 2 + TAG_HEADER_WORDS;

/// Index of the first tag in a buffer.
pub const TAGS_OFFSET: usize = 2;

/// Code written into word 1 of every request.
pub const REQUEST_CODE: u32 = 0x0000_0000;

/// Response code: request processed.
pub const CODE_SUCCESS: u32 = 0x8000_0000;

/// Response code: the firmware could not parse the request buffer.
pub const CODE_MALFORMED: u32 = 0x8000_0001;

/// Value buffer size in bytes for a request, widened so `arg_count` words fit.
pub fn value_buffer_size(declared_bytes: u32, arg_count: usize) -> u32 {
    let needed = (arg_count * 4) as u32;
    declared_bytes.max(needed)
}

/// Encode a single-tag property request into `buf`.
///
/// Layout:
/// ```text
/// ┌────────────┬──────┬────────┬─────────────┬──────────┬──────────────┐
/// │ size bytes │ code │ tag id │ value bytes │ req/resp │ args...      │
/// │ (word 0)   │  0   │        │             │    0     │ (word 5..)   │
/// └────────────┴──────┴────────┴─────────────┴──────────┴──────────────┘
/// ```
///
/// Only the header and `args` are written. Words after the arguments are
/// left untouched, so the caller must hand in a cleared buffer if stale
/// words could otherwise be read back as tags.
///
/// Returns the number of words written.
pub fn encode_request(
    buf: &mut [u32],
    tag_id: u32,
    value_bytes: u32,
    args: &[u32],
) -> Result<usize> {
    let value_bytes = value_buffer_size(value_bytes, args.len());
    let value_words = (value_bytes as usize).div_ceil(4);

    // Room for the header, the value region and the end marker that follows it.
    let needed = HEADER_WORDS + value_words + 1;
    if needed > buf.len() {
        return Err(FrameError::RequestTooLarge {
            needed,
            capacity: buf.len(),
        });
    }

    buf[0] = (buf.len() * 4) as u32;
    buf[1] = REQUEST_CODE;
    buf[2] = tag_id;
    buf[3] = value_bytes;
    buf[4] = 0;
    buf[HEADER_WORDS..HEADER_WORDS + args.len()].copy_from_slice(args);

    Ok(HEADER_WORDS + args.len())
}

/// Outcome encoded in word 1 of a response buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    MalformedRequest,
    Unexpected(u32),
}

impl ResponseStatus {
    pub fn from_code(code: u32) -> Self {
        if code == CODE_MALFORMED {
            Self::MalformedRequest
        } else if code & CODE_SUCCESS == CODE_SUCCESS {
            Self::Success
        } else {
            Self::Unexpected(code)
        }
    }
}

/// Check the response code the firmware wrote over word 1.
pub fn check_response(buf: &[u32]) -> Result<()> {
    let code = *buf.get(1).ok_or(FrameError::TruncatedBuffer {
        needed: 2,
        available: buf.len(),
    })?;

    match ResponseStatus::from_code(code) {
        ResponseStatus::Success => Ok(()),
        ResponseStatus::MalformedRequest => Err(FrameError::MalformedRequest),
        ResponseStatus::Unexpected(code) => Err(FrameError::UnexpectedResponseCode(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_header_and_args() {
        let mut buf = [0u32; 16];
        let written = encode_request(&mut buf, 0x0003_0047, 8, &[3]).unwrap();

        assert_eq!(written, 6);
        assert_eq!(&buf[..6], &[64, REQUEST_CODE, 0x0003_0047, 8, 0, 3]);
    }

    #[test]
    fn encode_widens_value_size_to_fit_args() {
        let mut buf = [0u32; 16];
        encode_request(&mut buf, 0x10, 4, &[7, 8, 9]).unwrap();

        assert_eq!(&buf[..8], &[64, 0, 0x10, 12, 0, 7, 8, 9]);
    }

    #[test]
    fn encode_without_args_keeps_declared_size() {
        let mut buf = [0u32; 8];
        let written = encode_request(&mut buf, 0x0000_0001, 4, &[]).unwrap();

        assert_eq!(written, HEADER_WORDS);
        assert_eq!(&buf[..5], &[32, 0, 1, 4, 0]);
    }

    #[test]
    fn encode_leaves_trailing_words_untouched() {
        // Stale words past the arguments survive framing; callers clear the
        // buffer before reuse.
        let mut buf = [0xDEAD_BEEFu32; 10];
        encode_request(&mut buf, 0x0003_0002, 8, &[4]).unwrap();

        assert_eq!(&buf[..6], &[40, 0, 0x0003_0002, 8, 0, 4]);
        assert!(buf[6..].iter().all(|&w| w == 0xDEAD_BEEF));
    }

    #[test]
    fn encode_rejects_request_that_cannot_fit() {
        let mut buf = [0u32; 6];
        let err = encode_request(&mut buf, 1, 8, &[1]).unwrap_err();
        assert_eq!(
            err,
            FrameError::RequestTooLarge {
                needed: 8,
                capacity: 6
            }
        );
    }

    #[test]
    fn value_buffer_size_clamps_up_only() {
        assert_eq!(value_buffer_size(8, 1), 8);
        assert_eq!(value_buffer_size(0, 2), 8);
        assert_eq!(value_buffer_size(4, 0), 4);
    }

    #[test]
    fn response_codes_classify() {
        assert_eq!(ResponseStatus::from_code(0x8000_0000), ResponseStatus::Success);
        assert_eq!(
            ResponseStatus::from_code(0x8000_0001),
            ResponseStatus::MalformedRequest
        );
        assert_eq!(
            ResponseStatus::from_code(0x0000_0000),
            ResponseStatus::Unexpected(0)
        );
        assert_eq!(
            ResponseStatus::from_code(0x1234_5678),
            ResponseStatus::Unexpected(0x1234_5678)
        );
    }

    #[test]
    fn check_response_maps_to_errors() {
        assert_eq!(check_response(&[64, 0x8000_0000]), Ok(()));
        assert_eq!(
            check_response(&[64, 0x8000_0001]),
            Err(FrameError::MalformedRequest)
        );
        assert_eq!(
            check_response(&[64, 0x1234_5678]),
            Err(FrameError::UnexpectedResponseCode(0x1234_5678))
        );
        assert!(matches!(
            check_response(&[64]),
            Err(FrameError::TruncatedBuffer { .. })
        ));
    }
}
