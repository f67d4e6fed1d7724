use crate::error::{FrameError, Result};

/// Words in a tag header: id, value buffer size, request/response length.
pub const TAG_HEADER_WORDS: usize = 3;

/// The single-word tag that ends a tag sequence.
pub const END_TAG: u32 = 0;

/// Set in the third header word of a tag once the firmware has answered it.
pub const RESPONSE_FLAG: u32 = 0x8000_0000;

const LENGTH_MASK: u32 = !RESPONSE_FLAG;

/// One self-describing tag borrowed from a response buffer.
///
/// Layout: `[id, capacity bytes, response flag | length bytes, value words...]`,
/// or the single word `[0]` for the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    words: &'a [u32],
}

impl<'a> Tag<'a> {
    /// Tag id, or `0` for the end marker.
    pub fn id(&self) -> u32 {
        self.words[0]
    }

    /// Size of the value buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.words.get(1).map_or(0, |&w| w as usize)
    }

    /// Length of the response value in bytes, as reported by the firmware.
    ///
    /// May exceed [`capacity`](Self::capacity); in that case the value was cut
    /// short and the request must be repeated with a larger value buffer.
    pub fn value_len(&self) -> usize {
        if !self.is_response() {
            return 0;
        }
        (self.words[2] & LENGTH_MASK) as usize
    }

    pub fn is_response(&self) -> bool {
        self.words
            .get(2)
            .is_some_and(|&w| w & RESPONSE_FLAG == RESPONSE_FLAG)
    }

    pub fn is_end(&self) -> bool {
        self.words.len() == 1 && self.words[0] == END_TAG
    }

    /// Whether the firmware had more to say than the value buffer could hold.
    pub fn is_truncated(&self) -> bool {
        self.value_len() > self.capacity()
    }

    /// Value words actually written, never reaching past the value buffer.
    pub fn value(&self) -> &'a [u32] {
        if self.is_end() {
            return &[];
        }
        let words = self.value_len().min(self.capacity()) / 4;
        &self.words[TAG_HEADER_WORDS..TAG_HEADER_WORDS + words]
    }

    /// Value bytes actually written, in memory (little-endian) order.
    pub fn value_bytes(&self) -> Vec<u8> {
        if self.is_end() {
            return Vec::new();
        }
        let bytes = self.value_len().min(self.capacity());
        self.words[TAG_HEADER_WORDS..]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .take(bytes)
            .collect()
    }

    /// Total length of the tag in words, including its header.
    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    /// The raw words of this tag.
    pub fn as_words(&self) -> &'a [u32] {
        self.words
    }
}

/// Read the tag at the start of `words`.
///
/// Returns the end marker if the first word is `0`; otherwise the tag
/// spanning `3 + capacity / 4` words.
pub fn read_tag(words: &[u32]) -> Result<Tag<'_>> {
    match words.first() {
        None => {
            return Err(FrameError::TruncatedBuffer {
                needed: 1,
                available: 0,
            })
        }
        Some(&END_TAG) => return Ok(Tag { words: &words[..1] }),
        Some(_) => {}
    }

    if words.len() < TAG_HEADER_WORDS {
        return Err(FrameError::TruncatedBuffer {
            needed: TAG_HEADER_WORDS,
            available: words.len(),
        });
    }

    let size = TAG_HEADER_WORDS + (words[1] / 4) as usize;
    if words.len() < size {
        return Err(FrameError::TruncatedBuffer {
            needed: size,
            available: words.len(),
        });
    }

    Ok(Tag {
        words: &words[..size],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_response_tag() {
        let words = [5, 8, 0x8000_0008, 0xAA, 0xBB, 0];
        let tag = read_tag(&words).unwrap();

        assert_eq!(tag.id(), 5);
        assert_eq!(tag.capacity(), 8);
        assert_eq!(tag.value_len(), 8);
        assert!(tag.is_response());
        assert!(!tag.is_truncated());
        assert_eq!(tag.value(), &[0xAA, 0xBB]);
        assert_eq!(tag.word_len(), 5);
    }

    #[test]
    fn reads_end_marker() {
        let tag = read_tag(&[0, 99, 99]).unwrap();
        assert!(tag.is_end());
        assert_eq!(tag.word_len(), 1);
        assert!(tag.value().is_empty());
    }

    #[test]
    fn unanswered_tag_has_no_value() {
        let tag = read_tag(&[0x0003_0002, 8, 0, 4, 0]).unwrap();
        assert!(!tag.is_response());
        assert_eq!(tag.value_len(), 0);
        assert!(tag.value().is_empty());
    }

    #[test]
    fn oversized_length_is_clamped_to_capacity() {
        let tag = read_tag(&[0x0001_0003, 8, 0x8000_0010, 1, 2]).unwrap();
        assert!(tag.is_truncated());
        assert_eq!(tag.value_len(), 16);
        assert_eq!(tag.value(), &[1, 2]);
    }

    #[test]
    fn short_value_is_rounded_down_to_words() {
        // MAC address replies carry 6 bytes in an 8 byte buffer.
        let tag = read_tag(&[0x0001_0003, 8, 0x8000_0006, 0x4433_2211, 0x0000_6655]).unwrap();
        assert_eq!(tag.value(), &[0x4433_2211]);
        assert_eq!(tag.value_bytes(), vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }

    #[test]
    fn rejects_empty_and_short_buffers() {
        assert_eq!(
            read_tag(&[]),
            Err(FrameError::TruncatedBuffer {
                needed: 1,
                available: 0
            })
        );
        assert_eq!(
            read_tag(&[7, 8]),
            Err(FrameError::TruncatedBuffer {
                needed: 3,
                available: 2
            })
        );
    }

    #[test]
    fn rejects_capacity_past_end() {
        assert_eq!(
            read_tag(&[7, 16, 0x8000_0004, 1]),
            Err(FrameError::TruncatedBuffer {
                needed: 7,
                available: 4
            })
        );
    }
}
