use crate::error::Result;
use crate::tag::{read_tag, Tag};

/// Walks the tags of a response buffer, stopping at the end marker.
///
/// Yields each tag in order. The first error ends the iteration; a buffer
/// that runs out before an end marker is an error, never a short read.
#[derive(Debug, Clone)]
pub struct TagReader<'a> {
    remaining: &'a [u32],
    done: bool,
}

impl<'a> TagReader<'a> {
    /// Start reading at the first tag of `region` (word 2 of a response buffer).
    pub fn new(region: &'a [u32]) -> Self {
        Self {
            remaining: region,
            done: false,
        }
    }

    /// Words not yet consumed.
    pub fn remaining(&self) -> &'a [u32] {
        self.remaining
    }
}

impl<'a> Iterator for TagReader<'a> {
    type Item = Result<Tag<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tag = match read_tag(self.remaining) {
            Ok(tag) => tag,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        if tag.is_end() {
            self.done = true;
            return None;
        }

        self.remaining = &self.remaining[tag.word_len()..];
        Some(Ok(tag))
    }
}

/// Parse every tag in `region` up to the end marker.
pub fn parse_tags(region: &[u32]) -> Result<Vec<Tag<'_>>> {
    TagReader::new(region).collect()
}
