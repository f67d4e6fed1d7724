use tracing::trace;
use vcio_transport::BUFFER_ALIGN;

const WORD_BYTES: usize = std::mem::size_of::<u32>();
const ALIGN_WORDS: usize = BUFFER_ALIGN / WORD_BYTES;

/// Words allocated for the backing store of the default buffer.
pub const BACKING_WORDS: usize = 48;

/// Words in the aligned view of the default buffer (176 bytes).
pub const BUFFER_WORDS: usize = BACKING_WORDS - ALIGN_WORDS;

/// Number of leading words to skip so that `words[offset..]` starts on a
/// [`BUFFER_ALIGN`] boundary.
///
/// Always less than `BUFFER_ALIGN / 4` because a `u32` slice is word aligned.
pub fn aligned_offset(words: &[u32]) -> usize {
    let misalign = (words.as_ptr() as usize) % BUFFER_ALIGN;
    if misalign == 0 {
        0
    } else {
        (BUFFER_ALIGN - misalign) / WORD_BYTES
    }
}

/// A fixed-length word buffer whose working view is 16-byte aligned.
///
/// The backing store is heap allocated with `ALIGN_WORDS` spare words so its
/// address never moves; the aligned offset is computed on first use and
/// reused for the lifetime of the buffer.
pub struct AlignedBuffer {
    backing: Box<[u32]>,
    len: usize,
    offset: Option<usize>,
}

impl AlignedBuffer {
    /// Buffer with the default [`BUFFER_WORDS`] view.
    pub fn new() -> Self {
        Self::with_len(BUFFER_WORDS)
    }

    /// Buffer whose aligned view holds exactly `len` words.
    pub fn with_len(len: usize) -> Self {
        Self {
            backing: vec![0u32; len + ALIGN_WORDS].into_boxed_slice(),
            len,
            offset: None,
        }
    }

    /// Length of the aligned view in words.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the aligned view holds no words.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The aligned view, computing the offset on first call.
    pub fn view(&mut self) -> &mut [u32] {
        let offset = *self.offset.get_or_insert_with(|| {
            let offset = aligned_offset(&self.backing);
            trace!(offset, "aligned mailbox buffer");
            offset
        });
        &mut self.backing[offset..offset + self.len]
    }

    /// The aligned view with every word cleared, ready for a new request.
    ///
    /// Clearing here keeps words left over from a previous response from
    /// being read back as a spurious tag after the new request's value region.
    pub fn acquire(&mut self) -> &mut [u32] {
        let view = self.view();
        view.fill(0);
        view
    }

    /// Read-only aligned view.
    pub fn as_slice(&self) -> &[u32] {
        let offset = self
            .offset
            .unwrap_or_else(|| aligned_offset(&self.backing));
        &self.backing[offset..offset + self.len]
    }
}

impl Default for AlignedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish()
    }
}
