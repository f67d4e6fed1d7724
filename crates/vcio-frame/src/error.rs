/// Errors that can occur while framing a request or decoding a response.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The firmware rejected the request buffer.
    #[error("vcio: error parsing request buffer")]
    MalformedRequest,

    /// The response code is neither success nor the malformed-request code.
    #[error("vcio: unexpected response code: {0:#010x}")]
    UnexpectedResponseCode(u32),

    /// A tag claims more words than remain in the buffer.
    #[error("vcio: tag buffer is too small (need {needed} words, have {available})")]
    TruncatedBuffer { needed: usize, available: usize },

    /// The request plus its response room does not fit in the buffer.
    #[error("request needs {needed} words but buffer holds {capacity}")]
    RequestTooLarge { needed: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
