use crate::property::Property;

/// Errors from a single request/response exchange.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Opening or driving the device failed.
    #[error(transparent)]
    Transport(#[from] vcio_transport::TransportError),

    /// The firmware rejected the request or the response could not be parsed.
    #[error(transparent)]
    Frame(#[from] vcio_frame::FrameError),

    /// The response carried no tag.
    #[error("response to tag {tag_id:#010x} carried no tags")]
    MissingExpectedTag { tag_id: u32 },

    /// The first response tag is not the one that was requested.
    #[error("expected tag {expected:#010x} in response, got {actual:#010x}")]
    UnexpectedTag { expected: u32, actual: u32 },

    /// The tag's value holds fewer words than the property needs.
    #[error("tag {tag_id:#010x} value has {available} words, need {needed}")]
    ValueTooShort {
        tag_id: u32,
        needed: usize,
        available: usize,
    },
}

/// A failed property fetch, naming the property that was being read.
///
/// The cause is part of the message and is not exposed again through
/// [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("unable to get {property}: {error}")]
pub struct PropertyError {
    pub property: Property,
    pub error: RequestError,
}

impl PropertyError {
    pub fn new(property: Property, error: RequestError) -> Self {
        Self { property, error }
    }
}

pub type Result<T> = std::result::Result<T, PropertyError>;
