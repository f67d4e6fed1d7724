//! Mailbox property buffer layout.
//!
//! Every exchange with the firmware uses one word buffer laid out as:
//! - word 0: total buffer size in bytes
//! - word 1: request/response code
//! - words 2..: a sequence of tags, terminated by a single `0` word
//!
//! This crate owns the aligned buffer, writes requests into it and parses
//! the response the firmware leaves behind. It performs no I/O.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod reader;
pub mod tag;

pub use buffer::{aligned_offset, AlignedBuffer, BACKING_WORDS, BUFFER_WORDS};
pub use codec::{
    check_response, encode_request, value_buffer_size, ResponseStatus, CODE_MALFORMED,
    CODE_SUCCESS, HEADER_WORDS, REQUEST_CODE, TAGS_OFFSET,
};
pub use error::{FrameError, Result};
pub use reader::{parse_tags, TagReader};
pub use tag::{read_tag, Tag, END_TAG, RESPONSE_FLAG, TAG_HEADER_WORDS};
