pub mod challenge;
pub mod chunk;
pub mod packet;
pub mod reassembly;
pub mod types;

pub use challenge::{derive_buttons, ChallengeCode};
pub use chunk::{send_chunks, ChunkFraming};
pub use packet::{encode, Payload, Report};
pub use reassembly::{read_fixed, ReadPlan};
pub use types::{KeyType, Message, MessageField};

use std::time::Duration;

use crate::hid::HidError;

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("Invalid payload type: {0}")]
    InvalidPayloadType(String),
    #[error("Unknown message field: {0}")]
    UnknownField(String),
    #[error("Payload too large: {len} bytes (capacity {capacity})")]
    PayloadTooLarge { len: usize, capacity: usize },
    #[error("Final chunk of {len} bytes collides with the continuation marker")]
    AmbiguousChunkLength { len: usize },
    #[error("Chunked send requires a message tag")]
    MissingMessage,
    #[error("Device did not respond within {waited:?}")]
    DeviceUnresponsive { waited: Duration },
    #[error("Segment {segment} timed out: expected {expected} bytes, last read {actual}")]
    SegmentReadTimeout {
        segment: usize,
        expected: usize,
        actual: usize,
    },
    #[error("HID: {0}")]
    Hid(#[from] HidError),
}
