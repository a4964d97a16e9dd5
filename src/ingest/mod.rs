//! Ingestion adapters feeding raw bytes to the frame decoder.
//!
//! Two modes share the decoder and the registry write API: `historical`
//! decodes a complete buffer once (optionally on a worker thread, handing
//! the registry back through its serialized form), `live` retains one
//! decoder and feeds it successive socket chunks in place.

pub mod historical;
pub mod live;

pub use historical::{decode_in_background, read_log_file};
pub use live::LiveSession;

/// Status of an ingestion source, published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Waiting,
    Connecting,
    Active,
    Stopped,
    Error,
}
