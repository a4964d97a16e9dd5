//! RLOG robot telemetry decoder and in-memory time-series field store.
//!
//! The crate ingests framed RLOG binary data (from a historical file or a
//! live socket stream) and maintains a queryable per-key time-series
//! registry with run-length-style deduplication and step-semantics range
//! reads.

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod field;
#[cfg(feature = "ingest")]
pub mod ingest;
pub mod registry;
pub mod tree;
pub mod value;

pub use decoder::RlogDecoder;
pub use error::{Error, Result};
pub use field::{FieldStore, SerializedField, ValueSet};
pub use registry::{Log, SerializedLog, DEFAULT_TIMESTAMP_RANGE};
pub use tree::FieldTree;
pub use value::{LoggableType, Value};
