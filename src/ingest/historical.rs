//! One-shot decoding of complete RLOG files.

use std::path::Path;
use std::thread;

use log::info;

use crate::decoder::RlogDecoder;
use crate::error::{Error, Result};
use crate::registry::{Log, SerializedLog};

/// Reads and decodes a complete RLOG file into a fresh registry.
pub fn read_log_file(path: impl AsRef<Path>) -> Result<Log> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let mut log = Log::new();
    let mut decoder = RlogDecoder::new();
    if !decoder.decode(&mut log, &data) {
        return Err(Error::Corrupt("rlog decode failed"));
    }
    info!(
        "decoded {} fields from {}",
        log.get_field_count(),
        path.display()
    );
    Ok(log)
}

/// Decodes a buffer on a worker thread.
///
/// The registry is built entirely on the worker and handed back by value
/// in its serialized form, together with the decode result. Partial data
/// is returned even when the decode fails, matching the decoder's
/// partial-success contract.
pub fn decode_in_background(data: Vec<u8>) -> thread::JoinHandle<(SerializedLog, bool)> {
    thread::spawn(move || {
        let mut log = Log::new();
        let mut decoder = RlogDecoder::new();
        let success = decoder.decode(&mut log, &data);
        (log.to_serialized(), success)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::SUPPORTED_LOG_REVISION;
    use std::io::Write;

    fn sample_buffer() -> Vec<u8> {
        let mut data = vec![SUPPORTED_LOG_REVISION, 0x00];
        data.extend_from_slice(&1.0f64.to_be_bytes());
        // Key declaration: id 1, "/x".
        data.push(1);
        data.extend_from_slice(&1i16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(b"/x");
        // Field update: id 1, double 2.5.
        data.push(2);
        data.extend_from_slice(&1i16.to_be_bytes());
        data.push(5);
        data.extend_from_slice(&2.5f64.to_be_bytes());
        data
    }

    #[test]
    fn reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample_buffer()).unwrap();
        file.flush().unwrap();

        let log = read_log_file(file.path()).unwrap();
        let set = log.get_number("/x", 1.0, 1.0).unwrap();
        assert_eq!(set.values, vec![2.5]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = read_log_file("/nonexistent/path.rlog");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn background_decode_hands_back_serialized_registry() {
        let handle = decode_in_background(sample_buffer());
        let (serialized, success) = handle.join().unwrap();
        assert!(success);

        let log = Log::from_serialized(serialized);
        assert_eq!(log.get_timestamp_range(), (1.0, 1.0));
        let set = log.get_number("/x", 1.0, 1.0).unwrap();
        assert_eq!(set.values, vec![2.5]);
    }

    #[test]
    fn background_decode_keeps_partial_data_on_failure() {
        let mut data = sample_buffer();
        // Truncated field record at the end.
        data.push(2);
        data.extend_from_slice(&1i16.to_be_bytes());

        let (serialized, success) = decode_in_background(data).join().unwrap();
        assert!(!success);
        let log = Log::from_serialized(serialized);
        assert_eq!(log.get_number("/x", 1.0, 1.0).unwrap().values, vec![2.5]);
    }
}
