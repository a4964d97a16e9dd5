//! Live RLOG streaming over TCP.
//!
//! A [`LiveSession`] retains one decoder across the whole connection and
//! feeds it each received chunk, mutating the shared registry in place so
//! readers always see the latest data. On decode failure or disconnect the
//! session swaps in a fresh registry and decoder and reconnects after a
//! short delay.

use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::SourceStatus;
use crate::decoder::RlogDecoder;
use crate::registry::Log;

const RECONNECT_DELAY: Duration = Duration::from_millis(500);
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A live decoding session against an RLOG server.
///
/// The registry sits behind a read-write lock: the session's decode task
/// is the only writer, while any number of readers may run range queries
/// concurrently and observe eventually-consistent data.
pub struct LiveSession {
    log: Arc<RwLock<Log>>,
    status: watch::Receiver<SourceStatus>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LiveSession {
    /// Connects to `address` and starts decoding in a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(address: impl Into<String>) -> LiveSession {
        let address = address.into();
        let log = Arc::new(RwLock::new(Log::new()));
        let (status_tx, status_rx) = watch::channel(SourceStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_session(
            address,
            Arc::clone(&log),
            status_tx,
            shutdown_rx,
        ));
        LiveSession {
            log,
            status: status_rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Shared handle to the registry being filled by this session.
    pub fn log(&self) -> Arc<RwLock<Log>> {
        Arc::clone(&self.log)
    }

    /// Current source status.
    pub fn status(&self) -> SourceStatus {
        *self.status.borrow()
    }

    /// Watch channel receiving every status transition.
    pub fn status_watch(&self) -> watch::Receiver<SourceStatus> {
        self.status.clone()
    }

    /// Requests the session to stop.
    ///
    /// Any in-flight partial frame is simply not completed; the registry
    /// remains valid and readable afterwards.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Waits for the decode task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

fn write_log(log: &Arc<RwLock<Log>>) -> Option<RwLockWriteGuard<'_, Log>> {
    log.write().ok()
}

async fn run_session(
    address: String,
    log: Arc<RwLock<Log>>,
    status: watch::Sender<SourceStatus>,
    mut shutdown: watch::Receiver<bool>,
) {
    while !*shutdown.borrow() {
        let _ = status.send(SourceStatus::Connecting);

        match TcpStream::connect(&address).await {
            Ok(mut stream) => {
                info!("connected to rlog server at {address}");
                // Fresh registry and decoder per connection attempt.
                match write_log(&log) {
                    Some(mut guard) => *guard = Log::new(),
                    None => {
                        let _ = status.send(SourceStatus::Error);
                        return;
                    }
                }
                let mut decoder = RlogDecoder::new();
                let mut buf = vec![0u8; READ_BUFFER_SIZE];

                loop {
                    tokio::select! {
                        changed = shutdown.changed() => {
                            // A closed channel means the session handle is
                            // gone, which stops the task like an explicit stop.
                            if changed.is_err() || *shutdown.borrow() {
                                let _ = status.send(SourceStatus::Stopped);
                                return;
                            }
                        }
                        read = stream.read(&mut buf) => match read {
                            Ok(0) => {
                                warn!("rlog server at {address} closed the connection");
                                break;
                            }
                            Ok(count) => {
                                let success = match write_log(&log) {
                                    Some(mut guard) => decoder.decode(&mut guard, &buf[..count]),
                                    None => {
                                        let _ = status.send(SourceStatus::Error);
                                        return;
                                    }
                                };
                                if !success {
                                    warn!("live rlog decode failed, reconnecting");
                                    break;
                                }
                                let _ = status.send(SourceStatus::Active);
                            }
                            Err(err) => {
                                warn!("rlog socket read failed: {err}");
                                break;
                            }
                        }
                    }
                }
            }
            Err(err) => {
                debug!("rlog connect to {address} failed: {err}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    let _ = status.send(SourceStatus::Stopped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::SUPPORTED_LOG_REVISION;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn frame_chunk(first: bool, timestamp: f64, declare: bool, value: f64) -> Vec<u8> {
        let mut data = if first {
            vec![SUPPORTED_LOG_REVISION, 0x00]
        } else {
            vec![0x00]
        };
        data.extend_from_slice(&timestamp.to_be_bytes());
        if declare {
            data.push(1);
            data.extend_from_slice(&1i16.to_be_bytes());
            data.extend_from_slice(&2u16.to_be_bytes());
            data.extend_from_slice(b"/x");
        }
        data.push(2);
        data.extend_from_slice(&1i16.to_be_bytes());
        data.push(5);
        data.extend_from_slice(&value.to_be_bytes());
        data
    }

    #[tokio::test]
    async fn live_session_decodes_incoming_chunks() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(&frame_chunk(true, 1.0, true, 10.0))
                .await
                .unwrap();
            socket
                .write_all(&frame_chunk(false, 1.5, false, 20.0))
                .await
                .unwrap();
            // Keep the socket open until the client stops.
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let session = LiveSession::connect(address);
        let mut status = session.status_watch();
        status
            .wait_for(|value| *value == SourceStatus::Active)
            .await
            .unwrap();

        let log = session.log();
        // Both chunks may not have landed yet; poll until the second one
        // does. Readers are eventually consistent during live decode.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            {
                let guard = log.read().unwrap();
                if let Some(set) = guard.get_number("/x", f64::NEG_INFINITY, f64::INFINITY) {
                    if set.len() == 2 {
                        assert_eq!(set.timestamps, vec![1.0, 1.5]);
                        assert_eq!(set.values, vec![10.0, 20.0]);
                        break;
                    }
                }
            }
            assert!(tokio::time::Instant::now() < deadline, "timed out");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        session.stop();
        session.join().await;
        server.abort();
    }

    #[tokio::test]
    async fn stop_leaves_registry_readable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(&frame_chunk(true, 1.0, true, 10.0))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let session = LiveSession::connect(address);
        let mut status = session.status_watch();
        status
            .wait_for(|value| *value == SourceStatus::Active)
            .await
            .unwrap();

        let log = session.log();
        session.stop();
        session.join().await;

        let guard = log.read().unwrap();
        let set = guard.get_number("/x", 1.0, 1.0).unwrap();
        assert_eq!(set.values, vec![10.0]);
        server.abort();
    }
}
