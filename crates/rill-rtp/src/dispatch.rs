//! # Background Dispatch Worker
//!
//! Optional worker thread that takes whole flush batches off the caller's
//! thread and performs the outbound socket writes. Worth it for payload
//! formats that fragment one frame into many packets; pointless for formats
//! that emit one packet per push.
//!
//! The worker never owns the socket in the teardown sense: it holds an `Arc`
//! share and never shuts the socket down. Starting is fire-and-forget;
//! stopping waits on an explicit completion signal from the worker, with an
//! optional caller deadline. Dropping the dispatcher triggers a graceful
//! shutdown and join.

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{RtpError, RtpResult};

/// Worker wake-up interval while idle; also bounds shutdown latency.
pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(20);

const BATCH_CHANNEL_CAPACITY: usize = 256;

/// Whether this platform can run the background dispatch path at all.
///
/// Resolved once and consumed uniformly by the writer; no per-platform
/// branching anywhere else.
pub fn dispatch_supported() -> bool {
    cfg!(unix)
}

// ─── Handle ─────────────────────────────────────────────────────────────────

/// Cheap cloneable handle for submitting flush batches to the worker.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    batch_tx: Sender<Vec<Bytes>>,
    shutdown: Arc<AtomicBool>,
}

impl DispatchHandle {
    /// Hand one drained batch to the worker. Blocks briefly if the worker is
    /// behind (bounded channel backpressure).
    pub fn submit(&self, batch: Vec<Bytes>) -> RtpResult<()> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(RtpError::Resource("dispatcher is shutting down"));
        }
        self.batch_tx
            .send(batch)
            .map_err(|_| RtpError::Resource("dispatch worker has exited"))
    }
}

// ─── Dispatcher ─────────────────────────────────────────────────────────────

/// Background send worker bound to one writer's socket.
pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    batch_tx: Sender<Vec<Bytes>>,
    batch_rx: Option<Receiver<Vec<Bytes>>>,
    done_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    shutdown: Arc<AtomicBool>,
    packets_sent: Arc<AtomicU64>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Dispatcher {
    /// Create a dispatcher sharing the writer's connected socket.
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        let (batch_tx, batch_rx) = bounded(BATCH_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = bounded(1);
        Dispatcher {
            socket,
            batch_tx,
            batch_rx: Some(batch_rx),
            done_tx: Some(done_tx),
            done_rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            packets_sent: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Spawn the worker thread. Fire-and-forget: no readiness wait.
    ///
    /// A dispatcher starts at most once; repeated calls are no-ops.
    pub fn start(&mut self) -> RtpResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let Some(batch_rx) = self.batch_rx.take() else {
            return Err(RtpError::Resource("dispatcher cannot be restarted"));
        };
        let done_tx = self
            .done_tx
            .take()
            .ok_or(RtpError::Resource("dispatcher cannot be restarted"))?;

        let socket = self.socket.clone();
        let shutdown = self.shutdown.clone();
        let packets_sent = self.packets_sent.clone();

        let handle = thread::Builder::new()
            .name("rill-dispatch".into())
            .spawn(move || {
                dispatch_worker(batch_rx, socket, shutdown, packets_sent);
                let _ = done_tx.send(());
            })
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to spawn dispatch worker");
                RtpError::Resource("failed to spawn dispatch worker")
            })?;

        self.worker = Some(handle);
        Ok(())
    }

    /// Handle for binding a frame queue to this dispatcher.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            batch_tx: self.batch_tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Whether the worker thread is currently alive.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Packets the worker has put on the wire so far.
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent.load(Ordering::Relaxed)
    }

    /// Request termination and wait for the worker to drain and exit.
    ///
    /// `timeout: None` blocks until the worker signals completion — the
    /// original busy-poll contract, and with it the livelock risk if the
    /// worker never exits. `Some(limit)` returns [`RtpError::StopTimedOut`]
    /// when the deadline passes; the worker keeps winding down and a later
    /// call can finish the join.
    ///
    /// Idempotent, and a no-op when the worker was never started.
    pub fn stop(&mut self, timeout: Option<Duration>) -> RtpResult<()> {
        self.shutdown.store(true, Ordering::Relaxed);
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        match timeout {
            None => {
                let _ = worker.join();
            }
            Some(limit) => match self.done_rx.recv_timeout(limit) {
                // Disconnected means the worker is gone too — join is cheap.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = worker.join();
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.worker = Some(worker);
                    return Err(RtpError::StopTimedOut);
                }
            },
        }
        Ok(())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let _ = self.stop(None);
    }
}

// ─── Worker ─────────────────────────────────────────────────────────────────

fn dispatch_worker(
    batch_rx: Receiver<Vec<Bytes>>,
    socket: Arc<UdpSocket>,
    shutdown: Arc<AtomicBool>,
    packets_sent: Arc<AtomicU64>,
) {
    tracing::debug!("dispatch worker running");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match batch_rx.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(batch) => send_batch(&socket, &batch, &packets_sent),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Drain whatever was queued before the shutdown request.
    while let Ok(batch) = batch_rx.try_recv() {
        send_batch(&socket, &batch, &packets_sent);
    }

    tracing::debug!(
        packets = packets_sent.load(Ordering::Relaxed),
        "dispatch worker terminated"
    );
}

fn send_batch(socket: &UdpSocket, batch: &[Bytes], packets_sent: &AtomicU64) {
    for packet in batch {
        match socket.send(packet) {
            Ok(_) => {
                packets_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(error = %e, len = packet.len(), "dispatch send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn connected_pair() -> (Arc<UdpSocket>, UdpSocket) {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(receiver.local_addr().unwrap()).unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        (Arc::new(sender), receiver)
    }

    #[test]
    fn worker_sends_submitted_batches() {
        let (sender, receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();

        let handle = dispatcher.handle();
        handle
            .submit(vec![
                Bytes::from_static(b"one"),
                Bytes::from_static(b"two"),
            ])
            .unwrap();

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"one");
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"two");

        dispatcher.stop(None).unwrap();
        assert_eq!(dispatcher.packets_sent(), 2);
    }

    #[test]
    fn stop_without_start_is_immediate() {
        let (sender, _receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        assert!(dispatcher.stop(None).is_ok());
        assert!(!dispatcher.is_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let (sender, _receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();
        dispatcher.stop(Some(Duration::from_secs(2))).unwrap();
        dispatcher.stop(Some(Duration::from_secs(2))).unwrap();
        dispatcher.stop(None).unwrap();
    }

    #[test]
    fn stop_completes_within_bounded_time() {
        let (sender, _receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();

        let begin = Instant::now();
        dispatcher.stop(Some(Duration::from_secs(2))).unwrap();
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn submit_after_stop_is_rejected() {
        let (sender, _receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();
        let handle = dispatcher.handle();
        dispatcher.stop(None).unwrap();

        let err = handle.submit(vec![Bytes::from_static(b"late")]).unwrap_err();
        assert!(matches!(err, RtpError::Resource(_)));
    }

    #[test]
    fn pending_batches_drain_on_shutdown() {
        let (sender, receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();

        let handle = dispatcher.handle();
        for i in 0..10u8 {
            handle.submit(vec![Bytes::from(vec![i; 8])]).unwrap();
        }
        dispatcher.stop(None).unwrap();
        assert_eq!(dispatcher.packets_sent(), 10);

        let mut buf = [0u8; 64];
        for _ in 0..10 {
            receiver.recv(&mut buf).unwrap();
        }
    }

    #[test]
    fn double_start_is_noop() {
        let (sender, _receiver) = connected_pair();
        let mut dispatcher = Dispatcher::new(sender);
        dispatcher.start().unwrap();
        dispatcher.start().unwrap();
        assert!(dispatcher.is_running());
        dispatcher.stop(None).unwrap();
    }
}
