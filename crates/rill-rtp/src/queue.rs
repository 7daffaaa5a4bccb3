//! # Frame Queue
//!
//! Per-writer buffer holding RTP packets produced by the packetizers for the
//! current push. Buffering is pure logic; I/O happens only at the flush
//! seam, either directly on the caller's thread or as one batch handed to
//! the dispatch worker.
//!
//! The queue is created once in `start()` and destroyed only with the
//! writer; nothing else may drop it.

use bytes::Bytes;
use std::collections::VecDeque;
use std::net::UdpSocket;

use crate::config::RtpConfig;
use crate::dispatch::DispatchHandle;
use crate::error::RtpResult;
use crate::formats::PayloadFormat;

/// Outbound RTP packet queue for one writer.
#[derive(Debug)]
pub struct FrameQueue {
    format: PayloadFormat,
    packets: VecDeque<Bytes>,
    dispatch: Option<DispatchHandle>,
}

impl FrameQueue {
    /// Build the queue for `format`, optionally bound to a dispatch worker.
    ///
    /// Capacity is pre-sized for a 64 KiB access unit fragmented at the
    /// configured MTU, so a typical push never reallocates mid-frame.
    pub fn new(
        format: PayloadFormat,
        config: &RtpConfig,
        dispatch: Option<DispatchHandle>,
    ) -> Self {
        let capacity = (64 * 1024 / config.mtu.max(1)).clamp(4, 1024);
        tracing::debug!(
            ?format,
            capacity,
            dispatched = dispatch.is_some(),
            "frame queue created"
        );
        FrameQueue {
            format,
            packets: VecDeque::with_capacity(capacity),
            dispatch,
        }
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn has_dispatcher(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Queue one serialized RTP packet for the current frame.
    pub fn enqueue(&mut self, packet: Bytes) {
        self.packets.push_back(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Move all queued packets out: batched to the dispatcher when one is
    /// bound, otherwise sent one by one on the connected socket.
    ///
    /// Returns the number of packets flushed.
    pub fn flush(&mut self, socket: &UdpSocket) -> RtpResult<usize> {
        if self.packets.is_empty() {
            return Ok(0);
        }
        let batch: Vec<Bytes> = self.packets.drain(..).collect();
        let count = batch.len();

        match &self.dispatch {
            Some(handle) => handle.submit(batch)?,
            None => {
                for packet in &batch {
                    socket.send(packet)?;
                }
            }
        }
        Ok(count)
    }
}
