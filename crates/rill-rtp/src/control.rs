//! # Control-Channel Session
//!
//! Sender-side companion session keyed by the writer's SSRC. It accumulates
//! the counters a feedback/report protocol would publish; the wire protocol
//! itself lives outside this crate. Created lazily during `start()` and
//! lives exactly as long as the writer.

use quanta::Instant;
use serde::Serialize;
use std::time::Duration;

/// Counters the control channel accumulates for one sender.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderStats {
    /// Frames accepted by `push_frame`.
    pub frames_pushed: u64,
    /// RTP packets handed to the socket or the dispatch worker.
    pub packets_sent: u64,
    /// Payload bytes pushed (media bytes, headers excluded).
    pub bytes_sent: u64,
}

impl SenderStats {
    /// Mean packets produced per pushed frame.
    pub fn packets_per_frame(&self) -> f64 {
        if self.frames_pushed == 0 {
            0.0
        } else {
            self.packets_sent as f64 / self.frames_pushed as f64
        }
    }
}

/// Sender-role control-channel session.
#[derive(Debug)]
pub struct ControlChannel {
    ssrc: u32,
    is_receiver: bool,
    created_at: Instant,
    stats: SenderStats,
}

impl ControlChannel {
    /// Create a session keyed by `ssrc`. The writer always constructs the
    /// sender role (`is_receiver = false`).
    pub fn new(ssrc: u32, is_receiver: bool) -> Self {
        tracing::debug!(ssrc, is_receiver, "control channel created");
        ControlChannel {
            ssrc,
            is_receiver,
            created_at: Instant::now(),
            stats: SenderStats::default(),
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn is_receiver(&self) -> bool {
        self.is_receiver
    }

    /// Time since the session was created.
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Record one accepted frame and the packets it produced.
    pub fn on_frame_sent(&mut self, packets: u64, payload_bytes: u64) {
        self.stats.frames_pushed += 1;
        self.stats.packets_sent += packets;
        self.stats.bytes_sent += payload_bytes;
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }
}
