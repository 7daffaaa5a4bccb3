//! # Session State
//!
//! Per-writer RTP session state: the SSRC, the mutable fixed-header state,
//! and the fragmentation threshold. This is the "writer context" every
//! packetizer consumes — packetizers never touch the socket or the queue
//! ownership, only this state and the queue they are handed.

use crate::formats::PayloadFormat;
use crate::packet::RtpHeader;

/// Writer-side RTP session state shared with packetizers.
#[derive(Debug)]
pub struct SessionContext {
    ssrc: u32,
    format: PayloadFormat,
    header: RtpHeader,
    mtu: usize,
}

impl SessionContext {
    /// Create session state for one outgoing stream with a random SSRC.
    pub fn new(format: PayloadFormat, mtu: usize) -> Self {
        let ssrc = RtpHeader::random_ssrc();
        SessionContext {
            ssrc,
            format,
            header: RtpHeader::new(format.payload_type(), ssrc),
            mtu,
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    pub fn set_mtu(&mut self, mtu: usize) {
        self.mtu = mtu;
    }

    pub fn header_mut(&mut self) -> &mut RtpHeader {
        &mut self.header
    }

    /// Advance the media clock by the format's per-frame default.
    pub fn advance_clock(&mut self) {
        self.header
            .advance_timestamp(self.format.timestamp_increment());
    }
}
