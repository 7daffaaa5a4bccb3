//! # RTP Fixed Header
//!
//! RFC 3550 §5.1 fixed-header state shared by all packetizers:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Version is always 2; padding, extension, and CSRC count are always 0.
//! The timestamp is kept as u64 internally so clock arithmetic never wraps;
//! the lower 32 bits go on the wire.

use rand::RngExt;

/// Length of the RTP fixed header in bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// Mutable RTP fixed-header state for one outgoing stream.
#[derive(Debug)]
pub struct RtpHeader {
    /// RTP payload type (7-bit, RFC 3551).
    pub payload_type: u8,
    /// Synchronization source identifier (RFC 3550 §8.1).
    pub ssrc: u32,
    sequence: u16,
    timestamp: u64,
}

impl RtpHeader {
    /// Create header state with an explicit SSRC.
    pub fn new(payload_type: u8, ssrc: u32) -> Self {
        RtpHeader {
            payload_type,
            ssrc,
            sequence: 0,
            timestamp: 0,
        }
    }

    /// Draw a collision-resistant random SSRC (RFC 3550 §8.1).
    pub fn random_ssrc() -> u32 {
        rand::rng().random::<u32>()
    }

    /// Sequence number the next [`write`](Self::write) call will emit.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Current media clock value.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Serialize a 12-byte fixed header and advance the wrapping sequence.
    ///
    /// The marker bit signals the last packet of a frame (RFC 3550 §5.1).
    pub fn write(&mut self, marker: bool) -> [u8; RTP_HEADER_LEN] {
        let mut header = [0u8; RTP_HEADER_LEN];
        header[0] = 2 << 6;
        header[1] = ((marker as u8) << 7) | (self.payload_type & 0x7F);
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..8].copy_from_slice(&(self.timestamp as u32).to_be_bytes());
        header[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    /// Advance the media clock by `increment` ticks.
    pub fn advance_timestamp(&mut self, increment: u32) {
        self.timestamp = self.timestamp.wrapping_add(u64::from(increment));
    }
}
