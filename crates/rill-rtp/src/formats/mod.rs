//! # Payload Formats
//!
//! The closed set of payload formats the writer routes on, plus one
//! packetizer module per format that has dedicated fragmentation rules.
//! Formats without a dedicated packetizer fall back to [`generic`].
//!
//! Adding a format means adding one enum variant and one packetizer module;
//! the router itself never grows new branching logic beyond the variant
//! match.

pub mod generic;
pub mod hevc;
pub mod opus;

/// Media payload format, fixed at writer construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Unspecified payload; single-packet fallback rules.
    Generic,
    /// G.711 µ-law audio (no dedicated packetizer; routed as generic).
    PcmU,
    /// Opus audio (RFC 7587).
    Opus,
    /// HEVC/H.265 video (RFC 7798).
    Hevc,
}

impl PayloadFormat {
    /// RTP payload type number for this format.
    pub fn payload_type(self) -> u8 {
        match self {
            PayloadFormat::PcmU => 0,
            PayloadFormat::Hevc => 96,
            PayloadFormat::Opus => 97,
            PayloadFormat::Generic => 98,
        }
    }

    /// RTP media clock rate in Hz.
    pub fn clock_rate(self) -> u32 {
        match self {
            PayloadFormat::PcmU => 8_000,
            PayloadFormat::Opus => 48_000,
            PayloadFormat::Hevc | PayloadFormat::Generic => 90_000,
        }
    }

    /// Default media-clock ticks per frame: 20 ms frames for audio,
    /// 30 fps for video-rate clocks.
    pub fn timestamp_increment(self) -> u32 {
        match self {
            PayloadFormat::PcmU => 160,
            PayloadFormat::Opus => 960,
            PayloadFormat::Hevc | PayloadFormat::Generic => 3_000,
        }
    }

    /// Whether this format benefits from batched outbound system calls.
    ///
    /// High-bitrate video fragments a single access unit into many packets
    /// per push; everything else emits one or two.
    pub fn wants_dispatch(self) -> bool {
        matches!(self, PayloadFormat::Hevc)
    }
}
