//! # HEVC Packetizer (RFC 7798)
//!
//! Converts one H.265 Annex B access unit into RTP packets:
//!
//! - **Single NAL Unit** (§4.4.1): NALs that fit the MTU go out as-is,
//!   12-byte RTP header + NAL bytes.
//! - **FU fragmentation** (§4.4.3): larger NALs are split across packets,
//!   each carrying a 2-byte PayloadHdr (type 49) plus a 1-byte FU header:
//!
//!   ```text
//!   PayloadHdr:  [F|Type=49|LayerId|TID]   (2 bytes, from original NAL)
//!   FU header:   [S|E|FuType]              (1 byte)
//!   ```
//!
//!   The H.265 NAL header is two bytes (`F(1)|Type(6)|LayerId(6)|TID(3)`),
//!   so fragment payloads start at byte 2 of the NAL.
//!
//! The RTP marker bit is set on the access unit's last packet.

use bytes::BytesMut;

use crate::error::{RtpError, RtpResult};
use crate::frame::{FrameBuf, FrameFlags};
use crate::packet::RTP_HEADER_LEN;
use crate::queue::FrameQueue;
use crate::session::SessionContext;

/// RFC 7798 §4.4.3 fragmentation unit type.
const FU_TYPE: u8 = 49;
/// PayloadHdr + FU header.
const FU_OVERHEAD: usize = 3;
/// H.265 NAL unit header length.
const NAL_HEADER_LEN: usize = 2;

/// Packetize one HEVC access unit into the frame queue.
pub fn push_frame(
    session: &mut SessionContext,
    queue: &mut FrameQueue,
    frame: FrameBuf<'_>,
    _flags: FrameFlags,
) -> RtpResult<()> {
    let data = frame.as_slice();
    let nal_ranges = extract_nal_units(data);
    if nal_ranges.is_empty() {
        return Err(RtpError::Packetizer(
            "no NAL units found in HEVC frame".into(),
        ));
    }

    let last = nal_ranges.len() - 1;
    for (i, &(start, end)) in nal_ranges.iter().enumerate() {
        packetize_nal(session, queue, &data[start..end], i == last)?;
    }
    session.advance_clock();
    Ok(())
}

/// Locate NAL unit payload ranges in an Annex B bitstream.
///
/// Handles both 4-byte (`00 00 00 01`) and 3-byte (`00 00 01`) start codes,
/// including bitstreams that mix the two. Returned ranges exclude the start
/// codes.
pub fn extract_nal_units(data: &[u8]) -> Vec<(usize, usize)> {
    // (payload_start, start_code_len)
    let mut starts: Vec<(usize, usize)> = Vec::new();
    let mut i = 0usize;

    while i < data.len() {
        if i + 3 < data.len() && data[i..i + 4] == [0, 0, 0, 1] {
            starts.push((i + 4, 4));
            i += 4;
        } else if i + 2 < data.len() && data[i..i + 3] == [0, 0, 1] {
            starts.push((i + 3, 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut ranges = Vec::with_capacity(starts.len());
    for (idx, &(start, _)) in starts.iter().enumerate() {
        let end = match starts.get(idx + 1) {
            Some(&(next_start, next_sc_len)) => next_start - next_sc_len,
            None => data.len(),
        };
        if start < end {
            ranges.push((start, end));
        }
    }
    ranges
}

fn packetize_nal(
    session: &mut SessionContext,
    queue: &mut FrameQueue,
    nal: &[u8],
    is_last_nal: bool,
) -> RtpResult<()> {
    if nal.len() < NAL_HEADER_LEN {
        return Err(RtpError::Packetizer(format!(
            "HEVC NAL unit too short: {} bytes",
            nal.len()
        )));
    }

    let mtu = session.mtu();
    if nal.len() <= mtu {
        // Single NAL Unit packet (RFC 7798 §4.4.1)
        let header = session.header_mut().write(is_last_nal);
        let mut packet = BytesMut::with_capacity(RTP_HEADER_LEN + nal.len());
        packet.extend_from_slice(&header);
        packet.extend_from_slice(nal);
        queue.enqueue(packet.freeze());
        return Ok(());
    }

    // FU fragmentation (RFC 7798 §4.4.3); the MTU must leave room for at
    // least one payload byte after PayloadHdr + FU header.
    if mtu <= FU_OVERHEAD {
        return Err(RtpError::Packetizer(format!(
            "MTU {mtu} too small for FU fragmentation"
        )));
    }

    let fu_type = (nal[0] >> 1) & 0x3F;
    let payload_hdr = [(nal[0] & 0x81) | (FU_TYPE << 1), nal[1]];
    let payload = &nal[NAL_HEADER_LEN..];

    let max_fragment = mtu - FU_OVERHEAD;
    let mut offset = 0usize;
    let mut first = true;
    let mut fragments = 0usize;

    while offset < payload.len() {
        let remaining = payload.len() - offset;
        let last_fragment = remaining <= max_fragment;
        let chunk = &payload[offset..offset + remaining.min(max_fragment)];

        let start_bit = if first { 0x80 } else { 0x00 };
        let end_bit = if last_fragment { 0x40 } else { 0x00 };
        let fu_header = start_bit | end_bit | fu_type;

        let marker = is_last_nal && last_fragment;
        let rtp_header = session.header_mut().write(marker);

        let mut packet = BytesMut::with_capacity(RTP_HEADER_LEN + FU_OVERHEAD + chunk.len());
        packet.extend_from_slice(&rtp_header);
        packet.extend_from_slice(&payload_hdr);
        packet.extend_from_slice(&[fu_header]);
        packet.extend_from_slice(chunk);
        queue.enqueue(packet.freeze());

        offset += chunk.len();
        first = false;
        fragments += 1;
    }

    tracing::trace!(
        nal_size = nal.len(),
        fragments,
        "FU-fragmented HEVC NAL unit"
    );
    Ok(())
}
