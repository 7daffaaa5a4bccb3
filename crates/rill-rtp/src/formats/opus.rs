//! # Opus Packetizer (RFC 7587)
//!
//! One encoded Opus frame maps to exactly one RTP packet; the payload goes
//! on the wire untouched. The marker bit stays clear — RFC 7587 §4.1 leaves
//! it unused for audio — and the 48 kHz media clock advances per frame.

use bytes::BytesMut;

use crate::error::{RtpError, RtpResult};
use crate::frame::{FrameBuf, FrameFlags};
use crate::packet::RTP_HEADER_LEN;
use crate::queue::FrameQueue;
use crate::session::SessionContext;

/// Packetize one Opus frame into the frame queue.
pub fn push_frame(
    session: &mut SessionContext,
    queue: &mut FrameQueue,
    frame: FrameBuf<'_>,
    _flags: FrameFlags,
) -> RtpResult<()> {
    if frame.is_empty() {
        return Err(RtpError::Packetizer("empty Opus frame".into()));
    }

    let payload = frame.as_slice();
    let header = session.header_mut().write(false);

    let mut packet = BytesMut::with_capacity(RTP_HEADER_LEN + payload.len());
    packet.extend_from_slice(&header);
    packet.extend_from_slice(payload);
    queue.enqueue(packet.freeze());

    session.advance_clock();
    Ok(())
}
