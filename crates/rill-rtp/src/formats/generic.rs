//! # Generic Packetizer
//!
//! Fallback for payload formats without dedicated fragmentation rules: the
//! frame goes out as a single RTP packet with the marker bit set. There is
//! no generic fragmentation header, so frames larger than the MTU are
//! rejected rather than silently split into packets no receiver could
//! reassemble.

use bytes::BytesMut;

use crate::error::{RtpError, RtpResult};
use crate::frame::{FrameBuf, FrameFlags};
use crate::packet::RTP_HEADER_LEN;
use crate::queue::FrameQueue;
use crate::session::SessionContext;

/// Packetize one opaque frame into the frame queue.
pub fn push_frame(
    session: &mut SessionContext,
    queue: &mut FrameQueue,
    frame: FrameBuf<'_>,
    _flags: FrameFlags,
) -> RtpResult<()> {
    if frame.is_empty() {
        return Err(RtpError::Packetizer("empty frame".into()));
    }
    if frame.len() > session.mtu() {
        return Err(RtpError::Packetizer(format!(
            "frame of {} bytes exceeds MTU of {}",
            frame.len(),
            session.mtu()
        )));
    }

    let payload = frame.as_slice();
    let header = session.header_mut().write(true);

    let mut packet = BytesMut::with_capacity(RTP_HEADER_LEN + payload.len());
    packet.extend_from_slice(&header);
    packet.extend_from_slice(payload);
    queue.enqueue(packet.freeze());

    session.advance_clock();
    Ok(())
}
