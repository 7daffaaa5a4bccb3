//! # Frame Buffers
//!
//! One buffer abstraction for both push-frame shapes: the caller either lends
//! a slice for the duration of the call or hands over an owned `Bytes`. The
//! ownership tag is explicit, so packetizers cannot retain a borrowed buffer
//! past the call — the lifetime won't let them.

use bytes::Bytes;

// ─── Flags ──────────────────────────────────────────────────────────────────

/// Bit-set of per-push flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u32);

impl FrameFlags {
    pub const NONE: FrameFlags = FrameFlags(0);
    /// Copy the caller's buffer before routing; the original stays untouched
    /// and remains caller-owned.
    pub const COPY: FrameFlags = FrameFlags(1);

    pub fn contains(self, other: FrameFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for FrameFlags {
    type Output = FrameFlags;

    fn bitor(self, rhs: FrameFlags) -> FrameFlags {
        FrameFlags(self.0 | rhs.0)
    }
}

// ─── FrameBuf ───────────────────────────────────────────────────────────────

/// One media frame handed to the writer.
///
/// `Borrowed` is valid only for the duration of the push call; `Owned`
/// transfers ownership to the send path.
#[derive(Debug)]
pub enum FrameBuf<'a> {
    Borrowed(&'a [u8]),
    Owned(Bytes),
}

impl FrameBuf<'_> {
    pub fn len(&self) -> usize {
        match self {
            FrameBuf::Borrowed(data) => data.len(),
            FrameBuf::Owned(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            FrameBuf::Borrowed(data) => data,
            FrameBuf::Owned(data) => data,
        }
    }

    /// Take ownership of the frame contents, copying only the borrowed arm.
    pub fn into_owned(self) -> Bytes {
        match self {
            FrameBuf::Borrowed(data) => Bytes::copy_from_slice(data),
            FrameBuf::Owned(data) => data,
        }
    }
}

impl<'a> From<&'a [u8]> for FrameBuf<'a> {
    fn from(data: &'a [u8]) -> Self {
        FrameBuf::Borrowed(data)
    }
}

impl From<Bytes> for FrameBuf<'_> {
    fn from(data: Bytes) -> Self {
        FrameBuf::Owned(data)
    }
}

impl From<Vec<u8>> for FrameBuf<'_> {
    fn from(data: Vec<u8>) -> Self {
        FrameBuf::Owned(Bytes::from(data))
    }
}
