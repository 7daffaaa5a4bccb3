//! # rill-rtp
//!
//! rill RTP send path.
//!
//! Turns application media frames (one encoded video access unit or audio
//! frame per call) into RTP packets delivered to a single remote endpoint
//! over UDP. The HEVC path can optionally run a background dispatch worker
//! that batches outbound socket writes off the caller's thread.
//!
//! ## Crate structure
//!
//! - [`config`] — runtime flags and context values
//! - [`error`] — error surface shared by all operations
//! - [`frame`] — unified borrowed/owned frame buffer and push flags
//! - [`packet`] — RFC 3550 fixed-header state
//! - [`formats`] — payload formats and per-format packetizers
//! - [`queue`] — per-writer outbound packet queue
//! - [`dispatch`] — optional background send worker
//! - [`control`] — sender-side control-channel session (statistics)
//! - [`socket`] — UDP socket helpers (bind, buffer sizing, resolution)
//! - [`session`] — per-writer RTP session state shared with packetizers
//! - [`writer`] — the send-path orchestrator
//!
//! ## Minimal usage
//!
//! ```no_run
//! use rill_rtp::formats::PayloadFormat;
//! use rill_rtp::frame::{FrameBuf, FrameFlags};
//! use rill_rtp::writer::RtpWriter;
//!
//! let mut writer = RtpWriter::new(PayloadFormat::Opus, "127.0.0.1", 5006);
//! writer.start()?;
//! writer.push_frame(FrameBuf::Borrowed(&[0u8; 960]), FrameFlags::NONE)?;
//! writer.stop()?;
//! # Ok::<(), rill_rtp::error::RtpError>(())
//! ```

pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod formats;
pub mod frame;
pub mod packet;
pub mod queue;
pub mod session;
pub mod socket;
pub mod writer;

pub use config::{ConfigFlags, RtpConfig};
pub use error::{RtpError, RtpResult};
pub use formats::PayloadFormat;
pub use frame::{FrameBuf, FrameFlags};
pub use writer::RtpWriter;
