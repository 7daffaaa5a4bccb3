//! # Runtime Configuration
//!
//! Flags and context values consumed by the writer at `start()`. The struct
//! is deserializable so deployments can carry it in a TOML file next to the
//! rest of their pipeline configuration.

use serde::Deserialize;

use crate::error::{RtpError, RtpResult};

/// SO_SNDBUF applied when no override is configured (bytes).
pub const DEFAULT_UDP_SEND_BUFFER: usize = 4_000_000;

/// Default payload fragmentation threshold (bytes).
pub const DEFAULT_MTU: usize = 1400;

// ─── Flags ──────────────────────────────────────────────────────────────────

/// Bit-set of writer behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct ConfigFlags(u32);

impl ConfigFlags {
    pub const NONE: ConfigFlags = ConfigFlags(0);
    /// Run a background worker that batches outbound socket writes.
    /// Meaningful only for dispatcher-eligible payload formats.
    pub const SYSTEM_CALL_DISPATCHER: ConfigFlags = ConfigFlags(1);

    pub fn contains(self, other: ConfigFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ConfigFlags {
    type Output = ConfigFlags;

    fn bitor(self, rhs: ConfigFlags) -> ConfigFlags {
        ConfigFlags(self.0 | rhs.0)
    }
}

// ─── Config ─────────────────────────────────────────────────────────────────

/// Writer runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RtpConfig {
    /// Behavior flags.
    pub flags: ConfigFlags,
    /// SO_SNDBUF override in bytes. Zero or negative means "use the default".
    pub udp_send_buffer: i64,
    /// Largest RTP payload before the packetizer fragments.
    pub mtu: usize,
}

impl Default for RtpConfig {
    fn default() -> Self {
        RtpConfig {
            flags: ConfigFlags::NONE,
            udp_send_buffer: 0,
            mtu: DEFAULT_MTU,
        }
    }
}

impl RtpConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> RtpResult<Self> {
        toml::from_str(text).map_err(|e| {
            tracing::debug!(error = %e, "config parse failed");
            RtpError::InvalidInput("malformed TOML configuration")
        })
    }

    /// The send-buffer size to request from the kernel.
    ///
    /// Falls back to [`DEFAULT_UDP_SEND_BUFFER`] when the override is unset
    /// or non-positive.
    pub fn effective_send_buffer(&self) -> usize {
        if self.udp_send_buffer <= 0 {
            DEFAULT_UDP_SEND_BUFFER
        } else {
            self.udp_send_buffer as usize
        }
    }
}
