//! # Send-Path Orchestrator
//!
//! [`RtpWriter`] owns the socket, the frame queue, the optional dispatch
//! worker, and the control-channel session for one outgoing media stream.
//! Lifecycle: construct → `start()` → any number of `push_frame()` calls →
//! `stop()` → drop. Destination and payload format are fixed at
//! construction; there is no reconfiguration API, so post-start socket state
//! is immutable and needs no locking.
//!
//! `push_frame` is single-producer: concurrent producers need their own
//! synchronization above this type. Dropping the writer tears the dispatch
//! worker down even when `stop()` was never called.

use bytes::Bytes;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigFlags, RtpConfig};
use crate::control::ControlChannel;
use crate::dispatch::{dispatch_supported, Dispatcher};
use crate::error::{RtpError, RtpResult};
use crate::formats::{self, PayloadFormat};
use crate::frame::{FrameBuf, FrameFlags};
use crate::queue::FrameQueue;
use crate::session::SessionContext;
use crate::socket;

/// Writer for one RTP stream to a single remote endpoint.
pub struct RtpWriter {
    format: PayloadFormat,
    dst_addr: String,
    dst_port: u16,
    src_port: u16,
    config: RtpConfig,
    session: SessionContext,
    socket: Option<Arc<UdpSocket>>,
    dest: Option<SocketAddr>,
    queue: Option<FrameQueue>,
    dispatcher: Option<Dispatcher>,
    control: Option<ControlChannel>,
    started: bool,
}

impl RtpWriter {
    /// Create a writer with an ephemeral source port.
    pub fn new(format: PayloadFormat, dst_addr: impl Into<String>, dst_port: u16) -> Self {
        let config = RtpConfig::default();
        let session = SessionContext::new(format, config.mtu);
        RtpWriter {
            format,
            dst_addr: dst_addr.into(),
            dst_port,
            src_port: 0,
            config,
            session,
            socket: None,
            dest: None,
            queue: None,
            dispatcher: None,
            control: None,
            started: false,
        }
    }

    /// Create a writer bound to a fixed source port, so NAT/firewall state is
    /// established for a known source before the first outbound packet.
    pub fn with_source_port(
        format: PayloadFormat,
        dst_addr: impl Into<String>,
        dst_port: u16,
        src_port: u16,
    ) -> Self {
        let mut writer = Self::new(format, dst_addr, dst_port);
        writer.src_port = src_port;
        writer
    }

    /// Replace the default configuration. Call before `start()`.
    pub fn with_config(mut self, config: RtpConfig) -> Self {
        self.session.set_mtu(config.mtu);
        self.config = config;
        self
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn has_dispatcher(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Resolved destination, available after `start()`.
    pub fn dest(&self) -> Option<SocketAddr> {
        self.dest
    }

    /// Local socket address, available after `start()`.
    pub fn local_addr(&self) -> RtpResult<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(RtpError::NotStarted)?;
        Ok(socket.local_addr()?)
    }

    /// Control-channel session, available after `start()`.
    pub fn control(&self) -> Option<&ControlChannel> {
        self.control.as_ref()
    }

    /// Bring the writer up.
    ///
    /// Steps, in order: socket creation (bound to the wildcard address on the
    /// source port, with SO_REUSEADDR, when one was given), send-buffer
    /// sizing, destination resolution, dispatcher eligibility decision, frame
    /// queue creation, lazy control-channel creation.
    ///
    /// The first failing step short-circuits with its own error. Nothing is
    /// rolled back: parts already built are released when the writer drops,
    /// which is safe at every stage of initialization.
    pub fn start(&mut self) -> RtpResult<()> {
        if self.started {
            return Err(RtpError::AlreadyStarted);
        }

        // Source-port binding happens strictly before the destination is
        // finalized.
        let sock = if self.src_port != 0 {
            tracing::debug!(port = self.src_port, "binding writer to source port");
            socket::bind_wildcard_reuse(self.src_port)?
        } else {
            socket::bind_wildcard(0)?
        };

        socket::set_send_buffer_size(&sock, self.config.effective_send_buffer())?;

        let dest = socket::resolve_dest(&self.dst_addr, self.dst_port)?;
        sock.connect(dest)?;
        let sock = Arc::new(sock);

        let eligible = self.format.wants_dispatch()
            && self.config.flags.contains(ConfigFlags::SYSTEM_CALL_DISPATCHER)
            && dispatch_supported();

        let (dispatcher, queue) = if eligible {
            let mut dispatcher = Dispatcher::new(sock.clone());
            dispatcher.start()?;
            let queue = FrameQueue::new(self.format, &self.config, Some(dispatcher.handle()));
            (Some(dispatcher), queue)
        } else {
            (None, FrameQueue::new(self.format, &self.config, None))
        };

        if self.control.is_none() {
            self.control = Some(ControlChannel::new(self.session.ssrc(), false));
        }

        self.socket = Some(sock);
        self.dest = Some(dest);
        self.dispatcher = dispatcher;
        self.queue = Some(queue);
        self.started = true;

        tracing::debug!(
            format = ?self.format,
            dest = %dest,
            dispatched = self.dispatcher.is_some(),
            "writer started"
        );
        Ok(())
    }

    /// Push one media frame into the send path.
    ///
    /// With [`FrameFlags::COPY`] the caller's buffer is copied first and the
    /// copy is routed; the original stays caller-owned and untouched. The
    /// frame is routed to the packetizer for the writer's payload format;
    /// formats without a dedicated packetizer fall back to the generic one.
    /// Packetizer failures propagate unchanged.
    pub fn push_frame(&mut self, frame: FrameBuf<'_>, flags: FrameFlags) -> RtpResult<()> {
        if !self.started {
            return Err(RtpError::NotStarted);
        }

        if flags.contains(FrameFlags::COPY) {
            let owned = Bytes::copy_from_slice(frame.as_slice());
            return self.push_frame(FrameBuf::Owned(owned), FrameFlags::NONE);
        }

        let payload_len = frame.len() as u64;

        let RtpWriter {
            format,
            session,
            socket,
            queue,
            control,
            ..
        } = self;
        let queue = queue.as_mut().ok_or(RtpError::NotStarted)?;
        let socket = socket.as_ref().ok_or(RtpError::NotStarted)?;

        match *format {
            PayloadFormat::Hevc => formats::hevc::push_frame(session, queue, frame, flags)?,
            PayloadFormat::Opus => formats::opus::push_frame(session, queue, frame, flags)?,
            PayloadFormat::Generic => formats::generic::push_frame(session, queue, frame, flags)?,
            other => {
                tracing::debug!(format = ?other, "format not recognized, pushing frame as generic");
                formats::generic::push_frame(session, queue, frame, flags)?;
            }
        }

        let packets = queue.flush(socket)?;
        if let Some(control) = control.as_mut() {
            control.on_frame_sent(packets as u64, payload_len);
        }
        Ok(())
    }

    /// Shut the dispatch worker down, waiting until it has fully drained.
    ///
    /// Without a dispatcher this returns immediately. Not reentrant: call
    /// from one thread at a time.
    pub fn stop(&mut self) -> RtpResult<()> {
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            dispatcher.stop(None)?;
        }
        Ok(())
    }

    /// Like [`stop`](Self::stop) but gives up after `timeout`, returning
    /// [`RtpError::StopTimedOut`]. The worker keeps winding down; a later
    /// `stop` call can finish the join.
    pub fn stop_with_timeout(&mut self, timeout: Duration) -> RtpResult<()> {
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            dispatcher.stop(Some(timeout))?;
        }
        Ok(())
    }
}
