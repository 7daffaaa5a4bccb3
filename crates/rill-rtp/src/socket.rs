//! # UDP Socket Helpers
//!
//! Thin layer over `std::net::UdpSocket` for the writer's `start()` steps:
//! wildcard binds (with SO_REUSEADDR for the hole-punching path), send-buffer
//! sizing, and destination resolution. Raw socket options go through libc on
//! unix; other platforms log and carry on with kernel defaults.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::{RtpError, RtpResult};

/// Bind a UDP socket to the wildcard address on `port` (0 = ephemeral).
pub fn bind_wildcard(port: u16) -> io::Result<UdpSocket> {
    UdpSocket::bind(("0.0.0.0", port))
}

/// Bind to the wildcard address on `port` with SO_REUSEADDR set before the
/// bind, so a writer can claim a fixed source port that recently carried
/// traffic (NAT hole punching).
#[cfg(unix)]
pub fn bind_wildcard_reuse(port: u16) -> io::Result<UdpSocket> {
    use std::os::unix::io::FromRawFd;

    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let enable: libc::c_int = 1;
        if libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &enable as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        ) != 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        let mut addr: libc::sockaddr_in = std::mem::zeroed();
        addr.sin_family = libc::AF_INET as libc::sa_family_t;
        addr.sin_port = port.to_be();
        // sin_addr stays zeroed: INADDR_ANY

        if libc::bind(
            fd,
            &addr as *const libc::sockaddr_in as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        ) != 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        Ok(UdpSocket::from_raw_fd(fd))
    }
}

/// Non-unix fallback: no pre-bind socket options, plain wildcard bind.
#[cfg(not(unix))]
pub fn bind_wildcard_reuse(port: u16) -> io::Result<UdpSocket> {
    tracing::debug!(port, "SO_REUSEADDR unavailable on this platform");
    bind_wildcard(port)
}

/// Request a kernel send-buffer size (SO_SNDBUF) for the socket.
///
/// The kernel may clamp the value to its configured maximum; the request
/// itself failing is a socket error.
#[cfg(unix)]
pub fn set_send_buffer_size(socket: &UdpSocket, bytes: usize) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let value = bytes.min(libc::c_int::MAX as usize) as libc::c_int;
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &value as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    tracing::debug!(requested = value, "send buffer size applied");
    Ok(())
}

#[cfg(not(unix))]
pub fn set_send_buffer_size(_socket: &UdpSocket, bytes: usize) -> io::Result<()> {
    tracing::debug!(requested = bytes, "send buffer sizing skipped on this platform");
    Ok(())
}

/// Kernel-reported send-buffer size for the socket.
#[cfg(unix)]
pub fn send_buffer_size(socket: &UdpSocket) -> io::Result<usize> {
    use std::os::unix::io::AsRawFd;

    let mut value: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &mut value as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(value as usize)
}

/// Resolve the destination host/port pair into a concrete socket address.
pub fn resolve_dest(addr: &str, port: u16) -> RtpResult<SocketAddr> {
    let mut candidates = (addr, port).to_socket_addrs()?;
    candidates
        .next()
        .ok_or(RtpError::InvalidInput("destination address did not resolve"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_bind_gets_ephemeral_port() {
        let socket = bind_wildcard(0).unwrap();
        assert_ne!(socket.local_addr().unwrap().port(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn reuse_bind_yields_usable_socket() {
        let socket = bind_wildcard_reuse(0).unwrap();
        let port = socket.local_addr().unwrap().port();
        assert_ne!(port, 0);

        // the socket must actually send
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.connect(receiver.local_addr().unwrap()).unwrap();
        socket.send(b"probe").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn send_buffer_request_is_accepted() {
        let socket = bind_wildcard(0).unwrap();
        set_send_buffer_size(&socket, 4_000_000).unwrap();
        assert!(send_buffer_size(&socket).unwrap() > 0);
    }

    #[test]
    fn resolves_numeric_destination() {
        let dest = resolve_dest("127.0.0.1", 5004).unwrap();
        assert_eq!(dest.port(), 5004);
        assert!(dest.ip().is_loopback());
    }

    #[test]
    fn unresolvable_destination_errors() {
        assert!(resolve_dest("definitely.invalid.rill.test.", 5004).is_err());
    }
}
