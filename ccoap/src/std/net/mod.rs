use ::std::io;
use ::std::net::UdpSocket;

use no_std_net::{IpAddr, SocketAddr};

use crate::net::{Addrd, Socket, SocketError};

pub(crate) mod convert;

/// `errno` values meaning the peer's host or network cannot be reached
#[cfg(unix)]
const UNREACHABLE_OS_ERRORS: [i32; 2] = [libc_errno::ENETUNREACH, libc_errno::EHOSTUNREACH];

#[cfg(windows)]
const UNREACHABLE_OS_ERRORS: [i32; 2] = [10051, 10065];

#[cfg(not(any(unix, windows)))]
const UNREACHABLE_OS_ERRORS: [i32; 0] = [];

#[cfg(unix)]
mod libc_errno {
  #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
  pub(super) const ENETUNREACH: i32 = 51;
  #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
  pub(super) const EHOSTUNREACH: i32 = 65;

  #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")))]
  pub(super) const ENETUNREACH: i32 = 101;
  #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")))]
  pub(super) const EHOSTUNREACH: i32 = 113;
}

impl SocketError for io::Error {
  fn is_unreachable(&self) -> bool {
    match self.kind() {
      | io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable => true,
      | _ => self.raw_os_error()
                 .map(|code| UNREACHABLE_OS_ERRORS.contains(&code))
                 .unwrap_or(false),
    }
  }
}

impl Socket for UdpSocket {
  type Error = io::Error;

  fn bind(addr: SocketAddr) -> Result<Self, Self::Error> {
    let sock = UdpSocket::bind(convert::to_std(addr))?;
    sock.set_nonblocking(true)?;
    Ok(sock)
  }

  fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
    UdpSocket::local_addr(self).map(convert::from_std)
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.send_to(msg.data(), convert::to_std(msg.addr()))
        .map(|_| ())
        .map_err(convert::io_to_nb)
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    self.recv_from(buffer)
        .map(|(n, addr)| Addrd(n, convert::from_std(addr)))
        .map_err(convert::io_to_nb)
  }

  fn join_multicast(&self, addr: IpAddr) -> Result<(), Self::Error> {
    match convert::ip_to_std(addr) {
      | ::std::net::IpAddr::V4(addr) => {
        self.join_multicast_v4(&addr, &::std::net::Ipv4Addr::UNSPECIFIED)
      },
      | ::std::net::IpAddr::V6(addr) => self.join_multicast_v6(&addr, 0),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn localhost() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
  }

  #[test]
  fn nonblocking_send_recv() {
    let a = <UdpSocket as Socket>::bind(localhost()).unwrap();
    let b = <UdpSocket as Socket>::bind(localhost()).unwrap();
    let mut buf = [0u8; 16];

    assert!(matches!(Socket::recv(&b, &mut buf), Err(nb::Error::WouldBlock)));

    let b_addr = Socket::local_addr(&b).unwrap();
    nb::block!(Socket::send(&a, Addrd(&[1, 2, 3][..], b_addr))).unwrap();

    let Addrd(n, from) = nb::block!(Socket::recv(&b, &mut buf)).unwrap();
    assert_eq!(&buf[..n], &[1, 2, 3]);
    assert_eq!(from, Socket::local_addr(&a).unwrap());
  }

  #[test]
  fn refused_and_unreachable_are_unreachable() {
    assert!(io::Error::from(io::ErrorKind::ConnectionRefused).is_unreachable());
    assert!(!io::Error::from(io::ErrorKind::PermissionDenied).is_unreachable());
  }
}
