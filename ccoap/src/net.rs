use no_std_net::{IpAddr, SocketAddr};
use std_alloc::vec;
use std_alloc::vec::Vec;

/// Data that came from a network socket, or is going to one
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addressed
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the socket and get the data in this Addressed
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data contained in this Addressed
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Map the data contained in this Addressed (with a copy of the address)
  pub fn map_with_addr<R>(self, f: impl FnOnce(T, SocketAddr) -> R) -> Addrd<R> {
    Addrd(f(self.0, self.1), self.1)
  }

  /// Borrow the contents of the addressed item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Copy the socket address for the data
  pub fn addr(&self) -> SocketAddr {
    self.1
  }
}

/// Errors a [`Socket`] may yield
pub trait SocketError: ::core::fmt::Debug {
  /// Whether the operating system reported the peer host or network as unreachable
  fn is_unreachable(&self) -> bool {
    false
  }
}

/// A CoAP network socket
///
/// This mirrors the Udp socket traits in embedded-nal, but allows us to implement them for foreign types (like `std::net::UdpSocket`).
///
/// Sockets never block; an operation that cannot complete yet yields
/// [`nb::Error::WouldBlock`].
pub trait Socket: Sized + ::core::fmt::Debug {
  /// The error yielded by socket operations
  type Error: SocketError;

  /// Bind the socket to an address
  fn bind(addr: SocketAddr) -> Result<Self, Self::Error>;

  /// Get the local address this socket was created with
  fn local_addr(&self) -> Result<SocketAddr, Self::Error>;

  /// Send a datagram to a remote address
  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;

  /// Pull a buffered datagram from the socket, along with the address of the sender.
  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error>;

  /// Join a multicast group
  fn join_multicast(&self, addr: IpAddr) -> Result<(), Self::Error>;

  /// An endless stream of inbound datagrams of at most `max_size` bytes.
  ///
  /// Reads go into a buffer one byte longer than `max_size`, so a
  /// datagram that did not fit comes out `max_size + 1` bytes long.
  fn incoming(&self, max_size: usize) -> Incoming<'_, Self> {
    Incoming { sock: self,
               buf: vec![0; max_size.saturating_add(1)] }
  }
}

/// See [`Socket::incoming`]
///
/// Never yields `None`; the caller decides when to stop pulling.
#[derive(Debug)]
pub struct Incoming<'a, S> {
  sock: &'a S,
  buf: Vec<u8>,
}

impl<'a, S: Socket> Iterator for Incoming<'a, S> {
  type Item = nb::Result<Addrd<Vec<u8>>, S::Error>;

  fn next(&mut self) -> Option<Self::Item> {
    let recvd = self.sock.recv(&mut self.buf);
    Some(recvd.map(|Addrd(n, addr)| Addrd(self.buf[..n.min(self.buf.len())].to_vec(), addr)))
  }
}
