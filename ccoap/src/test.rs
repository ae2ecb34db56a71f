#![allow(dead_code)]

use ::std::sync::atomic::{AtomicU64, Ordering};
use ::std::sync::{Arc, Mutex};
use ccoap_msg::{Message, TryFromBytes, TryIntoBytes};
use embedded_time::rate::Fraction;
use embedded_time::Instant;
use no_std_net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::net::{Addrd, Socket, SocketError};

/// Platform using mocks for clock and sock
#[derive(Debug, Clone, Copy)]
pub struct Platform;

impl crate::platform::Platform for Platform {
  type Clock = ClockMock;
  type Socket = SockMock;
}

pub fn dummy_addr() -> SocketAddr {
  SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)), 5683)
}

pub fn addr(last_octet: u8, port: u16) -> SocketAddr {
  SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), port)
}

/// Millisecond clock whose time only moves when told to.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ClockMock(pub Arc<AtomicU64>);

impl ClockMock {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, to: u64) {
    self.0.store(to, Ordering::SeqCst);
  }

  pub fn advance(&self, by: u64) {
    self.0.fetch_add(by, Ordering::SeqCst);
  }

  pub fn get(&self) -> u64 {
    self.0.load(Ordering::SeqCst)
  }
}

impl embedded_time::Clock for ClockMock {
  type T = u64;

  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

  fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    Ok(Instant::new(self.get()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
  Unreachable,
  Broken,
}

impl SocketError for MockError {
  fn is_unreachable(&self) -> bool {
    *self == MockError::Unreachable
  }
}

type Queue = Arc<Mutex<Vec<Addrd<Vec<u8>>>>>;

/// A mocked socket
///
/// Clones share the same queues.
#[derive(Debug, Clone, Default)]
pub struct SockMock {
  /// Inbound bytes from remote sockets. Address represents the sender
  pub rx: Queue,
  /// Outbound bytes to remote sockets. Address represents the destination
  pub tx: Queue,
  /// When set, every send fails with this error
  pub fail_sends: Arc<Mutex<Option<MockError>>>,
  /// Multicast groups joined
  pub groups: Arc<Mutex<Vec<IpAddr>>>,
}

impl SockMock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a message as if `from` had sent it
  pub fn push(&self, from: SocketAddr, msg: &Message) {
    self.rx
        .lock()
        .unwrap()
        .push(Addrd(msg.try_into_bytes().unwrap(), from));
  }

  /// Every message sent so far, decoded
  pub fn sent(&self) -> Vec<Addrd<Message>> {
    self.tx
        .lock()
        .unwrap()
        .iter()
        .map(|Addrd(bytes, addr)| Addrd(Message::try_from_bytes(bytes).unwrap(), *addr))
        .collect()
  }

  /// Forget everything sent so far
  pub fn clear_sent(&self) {
    self.tx.lock().unwrap().clear();
  }
}

impl Socket for SockMock {
  type Error = MockError;

  fn bind(_: SocketAddr) -> Result<Self, Self::Error> {
    Ok(Self::new())
  }

  fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
    Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5683))
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    if let Some(e) = *self.fail_sends.lock().unwrap() {
      return Err(nb::Error::Other(e));
    }

    self.tx
        .lock()
        .unwrap()
        .push(msg.map(|bytes| bytes.to_vec()));
    Ok(())
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    let mut rx = self.rx.lock().unwrap();

    if rx.is_empty() {
      return Err(nb::Error::WouldBlock);
    }

    let Addrd(dgram, addr) = rx.remove(0);
    let n = dgram.len().min(buffer.len());
    buffer[..n].copy_from_slice(&dgram[..n]);
    Ok(Addrd(n, addr))
  }

  fn join_multicast(&self, addr: IpAddr) -> Result<(), Self::Error> {
    self.groups.lock().unwrap().push(addr);
    Ok(())
  }
}
