use std_alloc::collections::BTreeMap;
use std_alloc::string::{String, ToString};
use std_alloc::vec::Vec;

use ccoap_msg::{repeat, Code, CodeKind, Id, Message, Opt, Token, Type};
use embedded_time::Instant;
use no_std_net::SocketAddr;

use crate::time::{Clock, Millis, Stamped};

/// A device that answered a discovery request
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveredDevice {
  /// IP address of the device
  pub address: String,
  /// Port the device answered from
  pub port: u16,
  /// The device's resources in CoRE Link Format
  pub resources: String,
}

/// Handle to an open discovery window, returned by [`Core::discover`](crate::core::Core::discover)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiscoveryHandle(pub(crate) Token);

/// The Non-confirmable `GET /.well-known/core` multicast to every CoAP device
pub fn request(id: Id, token: Token) -> Message {
  Message { id,
            token,
            ty: Type::Non,
            code: Code::new(0, 1),
            opts: [".well-known", "core"].into_iter()
                                         .map(|seg| Opt::new(repeat::PATH, seg))
                                         .collect(),
            payload: Default::default() }
}

/// Replies to one discovery request, gathered over a window
#[derive(Debug)]
pub struct Collector<C: Clock> {
  /// Message id of the discovery request
  pub id: Id,
  window: Stamped<C, Millis>,
  devices: Vec<DiscoveredDevice>,
}

impl<C: Clock> Collector<C> {
  /// Open a window of `window` starting at `now`
  pub fn new(id: Id, now: Instant<C>, window: Millis) -> Self {
    Self { id,
           window: Stamped(window, now),
           devices: Vec::new() }
  }

  /// Whether the window has closed
  pub fn is_closed(&self, now: Instant<C>) -> bool {
    self.window.expired(now, *self.window.data())
  }

  /// Add the sender of `msg` unless it already answered or the window is closed.
  ///
  /// Returns whether a device was added.
  pub fn accept(&mut self, now: Instant<C>, from: SocketAddr, msg: &Message) -> bool {
    let address = from.ip().to_string();
    let port = from.port();

    let seen = self.devices
                   .iter()
                   .any(|d| d.address == address && d.port == port);

    if seen || self.is_closed(now) || msg.code.kind() != CodeKind::Response {
      return false;
    }

    self.devices.push(DiscoveredDevice { address,
                                         port,
                                         resources: String::from_utf8_lossy(&msg.payload.0).into_owned() });
    true
  }

  /// Devices in the order they first answered
  pub fn devices(&self) -> &[DiscoveredDevice] {
    &self.devices
  }
}

/// Every open discovery window, keyed by the token of its request
#[derive(Debug)]
pub struct Discoveries<C: Clock> {
  open: BTreeMap<Token, Collector<C>>,
}

impl<C: Clock> Default for Discoveries<C> {
  fn default() -> Self {
    Self { open: BTreeMap::new() }
  }
}

impl<C: Clock> Discoveries<C> {
  /// Track a new window for a request carrying `token`
  pub fn open(&mut self, token: Token, collector: Collector<C>) -> DiscoveryHandle {
    self.open.insert(token, collector);
    DiscoveryHandle(token)
  }

  /// The window a reply with `token` belongs to
  pub fn by_token_mut(&mut self, token: Token) -> Option<&mut Collector<C>> {
    self.open.get_mut(&token)
  }

  /// Remove a closed window and return what it gathered.
  ///
  /// `None` while the window is open or when the handle is unknown.
  pub fn take_closed(&mut self,
                     handle: DiscoveryHandle,
                     now: Instant<C>)
                     -> Option<Vec<DiscoveredDevice>> {
    match self.open.get(&handle.0).map(|c| c.is_closed(now)) {
      | Some(true) => self.open.remove(&handle.0).map(|c| c.devices),
      | _ => None,
    }
  }

  /// Close and forget a window
  pub fn remove(&mut self, handle: DiscoveryHandle) -> Option<Collector<C>> {
    self.open.remove(&handle.0)
  }

  /// Whether `handle` is open
  pub fn contains(&self, handle: DiscoveryHandle) -> bool {
    self.open.contains_key(&handle.0)
  }

  /// Whether a window uses `token`
  pub fn token_in_use(&self, token: Token) -> bool {
    self.open.contains_key(&token)
  }

  /// Whether a window's request used message id `id`
  pub fn id_in_use(&self, id: Id) -> bool {
    self.open.values().any(|c| c.id == id)
  }
}

#[cfg(test)]
mod tests {
  use ccoap_msg::{Payload, TryIntoBytes};
  use embedded_time::duration::Milliseconds;
  use embedded_time::Clock as _;

  use super::*;
  use crate::test::{addr, ClockMock};

  fn reply(payload: &str) -> Message {
    Message { ty: Type::Non,
              code: Code::new(2, 5),
              payload: Payload(payload.as_bytes().to_vec()),
              ..Default::default() }
  }

  #[test]
  fn request_targets_well_known_core() {
    let msg = request(Id(1), Token::from_bytes(&[1]));
    assert_eq!(msg.ty, Type::Non);
    assert_eq!(msg.opts,
               vec![Opt::new(repeat::PATH, ".well-known"), Opt::new(repeat::PATH, "core")]);
    assert!(msg.try_into_bytes().is_ok());
  }

  #[test]
  fn dedups_by_address_and_port() {
    let clock = ClockMock::new();
    let now = || clock.try_now().unwrap();
    let mut c = Collector::new(Id(1), now(), Milliseconds(2000));

    assert!(c.accept(now(), addr(1, 5683), &reply("</a>")));
    assert!(c.accept(now(), addr(2, 5683), &reply("</b>")));
    assert!(!c.accept(now(), addr(1, 5683), &reply("</c>")));
    assert!(c.accept(now(), addr(1, 5684), &reply("</d>")));

    assert_eq!(c.devices()
                .iter()
                .map(|d| (d.address.as_str(), d.port, d.resources.as_str()))
                .collect::<Vec<_>>(),
               vec![("10.0.0.1", 5683, "</a>"),
                    ("10.0.0.2", 5683, "</b>"),
                    ("10.0.0.1", 5684, "</d>")]);
  }

  #[test]
  fn window_closes() {
    let clock = ClockMock::new();
    let now = || clock.try_now().unwrap();
    let mut open = Discoveries::default();
    let h = open.open(Token::from_bytes(&[7]),
                      Collector::new(Id(1), now(), Milliseconds(2000)));

    clock.set(1999);
    assert_eq!(open.take_closed(h, now()), None);
    open.by_token_mut(Token::from_bytes(&[7]))
        .unwrap()
        .accept(now(), addr(1, 5683), &reply("</a>"));

    clock.set(2000);
    assert!(!open.by_token_mut(Token::from_bytes(&[7]))
                 .unwrap()
                 .accept(now(), addr(2, 5683), &reply("</b>")));
    assert_eq!(open.take_closed(h, now()).map(|d| d.len()), Some(1));
    assert!(!open.contains(h));
  }

  #[test]
  fn empty_window_is_ok() {
    let clock = ClockMock::new();
    let mut open = Discoveries::default();
    let h = open.open(Token::from_bytes(&[7]),
                      Collector::new(Id(1), clock.try_now().unwrap(), Milliseconds(10)));
    clock.set(10);
    assert_eq!(open.take_closed(h, clock.try_now().unwrap()), Some(vec![]));
  }
}
