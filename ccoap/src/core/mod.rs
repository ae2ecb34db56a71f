use ccoap_msg::{CodeKind, Id, Message, MessageParseError, Token, TryFromBytes, TryIntoBytes,
                Type};
use embedded_time::clock::Clock as _;
use embedded_time::Instant;
use no_std_net::{IpAddr, SocketAddr};
use rand::SeedableRng;
use std_alloc::format;
use std_alloc::vec::Vec;

mod error;
#[doc(inline)]
pub use error::*;

use crate::config::Config;
use crate::discovery::{self, Collector, DiscoveredDevice, Discoveries, DiscoveryHandle};
use crate::exchange::{ExchangeHandle, Exchanges, Outcome, PendingExchange, Provisioner};
use crate::logging;
use crate::net::{Addrd, Socket, SocketError};
use crate::platform::Platform;
use crate::reliability::{self, Action, DedupTable, Seen, State};
use crate::req::{Req, ReqId};
use crate::resp::Resp;
use crate::time::{millis_since, Millis};
use crate::uri::Uri;

/// A sans-IO CoAP client runtime.
///
/// `Core` owns a socket, a clock and every piece of exchange state,
/// and only does work when one of its methods is called:
/// - [`Core::submit`] and [`Core::discover`] send a request
/// - [`Core::tick`] reads inbound datagrams and fires due retransmissions and timeouts
/// - [`Core::poll_exchange`] and [`Core::poll_discovery`] tick, then yield
///   a result once it is ready
///
/// ```
/// use ccoap::core::Core;
/// use ccoap::req::Req;
/// # #[cfg(feature = "std")] {
/// use ccoap::std::{Clock, Std};
/// use std::net::UdpSocket;
///
/// let sock = <UdpSocket as ccoap::net::Socket>::bind("127.0.0.1:0".parse().unwrap()).unwrap();
/// let mut core = Core::<Std>::new(Clock::new(), sock);
///
/// let ex = core.submit(Req::get("coap://127.0.0.1:1/hello")).unwrap();
/// assert_eq!(core.poll_exchange(ex).unwrap_err(), nb::Error::WouldBlock);
/// # }
/// ```
#[derive(Debug)]
pub struct Core<P: Platform> {
  sock: P::Socket,
  clock: P::Clock,
  config: Config,
  rand: rand_chacha::ChaCha8Rng,
  provisioner: Provisioner,
  exchanges: Exchanges<P::Clock>,
  dedup: DedupTable<P::Clock>,
  discoveries: Discoveries<P::Clock>,
  joined_multicast: bool,
}

impl<P: Platform> Core<P> {
  /// Creates a new Core with the default runtime behavior
  pub fn new(clock: P::Clock, sock: P::Socket) -> Self {
    Self::new_config(Config::default(), clock, sock)
  }

  /// Create a new core with custom runtime behavior
  pub fn new_config(config: Config, clock: P::Clock, sock: P::Socket) -> Self {
    Self::new_seeded(config, clock, sock, 0)
  }

  /// Create a new core whose message ids and retransmission jitter
  /// derive from `seed`
  pub fn new_seeded(config: Config, clock: P::Clock, sock: P::Socket, seed: u64) -> Self {
    let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let provisioner = Provisioner::new(&mut rand);

    Self { sock,
           clock,
           rand,
           provisioner,
           exchanges: Exchanges::default(),
           dedup: DedupTable::new(config.exchange_lifetime()),
           discoveries: Discoveries::default(),
           joined_multicast: false,
           config }
  }

  /// The runtime config
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// The socket
  pub fn socket(&self) -> &P::Socket {
    &self.sock
  }

  /// Inspect a live exchange
  pub fn exchange(&self, handle: ExchangeHandle) -> Option<&PendingExchange<P::Clock>> {
    self.exchanges.get(handle)
  }

  fn now(&self, when: When) -> Result<Instant<P::Clock>, Error> {
    self.clock
        .try_now()
        .map_err(|_| when.what(What::ClockError))
  }

  fn sock_what(e: <P::Socket as Socket>::Error) -> What {
    if e.is_unreachable() {
      What::Unreachable(format!("{:?}", e))
    } else {
      What::SockError(format!("{:?}", e))
    }
  }

  /// The first of `addrs` in the same address family as our socket
  fn reachable_addr(&self, addrs: &[SocketAddr]) -> Option<SocketAddr> {
    let v4 = |a: &SocketAddr| matches!(a, SocketAddr::V4(_));

    match self.sock.local_addr() {
      | Ok(local) => addrs.iter().copied().find(|a| v4(a) == v4(&local)),
      | Err(_) => addrs.first().copied(),
    }
  }

  fn next_id(&mut self) -> Id {
    let (exchanges, discoveries) = (&self.exchanges, &self.discoveries);
    self.provisioner
        .next_id(|id| exchanges.id_in_use(id) || discoveries.id_in_use(id))
  }

  fn next_token(&mut self, now: Instant<P::Clock>) -> Result<Token, What> {
    let (exchanges, discoveries) = (&self.exchanges, &self.discoveries);
    self.provisioner.next_token(self.config.msg.token_seed, now, |t| {
                                  exchanges.token_in_use(t) || discoveries.token_in_use(t)
                                })
  }

  fn send_bytes(&self, when: When, addr: SocketAddr, bytes: &[u8]) -> Result<(), Error> {
    nb::block!(self.sock.send(Addrd(bytes, addr))).map_err(|e| when.what(Self::sock_what(e)))?;
    log::trace!("sent {}b -> {}", bytes.len(), addr);
    Ok(())
  }

  /// Send a message whose delivery nobody waits on (ACK, RST);
  /// failures are logged and dropped.
  fn fling(&self, msg: Addrd<Message>) -> Option<Vec<u8>> {
    let Addrd(msg, addr) = msg;
    log::trace!("sending {} -> {}", logging::msg_summary(&msg), addr);

    let bytes = match (&msg).try_into_bytes() {
      | Ok(bytes) => bytes,
      | Err(e) => {
        log::warn!("could not encode message for {}: {}", addr, e);
        return None;
      },
    };

    match self.send_bytes(When::SendingMessage(Some(addr), msg.id, msg.token), addr, &bytes) {
      | Ok(()) => (),
      | Err(e) => log::warn!("{}", e),
    }

    Some(bytes)
  }

  /// Send a request, and start tracking it as an exchange.
  ///
  /// Fails before any I/O when the request is invalid, the host does not
  /// resolve to an address our socket can reach, or
  /// [`Config::max_concurrent_requests`] exchanges are already live.
  /// A failure to send is reported here as well.
  pub fn submit(&mut self, req: Req) -> Result<ExchangeHandle, Error> {
    let when = When::Submitting;
    let req_id = req.id;
    let fail = |what: What| when.what(what).for_request(req_id);

    let uri = Uri::parse(&req.uri).map_err(|e| fail(e.into()))?;
    let addrs = P::resolve(&uri.host, uri.port);
    let addr = match (self.reachable_addr(&addrs), addrs.first()) {
      | (Some(addr), _) => addr,
      | (None, Some(other)) => return Err(fail(What::AddressFamily(*other))),
      | (None, None) => return Err(fail(What::HostUnresolved(uri.host.clone()))),
    };

    let max = self.config.max_concurrent_requests;
    if self.exchanges.len() >= max as usize {
      return Err(fail(What::TooManyRequests(max)));
    }

    let now = self.now(when).map_err(|e| e.for_request(req_id))?;
    let id = self.next_id();
    let token = self.next_token(now).map_err(fail)?;

    let msg = req.to_message(&uri, id, token);
    let dgram = (&msg).try_into_bytes().map_err(|e| fail(What::ToBytes(e)))?;

    log::trace!("sending {} -> {}", logging::msg_summary(&msg), addr);
    self.send_bytes(When::SendingMessage(Some(addr), id, token), addr, &dgram)
        .map_err(|e| e.for_request(req_id))?;

    let reliability = if req.confirmable {
      Some(State::new(now, &self.config, &mut self.rand))
    } else {
      None
    };

    Ok(self.exchanges.insert(PendingExchange { req_id,
                                               id,
                                               token,
                                               addr,
                                               sent_at: now,
                                               dgram,
                                               reliability,
                                               retransmits: 0,
                                               outcome: Outcome::Pending,
                                               malformed: None }))
  }

  /// Read up to [`Config::poll_batch`] inbound datagrams and act on them,
  /// then send due retransmissions and expire timed out exchanges
  /// and stale duplicate-detection entries.
  pub fn tick(&mut self) -> Result<(), Error> {
    let now = self.now(When::Polling)?;

    let mut dgrams = Vec::new();
    for recvd in self.sock
                     .incoming(self.config.msg.max_datagram_size)
                     .take(self.config.poll_batch)
    {
      match recvd {
        | Ok(dgram) => dgrams.push(dgram),
        | Err(nb::Error::WouldBlock) => break,
        | Err(nb::Error::Other(e)) => {
          log::warn!("receiving failed: {:?}", e);
          break;
        },
      }
    }

    dgrams.into_iter().for_each(|dgram| self.dgram_recvd(now, dgram));

    self.send_retransmits(now);
    self.expire(now);
    self.dedup.prune(now);

    Ok(())
  }

  fn dgram_recvd(&mut self, now: Instant<P::Clock>, dgram: Addrd<Vec<u8>>) {
    log::trace!("recvd {}b <- {}", dgram.data().len(), dgram.addr());

    let addr = dgram.addr();
    let max = self.config.msg.max_datagram_size;
    if dgram.data().len() > max {
      log::debug!("dropping datagram from {}: longer than {}b", addr, max);
      self.exchanges.saw_malformed_from(addr, MessageParseError::eof());
      return;
    }

    let msg = match Message::try_from_bytes(dgram.unwrap()) {
      | Ok(msg) => msg,
      | Err(e) => {
        log::debug!("dropping malformed datagram from {}: {}", addr, e);
        self.exchanges.saw_malformed_from(addr, e);
        return;
      },
    };

    log::trace!("recvd {} <- {}", logging::msg_summary(&msg), addr);

    match (msg.ty, msg.code.kind()) {
      | (Type::Ack, CodeKind::Request) => {
        log::debug!("dropping ACK carrying a request from {}", addr)
      },
      | (Type::Ack, _) | (Type::Reset, _) => self.ack_or_reset_recvd(now, Addrd(msg, addr)),
      | (_, CodeKind::Response) => self.resp_recvd(now, Addrd(msg, addr)),
      | (Type::Con, CodeKind::Empty) => {
        log::debug!("answering ping {:?} from {} with RST", msg.id, addr);
        self.fling(Addrd(Message::reset(msg.id), addr));
      },
      | (_, CodeKind::Empty) => log::debug!("dropping empty NON from {}", addr),
      | (_, CodeKind::Request) => log::debug!("dropping {} request from {}", msg.code, addr),
    }
  }

  fn ack_or_reset_recvd(&mut self, now: Instant<P::Clock>, msg: Addrd<Message>) {
    let Addrd(msg, addr) = msg;

    let ex = match self.exchanges.by_id_mut(addr, msg.id) {
      | Some(ex) => ex,
      | None => {
        log::debug!("dropping {:?} {:?} from {}: no matching exchange",
                    msg.ty,
                    msg.id,
                    addr);
        return;
      },
    };

    match (msg.ty, msg.code.kind()) {
      | (Type::Reset, _) => {
        log::info!("{:?} was reset by {}", ex.id, addr);
        if let Some(state) = ex.reliability.as_mut() {
          state.reset();
        }
        ex.fail(When::Polling.what(What::Reset));
      },
      | (_, CodeKind::Empty) => {
        log::trace!("{:?} was acked; awaiting separate response", ex.id);
        if let Some(state) = ex.reliability.as_mut() {
          state.ack(now);
        }
      },
      | _ if msg.token != ex.token => {
        log::debug!("dropping piggybacked response from {}: token mismatch", addr)
      },
      | _ => {
        log::info!("{:?} resolved with {} by {}", ex.req_id, msg.code, addr);
        if let Some(state) = ex.reliability.as_mut() {
          state.ack(now);
        }
        let rep = Resp::from_message(ex.req_id, msg);
        ex.resolve(rep);
      },
    }
  }

  fn resp_recvd(&mut self, now: Instant<P::Clock>, msg: Addrd<Message>) {
    let Addrd(msg, addr) = msg;
    let (ty, id) = (msg.ty, msg.id);

    if ty == Type::Con {
      match self.dedup.check(now, addr, id) {
        | Seen::New => (),
        | Seen::Duplicate(reply) => {
          log::debug!("dropping duplicate {:?} from {}", id, addr);
          if let Some(bytes) = reply {
            self.send_bytes(When::SendingMessage(Some(addr), id, msg.token), addr, &bytes)
                .unwrap_or_else(|e| log::warn!("{}", e));
          }
          return;
        },
      }
    }

    let matched = if let Some(window) = self.discoveries.by_token_mut(msg.token) {
      if window.accept(now, addr, &msg) {
        log::info!("discovered {}", addr);
      }
      true
    } else if let Some(ex) = self.exchanges.by_token_mut(addr, msg.token) {
      log::info!("{:?} resolved with {} by {}", ex.req_id, msg.code, addr);
      if let Some(state) = ex.reliability.as_mut() {
        state.ack(now);
      }
      let rep = Resp::from_message(ex.req_id, msg);
      ex.resolve(rep);
      true
    } else {
      false
    };

    if !matched {
      log::debug!("dropping response {:?} from {}: no matching exchange", id, addr);
      return;
    }

    if ty == Type::Con {
      if let Some(ack) = self.fling(Addrd(Message::ack(id), addr)) {
        self.dedup.remember_reply(addr, id, ack);
      }
    }
  }

  fn send_retransmits(&mut self, now: Instant<P::Clock>) {
    let sock = &self.sock;

    for ex in self.exchanges.iter_mut() {
      let when = When::SendingMessage(Some(ex.addr), ex.id, ex.token);

      match reliability::poll(ex, now) {
        | Action::Wait => (),
        | Action::Resend => {
          ex.retransmits += 1;
          log::warn!("retransmitting {:?} to {} ({} of {})",
                     ex.id,
                     ex.addr,
                     ex.retransmits,
                     self.config.msg.con.max_retransmits.0);

          let sent = nb::block!(sock.send(Addrd(ex.dgram.as_slice(), ex.addr)));
          if let Err(e) = sent {
            ex.fail(when.what(Self::sock_what(e)));
          }
        },
        | Action::GiveUp => {
          log::warn!("{:?} to {} was never acknowledged after {} retransmissions",
                     ex.id,
                     ex.addr,
                     ex.retransmits);
          ex.fail(when.what(What::MessageNeverAcked));
        },
      }
    }
  }

  fn expire(&mut self, now: Instant<P::Clock>) {
    let non: Millis = self.config.msg.non.response_timeout;
    let acked: Millis = self.config.msg.con.acked_response_timeout;

    self.exchanges
        .iter_mut()
        .filter(|ex| !ex.is_settled())
        .filter(|ex| {
          ex.awaiting_response(non, acked)
            .map(|(since, ttl)| millis_since(now, since) >= ttl.0)
            .unwrap_or(false)
        })
        .for_each(|ex| {
          let what = match ex.malformed {
            | Some(e) => What::FromBytes(e),
            | None => What::Timeout,
          };
          log::warn!("{:?} to {} timed out waiting for a response", ex.id, ex.addr);
          ex.fail(When::Polling.what(what));
        });
  }

  /// Tick, then take the result of an exchange if it has settled.
  ///
  /// Yields the result exactly once; polling the handle again after
  /// that, or after the exchange was cancelled, is an `INVALID_ACTION`
  /// error tagged with the request's id.
  pub fn poll_exchange(&mut self, handle: ExchangeHandle) -> nb::Result<Resp, Error> {
    let req_id = handle.req_id();
    if !self.exchanges.contains(handle) {
      let e = When::Polling.what(What::NoSuchExchange).for_request(req_id);
      return Err(nb::Error::Other(e));
    }

    self.tick()
        .map_err(|e| nb::Error::Other(e.for_request(req_id)))?;

    match self.exchanges.take_settled(handle) {
      | Some(Ok(rep)) => Ok(rep),
      | Some(Err(e)) => {
        log::info!("{:?} failed: {}", req_id, e);
        Err(nb::Error::Other(e))
      },
      | None => Err(nb::Error::WouldBlock),
    }
  }

  /// Stop tracking every exchange that carries `req_id`. Their results,
  /// if any, are discarded.
  ///
  /// Returns the number of exchanges dropped.
  pub fn cancel(&mut self, req_id: ReqId) -> usize {
    let n = self.exchanges.cancel(req_id);
    log::debug!("cancelled {} exchange(s) for {:?}", n, req_id);
    n
  }

  /// Stop tracking one exchange
  pub fn cancel_exchange(&mut self, handle: ExchangeHandle) -> Result<(), Error> {
    self.exchanges
        .remove(handle)
        .map(|_| ())
        .ok_or_else(|| When::None.what(What::NoSuchExchange).for_request(handle.req_id()))
  }

  /// Multicast a `GET /.well-known/core` to every CoAP device and
  /// collect the replies that arrive within `window`.
  pub fn discover(&mut self, window: Millis) -> Result<DiscoveryHandle, Error> {
    let when = When::Discovering;
    let now = self.now(when)?;

    if !self.joined_multicast {
      let group = IpAddr::V4(crate::multicast::ALL_COAP_DEVICES_IP);
      match self.sock.join_multicast(group) {
        | Ok(()) => self.joined_multicast = true,
        | Err(e) => log::warn!("joining {} failed: {:?}", group, e),
      }
    }

    let id = self.next_id();
    let token = self.next_token(now).map_err(|w| when.what(w))?;
    let addr = crate::multicast::all_coap_devices(self.config.discovery.port);

    let msg = discovery::request(id, token);
    let bytes = (&msg).try_into_bytes()
                      .map_err(|e| when.what(What::ToBytes(e)))?;

    log::trace!("sending {} -> {}", logging::msg_summary(&msg), addr);
    self.send_bytes(When::SendingMessage(Some(addr), id, token), addr, &bytes)?;

    Ok(self.discoveries
           .open(token, Collector::new(id, now, window)))
  }

  /// Tick, then take what a discovery window gathered once it has closed.
  ///
  /// Devices are deduplicated by address and port, in the order
  /// they first answered. A window nobody answered yields an empty list.
  pub fn poll_discovery(&mut self,
                        handle: DiscoveryHandle)
                        -> nb::Result<Vec<DiscoveredDevice>, Error> {
    if !self.discoveries.contains(handle) {
      return Err(nb::Error::Other(When::Discovering.what(What::NoSuchExchange)));
    }

    self.tick().map_err(nb::Error::Other)?;
    let now = self.now(When::Discovering).map_err(nb::Error::Other)?;

    match self.discoveries.take_closed(handle, now) {
      | Some(devices) => {
        log::info!("discovery found {} device(s)", devices.len());
        Ok(devices)
      },
      | None => Err(nb::Error::WouldBlock),
    }
  }

  /// Close a discovery window early, discarding its replies
  pub fn cancel_discovery(&mut self, handle: DiscoveryHandle) -> Result<(), Error> {
    self.discoveries
        .remove(handle)
        .map(|_| ())
        .ok_or_else(|| When::None.what(What::NoSuchExchange))
  }
}
