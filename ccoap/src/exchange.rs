use std_alloc::collections::BTreeMap;
use std_alloc::vec::Vec;

use ccoap_msg::{Id, MessageParseError, Token};
use embedded_time::Instant;
use no_std_net::SocketAddr;
use rand::Rng;

use crate::core::{Error, What};
use crate::reliability::{Retransmit, State};
use crate::req::ReqId;
use crate::resp::Resp;
use crate::time::{Clock, Millis};

/// Handle to an in-flight exchange, returned by [`Core::submit`](crate::core::Core::submit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeHandle(pub(crate) Token, pub(crate) ReqId);

impl ExchangeHandle {
  /// The token of the request message
  pub fn token(&self) -> Token {
    self.0
  }

  /// The caller's correlation id for the request
  pub fn req_id(&self) -> ReqId {
    self.1
  }
}

/// How an exchange ended, if it has
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// Still waiting
  Pending,
  /// A response arrived
  Resolved(Resp),
  /// The exchange failed
  Failed(Error),
}

/// A request that has been sent and not yet collected
#[derive(Debug)]
pub struct PendingExchange<C: Clock> {
  /// Caller's correlation id
  pub req_id: ReqId,
  /// Message id of the request
  pub id: Id,
  /// Token of the request
  pub token: Token,
  /// Where the request was sent
  pub addr: SocketAddr,
  /// When the request was first sent
  pub sent_at: Instant<C>,
  /// The encoded request, resent verbatim
  pub dgram: Vec<u8>,
  /// Retransmission state; `None` for Non-confirmable requests
  pub reliability: Option<State<C>>,
  /// Retransmissions performed
  pub retransmits: u16,
  /// See [`Outcome`]
  pub outcome: Outcome,
  /// The last datagram from `addr` that failed to parse while we waited
  pub malformed: Option<MessageParseError>,
}

impl<C: Clock> Retransmit<C> for PendingExchange<C> {
  fn reliability_mut(&mut self) -> Option<&mut State<C>> {
    match self.outcome {
      | Outcome::Pending => self.reliability.as_mut(),
      | _ => None,
    }
  }
}

impl<C: Clock> PendingExchange<C> {
  /// Settle with a response; an exchange settles only once
  pub fn resolve(&mut self, rep: Resp) -> bool {
    self.settle(Outcome::Resolved(rep))
  }

  /// Settle with an error; an exchange settles only once
  pub fn fail(&mut self, e: Error) -> bool {
    self.settle(Outcome::Failed(e.for_request(self.req_id)))
  }

  fn settle(&mut self, outcome: Outcome) -> bool {
    match self.outcome {
      | Outcome::Pending => {
        self.outcome = outcome;
        true
      },
      | _ => false,
    }
  }

  /// Whether a result is waiting to be collected
  pub fn is_settled(&self) -> bool {
    self.outcome != Outcome::Pending
  }

  /// Current retransmission timeout, while unacknowledged
  pub fn next_timeout(&self) -> Option<Millis> {
    self.reliability
        .as_ref()
        .and_then(State::timer)
        .map(|t| t.next_timeout())
  }

  /// When we started waiting for the response itself, and how long we may wait.
  ///
  /// Non-confirmable requests wait from the moment they were sent,
  /// confirmable ones from the moment they were acknowledged.
  /// `None` while a confirmable request is unacknowledged.
  pub fn awaiting_response(&self,
                           non_timeout: Millis,
                           acked_timeout: Millis)
                           -> Option<(Instant<C>, Millis)> {
    match self.reliability {
      | None => Some((self.sent_at, non_timeout)),
      | Some(State::Acked(at)) => Some((at, acked_timeout)),
      | Some(_) => None,
    }
  }
}

/// Every exchange that has not been collected, keyed by token
#[derive(Debug)]
pub struct Exchanges<C: Clock> {
  live: BTreeMap<Token, PendingExchange<C>>,
}

impl<C: Clock> Default for Exchanges<C> {
  fn default() -> Self {
    Self { live: BTreeMap::new() }
  }
}

impl<C: Clock> Exchanges<C> {
  /// Start tracking an exchange
  pub fn insert(&mut self, ex: PendingExchange<C>) -> ExchangeHandle {
    let handle = ExchangeHandle(ex.token, ex.req_id);
    self.live.insert(ex.token, ex);
    handle
  }

  /// Look up an exchange
  pub fn get(&self, handle: ExchangeHandle) -> Option<&PendingExchange<C>> {
    self.live.get(&handle.0)
  }

  /// The unsettled exchange whose request had message id `id` and went to `addr`
  pub fn by_id_mut(&mut self, addr: SocketAddr, id: Id) -> Option<&mut PendingExchange<C>> {
    self.live
        .values_mut()
        .find(|ex| ex.id == id && ex.addr == addr && !ex.is_settled())
  }

  /// The unsettled exchange whose request carried `token` and went to `addr`
  pub fn by_token_mut(&mut self,
                      addr: SocketAddr,
                      token: Token)
                      -> Option<&mut PendingExchange<C>> {
    self.live
        .get_mut(&token)
        .filter(|ex| ex.addr == addr && !ex.is_settled())
  }

  /// Remove and return the result of a settled exchange.
  ///
  /// `None` while pending or when the handle is unknown.
  pub fn take_settled(&mut self, handle: ExchangeHandle) -> Option<Result<Resp, Error>> {
    match self.live.get(&handle.0).map(|ex| ex.is_settled()) {
      | Some(true) => match self.live.remove(&handle.0).map(|ex| ex.outcome) {
        | Some(Outcome::Resolved(rep)) => Some(Ok(rep)),
        | Some(Outcome::Failed(e)) => Some(Err(e)),
        | _ => None,
      },
      | _ => None,
    }
  }

  /// Stop tracking an exchange
  pub fn remove(&mut self, handle: ExchangeHandle) -> Option<PendingExchange<C>> {
    self.live.remove(&handle.0)
  }

  /// Drop every exchange carrying `req_id`, returning how many there were
  pub fn cancel(&mut self, req_id: ReqId) -> usize {
    let before = self.live.len();
    self.live.retain(|_, ex| ex.req_id != req_id);
    before - self.live.len()
  }

  /// Whether `handle` is tracked
  pub fn contains(&self, handle: ExchangeHandle) -> bool {
    self.live.contains_key(&handle.0)
  }

  /// Whether a tracked exchange uses message id `id`
  pub fn id_in_use(&self, id: Id) -> bool {
    self.live.values().any(|ex| ex.id == id)
  }

  /// Whether a tracked exchange uses `token`
  pub fn token_in_use(&self, token: Token) -> bool {
    self.live.contains_key(&token)
  }

  /// Note on every unsettled exchange waiting on `addr` that a datagram from it failed to parse
  pub fn saw_malformed_from(&mut self, addr: SocketAddr, e: MessageParseError) {
    self.live
        .values_mut()
        .filter(|ex| ex.addr == addr && !ex.is_settled())
        .for_each(|ex| ex.malformed = Some(e));
  }

  /// Iterate over every tracked exchange
  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PendingExchange<C>> {
    self.live.values_mut()
  }

  /// Number of tracked exchanges, settled or not
  pub fn len(&self) -> usize {
    self.live.len()
  }

  /// Whether nothing is tracked
  pub fn is_empty(&self) -> bool {
    self.live.is_empty()
  }
}

/// Hands out message ids and tokens
#[derive(Debug, Clone)]
pub struct Provisioner {
  next_id: Id,
  tokens_issued: u64,
}

impl Provisioner {
  /// Message ids start at a random value
  pub fn new(rand: &mut impl Rng) -> Self {
    Self { next_id: Id(rand.gen()),
           tokens_issued: 0 }
  }

  /// The next message id for which `in_use` is false.
  ///
  /// Ids increment and wrap around.
  pub fn next_id(&mut self, in_use: impl Fn(Id) -> bool) -> Id {
    let mut id = self.next_id;
    for _ in 0..=u16::MAX {
      if !in_use(id) {
        break;
      }
      id = id.next();
    }

    self.next_id = id.next();
    id
  }

  /// An 8-byte token for which `in_use` is false, derived from
  /// `seed`, a counter and the current time.
  pub fn next_token<C: Clock>(&mut self,
                              seed: u16,
                              now: Instant<C>,
                              in_use: impl Fn(Token) -> bool)
                              -> Result<Token, What> {
    let now_since_epoch = Millis::try_from(now.duration_since_epoch()).map_err(|_| What::ClockError)?;

    loop {
      self.tokens_issued = self.tokens_issued.wrapping_add(1);

      #[allow(clippy::many_single_char_names)]
      let bytes = {
        let ([a, b], [c, d, e, f, g, h, i, j], [k, l, m, n, o, p, q, r]) =
          (seed.to_be_bytes(), now_since_epoch.0.to_be_bytes(), self.tokens_issued.to_be_bytes());
        [a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r]
      };

      let token = Token::opaque(&bytes);
      if !in_use(token) {
        return Ok(token);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use ccoap_msg::Code;
  use embedded_time::Clock as _;
  use rand::SeedableRng;

  use super::*;
  use crate::core::When;
  use crate::test::{addr, ClockMock};

  fn exchange(clock: &ClockMock, req_id: i64, id: u16, token: u8) -> PendingExchange<ClockMock> {
    PendingExchange { req_id: ReqId(req_id),
                      id: Id(id),
                      token: Token::from_bytes(&[token]),
                      addr: addr(5, 5683),
                      sent_at: clock.try_now().unwrap(),
                      dgram: vec![],
                      reliability: None,
                      retransmits: 0,
                      outcome: Outcome::Pending,
                      malformed: None }
  }

  fn rep(req_id: ReqId) -> Resp {
    Resp { id: req_id,
           code: Code::new(2, 5),
           payload: vec![],
           options: vec![] }
  }

  #[test]
  fn settles_exactly_once() {
    let clock = ClockMock::new();
    let mut ex = exchange(&clock, 1, 1, 1);

    assert!(ex.resolve(rep(ReqId(1))));
    assert!(!ex.fail(When::None.what(What::Timeout)));
    assert!(matches!(ex.outcome, Outcome::Resolved(_)));
  }

  #[test]
  fn failure_carries_request_id() {
    let clock = ClockMock::new();
    let mut ex = exchange(&clock, 42, 1, 1);
    ex.fail(When::None.what(What::MessageNeverAcked));

    match ex.outcome {
      | Outcome::Failed(e) => assert_eq!(e.id, ReqId(42)),
      | o => panic!("{:?}", o),
    }
  }

  #[test]
  fn take_settled_once() {
    let clock = ClockMock::new();
    let mut table = Exchanges::default();
    let h = table.insert(exchange(&clock, -1, 1, 1));

    assert_eq!(table.take_settled(h), None);
    table.by_id_mut(addr(5, 5683), Id(1)).unwrap().resolve(rep(ReqId(-1)));
    assert_eq!(table.take_settled(h), Some(Ok(rep(ReqId(-1)))));
    assert_eq!(table.take_settled(h), None);
    assert!(!table.contains(h));
  }

  #[test]
  fn lookups_require_matching_peer() {
    let clock = ClockMock::new();
    let mut table = Exchanges::default();
    table.insert(exchange(&clock, -1, 7, 9));

    assert!(table.by_id_mut(addr(6, 5683), Id(7)).is_none());
    assert!(table.by_token_mut(addr(5, 5684), Token::from_bytes(&[9])).is_none());
    assert!(table.by_token_mut(addr(5, 5683), Token::from_bytes(&[9])).is_some());
  }

  #[test]
  fn cancel_by_request_id() {
    let clock = ClockMock::new();
    let mut table = Exchanges::default();
    table.insert(exchange(&clock, 3, 1, 1));
    table.insert(exchange(&clock, 3, 2, 2));
    table.insert(exchange(&clock, 4, 3, 3));

    assert_eq!(table.cancel(ReqId(3)), 2);
    assert_eq!(table.cancel(ReqId(3)), 0);
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn ids_skip_live_ones_and_wrap() {
    let mut ids = Provisioner { next_id: Id(u16::MAX - 1),
                                tokens_issued: 0 };
    let live = [Id(u16::MAX)];

    assert_eq!(ids.next_id(|id| live.contains(&id)), Id(u16::MAX - 1));
    assert_eq!(ids.next_id(|id| live.contains(&id)), Id(0));
    assert_eq!(ids.next_id(|id| live.contains(&id)), Id(1));
  }

  #[test]
  fn tokens_are_unique() {
    let clock = ClockMock::new();
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
    let mut provisioner = Provisioner::new(&mut rng);

    let mut issued: Vec<Token> = vec![];
    for _ in 0..100 {
      let t = provisioner.next_token(0, clock.try_now().unwrap(), |t| issued.contains(&t))
                         .unwrap();
      assert_eq!(t.as_bytes().len(), 8);
      issued.push(t);
    }

    issued.sort();
    issued.dedup();
    assert_eq!(issued.len(), 100);
  }
}
