use std_alloc::collections::BTreeMap;
use std_alloc::vec::Vec;

use ccoap_msg::Id;
use embedded_time::Instant;
use no_std_net::SocketAddr;
use rand::Rng;

use crate::config::Config;
use crate::retry::{RetryTimer, YouShould};
use crate::time::{Clock, Millis, Stamped};

/// Delivery state of an outbound Confirmable message
///
/// ```text
/// Unacked --ACK or piggybacked response--> Acked
///    |  \
///    |   `--RST--> Reset
///    `--retries exhausted--> Exhausted
/// ```
#[derive(Debug)]
pub enum State<C: Clock> {
  /// Sent, waiting for an acknowledgement
  Unacked(RetryTimer<C>),
  /// Acknowledged at the given time
  Acked(Instant<C>),
  /// The peer answered with a Reset
  Reset,
  /// Retransmissions ran out without an acknowledgement
  Exhausted,
}

impl<C: Clock> State<C> {
  /// Start tracking a message first sent at `now`
  pub fn new(now: Instant<C>, config: &Config, rand: &mut impl Rng) -> Self {
    State::Unacked(RetryTimer::new(now,
                                   config.msg.con.unacked_retry_strategy,
                                   config.msg.con.max_retransmits,
                                   rand))
  }

  /// An acknowledgement arrived; retransmission stops.
  ///
  /// Acknowledging a message twice keeps the first time.
  pub fn ack(&mut self, now: Instant<C>) {
    if let State::Unacked(_) = self {
      *self = State::Acked(now);
    }
  }

  /// A Reset arrived
  pub fn reset(&mut self) {
    *self = State::Reset;
  }

  /// Whether retransmission is still running
  pub fn is_unacked(&self) -> bool {
    matches!(self, State::Unacked(_))
  }

  /// The retry timer, while unacked
  pub fn timer(&self) -> Option<&RetryTimer<C>> {
    match self {
      | State::Unacked(t) => Some(t),
      | _ => None,
    }
  }
}

/// What the owner of a tracked message should do about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Nothing is due
  Wait,
  /// Send the identical datagram again
  Resend,
  /// Retries are exhausted; fail the exchange
  GiveUp,
}

/// The slice of an exchange that retransmission is allowed to touch
pub trait Retransmit<C: Clock> {
  /// Delivery state, or `None` for messages that are never retransmitted
  fn reliability_mut(&mut self) -> Option<&mut State<C>>;
}

/// Advance the retransmission state machine of `tracked` to `now`.
///
/// A [`Action::Resend`] answer has already been counted as a
/// retransmission, and the timeout doubled.
pub fn poll<C: Clock>(tracked: &mut impl Retransmit<C>, now: Instant<C>) -> Action {
  let state = match tracked.reliability_mut() {
    | Some(state) => state,
    | None => return Action::Wait,
  };

  let next = match state {
    | State::Unacked(timer) => match timer.what_should_i_do(now) {
      | Ok(YouShould::Retry) => return Action::Resend,
      | Ok(YouShould::Cry) => State::Exhausted,
      | Err(_) => return Action::Wait,
    },
    | _ => return Action::Wait,
  };

  *state = next;
  Action::GiveUp
}

/// Result of [`DedupTable::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
  /// First time this message arrived; process it
  New,
  /// Already processed. Carries the reply sent the first time, if any,
  /// to be sent again.
  Duplicate(Option<Vec<u8>>),
}

/// Inbound Confirmable messages recently processed,
/// keyed by sender and message id
#[derive(Debug)]
pub struct DedupTable<C: Clock> {
  seen: BTreeMap<(SocketAddr, Id), Stamped<C, Option<Vec<u8>>>>,
  lifetime: Millis,
}

impl<C: Clock> DedupTable<C> {
  /// Entries are retained for `lifetime` (EXCHANGE_LIFETIME)
  pub fn new(lifetime: Millis) -> Self {
    Self { seen: BTreeMap::new(),
           lifetime }
  }

  /// Record that message `id` arrived from `from`, and whether it was seen before
  pub fn check(&mut self, now: Instant<C>, from: SocketAddr, id: Id) -> Seen {
    match self.seen.get(&(from, id)) {
      | Some(entry) if !entry.expired(now, self.lifetime) => Seen::Duplicate(entry.data().clone()),
      | _ => {
        self.seen.insert((from, id), Stamped(None, now));
        Seen::New
      },
    }
  }

  /// Remember the bytes we replied to a message with
  pub fn remember_reply(&mut self, from: SocketAddr, id: Id, reply: Vec<u8>) {
    if let Some(entry) = self.seen.get_mut(&(from, id)) {
      entry.0 = Some(reply);
    }
  }

  /// Forget entries older than the lifetime
  pub fn prune(&mut self, now: Instant<C>) {
    let lifetime = self.lifetime;
    self.seen.retain(|_, entry| !entry.expired(now, lifetime));
  }

  /// Number of entries
  pub fn len(&self) -> usize {
    self.seen.len()
  }

  /// Whether there are no entries
  pub fn is_empty(&self) -> bool {
    self.seen.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;
  use embedded_time::Clock as _;
  use rand::SeedableRng;

  use super::*;
  use crate::retry::{Attempts, Strategy};
  use crate::test::{dummy_addr, ClockMock};

  struct Tracked<C: Clock>(Option<State<C>>);

  impl<C: Clock> Retransmit<C> for Tracked<C> {
    fn reliability_mut(&mut self) -> Option<&mut State<C>> {
      self.0.as_mut()
    }
  }

  fn config() -> Config {
    let mut config = Config::default();
    config.msg.con.unacked_retry_strategy = Strategy::Exponential { init_min: Milliseconds(2000),
                                                                    init_max: Milliseconds(2000) };
    config.msg.con.max_retransmits = Attempts(4);
    config
  }

  #[test]
  fn resends_exactly_max_retransmits_times() {
    let clock = ClockMock::new();
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    let mut tracked = Tracked(Some(State::new(clock.try_now().unwrap(), &config(), &mut rng)));

    let mut resent_at = vec![];
    let mut gave_up_at = None;
    for ms in 0..=70_000 {
      clock.set(ms);
      match poll(&mut tracked, clock.try_now().unwrap()) {
        | Action::Resend => resent_at.push(ms),
        | Action::GiveUp => gave_up_at = gave_up_at.or(Some(ms)),
        | Action::Wait => (),
      }
    }

    assert_eq!(resent_at, vec![2000, 6000, 14_000, 30_000]);
    assert_eq!(gave_up_at, Some(62_000));
    assert!(matches!(tracked.0, Some(State::Exhausted)));
  }

  #[test]
  fn ack_stops_retransmission() {
    let clock = ClockMock::new();
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    let mut tracked = Tracked(Some(State::new(clock.try_now().unwrap(), &config(), &mut rng)));

    clock.set(1000);
    tracked.0.as_mut().unwrap().ack(clock.try_now().unwrap());

    clock.set(100_000);
    assert_eq!(poll(&mut tracked, clock.try_now().unwrap()), Action::Wait);
    assert!(!tracked.0.as_ref().unwrap().is_unacked());
  }

  #[test]
  fn untracked_never_resends() {
    let clock = ClockMock::new();
    let mut tracked = Tracked::<ClockMock>(None);
    clock.set(1_000_000);
    assert_eq!(poll(&mut tracked, clock.try_now().unwrap()), Action::Wait);
  }

  #[test]
  fn dedup_replays_reply_until_expiry() {
    let clock = ClockMock::new();
    let now = || clock.try_now().unwrap();
    let mut dedup = DedupTable::<ClockMock>::new(Milliseconds(247_000));

    assert_eq!(dedup.check(now(), dummy_addr(), Id(5)), Seen::New);
    assert_eq!(dedup.check(now(), dummy_addr(), Id(5)), Seen::Duplicate(None));

    dedup.remember_reply(dummy_addr(), Id(5), vec![0x60, 0, 0, 5]);
    clock.set(246_999);
    assert_eq!(dedup.check(now(), dummy_addr(), Id(5)),
               Seen::Duplicate(Some(vec![0x60, 0, 0, 5])));
    assert_eq!(dedup.check(now(), dummy_addr(), Id(6)), Seen::New);

    clock.set(247_000);
    dedup.prune(now());
    assert_eq!(dedup.len(), 1);
    assert_eq!(dedup.check(now(), dummy_addr(), Id(5)), Seen::New);
  }
}
