use embedded_time::clock::Error;
use embedded_time::Instant;

/// Milliseconds
pub type Millis = embedded_time::duration::Milliseconds<u64>;

/// Supertrait of [`embedded_time::Clock`] pinning the
/// type of "ticks" to u64
pub trait Clock: embedded_time::Clock<T = u64> + ::core::fmt::Debug {}
impl<C: embedded_time::Clock<T = u64> + ::core::fmt::Debug> Clock for C {}

/// Whole milliseconds elapsed from `then` to `now`; zero if `then` is later.
pub fn millis_since<C: Clock>(now: Instant<C>, then: Instant<C>) -> u64 {
  now.checked_duration_since(&then)
     .and_then(|dur| Millis::try_from(dur).ok())
     .map(|ms| ms.0)
     .unwrap_or(0)
}

/// Data associated with a timestamp
pub struct Stamped<C: Clock, T>(pub T, pub Instant<C>);

impl<C: Clock, T: ::core::fmt::Debug> ::core::fmt::Debug for Stamped<C, T> {
  fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
    f.debug_tuple("Stamped")
     .field(&self.0)
     .field(&Millis::try_from(self.1.duration_since_epoch()).map(|ms| ms.0)
                                                           .unwrap_or(0))
     .finish()
  }
}

impl<C: Clock, T: PartialEq> PartialEq for Stamped<C, T> {
  fn eq(&self, other: &Self) -> bool {
    self.0 == other.0 && self.1 == other.1
  }
}

impl<C: Clock, T: Clone> Clone for Stamped<C, T> {
  fn clone(&self) -> Self {
    Self(self.0.clone(), self.1)
  }
}

impl<C: Clock, T> Stamped<C, T> {
  /// Stamp `t` with the current time
  pub fn new(clock: &C, t: T) -> Result<Self, Error> {
    clock.try_now().map(|now| Self(t, now))
  }

  /// Get the data
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Get the timestamp
  pub fn time(&self) -> Instant<C> {
    self.1
  }

  /// Whether more than `ttl` has elapsed between the stamp and `now`
  pub fn expired(&self, now: Instant<C>, ttl: Millis) -> bool {
    millis_since(now, self.1) >= ttl.0
  }
}
