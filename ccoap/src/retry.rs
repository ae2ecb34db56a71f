use ::core::ops::RangeInclusive;

use embedded_time::duration::Milliseconds;
use embedded_time::Instant;
use rand::Rng;

use crate::time::{millis_since, Clock, Millis};

/// A non-blocking timer deciding when to retry an operation that lives
/// alongside it, with a fixed delay or exponential backoff.
///
/// The first timeout is drawn from the strategy's range once; every retry
/// after that keeps it (fixed delay) or doubles it (exponential).
///
/// ```
/// use embedded_time::clock::Clock as _;
/// use embedded_time::duration::Milliseconds;
/// use embedded_time::rate::Fraction;
/// use embedded_time::Instant;
/// use ccoap::retry::{Attempts, RetryTimer, Strategy, YouShould};
/// use rand::SeedableRng;
///
/// #[derive(Debug)]
/// struct FixedClock(u64);
/// impl embedded_time::Clock for FixedClock {
///   type T = u64;
///   const SCALING_FACTOR: Fraction = Fraction::new(1, 1000);
///   fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
///     Ok(Instant::new(self.0))
///   }
/// }
///
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// let mut retry = RetryTimer::new(FixedClock(0).try_now().unwrap(),
///                                 Strategy::Exponential { init_min: Milliseconds(100),
///                                                         init_max: Milliseconds(100) },
///                                 Attempts(1),
///                                 &mut rng);
///
/// assert_eq!(retry.what_should_i_do(FixedClock(99).try_now().unwrap()),
///            Err(nb::Error::WouldBlock));
/// assert_eq!(retry.what_should_i_do(FixedClock(100).try_now().unwrap()),
///            Ok(YouShould::Retry));
/// assert_eq!(retry.what_should_i_do(FixedClock(299).try_now().unwrap()),
///            Err(nb::Error::WouldBlock));
/// assert_eq!(retry.what_should_i_do(FixedClock(300).try_now().unwrap()),
///            Ok(YouShould::Cry));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryTimer<C: Clock> {
  last_attempt: Instant<C>,
  timeout: Millis,
  strategy: Strategy,
  retransmits: Attempts,
  max_retransmits: Attempts,
}

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

/// Result of [`RetryTimer.what_should_i_do`].
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Timeout elapsed with retries left; perform the operation again.
  Retry,
  /// Timeout elapsed with no retries left; give up.
  Cry,
}

impl<C: Clock> RetryTimer<C> {
  /// Start a timer; `start` is the time of the first attempt.
  pub fn new(start: Instant<C>,
             strategy: Strategy,
             max_retransmits: Attempts,
             rand: &mut impl Rng)
             -> Self {
    let timeout = if strategy.has_jitter() {
      Milliseconds(rand.gen_range(strategy.range()))
    } else {
      Milliseconds(*strategy.range().start())
    };

    Self { last_attempt: start,
           timeout,
           strategy,
           retransmits: Attempts(0),
           max_retransmits }
  }

  /// When the thing we keep failing at has not succeeded yet, ask the timer
  /// whether to try again, give up, or keep waiting.
  ///
  /// A `Retry` answer counts as a retransmission and restarts the timeout.
  pub fn what_should_i_do(&mut self, now: Instant<C>) -> nb::Result<YouShould, ::core::convert::Infallible> {
    if millis_since(now, self.last_attempt) < self.timeout.0 {
      Err(nb::Error::WouldBlock)
    } else if self.retransmits >= self.max_retransmits {
      Ok(YouShould::Cry)
    } else {
      self.retransmits.0 += 1;
      self.last_attempt = now;
      self.timeout = match self.strategy {
        | Strategy::Delay { .. } => self.timeout,
        | Strategy::Exponential { .. } => Milliseconds(self.timeout.0.saturating_mul(2)),
      };
      Ok(YouShould::Retry)
    }
  }

  /// Retries performed so far
  pub fn retransmits(&self) -> Attempts {
    self.retransmits
  }

  /// How long after [`RetryTimer::last_attempt`] the next decision is due
  pub fn next_timeout(&self) -> Millis {
    self.timeout
  }

  /// Time of the most recent attempt
  pub fn last_attempt(&self) -> Instant<C> {
    self.last_attempt
  }
}

/// Strategy to employ when retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Wait an exponentially growing delay between attempts.
  ///
  /// The initial delay is a random value in
  /// `[init_min, init_max]`; `init_min == init_max` disables jitter.
  #[allow(missing_docs)]
  Exponential {
    init_min: Milliseconds<u64>,
    init_max: Milliseconds<u64>,
  },
  /// Wait a fixed delay between attempts, chosen once
  /// from `[min, max]`.
  #[allow(missing_docs)]
  Delay {
    min: Milliseconds<u64>,
    max: Milliseconds<u64>,
  },
}

impl Strategy {
  /// Whether the initial delay is random
  pub fn has_jitter(&self) -> bool {
    let rng = self.range();
    rng.start() != rng.end()
  }

  /// Range of possible initial delays, in milliseconds
  pub fn range(&self) -> RangeInclusive<u64> {
    match self {
      | &Self::Delay { min: Milliseconds(min),
                       max: Milliseconds(max), } => min..=max,

      | &Self::Exponential { init_min: Milliseconds(min),
                             init_max: Milliseconds(max), } => min..=max,
    }
  }

  /// Longest possible total wait across `n` consecutive timeouts.
  ///
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use ccoap::retry::{Attempts, Strategy};
  ///
  /// let exp = Strategy::Exponential { init_min: Milliseconds(2000),
  ///                                   init_max: Milliseconds(3000) };
  /// assert_eq!(exp.max_time(Attempts(4)), Milliseconds(45_000u64));
  ///
  /// let delay = Strategy::Delay { min: Milliseconds(10),
  ///                               max: Milliseconds(20) };
  /// assert_eq!(delay.max_time(Attempts(3)), Milliseconds(60u64));
  /// ```
  pub fn max_time(&self, n: Attempts) -> Milliseconds<u64> {
    Milliseconds(match self {
                   | Self::Exponential { init_max, .. } => Self::total_delay_exp(*init_max, n.0),
                   | Self::Delay { max: Milliseconds(max),
                                   .. } => max * n.0 as u64,
                 })
  }

  const fn total_delay_exp(Milliseconds(init): Milliseconds<u64>, n: u16) -> u64 {
    init * (2u64.pow(n as u32) - 1)
  }
}
