use embedded_time::duration::Milliseconds;

use crate::retry::{Attempts, Strategy};
use crate::time::Millis;

/// MAX_LATENCY; the longest a datagram is expected to spend in the network
const MAX_LATENCY: u64 = 100_000;

/// Configuration options related to outbound CON requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Con {
  /// Retry strategy for CON requests that
  /// have not yet been ACKed.
  ///
  /// Defaults to an exponential retry strategy starting at
  /// ACK_TIMEOUT (2s) scaled by a random factor in `[1.0, 1.5]`:
  /// ```
  /// use ccoap::config::Con;
  /// use ccoap::retry::Strategy;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Con::default().unacked_retry_strategy,
  ///            Strategy::Exponential { init_min: Milliseconds(2_000),
  ///                                    init_max: Milliseconds(3_000) });
  /// ```
  pub unacked_retry_strategy: Strategy,
  /// Number of times we are allowed to resend a CON request
  /// before giving up.
  ///
  /// Defaults to 4 retransmissions.
  /// ```
  /// use ccoap::config::Con;
  /// use ccoap::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_retransmits, Attempts(4));
  /// ```
  pub max_retransmits: Attempts,
  /// How long to wait for a separate response once our
  /// request has been acknowledged with an empty ACK.
  ///
  /// Defaults to MAX_TRANSMIT_WAIT of the default strategy (93s).
  pub acked_response_timeout: Millis,
}

/// Configuration options related to outbound NON requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Non {
  /// How long to wait for a response to a NON request.
  ///
  /// Defaults to 93 seconds.
  /// ```
  /// use ccoap::config::Non;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Non::default().response_timeout, Milliseconds(93_000u64));
  /// ```
  pub response_timeout: Millis,
}

/// Configuration options related to parsing & handling messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msg {
  /// Seed used to generate message [`Token`](ccoap_msg::Token)s,
  /// customizable to allow for your application to generate tokens
  /// less guessably.
  ///
  /// ```
  /// use ccoap::config::Msg;
  ///
  /// assert_eq!(Msg::default().token_seed, 0);
  /// ```
  pub token_seed: u16,

  /// See [`Con`]
  pub con: Con,

  /// See [`Non`]
  pub non: Non,

  /// Longest inbound datagram accepted. Longer ones are dropped
  /// and count as malformed replies.
  ///
  /// Defaults to 4096 bytes.
  pub max_datagram_size: usize,
}

/// Configuration options related to multicast discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
  /// Port discovery requests are sent to.
  ///
  /// ```
  /// use ccoap::config::Discovery;
  ///
  /// assert_eq!(Discovery::default().port, 5683);
  /// ```
  pub port: u16,
  /// Collection window used when a caller does not choose one.
  ///
  /// Defaults to 60 seconds.
  pub default_window: Millis,
}

impl Default for Con {
  fn default() -> Self {
    let unacked_retry_strategy = Strategy::Exponential { init_min: Milliseconds(2_000),
                                                         init_max: Milliseconds(3_000) };
    let max_retransmits = Attempts(4);

    Con { unacked_retry_strategy,
          max_retransmits,
          acked_response_timeout: unacked_retry_strategy.max_time(Attempts(max_retransmits.0 + 1)) }
  }
}

impl Default for Non {
  fn default() -> Self {
    Non { response_timeout: Con::default().acked_response_timeout }
  }
}

impl Default for Msg {
  fn default() -> Self {
    Msg { token_seed: 0,
          con: Con::default(),
          non: Non::default(),
          max_datagram_size: 4096 }
  }
}

impl Default for Discovery {
  fn default() -> Self {
    Discovery { port: crate::DEFAULT_PORT,
                default_window: Milliseconds(60_000) }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// See [`Msg`]
  pub msg: Msg,
  /// See [`Discovery`]
  pub discovery: Discovery,
  /// Maximum number of requests that
  /// can be in flight at a given moment
  ///
  /// ```
  /// use ccoap::config::Config;
  ///
  /// assert_eq!(Config::default().max_concurrent_requests, 64);
  /// ```
  pub max_concurrent_requests: u16,
  /// Most datagrams drained from the socket by one tick
  pub poll_batch: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config { msg: Msg::default(),
             discovery: Discovery::default(),
             max_concurrent_requests: 64,
             poll_batch: 32 }
  }
}

impl Config {
  /// MAX_TRANSMIT_SPAN; the longest time from the first transmission
  /// of a CON message to its last retransmission.
  pub fn max_transmit_span(&self) -> Millis {
    self.msg
        .con
        .unacked_retry_strategy
        .max_time(self.msg.con.max_retransmits)
  }

  /// MAX_TRANSMIT_WAIT; the longest time from the first transmission
  /// of a CON message to giving up on an acknowledgement.
  pub fn max_transmit_wait(&self) -> Millis {
    self.msg
        .con
        .unacked_retry_strategy
        .max_time(Attempts(self.msg.con.max_retransmits.0 + 1))
  }

  /// PROCESSING_DELAY; how long a peer may take to acknowledge, ACK_TIMEOUT
  fn processing_delay(&self) -> u64 {
    *self.msg.con.unacked_retry_strategy.range().start()
  }

  /// EXCHANGE_LIFETIME; how long a message id stays reserved after
  /// its first transmission.
  ///
  /// ```
  /// use ccoap::config::Config;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// let config = Config::default();
  /// assert_eq!(config.max_transmit_span(), Milliseconds(45_000u64));
  /// assert_eq!(config.max_transmit_wait(), Milliseconds(93_000u64));
  /// assert_eq!(config.exchange_lifetime(), Milliseconds(247_000u64));
  /// ```
  pub fn exchange_lifetime(&self) -> Millis {
    Milliseconds(self.max_transmit_span().0 + 2 * MAX_LATENCY + self.processing_delay())
  }
}
