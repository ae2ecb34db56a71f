use ::std::net::{ToSocketAddrs, UdpSocket};

use embedded_time::rate::Fraction;
use no_std_net::SocketAddr;

/// Networking! woohoo!
pub mod net;
pub use net::*;

/// implementor of [`crate::platform::Platform`] for
/// platforms that support `std`.
///
/// Hosts are resolved with the operating system's resolver.
#[derive(Clone, Copy, Debug)]
pub struct Std;

impl crate::platform::Platform for Std {
  type Clock = Clock;
  type Socket = UdpSocket;

  fn resolve(host: &str, port: u16) -> Vec<SocketAddr> {
    match (host, port).to_socket_addrs() {
      | Ok(addrs) => addrs.map(convert::from_std).collect(),
      | Err(e) => {
        log::debug!("resolving {:?} failed: {}", host, e);
        Vec::new()
      },
    }
  }
}

/// Implement [`embedded_time::Clock`] using [`std::time`] primitives
#[derive(Debug, Clone, Copy)]
pub struct Clock(::std::time::Instant);

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock {
  /// Create a new clock
  pub fn new() -> Self {
    Self(::std::time::Instant::now())
  }
}

impl embedded_time::Clock for Clock {
  type T = u64;

  // microseconds
  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

  fn try_now(&self) -> Result<embedded_time::Instant<Self>, embedded_time::clock::Error> {
    let elapsed = ::std::time::Instant::now().duration_since(self.0);
    Ok(embedded_time::Instant::new(elapsed.as_micros() as u64))
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::Clock as _;

  use super::*;
  use crate::platform::Platform;
  use crate::time::millis_since;

  #[test]
  fn clock_counts_milliseconds() {
    let clock = Clock::new();
    let start = clock.try_now().unwrap();
    ::std::thread::sleep(::std::time::Duration::from_millis(20));
    let now = clock.try_now().unwrap();

    let elapsed = millis_since(now, start);
    assert!(elapsed >= 20, "{}", elapsed);
  }

  #[test]
  fn resolves_ip_literals_and_localhost() {
    assert_eq!(Std::resolve("10.0.0.5", 5683),
               vec!["10.0.0.5:5683".parse().unwrap()]);
    assert_eq!(Std::resolve("::1", 61616), vec!["[::1]:61616".parse().unwrap()]);

    let localhost = Std::resolve("localhost", 5683);
    assert!(!localhost.is_empty());
    assert!(localhost.iter().all(|a| a.port() == 5683));
    assert!(Std::resolve("no-such-host.invalid", 5683).is_empty());
  }
}
