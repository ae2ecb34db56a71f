use no_std_net::{IpAddr, SocketAddr};
use std_alloc::vec;
use std_alloc::vec::Vec;

use crate::net::Socket;
use crate::time::Clock;

/// The types and host services a [`Core`](crate::core::Core) runs on
///
/// ```
/// use ccoap::platform::Platform;
/// use no_std_net::SocketAddr;
///
/// # #[cfg(feature = "std")] {
/// use ccoap::std::Std;
///
/// assert_eq!(Std::resolve("127.0.0.1", 5683),
///            vec!["127.0.0.1:5683".parse::<SocketAddr>().unwrap()]);
/// # }
/// ```
pub trait Platform: Sized + ::core::fmt::Debug {
  /// What should we use to keep track of time?
  type Clock: Clock;

  /// What should we use for networking?
  type Socket: Socket;

  /// Resolve a URI host to socket addresses, most preferred first.
  /// An empty list means the host did not resolve.
  ///
  /// The default only understands IP literals.
  fn resolve(host: &str, port: u16) -> Vec<SocketAddr> {
    host.parse::<IpAddr>()
        .map(|ip| vec![SocketAddr::new(ip, port)])
        .unwrap_or_default()
  }
}
