//! `ccoap` is a client-side CoAP engine.
//!
//! ## CoAP
//! CoAP is an application-level network protocol that copies the semantics of HTTP
//! to an environment conducive to **constrained** devices. (weak hardware, small battery capacity, etc.)
//!
//! CoAP customarily sits on top of UDP, which offers no guarantee of delivery.
//! Requests sent as Confirmable are retransmitted with exponential backoff until the
//! peer acknowledges them, and duplicates of the peer's Confirmable messages are
//! recognised and re-acknowledged without being processed twice.
//!
//! ## This crate
//! - [`core::Core`] is the protocol engine. It owns a socket, a clock and all exchange state,
//!   performs no I/O unless driven, and reports results through [`nb`].
//! - [`blocking::Client`] wraps a `Core` behind a mutex and blocks the calling thread
//!   until an exchange settles.
//! - [`json`] describes requests, responses, errors and discovered devices as JSON.
//!
//! ```no_run
//! use ccoap::blocking::Client;
//!
//! let client = Client::new_std(0).unwrap();
//! let rep = client.get("coap://10.0.0.5/sensor/temp").unwrap();
//! println!("{} {:?}", rep.code, rep.payload_string());
//!
//! for device in client.discover(2000).unwrap() {
//!   println!("{}:{} {}", device.address, device.port, device.resources);
//! }
//! ```

#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc as std_alloc;

#[cfg(test)]
pub(crate) mod test;

pub(crate) mod logging;

/// Blocking CoAP client
#[cfg(feature = "std")]
#[cfg_attr(any(docsrs, feature = "docs"), doc(cfg(feature = "std")))]
pub mod blocking;

/// customizable retrying of fallible operations
pub mod retry;

/// responses
pub mod resp;

/// requests
pub mod req;

/// parsing `coap://` URIs
pub mod uri;

/// confirmable retransmission and duplicate detection
pub mod reliability;

/// correlating responses with the requests that caused them
pub mod exchange;

/// multicast resource discovery
pub mod discovery;

/// low-level coap behavior
pub mod core;

/// platform configuration
pub mod platform;

/// network abstractions
pub mod net;

/// time abstractions
pub mod time;

/// configuring runtime behavior
pub mod config;

/// option values as they cross the API boundary
pub mod option;

/// JSON descriptors for requests, responses, errors and devices
#[cfg(feature = "json")]
#[cfg_attr(any(docsrs, feature = "docs"), doc(cfg(feature = "json")))]
pub mod json;

/// `std`-only ccoap stuff
#[cfg(feature = "std")]
#[cfg_attr(any(docsrs, feature = "docs"), doc(cfg(feature = "std")))]
pub mod std;

pub use ccoap_msg::ContentFormat;

/// The default CoAP port
pub const DEFAULT_PORT: u16 = 5683;

/// Helper constants and functions for creating multicast addresses
pub mod multicast {
  use no_std_net::{Ipv4Addr, SocketAddr, SocketAddrV4};

  /// IPv4 "All CoAP devices" multicast address.
  pub const ALL_COAP_DEVICES_IP: Ipv4Addr = Ipv4Addr::new(224, 0, 1, 187);

  /// Create a SocketAddr (IP + port) with the [`ALL_COAP_DEVICES_IP`] address
  pub const fn all_coap_devices(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(ALL_COAP_DEVICES_IP, port))
  }
}

macro_rules! code {
  (rfc7252($section:literal) $name:ident = $c:literal.$d:literal) => {
    #[doc = concat!("[RFC7252 Section ", $section, "](https://datatracker.ietf.org/doc/html/rfc7252#section-", $section, ")")]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: ccoap_msg::Code = ccoap_msg::Code::new($c, $d);
  };
  (rfc7252($section:literal) $name:ident = $newtype:tt($c:literal.$d:literal)) => {
    #[doc = concat!("[RFC7252 Section ", $section, "](https://datatracker.ietf.org/doc/html/rfc7252#section-", $section, ")")]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: $newtype = $newtype(ccoap_msg::Code::new($c, $d));
  };
}

pub(crate) use code;
