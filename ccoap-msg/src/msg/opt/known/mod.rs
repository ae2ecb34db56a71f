use super::OptNumber;

mod content_format;
pub use content_format::ContentFormat;

/// How an option's value is represented on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptFormat {
  /// Zero-length; presence is the value
  Empty,
  /// Uninterpreted bytes
  Opaque,
  /// Big-endian unsigned integer in the fewest bytes
  Uint,
  /// UTF-8 text
  String,
}

/// An option this implementation knows the meaning of
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KnownOpt {
  /// Option number
  pub number: OptNumber,
  /// Registered name, e.g. `"Content-Format"`
  pub name: &'static str,
  /// Value representation
  pub format: OptFormat,
  /// Whether the option may appear more than once in a message
  pub repeatable: bool,
}

macro_rules! known {
  ($($n:literal $name:literal $fmt:ident $rep:literal),* $(,)?) => {
    /// Every option in the registry, ascending by number
    pub const KNOWN_OPTS: &[KnownOpt] = &[
      $(KnownOpt { number: OptNumber($n), name: $name, format: OptFormat::$fmt, repeatable: $rep }),*
    ];
  };
}

known! {
  1  "If-Match"       Opaque true,
  3  "Uri-Host"       String false,
  4  "ETag"           Opaque true,
  5  "If-None-Match"  Empty  false,
  6  "Observe"        Uint   false,
  7  "Uri-Port"       Uint   false,
  8  "Location-Path"  String true,
  11 "Uri-Path"       String true,
  12 "Content-Format" Uint   false,
  14 "Max-Age"        Uint   false,
  15 "Uri-Query"      String true,
  17 "Accept"         Uint   false,
  20 "Location-Query" String true,
  23 "Block2"         Uint   false,
  27 "Block1"         Uint   false,
  28 "Size2"          Uint   false,
  35 "Proxy-Uri"      String false,
  39 "Proxy-Scheme"   String false,
  60 "Size1"          Uint   false,
}

impl KnownOpt {
  /// Look up an option by number
  pub fn find(number: OptNumber) -> Option<&'static KnownOpt> {
    KNOWN_OPTS.iter().find(|k| k.number == number)
  }

  /// Look up an option by name, ignoring ASCII case
  ///
  /// ```
  /// use ccoap_msg::{KnownOpt, OptNumber};
  ///
  /// assert_eq!(KnownOpt::find_by_name("content-format").map(|k| k.number),
  ///            Some(OptNumber(12)));
  /// assert!(KnownOpt::find_by_name("Colour").is_none());
  /// ```
  pub fn find_by_name(name: &str) -> Option<&'static KnownOpt> {
    KNOWN_OPTS.iter().find(|k| k.name.eq_ignore_ascii_case(name))
  }
}

/// Non-repeatable options
pub mod no_repeat {
  use super::OptNumber;

  #[allow(missing_docs)]
  pub const HOST: OptNumber = OptNumber(3);
  #[allow(missing_docs)]
  pub const IF_NONE_MATCH: OptNumber = OptNumber(5);
  #[allow(missing_docs)]
  pub const OBSERVE: OptNumber = OptNumber(6);
  #[allow(missing_docs)]
  pub const PORT: OptNumber = OptNumber(7);
  #[allow(missing_docs)]
  pub const CONTENT_FORMAT: OptNumber = OptNumber(12);
  #[allow(missing_docs)]
  pub const MAX_AGE: OptNumber = OptNumber(14);
  #[allow(missing_docs)]
  pub const ACCEPT: OptNumber = OptNumber(17);
  #[allow(missing_docs)]
  pub const BLOCK2: OptNumber = OptNumber(23);
  #[allow(missing_docs)]
  pub const BLOCK1: OptNumber = OptNumber(27);
  #[allow(missing_docs)]
  pub const SIZE2: OptNumber = OptNumber(28);
  #[allow(missing_docs)]
  pub const PROXY_URI: OptNumber = OptNumber(35);
  #[allow(missing_docs)]
  pub const PROXY_SCHEME: OptNumber = OptNumber(39);
  #[allow(missing_docs)]
  pub const SIZE1: OptNumber = OptNumber(60);
}

/// Repeatable options
pub mod repeat {
  use super::OptNumber;

  #[allow(missing_docs)]
  pub const IF_MATCH: OptNumber = OptNumber(1);
  #[allow(missing_docs)]
  pub const ETAG: OptNumber = OptNumber(4);
  #[allow(missing_docs)]
  pub const LOCATION_PATH: OptNumber = OptNumber(8);
  #[allow(missing_docs)]
  pub const PATH: OptNumber = OptNumber(11);
  #[allow(missing_docs)]
  pub const QUERY: OptNumber = OptNumber(15);
  #[allow(missing_docs)]
  pub const LOCATION_QUERY: OptNumber = OptNumber(20);
}
