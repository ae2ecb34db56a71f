use std_alloc::string::String;
use std_alloc::vec::Vec;
use tinyvec::ArrayVec;

use crate::cursor::Cursor;
use crate::to_bytes::MessageToBytesError;

/// Option parsing errors
pub mod parse_error;

/// Option numbers and value formats this implementation recognizes
pub mod known;

pub use known::*;
use parse_error::OptParseError;

/// # Option
/// An option's number and its value.
///
/// Options are the CoAP equivalent of http headers.
/// On the wire each option is prefixed by the difference between
/// its number and the previous option's number (the "delta") and the
/// length of its value:
///
/// ```text
///   0   1   2   3   4   5   6   7
/// +---------------+---------------+
/// |  Option Delta | Option Length |   1 byte
/// +---------------+---------------+
/// /         Option Delta          /   0-2 bytes
/// \          (extended)           \
/// +-------------------------------+
/// /         Option Length         /   0-2 bytes
/// \          (extended)           \
/// +-------------------------------+
/// /         Option Value          /   0 or more bytes
/// +-------------------------------+
/// ```
///
/// Within a [`Message`](crate::Message) options are kept in wire order,
/// ascending by number. Repeated options share a number and keep their relative order.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opt {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// See [`OptValue`]
  pub value: OptValue,
}

impl Opt {
  /// Create an option
  ///
  /// ```
  /// use ccoap_msg::{Opt, OptNumber};
  ///
  /// let path = Opt::new(OptNumber(11), "temp");
  /// assert_eq!(path.value.as_str(), Some("temp"));
  /// ```
  pub fn new(number: OptNumber, value: impl Into<OptValue>) -> Self {
    Self { number,
           value: value.into() }
  }
}

/// Identifies which option is being set (e.g. Content-Format has a Number of 12)
///
/// The low bits of the number carry the option's properties:
/// ```text
///   0   1   2   3   4   5   6   7
/// +---+---+---+---+---+---+---+---+
/// |           | NoCacheKey| U | C |
/// +---+---+---+---+---+---+---+---+
/// ```
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u16);

/// Whether a recipient may ignore an option it does not understand
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionMustBeProcessed {
  /// The option is "critical"; a message carrying it
  /// must be rejected if it is not understood.
  Yes,
  /// The option is "elective" and may be silently ignored.
  No,
}

/// Whether a proxy that does not understand an option may forward it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WhenOptionUnsupportedByProxy {
  /// The option is "unsafe" to forward blindly.
  Error,
  /// The option is "safe to forward".
  Forward,
}

/// Whether an option participates in a proxy's cache key
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WhenOptionChanges {
  /// Different values yield different cached responses
  ResponseChanges,
  /// The option is "NoCacheKey"
  ResponseDoesNotChange,
}

impl OptNumber {
  /// Whether or not this option may be ignored by a recipient
  pub fn must_be_processed(&self) -> OptionMustBeProcessed {
    match self.0 & 0b1 {
      | 1 => OptionMustBeProcessed::Yes,
      | _ => OptionMustBeProcessed::No,
    }
  }

  /// Shorthand for `must_be_processed() == Yes`
  pub fn is_critical(&self) -> bool {
    self.must_be_processed() == OptionMustBeProcessed::Yes
  }

  /// Whether or not this option may be forwarded blindly by
  /// a proxy that does not support processing it
  pub fn when_unsupported_by_proxy(&self) -> WhenOptionUnsupportedByProxy {
    match (self.0 & 0b10) >> 1 {
      | 1 => WhenOptionUnsupportedByProxy::Error,
      | _ => WhenOptionUnsupportedByProxy::Forward,
    }
  }

  /// Whether or not different values for this option should
  /// yield proxies' cached response
  pub fn when_option_changes(&self) -> WhenOptionChanges {
    match (self.0 & 0b11100) >> 2 {
      | 0b111 => WhenOptionChanges::ResponseDoesNotChange,
      | _ => WhenOptionChanges::ResponseChanges,
    }
  }

  /// Registry entry for this number, if it is a known option
  pub fn known(&self) -> Option<&'static KnownOpt> {
    KnownOpt::find(*self)
  }
}

/// Option value bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptValue(pub Vec<u8>);

impl OptValue {
  /// Encode an unsigned integer in the fewest big-endian bytes;
  /// zero is the empty value.
  ///
  /// ```
  /// use ccoap_msg::OptValue;
  ///
  /// assert_eq!(OptValue::uint(0).0, Vec::<u8>::new());
  /// assert_eq!(OptValue::uint(50).0, vec![50]);
  /// assert_eq!(OptValue::uint(1024).0, vec![4, 0]);
  /// ```
  pub fn uint(n: u64) -> Self {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    Self(bytes[skip..].to_vec())
  }

  /// Interpret the value as an unsigned integer, if it is 8 bytes or fewer
  pub fn as_uint(&self) -> Option<u64> {
    if self.0.len() > 8 {
      None
    } else {
      Some(self.0.iter().fold(0u64, |n, b| (n << 8) | u64::from(*b)))
    }
  }

  /// Interpret the value as UTF-8
  pub fn as_str(&self) -> Option<&str> {
    core::str::from_utf8(&self.0).ok()
  }

  /// The raw value
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}

impl From<Vec<u8>> for OptValue {
  fn from(v: Vec<u8>) -> Self {
    Self(v)
  }
}

impl<'a> From<&'a [u8]> for OptValue {
  fn from(v: &'a [u8]) -> Self {
    Self(v.to_vec())
  }
}

impl From<String> for OptValue {
  fn from(s: String) -> Self {
    Self(s.into_bytes())
  }
}

impl<'a> From<&'a str> for OptValue {
  fn from(s: &'a str) -> Self {
    Self(s.as_bytes().to_vec())
  }
}

/// Largest value length expressible with the 2-byte extended form
pub(crate) const MAX_EXTENDED: u32 = 65535 + 269;

/// Read a 4-bit delta or length, consuming any extended bytes it signals.
///
/// Delta **MUST** be consumed before length; the extended delta bytes
/// precede the extended length bytes on the wire.
pub(crate) fn parse_opt_len_or_delta<A: AsRef<[u8]>>(head: u8,
                                                     bytes: &mut Cursor<A>,
                                                     reserved_err: OptParseError)
                                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok(u32::from(n) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u32::from(u16::from_be_bytes([a, b])) + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(u32::from(head)),
  }
}

/// Inverse of [`parse_opt_len_or_delta`]; the 4-bit head and any extended bytes
pub(crate) fn opt_len_or_delta(val: u32) -> Option<(u8, ArrayVec<[u8; 2]>)> {
  match val {
    | n if n < 13 => Some((n as u8, ArrayVec::new())),
    | n if n < 269 => Some((13, [(n - 13) as u8].into_iter().collect())),
    | n if n <= MAX_EXTENDED => Some((14, ((n - 269) as u16).to_be_bytes().into())),
    | _ => None,
  }
}

/// Parse the options block, stopping at the payload marker or the end of the buffer.
///
/// The payload marker is left unconsumed.
pub(crate) fn decode_opts<A: AsRef<[u8]>>(bytes: &mut Cursor<A>) -> Result<Vec<Opt>, OptParseError> {
  let mut opts: Vec<Opt> = Vec::new();
  let mut number: u32 = 0;

  loop {
    let byte1 = match bytes.peek_exact(1) {
      | None | Some(&[0xFF]) => break Ok(opts),
      | Some(&[b]) => b,
      | Some(_) => break Err(OptParseError::eof()),
    };
    bytes.next();

    let delta = parse_opt_len_or_delta(byte1 >> 4,
                                       bytes,
                                       OptParseError::OptionDeltaReservedValue(15))?;
    let len = parse_opt_len_or_delta(byte1 & 0b00001111,
                                     bytes,
                                     OptParseError::ValueLengthReservedValue(15))?
              as usize;

    number += delta;
    let num = u16::try_from(number).map(OptNumber)
                                   .map_err(|_| OptParseError::OptionNumberOverflow)?;

    let value = bytes.take_exact(len).ok_or_else(OptParseError::eof)?;

    match num.known() {
      | None if num.is_critical() => return Err(OptParseError::UnrecognizedCritical(num)),
      | Some(k) if !k.repeatable && opts.last().map(|o| o.number) == Some(num) => {
        return Err(OptParseError::RepeatedUnique(num))
      },
      | _ => (),
    }

    opts.push(Opt { number: num,
                    value: OptValue(value.to_vec()) });
  }
}

/// Write options to `out` in ascending number order.
///
/// Options sharing a number keep their relative order.
pub(crate) fn encode_opts(opts: &[Opt], out: &mut Vec<u8>) -> Result<(), MessageToBytesError> {
  let mut sorted: Vec<&Opt> = opts.iter().collect();
  sorted.sort_by_key(|o| o.number);

  let mut prev: u16 = 0;
  for opt in sorted {
    let len = u32::try_from(opt.value.0.len()).unwrap_or(u32::MAX);
    let (len_head, len_ext) =
      opt_len_or_delta(len).ok_or(MessageToBytesError::OptionValueTooLong { number: opt.number,
                                                                           len: opt.value.0.len() })?;
    let (delta_head, delta_ext) = opt_len_or_delta(u32::from(opt.number.0 - prev)).unwrap_or_default();

    out.push(delta_head << 4 | len_head);
    out.extend(delta_ext);
    out.extend(len_ext);
    out.extend_from_slice(&opt.value.0);

    prev = opt.number.0;
  }

  Ok(())
}
