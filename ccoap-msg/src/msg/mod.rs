use std_alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::from_bytes::{TryConsumeBytes, TryFromBytes};

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

pub use code::*;
pub use id::*;
pub use opt::parse_error::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;

/// The only CoAP version
pub const VERSION: u8 = 1;

/// Message payload; the CoAP equivalent of an http request or response body.
///
/// An empty payload is written without the `0xFF` payload marker,
/// so "empty" and "absent" are the same thing on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(pub Vec<u8>);

impl Payload {
  /// Whether there is a payload
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The payload as UTF-8, if it is
  pub fn as_str(&self) -> Option<&str> {
    core::str::from_utf8(&self.0).ok()
  }
}

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Byte1 {
  pub(crate) ver: u8,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl From<u8> for Byte1 {
  fn from(b: u8) -> Self {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Byte1 { ver,
            ty: Type::from_bits(ty),
            tkl }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl & 0b1111;

    ver | ty | tkl
  }
}

/// # `Message` struct
/// Low-level representation of a message that has been parsed from the raw binary format.
///
/// Messages support both serializing to bytes and from bytes, by using the provided
/// [`TryFromBytes`] and [`TryIntoBytes`](crate::TryIntoBytes) traits.
///
/// The version field is not stored; it is always [`VERSION`].
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`Opt`] for details
  pub opts: Vec<Opt>,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// An empty Acknowledgement for a Confirmable message
  pub fn ack(id: Id) -> Self {
    Self { id,
           ty: Type::Ack,
           ..Default::default() }
  }

  /// An empty Reset for a message
  pub fn reset(id: Id) -> Self {
    Self { id,
           ty: Type::Reset,
           ..Default::default() }
  }

  /// Whether this message has code `0.00`
  pub fn is_empty(&self) -> bool {
    self.code.kind() == CodeKind::Empty
  }

  /// Iterate over the values of every option with number `n`
  pub fn get<'a>(&'a self, n: OptNumber) -> impl Iterator<Item = &'a OptValue> + 'a {
    self.opts
        .iter()
        .filter(move |o| o.number == n)
        .map(|o| &o.value)
  }

  /// The first value of option `n`
  pub fn get_first(&self, n: OptNumber) -> Option<&OptValue> {
    self.get(n).next()
  }

  /// The Content-Format option, if present
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.get_first(no_repeat::CONTENT_FORMAT)
        .and_then(OptValue::as_uint)
        .and_then(|n| u16::try_from(n).ok())
        .map(ContentFormat::from)
  }
}

impl<Bytes: AsRef<[u8]>> TryFromBytes<Bytes> for Message {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);

    let Byte1 { tkl, ty, ver } = bytes.next().ok_or_else(MessageParseError::eof)?.into();

    if ver != VERSION {
      return Err(Self::Error::InvalidVersion(ver));
    }

    if tkl > 8 {
      return Err(Self::Error::InvalidTokenLength(tkl));
    }

    let code: Code = bytes.next().ok_or_else(MessageParseError::eof)?.into();
    let id: Id = Id::try_consume_bytes(&mut bytes)?;

    if code.kind() == CodeKind::Empty && (tkl > 0 || !bytes.is_exhausted()) {
      return Err(Self::Error::EmptyMessageNotEmpty);
    }

    let token = bytes.take_exact(tkl as usize)
                     .map(Token::from_bytes)
                     .ok_or_else(MessageParseError::eof)?;

    let opts = opt::decode_opts(&mut bytes)?;

    let payload = match bytes.next() {
      | Some(_marker) if bytes.is_exhausted() => return Err(Self::Error::EmptyPayload),
      | Some(_marker) => Payload(bytes.take_until_end().to_vec()),
      | None => Payload::default(),
    };

    Ok(Message { id,
                 ty,
                 code,
                 token,
                 opts,
                 payload })
  }
}
