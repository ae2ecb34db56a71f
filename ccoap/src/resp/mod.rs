use ::core::str::{from_utf8, Utf8Error};

use ccoap_msg::{Code, ContentFormat, Message, Opt, OptNumber, OptValue};
use std_alloc::string::{FromUtf8Error, String};
use std_alloc::vec::Vec;

use crate::req::ReqId;

/// Response codes
pub mod code;

/// The response a request settled with
///
/// ```
/// use ccoap::req::ReqId;
/// use ccoap::resp::{code, Resp};
///
/// let rep = Resp { id: ReqId(-1),
///                  code: code::CONTENT,
///                  payload: b"23.4".to_vec(),
///                  options: vec![] };
///
/// assert_eq!(u8::from(rep.code), 69);
/// assert_eq!(rep.payload_string().unwrap(), "23.4");
/// assert!(rep.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resp {
  /// The id of the request this answers
  pub id: ReqId,
  /// Response code, e.g. `2.05`
  pub code: Code,
  /// Response body; empty when the peer sent none
  pub payload: Vec<u8>,
  /// Options in wire order
  pub options: Vec<Opt>,
}

impl Resp {
  /// The response carried by `msg`, answering request `id`
  pub fn from_message(id: ReqId, msg: Message) -> Self {
    Self { id,
           code: msg.code,
           payload: msg.payload.0,
           options: msg.opts }
  }

  /// Get the payload and attempt to interpret it as an ASCII string
  pub fn payload_string(&self) -> Result<String, FromUtf8Error> {
    String::from_utf8(self.payload.clone())
  }

  /// Borrow the payload as UTF-8
  pub fn payload_str(&self) -> Result<&str, Utf8Error> {
    from_utf8(&self.payload)
  }

  /// Values of option `n`, in order
  pub fn get_option(&self, n: OptNumber) -> impl Iterator<Item = &OptValue> {
    self.options
        .iter()
        .filter(move |o| o.number == n)
        .map(|o| &o.value)
  }

  /// The Content-Format option, if present
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.get_option(ccoap_msg::no_repeat::CONTENT_FORMAT)
        .next()
        .and_then(OptValue::as_uint)
        .and_then(|n| u16::try_from(n).ok())
        .map(ContentFormat::from)
  }

  /// Whether the code is in class 2
  pub fn is_success(&self) -> bool {
    self.code.class == 2
  }
}

#[cfg(test)]
mod tests {
  use ccoap_msg::{no_repeat, Id, Payload, Token, Type};

  use super::*;

  #[test]
  fn from_message() {
    let msg = Message { id: Id(1),
                        ty: Type::Ack,
                        token: Token::from_bytes(&[1]),
                        code: code::NOT_FOUND,
                        opts: vec![Opt::new(no_repeat::CONTENT_FORMAT, ContentFormat::Text.value())],
                        payload: Payload(b"nope".to_vec()) };
    let rep = Resp::from_message(ReqId(3), msg);

    assert_eq!(rep.id, ReqId(3));
    assert_eq!(u8::from(rep.code), 132);
    assert!(!rep.is_success());
    assert_eq!(rep.content_format(), Some(ContentFormat::Text));
    assert_eq!(rep.payload_str(), Ok("nope"));
  }
}
