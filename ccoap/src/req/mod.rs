use ::core::fmt;

use ccoap_msg::{Id, Message, Opt, Payload, Token, Type};
use std_alloc::string::{String, ToString};
use std_alloc::vec::Vec;

use crate::uri::Uri;

/// Request methods
pub mod method;

#[doc(inline)]
pub use method::{Method, UnsupportedMethod};

/// Request builder
pub mod builder;

#[doc(inline)]
pub use builder::*;

/// Caller-chosen correlation id for a request.
///
/// It never goes on the wire; it is echoed back on the
/// [`Resp`](crate::resp::Resp) or [`Error`](crate::core::Error) the
/// request settles with. `-1` means "unspecified".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct ReqId(pub i64);

impl ReqId {
  /// The id of requests that did not choose one
  pub const UNSPECIFIED: ReqId = ReqId(-1);
}

impl Default for ReqId {
  fn default() -> Self {
    Self::UNSPECIFIED
  }
}

impl fmt::Display for ReqId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<i64> for ReqId {
  fn from(n: i64) -> Self {
    Self(n)
  }
}

/// A CoAP request
///
/// ```
/// use ccoap::req::{Method, Req, ReqId};
///
/// let req = Req::get("coap://10.0.0.5/sensor/temp");
/// assert_eq!(req.id, ReqId(-1));
/// assert_eq!(req.method, Method::GET);
/// assert!(req.confirmable);
///
/// let req = Req::post("coap://10.0.0.5/led", "on");
/// assert_eq!(req.payload, Some(b"on".to_vec()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Req {
  /// See [`ReqId`]
  pub id: ReqId,
  /// Request method
  pub method: Method,
  /// `coap://host[:port]/path[?query]`
  pub uri: String,
  /// Body; only sent for POST and PUT
  pub payload: Option<Vec<u8>>,
  /// Options besides the ones derived from the URI
  pub options: Vec<Opt>,
  /// Whether the request is retransmitted until acknowledged
  pub confirmable: bool,
}

impl Req {
  /// Create a confirmable request with no payload and an unspecified id
  pub fn new(method: Method, uri: impl ToString) -> Self {
    Self { id: ReqId::UNSPECIFIED,
           method,
           uri: uri.to_string(),
           payload: None,
           options: Vec::new(),
           confirmable: true }
  }

  /// Create a new GET request
  pub fn get(uri: impl ToString) -> Self {
    Self::new(Method::GET, uri)
  }

  /// Create a new POST request
  pub fn post(uri: impl ToString, payload: impl Into<Vec<u8>>) -> Self {
    Self { payload: Some(payload.into()),
           ..Self::new(Method::POST, uri) }
  }

  /// Create a new PUT request
  pub fn put(uri: impl ToString, payload: impl Into<Vec<u8>>) -> Self {
    Self { payload: Some(payload.into()),
           ..Self::new(Method::PUT, uri) }
  }

  /// Create a new DELETE request
  pub fn delete(uri: impl ToString) -> Self {
    Self::new(Method::DELETE, uri)
  }

  /// Add an option, replacing any earlier value if the option may only appear once
  pub fn set_option(&mut self, opt: Opt) {
    let repeatable = opt.number.known().map(|k| k.repeatable).unwrap_or(true);
    if !repeatable {
      self.options.retain(|o| o.number != opt.number);
    }
    self.options.push(opt);
  }

  /// Build the message for this request.
  ///
  /// URI options come first, then [`Req::options`], kept in
  /// a stable order by option number.
  pub(crate) fn to_message(&self, uri: &Uri, id: Id, token: Token) -> Message {
    let mut opts = uri.opts();
    opts.extend(self.options.iter().cloned());
    opts.sort_by_key(|o| o.number);

    let payload = self.payload
                      .as_ref()
                      .filter(|_| self.method.has_payload())
                      .cloned()
                      .map(Payload)
                      .unwrap_or_default();

    Message { id,
              token,
              ty: if self.confirmable { Type::Con } else { Type::Non },
              code: self.method.code(),
              opts,
              payload }
  }
}

#[cfg(test)]
mod tests {
  use ccoap_msg::{no_repeat, repeat, Code, ContentFormat};

  use super::*;

  #[test]
  fn message_for_get_drops_payload() {
    let mut req = Req::get("coap://10.0.0.5/a/b?x=1");
    req.payload = Some(b"ignored".to_vec());
    req.set_option(Opt::new(no_repeat::ACCEPT, ContentFormat::Json.value()));

    let uri = Uri::parse(&req.uri).unwrap();
    let msg = req.to_message(&uri, Id(10), Token::from_bytes(&[1]));

    assert_eq!(msg.ty, Type::Con);
    assert_eq!(msg.code, Code::new(0, 1));
    assert!(msg.payload.is_empty());
    assert_eq!(msg.opts,
               vec![Opt::new(repeat::PATH, "a"),
                    Opt::new(repeat::PATH, "b"),
                    Opt::new(repeat::QUERY, "x=1"),
                    Opt::new(no_repeat::ACCEPT, vec![50u8])]);
  }

  #[test]
  fn message_for_non_put() {
    let mut req = Req::put("coap://sensor.local/led", "on");
    req.confirmable = false;

    let uri = Uri::parse(&req.uri).unwrap();
    let msg = req.to_message(&uri, Id(1), Token::default());

    assert_eq!(msg.ty, Type::Non);
    assert_eq!(msg.payload.0, b"on".to_vec());
    assert_eq!(msg.opts[0], Opt::new(no_repeat::HOST, "sensor.local"));
  }

  #[test]
  fn set_option_replaces_unique() {
    let mut req = Req::get("coap://h/");
    req.set_option(Opt::new(no_repeat::ACCEPT, vec![0u8]));
    req.set_option(Opt::new(no_repeat::ACCEPT, vec![50u8]));
    req.set_option(Opt::new(repeat::ETAG, vec![1u8]));
    req.set_option(Opt::new(repeat::ETAG, vec![2u8]));

    assert_eq!(req.options.len(), 3);
    assert_eq!(req.options[0], Opt::new(no_repeat::ACCEPT, vec![50u8]));
  }
}
