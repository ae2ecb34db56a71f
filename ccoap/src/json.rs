use ccoap_msg::{no_repeat, ContentFormat, Opt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std_alloc::string::{String, ToString};
use std_alloc::vec::Vec;

use crate::config::Config;
use crate::core::{Error, What, When};
use crate::option::{describe, NamedOption};
use crate::req::{Method, Req, ReqId};
use crate::resp::Resp;
use crate::time::Millis;

fn default_method() -> String {
  "get".into()
}

fn yes() -> bool {
  true
}

/// A payload as it crosses the JSON boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadJson {
  /// UTF-8 text
  Text(String),
  /// Raw bytes, as an array of numbers
  Bytes(Vec<u8>),
  /// A JSON document, sent as `application/json`
  Object(Map<String, Value>),
}

impl PayloadJson {
  /// The Content-Format this kind of payload implies
  pub fn implied_format(&self) -> ContentFormat {
    match self {
      | Self::Text(_) => ContentFormat::Text,
      | Self::Bytes(_) => ContentFormat::OctetStream,
      | Self::Object(_) => ContentFormat::Json,
    }
  }

  fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
    match self {
      | Self::Text(s) => Ok(s.into_bytes()),
      | Self::Bytes(b) => Ok(b),
      | Self::Object(o) => serde_json::to_vec(&o),
    }
  }
}

/// A request descriptor
///
/// ```
/// use ccoap::json::RequestJson;
/// use ccoap::req::{Method, ReqId};
///
/// let req = RequestJson::parse(r#"{"uri": "coap://10.0.0.5:5683/sensor/temp"}"#).unwrap()
///                                                                             .into_req()
///                                                                             .unwrap();
/// assert_eq!(req.id, ReqId(-1));
/// assert_eq!(req.method, Method::GET);
/// assert!(req.confirmable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestJson {
  /// Caller's correlation id, echoed in the result
  #[serde(default)]
  pub id: ReqId,
  /// `get`, `post`, `put` or `delete`, in any case
  #[serde(default = "default_method")]
  pub method: String,
  /// `coap://host[:port]/path[?query]`
  pub uri: String,
  /// Whether the request is retransmitted until acknowledged
  #[serde(default = "yes")]
  pub confirmable: bool,
  /// Options besides the ones derived from the URI
  #[serde(default)]
  pub options: Vec<NamedOption>,
  /// Body; only sent for POST and PUT
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payload: Option<PayloadJson>,
}

impl RequestJson {
  /// Parse a request descriptor.
  ///
  /// When the document is not a valid descriptor the error still
  /// carries its `id`, if one could be read.
  pub fn parse(json: &str) -> Result<Self, Error> {
    let value = serde_json::from_str::<Value>(json).map_err(|e| invalid(ReqId::UNSPECIFIED, e))?;
    Self::from_value(value)
  }

  /// See [`RequestJson::parse`]
  pub fn from_value(value: Value) -> Result<Self, Error> {
    let id = value.get("id")
                  .and_then(Value::as_i64)
                  .map(ReqId)
                  .unwrap_or_default();

    serde_json::from_value(value).map_err(|e| invalid(id, e))
  }

  /// Validate the descriptor and normalize its options and payload
  pub fn into_req(self) -> Result<Req, Error> {
    let id = self.id;
    let fail = |what: What| When::Submitting.what(what).for_request(id);

    let method = self.method.parse::<Method>().map_err(|e| fail(e.into()))?;

    let mut req = Req { id,
                        confirmable: self.confirmable,
                        ..Req::new(method, self.uri) };

    for opt in self.options.iter() {
      opt.to_opts()
         .map_err(|e| fail(e.into()))?
         .into_iter()
         .for_each(|opt| req.set_option(opt));
    }

    if let Some(payload) = self.payload {
      let format = payload.implied_format();
      let has_format = req.options
                          .iter()
                          .any(|o| o.number == no_repeat::CONTENT_FORMAT);

      if method.has_payload() && !has_format {
        req.set_option(Opt::new(no_repeat::CONTENT_FORMAT, format.value()));
      }

      let bytes = payload.into_bytes()
                         .map_err(|e| fail(What::RequestInvalid(e.to_string())))?;
      req.payload = Some(bytes);
    }

    Ok(req)
  }
}

fn invalid(id: ReqId, e: serde_json::Error) -> Error {
  When::Submitting.what(What::RequestInvalid(e.to_string()))
                  .for_request(id)
}

/// A response descriptor
///
/// ```
/// use ccoap::json::ResponseJson;
/// use ccoap::req::ReqId;
/// use ccoap::resp::{code, Resp};
///
/// let rep = Resp { id: ReqId(-1),
///                  code: code::CONTENT,
///                  payload: b"23.4".to_vec(),
///                  options: vec![] };
///
/// assert_eq!(serde_json::to_string(&ResponseJson::from(&rep)).unwrap(),
///            r#"{"id":-1,"code":69,"payload":"23.4","options":[]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseJson {
  /// The id of the request this answers
  pub id: ReqId,
  /// The response code as one byte; 2.05 is 69
  pub code: u8,
  /// Text when the content is textual, bytes otherwise
  pub payload: PayloadJson,
  /// Response options, by name
  pub options: Vec<NamedOption>,
}

impl<'a> From<&'a Resp> for ResponseJson {
  fn from(rep: &'a Resp) -> Self {
    let text = match rep.content_format() {
      | Some(format) if !format.is_text() => None,
      | _ => rep.payload_string().ok(),
    };

    let payload = match text {
      | Some(text) => PayloadJson::Text(text),
      | None => PayloadJson::Bytes(rep.payload.clone()),
    };

    ResponseJson { id: rep.id,
                   code: rep.code.into(),
                   payload,
                   options: rep.options.iter().map(describe).collect() }
  }
}

/// An error descriptor
///
/// ```
/// use ccoap::core::{What, When};
/// use ccoap::json::ErrorJson;
/// use ccoap::req::ReqId;
///
/// let e = When::Polling.what(What::MessageNeverAcked).for_request(ReqId(7));
/// let json = ErrorJson::from(&e);
///
/// assert_eq!(json.id, ReqId(7));
/// assert_eq!(json.code, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorJson {
  /// The id of the request that failed
  pub id: ReqId,
  /// See [`ErrorKind::code`](crate::core::ErrorKind::code)
  pub code: u8,
  /// Human-readable description
  pub message: String,
  /// Underlying cause, when there is one
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extra: Option<String>,
}

impl<'a> From<&'a Error> for ErrorJson {
  fn from(e: &'a Error) -> Self {
    ErrorJson { id: e.id,
                code: e.code(),
                message: e.message(),
                extra: e.extra() }
  }
}

impl From<Error> for ErrorJson {
  fn from(e: Error) -> Self {
    Self::from(&e)
  }
}

/// A discover request; `{ "timeout": 2000 }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverJson {
  /// Collection window in milliseconds
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<u64>,
}

impl DiscoverJson {
  /// The requested window, or the configured default
  pub fn window(&self, config: &Config) -> Millis {
    self.timeout
        .map(embedded_time::duration::Milliseconds)
        .unwrap_or(config.discovery.default_window)
  }
}

#[cfg(feature = "std")]
mod client {
  use super::*;
  use crate::blocking::Client;
  use crate::discovery::DiscoveredDevice;
  use crate::platform::Platform;

  impl<P: Platform> Client<P> {
    /// Send a request described by a JSON document and wait for its response
    pub fn request_json(&self, req: &str) -> Result<ResponseJson, ErrorJson> {
      let req = RequestJson::parse(req).and_then(RequestJson::into_req)?;
      let rep = self.request(req)?;
      Ok(ResponseJson::from(&rep))
    }

    /// Look for devices, with the window described by a JSON document
    pub fn discover_json(&self, req: &str) -> Result<Vec<DiscoveredDevice>, ErrorJson> {
      let discover =
        serde_json::from_str::<DiscoverJson>(req).map_err(|e| ErrorJson::from(invalid(ReqId::UNSPECIFIED, e)))?;
      let window = discover.window(&self.config());
      Ok(self.discover(window.0)?)
    }
  }
}
