use ccoap_msg::{no_repeat, ContentFormat, Opt, OptNumber, OptValue};
use std_alloc::string::ToString;
use std_alloc::vec::Vec;

use super::{Method, Req, ReqId};
use crate::option::{NamedOption, OptionError, OptionValue};

/// Build a request
///
/// ```
/// use ccoap::option::OptionValue;
/// use ccoap::req::{ReqBuilder, ReqId};
/// use ccoap::ContentFormat;
///
/// let req = ReqBuilder::post("coap://10.0.0.5/say").id(7)
///                                                  .content_format(ContentFormat::Json)
///                                                  .accept(ContentFormat::Text)
///                                                  .named("Uri-Query", OptionValue::Str("loud".into()))
///                                                  .payload(r#"{"say": "hi"}"#)
///                                                  .build()
///                                                  .unwrap();
///
/// assert_eq!(req.id, ReqId(7));
/// assert_eq!(req.options.len(), 3);
/// assert!(ReqBuilder::get("coap://h/").named("Nope", OptionValue::Num(1))
///                                     .build()
///                                     .is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ReqBuilder {
  inner: Result<Req, OptionError>,
}

impl ReqBuilder {
  fn new(method: Method, uri: impl ToString) -> Self {
    Self { inner: Ok(Req::new(method, uri)) }
  }

  /// Creates a GET request
  pub fn get(uri: impl ToString) -> Self {
    Self::new(Method::GET, uri)
  }

  /// Creates a PUT request
  pub fn put(uri: impl ToString) -> Self {
    Self::new(Method::PUT, uri)
  }

  /// Creates a POST request
  pub fn post(uri: impl ToString) -> Self {
    Self::new(Method::POST, uri)
  }

  /// Creates a DELETE request
  pub fn delete(uri: impl ToString) -> Self {
    Self::new(Method::DELETE, uri)
  }

  fn map(mut self, f: impl FnOnce(&mut Req) -> Result<(), OptionError>) -> Self {
    if let Ok(req) = self.inner.as_mut() {
      if let Err(e) = f(req) {
        self.inner = Err(e);
      }
    }
    self
  }

  /// Set the correlation id echoed back with the result
  pub fn id(self, id: i64) -> Self {
    self.map(|r| {
          r.id = ReqId(id);
          Ok(())
        })
  }

  /// Send the request Non-confirmable; it will not be retransmitted
  pub fn non(self) -> Self {
    self.confirmable(false)
  }

  /// Choose whether the request is retransmitted until acknowledged
  pub fn confirmable(self, con: bool) -> Self {
    self.map(|r| {
          r.confirmable = con;
          Ok(())
        })
  }

  /// Set the payload of the request
  pub fn payload(self, payload: impl Into<Vec<u8>>) -> Self {
    self.map(|r| {
          r.payload = Some(payload.into());
          Ok(())
        })
  }

  /// Insert or update a raw option value
  pub fn option(self, number: OptNumber, value: impl Into<OptValue>) -> Self {
    self.map(|r| {
          r.set_option(Opt::new(number, value));
          Ok(())
        })
  }

  /// Add an option by registered name, normalizing the value
  /// to the option's format.
  ///
  /// # Errors
  /// Causes the builder to error if the name is unknown or
  /// the value does not fit.
  pub fn named(self, name: &str, value: OptionValue) -> Self {
    self.map(|r| {
          NamedOption::new(name, value).to_opts()?
                                       .into_iter()
                                       .for_each(|o| r.set_option(o));
          Ok(())
        })
  }

  /// Set the Content-Format of the payload
  pub fn content_format(self, format: ContentFormat) -> Self {
    self.option(no_repeat::CONTENT_FORMAT, format.value())
  }

  /// Set the format we would like the response in
  pub fn accept(self, format: ContentFormat) -> Self {
    self.option(no_repeat::ACCEPT, format.value())
  }

  /// Unwrap the builder into the built request
  pub fn build(self) -> Result<Req, OptionError> {
    self.inner
  }
}
