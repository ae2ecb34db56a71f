use ::core::fmt;
use ::core::str::FromStr;

use ccoap_msg::Code;
use std_alloc::string::{String, ToString};

use crate::code;

/// Request method
///
/// ```
/// use ccoap::req::Method;
///
/// assert_eq!("Post".parse::<Method>(), Ok(Method::POST));
/// assert_eq!(Method::DELETE.to_string(), "DELETE");
/// assert!("PATCH".parse::<Method>().is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Method(pub(crate) Code);

impl Method {
  code!(rfc7252("5.8.1") GET    = Method(0 . 01));
  code!(rfc7252("5.8.2") POST   = Method(0 . 02));
  code!(rfc7252("5.8.3") PUT    = Method(0 . 03));
  code!(rfc7252("5.8.4") DELETE = Method(0 . 04));

  /// The message code requests with this method carry
  pub fn code(&self) -> Code {
    self.0
  }

  /// Whether requests with this method carry a payload
  pub fn has_payload(&self) -> bool {
    *self == Method::POST || *self == Method::PUT
  }
}

impl Default for Method {
  fn default() -> Self {
    Method::GET
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      | Method::GET => write!(f, "GET"),
      | Method::POST => write!(f, "POST"),
      | Method::PUT => write!(f, "PUT"),
      | Method::DELETE => write!(f, "DELETE"),
      | Method(c) => write!(f, "{}", c),
    }
  }
}

/// A method name that is not GET, POST, PUT or DELETE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl fmt::Display for UnsupportedMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unsupported method {:?}", self.0)
  }
}

impl FromStr for Method {
  type Err = UnsupportedMethod;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    [Method::GET, Method::POST, Method::PUT, Method::DELETE].into_iter()
                                                            .find(|m| {
                                                              m.to_string()
                                                               .eq_ignore_ascii_case(s.trim())
                                                            })
                                                            .ok_or_else(|| {
                                                              UnsupportedMethod(s.to_string())
                                                            })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes() {
    assert_eq!(u8::from(Method::GET.code()), 1);
    assert_eq!(u8::from(Method::POST.code()), 2);
    assert_eq!(u8::from(Method::PUT.code()), 3);
    assert_eq!(u8::from(Method::DELETE.code()), 4);
  }

  #[test]
  fn payload_only_for_post_and_put() {
    assert!(Method::POST.has_payload());
    assert!(Method::PUT.has_payload());
    assert!(!Method::GET.has_payload());
    assert!(!Method::DELETE.has_payload());
  }
}
