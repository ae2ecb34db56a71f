#[cfg(feature = "std")]
use std_alloc::string::String;

/// The kind of message a [`Code`] identifies
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum CodeKind {
  /// `0.00`; used by pings, empty Acknowledgements and Resets
  Empty,
  /// `0.01` through `0.31`
  Request,
  /// Classes 2 through 7
  Response,
}

/// Message code; a 3-bit class and a 5-bit detail, written `c.dd`.
///
/// |class|meaning|
/// |---|---|
/// |`0`|Message is a request (or empty)|
/// |`2`|Message is a success response|
/// |`4`|Message is a client error response|
/// |`5`|Message is a server error response|
///
/// # Examples
/// ```
/// use ccoap_msg::Code;
///
/// assert_eq!(Code { class: 2, detail: 5 }.to_string(), "2.05".to_string());
/// assert_eq!(u8::from(Code::new(2, 5)), 69);
/// ```
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status
  pub class: u8,

  /// 2-digit integer (range `[0, 32)`) that provides granular information about the response status.
  pub detail: u8,
}

impl Code {
  /// `0.00`
  pub const EMPTY: Code = Code::new(0, 0);

  /// Create a new Code
  ///
  /// ```
  /// use ccoap_msg::Code;
  ///
  /// let content = Code::new(2, 05);
  /// ```
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// What kind of message carries this code
  pub fn kind(&self) -> CodeKind {
    match (self.class, self.detail) {
      | (0, 0) => CodeKind::Empty,
      | (0, _) => CodeKind::Request,
      | _ => CodeKind::Response,
    }
  }

  /// Get the human string representation of a message code
  ///
  /// ```
  /// use ccoap_msg::Code;
  ///
  /// let code = Code { class: 2, detail: 5 };
  /// assert_eq!(String::from_iter(code.to_human()), "2.05".to_string());
  /// ```
  pub fn to_human(&self) -> [char; 4] {
    let to_char = |d: u8| char::from(b'0' + d % 10);
    [to_char(self.class), '.', to_char(self.detail / 10), to_char(self.detail)]
  }
}

impl core::fmt::Display for Code {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    self.to_human().iter().try_for_each(|c| write!(f, "{}", c))
  }
}

#[cfg(feature = "std")]
impl From<Code> for String {
  fn from(code: Code) -> String {
    String::from_iter(code.to_human())
  }
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    let class = b >> 5;
    let detail = b & 0b0011111;

    Code { class, detail }
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    let class = code.class << 5;
    let detail = code.detail & 0b0011111;

    class | detail
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_code() {
    let byte = 0b_01_000101u8;
    let code = Code::from(byte);
    assert_eq!(code, Code { class: 2, detail: 5 })
  }

  #[test]
  fn serialize_code() {
    let code = Code { class: 4, detail: 4 };
    let actual: u8 = code.into();
    assert_eq!(actual, 0b_100_00100u8)
  }

  #[test]
  fn kind() {
    assert_eq!(Code::EMPTY.kind(), CodeKind::Empty);
    assert_eq!(Code::new(0, 1).kind(), CodeKind::Request);
    assert_eq!(Code::new(5, 3).kind(), CodeKind::Response);
  }
}
