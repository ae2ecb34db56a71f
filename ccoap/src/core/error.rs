use ::core::fmt;

use ccoap_msg::{Id, MessageParseError, MessageToBytesError, Token};
use no_std_net::SocketAddr;
use std_alloc::format;
use std_alloc::string::{String, ToString};

use crate::option::OptionError;
use crate::req::{ReqId, UnsupportedMethod};
use crate::uri::UriError;

/// The context that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  /// We were polling for a message when the error occurred
  Polling,
  /// We were turning a request into a message
  Submitting,
  /// We were sending a message
  SendingMessage(Option<SocketAddr>, Id, Token),
  /// We were collecting discovery replies
  Discovering,
  /// No particular context
  None,
}

impl When {
  /// Construct a specific error from the context the error occurred in
  pub fn what(self, what: What) -> Error {
    Error { id: ReqId::UNSPECIFIED,
            when: self,
            what }
  }
}

/// An error encounterable from within Core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
  /// The request this error settles
  pub id: ReqId,
  /// What happened?
  pub what: What,
  /// What were we doing when it happened?
  pub when: When,
}

/// A contextless error with some additional debug data attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum What {
  /// The request URI could not be parsed
  UriInvalid(UriError),
  /// The method is not GET, POST, PUT or DELETE
  MethodUnsupported(UnsupportedMethod),
  /// A request option could not be normalized
  OptionInvalid(OptionError),
  /// The request descriptor itself was malformed
  RequestInvalid(String),
  /// Serializing a message to bytes failed
  ToBytes(MessageToBytesError),
  /// Serializing a message from bytes failed
  FromBytes(MessageParseError),
  /// Some socket operation failed locally
  SockError(String),
  /// The network reported the peer unreachable
  Unreachable(String),
  /// The URI host could not be resolved to an address
  HostUnresolved(String),
  /// The destination's address family differs from the local socket's
  AddressFamily(SocketAddr),
  /// A CONfirmable message was sent many times without an ACKnowledgement.
  MessageNeverAcked,
  /// The peer rejected our message with a Reset
  Reset,
  /// No response arrived in time
  Timeout,
  /// The clock failed to provide timing.
  ///
  /// See [`embedded_time::clock::Error`]
  ClockError,
  /// The exchange or discovery window is not live
  NoSuchExchange,
  /// Already waiting on the configured maximum number of requests
  TooManyRequests(u16),
}

/// The closed set of error kinds reported across the API boundary.
///
/// ```
/// use ccoap::core::ErrorKind;
///
/// assert_eq!(ErrorKind::ConnectionFailed.code(), 5);
/// assert_eq!(ErrorKind::ConnectionFailed.name(), "CONNECTION_FAILED");
/// assert_eq!(ErrorKind::from_code(6), Some(ErrorKind::DestinationIsUnreachable));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
  NoError = 0,
  InvalidArgument = 1,
  InvalidMessage = 2,
  InvalidTransport = 3,
  InvalidAction = 4,
  ConnectionFailed = 5,
  DestinationIsUnreachable = 6,
  Unknown = 7,
}

impl ErrorKind {
  const ALL: [ErrorKind; 8] = [ErrorKind::NoError,
                               ErrorKind::InvalidArgument,
                               ErrorKind::InvalidMessage,
                               ErrorKind::InvalidTransport,
                               ErrorKind::InvalidAction,
                               ErrorKind::ConnectionFailed,
                               ErrorKind::DestinationIsUnreachable,
                               ErrorKind::Unknown];

  /// Numeric code
  pub fn code(&self) -> u8 {
    *self as u8
  }

  /// Inverse of [`ErrorKind::code`]
  pub fn from_code(code: u8) -> Option<Self> {
    Self::ALL.get(code as usize).copied()
  }

  /// Upper snake case name, e.g. `INVALID_ARGUMENT`
  pub fn name(&self) -> &'static str {
    match self {
      | Self::NoError => "NO_ERROR",
      | Self::InvalidArgument => "INVALID_ARGUMENT",
      | Self::InvalidMessage => "INVALID_MESSAGE",
      | Self::InvalidTransport => "INVALID_TRANSPORT",
      | Self::InvalidAction => "INVALID_ACTION",
      | Self::ConnectionFailed => "CONNECTION_FAILED",
      | Self::DestinationIsUnreachable => "DESTINATION_IS_UNREACHABLE",
      | Self::Unknown => "UNKNOWN",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl What {
  /// See [`Error::kind`]
  pub fn kind(&self) -> ErrorKind {
    use What::*;
    match self {
      | UriInvalid(_)
      | MethodUnsupported(_)
      | OptionInvalid(_)
      | RequestInvalid(_)
      | ToBytes(_)
      | AddressFamily(_) => ErrorKind::InvalidArgument,
      | FromBytes(_) => ErrorKind::InvalidMessage,
      | SockError(_) => ErrorKind::InvalidTransport,
      | NoSuchExchange | TooManyRequests(_) => ErrorKind::InvalidAction,
      | MessageNeverAcked | Reset | Timeout => ErrorKind::ConnectionFailed,
      | Unreachable(_) | HostUnresolved(_) => ErrorKind::DestinationIsUnreachable,
      | ClockError => ErrorKind::Unknown,
    }
  }
}

impl Error {
  /// Tag this error with the request it settles
  pub fn for_request(self, id: ReqId) -> Self {
    Self { id, ..self }
  }

  /// The boundary error kind
  pub fn kind(&self) -> ErrorKind {
    self.what.kind()
  }

  /// Numeric [`ErrorKind`] code
  pub fn code(&self) -> u8 {
    self.kind().code()
  }

  /// Human-readable description
  pub fn message(&self) -> String {
    use What::*;
    match &self.what {
      | UriInvalid(_) => "invalid uri".to_string(),
      | MethodUnsupported(m) => m.to_string(),
      | OptionInvalid(_) => "invalid option".to_string(),
      | RequestInvalid(_) => "invalid request".to_string(),
      | ToBytes(_) => "request could not be encoded".to_string(),
      | FromBytes(_) => "received a malformed message".to_string(),
      | SockError(_) => "socket failure".to_string(),
      | Unreachable(_) => "destination is unreachable".to_string(),
      | HostUnresolved(h) => format!("host {:?} could not be resolved", h),
      | AddressFamily(_) => "address family not supported by the local socket".to_string(),
      | MessageNeverAcked => "confirmable request was never acknowledged".to_string(),
      | Reset => "peer reset the exchange".to_string(),
      | Timeout => "timed out waiting for a response".to_string(),
      | ClockError => "clock failure".to_string(),
      | NoSuchExchange => "no such exchange".to_string(),
      | TooManyRequests(n) => format!("already waiting on {} requests", n),
    }
  }

  /// Diagnostic detail, when the error has an underlying cause
  pub fn extra(&self) -> Option<String> {
    use What::*;
    match &self.what {
      | UriInvalid(e) => Some(e.to_string()),
      | OptionInvalid(e) => Some(e.to_string()),
      | RequestInvalid(e) | SockError(e) | Unreachable(e) => Some(e.clone()),
      | ToBytes(e) => Some(e.to_string()),
      | FromBytes(e) => Some(e.to_string()),
      | AddressFamily(addr) => Some(addr.to_string()),
      | _ => match self.when {
        | When::SendingMessage(Some(addr), id, _) => Some(format!("{} message id {}", addr, id.0)),
        | _ => None,
      },
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.kind(), self.message())?;
    match self.extra() {
      | Some(extra) => write!(f, " ({})", extra),
      | None => Ok(()),
    }
  }
}

#[cfg(feature = "std")]
impl ::std::error::Error for Error {}

impl From<UriError> for What {
  fn from(e: UriError) -> Self {
    What::UriInvalid(e)
  }
}

impl From<OptionError> for What {
  fn from(e: OptionError) -> Self {
    What::OptionInvalid(e)
  }
}

impl From<UnsupportedMethod> for What {
  fn from(e: UnsupportedMethod) -> Self {
    What::MethodUnsupported(e)
  }
}
