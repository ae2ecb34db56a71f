use std_alloc::vec::Vec;

use crate::msg::Byte1;
use crate::*;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error yielded when the value cannot be serialized
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use ccoap_msg::{Code, Id, Message, Payload, Token, TryIntoBytes, Type};
  ///
  /// let msg = Message { id: Id(0x1234),
  ///                     ty: Type::Non,
  ///                     code: Code::new(0, 1),
  ///                     token: Token::default(),
  ///                     opts: vec![],
  ///                     payload: Payload(vec![]) };
  ///
  /// assert_eq!(msg.try_into_bytes().unwrap(), vec![0x50, 0x01, 0x12, 0x34]);
  /// ```
  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// An option value was longer than the wire format can express
  OptionValueTooLong {
    /// The option
    number: OptNumber,
    /// Its value's length
    len: usize,
  },
  /// An Empty (`0.00`) message may not carry a token, options or a payload
  EmptyMessageNotEmpty,
}

impl core::fmt::Display for MessageToBytesError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Self::OptionValueTooLong { number, len } => {
        write!(f, "option {} value of {} bytes is too long", number.0, len)
      },
      | Self::EmptyMessageNotEmpty => write!(f, "empty message is not empty"),
    }
  }
}

impl<'a> TryIntoBytes for &'a Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error> {
    if self.is_empty()
       && !(self.token.is_empty() && self.opts.is_empty() && self.payload.is_empty())
    {
      return Err(MessageToBytesError::EmptyMessageNotEmpty);
    }

    let size = 4
               + self.token.0.len()
               + self.opts.iter().map(|o| 5 + o.value.0.len()).sum::<usize>()
               + 1
               + self.payload.0.len();
    let mut bytes = Vec::with_capacity(size);

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: VERSION,
                            ty: self.ty }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();

    bytes.push(byte1);
    bytes.push(code);
    bytes.extend(id);
    bytes.extend_from_slice(&self.token.0);

    opt::encode_opts(&self.opts, &mut bytes)?;

    if !self.payload.is_empty() {
      bytes.push(0b11111111);
      bytes.extend_from_slice(&self.payload.0);
    }

    Ok(bytes)
  }
}

impl TryIntoBytes for Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error> {
    (&self).try_into_bytes()
  }
}

#[cfg(test)]
mod tests {
  use std_alloc::vec;

  use super::*;

  #[test]
  fn msg() {
    let (m, expected) = crate::test_msg();
    let actual = m.try_into_bytes().unwrap();
    assert_eq!(actual, expected);
  }

  #[test]
  fn no_payload_marker() {
    let msg = Message { id: Id(0),
                        ty: Type::Con,
                        code: Code { class: 2,
                                     detail: 5 },
                        token: Token::default(),
                        opts: vec![],
                        payload: Payload(vec![]) };

    assert_ne!(msg.try_into_bytes().unwrap().last(), Some(&0b11111111));
  }

  #[test]
  fn empty_ack() {
    assert_eq!(Message::ack(Id(7)).try_into_bytes().unwrap(),
               vec![0x60, 0x00, 0x00, 0x07]);
  }

  #[test]
  fn empty_with_token_rejected() {
    let mut msg = Message::reset(Id(7));
    msg.token = Token::from_bytes(&[1]);
    assert_eq!(msg.try_into_bytes(),
               Err(MessageToBytesError::EmptyMessageNotEmpty));
  }

  #[test]
  fn oversized_option_rejected() {
    let msg = Message { code: Code::new(0, 2),
                        opts: vec![Opt::new(OptNumber(4), vec![0u8; 65535 + 270])],
                        ..Default::default() };
    assert_eq!(msg.try_into_bytes(),
               Err(MessageToBytesError::OptionValueTooLong { number: OptNumber(4),
                                                             len: 65535 + 270 }));
  }
}
