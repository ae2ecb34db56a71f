/// Indicates if this message is of
/// type Confirmable (0), Non-confirmable (1), Acknowledgement (2), or Reset (3).
///
/// Confirmable messages are retransmitted until the peer acknowledges them,
/// Non-confirmable messages are sent once.
/// Acknowledgements and Resets terminate a Confirmable message's retransmission,
/// and carry the message id of the message they answer.
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum Type {
  /// Some messages do not require an acknowledgement.
  Non,
  /// Some messages require an acknowledgement.
  Con,
  /// An Acknowledgement message acknowledges that a specific
  /// Confirmable message arrived.
  Ack,
  /// A Reset message indicates that a specific message (Confirmable or
  /// Non-confirmable) was received, but some context is missing to
  /// properly process it.
  Reset,
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    match t {
      | Type::Con => 0,
      | Type::Non => 1,
      | Type::Ack => 2,
      | Type::Reset => 3,
    }
  }
}

impl Default for Type {
  fn default() -> Self {
    Type::Con
  }
}

impl Type {
  /// Read the 2-bit type field
  pub(crate) fn from_bits(b: u8) -> Self {
    match b & 0b11 {
      | 0 => Type::Con,
      | 1 => Type::Non,
      | 2 => Type::Ack,
      | _ => Type::Reset,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_values() {
    for ty in [Type::Con, Type::Non, Type::Ack, Type::Reset] {
      assert_eq!(Type::from_bits(u8::from(ty)), ty);
    }
    assert_eq!(u8::from(Type::Ack), 2);
  }
}
