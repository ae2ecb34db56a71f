use crate::cursor::Cursor;

/// Trait for converting a sequence of bytes into some data structure
pub trait TryFromBytes<Bytes: AsRef<[u8]>>: Sized {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert from some sequence of bytes `T`
  /// into `Self`
  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error>;
}

/// Similar to [`TryFromBytes`], but instead of taking ownership of the whole buffer
/// it consumes only the bytes it needs from a [`Cursor`].
pub(crate) trait TryConsumeBytes<Bytes: AsRef<[u8]>>: Sized {
  type Error;

  fn try_consume_bytes(bytes: &mut Cursor<Bytes>) -> Result<Self, Self::Error>;
}
