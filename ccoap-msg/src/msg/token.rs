use tinyvec::ArrayVec;

/// Message token; an opaque 0 to 8 byte correlator between a request
/// and its response.
///
/// Every response carries the token of the request it answers,
/// whether it is piggybacked on an Acknowledgement or sent separately.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Build a token from raw bytes, keeping at most the first 8.
  ///
  /// ```
  /// use ccoap_msg::Token;
  ///
  /// assert_eq!(Token::from_bytes(&[1, 2]).as_bytes(), &[1, 2]);
  /// assert_eq!(Token::from_bytes(&[0; 10]).as_bytes().len(), 8);
  /// ```
  pub fn from_bytes(bytes: &[u8]) -> Token {
    Token(bytes.iter().copied().take(8).collect())
  }

  /// Take an arbitrary-length sequence of bytes and turn it into an opaque 8-byte token
  ///
  /// Uses the BLAKE2b hashing algorithm.
  ///
  /// ```
  /// use ccoap_msg::Token;
  ///
  /// let my_token = Token::opaque(&[0, 1, 2]);
  /// assert_eq!(my_token, Token::opaque(&[0, 1, 2]));
  /// assert_ne!(my_token, Token::opaque(&[0, 1, 3]));
  /// ```
  pub fn opaque(data: &[u8]) -> Token {
    use blake2::digest::consts::U8;
    use blake2::{Blake2b, Digest};

    let mut digest = Blake2b::<U8>::new();
    digest.update(data);
    Token(Into::<[u8; 8]>::into(digest.finalize()).into())
  }

  /// The token bytes
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  /// Whether this is the zero-length token
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
