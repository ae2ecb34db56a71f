/// A read-only cursor over a byte buffer (a std-less cousin of [`std::io::Cursor`])
///
/// ```
/// use ccoap_msg::cursor::Cursor;
///
/// let mut cur = Cursor::new([1u8, 2, 3]);
/// assert_eq!(cur.next(), Some(1));
/// assert_eq!(cur.take_exact(2), Some([2u8, 3].as_ref()));
/// assert!(cur.is_exhausted());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor<T> {
  t: T,
  cursor: usize,
}

impl<T: AsRef<[u8]>> Cursor<T> {
  /// Creates a new cursor
  pub fn new(t: T) -> Cursor<T> {
    Cursor { t, cursor: 0 }
  }

  /// Unwraps the cursor, discarding its internal position
  pub fn into_inner(self) -> T {
    self.t
  }

  fn remaining(&self) -> usize {
    self.t.as_ref().len().saturating_sub(self.cursor)
  }

  /// Take the next byte in the cursor, returning None
  /// if the cursor is exhausted.
  pub fn next(&mut self) -> Option<u8> {
    self.take_exact(1).map(|a| a[0])
  }

  /// Take `n` bytes from the cursor, stopping early if
  /// the end of the buffer is encountered.
  pub fn take(&mut self, n: usize) -> &[u8] {
    let n = n.min(self.remaining());
    let start = self.cursor;
    self.cursor += n;
    &self.t.as_ref()[start..start + n]
  }

  /// Take `n` bytes from the cursor, returning None if
  /// fewer than `n` bytes remain.
  pub fn take_exact(&mut self, n: usize) -> Option<&[u8]> {
    if n > self.remaining() {
      None
    } else {
      Some(self.take(n))
    }
  }

  /// Without advancing the position, look at the next
  /// `n` bytes, or until the end if there are less than `n` bytes
  /// remaining.
  pub fn peek(&self, n: usize) -> &[u8] {
    let n = n.min(self.remaining());
    &self.t.as_ref()[self.cursor..self.cursor + n]
  }

  /// Without advancing the position, look at the next
  /// `n` bytes, returning None if there are less than `n` bytes
  /// remaining.
  pub fn peek_exact(&self, n: usize) -> Option<&[u8]> {
    if n > self.remaining() {
      None
    } else {
      Some(self.peek(n))
    }
  }

  /// Consume bytes until a predicate returns `false`.
  pub fn take_while(&mut self, mut f: impl FnMut(u8) -> bool) -> &[u8] {
    let n = self.until_end().iter().take_while(|b| f(**b)).count();
    self.take(n)
  }

  /// Consume all remaining bytes.
  pub fn take_until_end(&mut self) -> &[u8] {
    self.take(self.remaining())
  }

  /// Whether the cursor has reached the end
  /// of the buffer.
  pub fn is_exhausted(&self) -> bool {
    self.remaining() == 0
  }

  /// Get the bytes remaining in the buffer
  /// without advancing.
  pub fn until_end(&self) -> &[u8] {
    &self.t.as_ref()[self.cursor.min(self.t.as_ref().len())..]
  }

  /// Get the position the cursor points to within
  /// the buffer
  pub fn position(&self) -> usize {
    self.cursor
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  pub fn next() {
    let mut cur = Cursor::new(vec![1]);
    assert_eq!(cur.next(), Some(1));
    assert_eq!(cur.next(), None);
    assert_eq!(cur.next(), None);
  }

  #[test]
  pub fn take() {
    let mut cur = Cursor::new(vec![1, 2, 3]);
    assert_eq!(cur.take(2), &[1, 2]);
    assert_eq!(cur.take(2), &[3]);
    assert_eq!(cur.take(1), &[] as &[u8]);
  }

  #[test]
  pub fn take_exact() {
    let mut cur = Cursor::new(vec![1, 2, 3]);
    assert_eq!(cur.take_exact(2), Some([1u8, 2].as_ref()));
    assert_eq!(cur.take_exact(2), None);
    assert_eq!(cur.position(), 2);
    assert_eq!(cur.take_exact(1), Some([3u8].as_ref()));
  }

  #[test]
  pub fn peek_does_not_advance() {
    let cur = Cursor::new(vec![1, 2, 3]);
    assert_eq!(cur.peek(5), &[1, 2, 3]);
    assert_eq!(cur.peek_exact(4), None);
    assert_eq!(cur.position(), 0);
  }

  #[test]
  pub fn take_while() {
    let mut cur = Cursor::new(vec![2, 4, 5, 6]);
    assert_eq!(cur.take_while(|b| b % 2 == 0), &[2, 4]);
    assert_eq!(cur.until_end(), &[5, 6]);
    assert_eq!(cur.take_until_end(), &[5, 6]);
    assert!(cur.is_exhausted());
  }
}
