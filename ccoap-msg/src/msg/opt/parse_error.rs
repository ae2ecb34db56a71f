use super::OptNumber;

/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum OptParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Option Delta was set to 15, which is invalid.
  OptionDeltaReservedValue(u8),

  /// Value Length was set to 15, which is invalid.
  ValueLengthReservedValue(u8),

  /// Summing option deltas produced a number past `u16::MAX`
  OptionNumberOverflow,

  /// A critical option this implementation does not recognize
  UnrecognizedCritical(OptNumber),

  /// An option that may appear at most once appeared again
  RepeatedUnique(OptNumber),
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl core::fmt::Display for OptParseError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Self::UnexpectedEndOfStream => write!(f, "option truncated"),
      | Self::OptionDeltaReservedValue(n) => write!(f, "reserved delta nibble {}", n),
      | Self::ValueLengthReservedValue(n) => write!(f, "reserved length nibble {}", n),
      | Self::OptionNumberOverflow => write!(f, "option number overflows 16 bits"),
      | Self::UnrecognizedCritical(n) => write!(f, "unrecognized critical option {}", n.0),
      | Self::RepeatedUnique(n) => write!(f, "option {} may not be repeated", n.0),
    }
  }
}
