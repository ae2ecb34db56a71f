use ::core::fmt;

use ccoap_msg::{no_repeat, ContentFormat, KnownOpt, Opt, OptFormat, OptNumber, OptValue};
use std_alloc::string::{String, ToString};
use std_alloc::vec::Vec;

/// An option value as a caller supplies it, before it is
/// normalized to bytes according to the option's registered format.
///
/// When deserialized from JSON: `true`, `12`, `"text/plain"`,
/// `[1, 2, 3]` (bytes) and `["a", "b"]` (one option per element).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(untagged))]
pub enum OptionValue {
  /// Presence flag for empty-format options
  Bool(bool),
  /// Unsigned integer
  Num(u64),
  /// Text
  Str(String),
  /// Raw bytes
  Bytes(Vec<u8>),
  /// Several values for a repeatable option
  Many(Vec<OptionValue>),
}

/// An option as it crosses the API boundary; `{ "name": "Uri-Path", "value": "temp" }`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedOption {
  /// Registered option name, matched case-insensitively
  pub name: String,
  /// See [`OptionValue`]
  pub value: OptionValue,
}

impl NamedOption {
  /// Create a named option
  pub fn new(name: impl ToString, value: OptionValue) -> Self {
    Self { name: name.to_string(),
           value }
  }

  /// Normalize into wire options; see [`normalize`]
  pub fn to_opts(&self) -> Result<Vec<Opt>, OptionError> {
    normalize(&self.name, &self.value)
  }
}

/// An option supplied by a caller could not be normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
  /// No registered option has this name
  UnknownName(String),
  /// The value does not fit the option's format
  InvalidValue {
    /// Registered name of the option
    option: &'static str,
    /// The offending value
    value: OptionValue,
  },
  /// Several values were given for an option that may appear once
  NotRepeatable(&'static str),
}

impl fmt::Display for OptionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::UnknownName(n) => write!(f, "unknown option {:?}", n),
      | Self::InvalidValue { option, value } => write!(f, "invalid value for {}: {:?}", option, value),
      | Self::NotRepeatable(o) => write!(f, "option {} may not be repeated", o),
    }
  }
}

fn is_content_format(number: OptNumber) -> bool {
  number == no_repeat::CONTENT_FORMAT || number == no_repeat::ACCEPT
}

fn max_uint(number: OptNumber) -> u64 {
  match number {
    | n if is_content_format(n) || n == no_repeat::PORT => u16::MAX as u64,
    | no_repeat::OBSERVE | no_repeat::BLOCK1 | no_repeat::BLOCK2 => 0xFF_FFFF,
    | _ => u32::MAX as u64,
  }
}

fn normalize_one(known: &KnownOpt, value: &OptionValue) -> Result<Option<Opt>, OptionError> {
  let invalid = || OptionError::InvalidValue { option: known.name,
                                               value: value.clone() };

  let uint = |n: u64| Some(n).filter(|n| *n <= max_uint(known.number))
                             .map(OptValue::uint)
                             .ok_or_else(invalid);

  let bytes = match (known.format, value) {
    | (OptFormat::Empty, OptionValue::Bool(false)) => return Ok(None),
    | (OptFormat::Empty, OptionValue::Bool(true)) => OptValue::default(),

    | (OptFormat::Uint, OptionValue::Num(n)) => uint(*n)?,
    | (OptFormat::Uint, OptionValue::Str(s)) => {
      let mime = Some(known.number).filter(|n| is_content_format(*n))
                                   .and_then(|_| ContentFormat::from_mime(s));
      match mime {
        | Some(format) => format.value(),
        | None => uint(s.trim().parse::<u64>().map_err(|_| invalid())?)?,
      }
    },

    | (OptFormat::String, OptionValue::Str(s)) => OptValue::from(s.as_str()),
    | (OptFormat::String, OptionValue::Num(n)) => OptValue::from(n.to_string()),

    | (OptFormat::Opaque, OptionValue::Bytes(b)) => OptValue::from(b.as_slice()),
    | (OptFormat::Opaque, OptionValue::Str(s)) => OptValue::from(s.as_str()),

    | _ => return Err(invalid()),
  };

  Ok(Some(Opt { number: known.number,
                value: bytes }))
}

/// Turn a caller-supplied option into zero or more wire options.
///
/// ```
/// use ccoap::option::{normalize, OptionValue};
/// use ccoap_msg::{no_repeat, repeat, Opt, OptValue};
///
/// assert_eq!(normalize("content-format", &OptionValue::Str("application/json".into())),
///            Ok(vec![Opt::new(no_repeat::CONTENT_FORMAT, OptValue::uint(50))]));
///
/// let path = OptionValue::Many(vec![OptionValue::Str("a".into()), OptionValue::Str("b".into())]);
/// assert_eq!(normalize("Uri-Path", &path),
///            Ok(vec![Opt::new(repeat::PATH, "a"), Opt::new(repeat::PATH, "b")]));
/// ```
pub fn normalize(name: &str, value: &OptionValue) -> Result<Vec<Opt>, OptionError> {
  let known =
    KnownOpt::find_by_name(name).ok_or_else(|| OptionError::UnknownName(name.to_string()))?;

  let many = |vals: &[OptionValue]| {
    vals.iter()
        .map(|v| match v {
          | OptionValue::Many(_) => Err(OptionError::InvalidValue { option: known.name,
                                                                    value: v.clone() }),
          | v => normalize_one(known, v),
        })
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()
  };

  match value {
    | OptionValue::Many(_) if !known.repeatable => Err(OptionError::NotRepeatable(known.name)),
    | OptionValue::Many(vals) => many(vals.as_slice()),
    // a JSON array of small numbers for a repeatable non-opaque option
    | OptionValue::Bytes(bytes) if known.repeatable && known.format != OptFormat::Opaque => {
      many(bytes.iter()
                .map(|b| OptionValue::Num(*b as u64))
                .collect::<Vec<_>>()
                .as_slice())
    },
    | v => Ok(normalize_one(known, v)?.into_iter().collect()),
  }
}

/// Describe a wire option the way callers supply them.
///
/// Content-Format and Accept become mime strings when registered,
/// uint options numbers, string options text and opaque options bytes.
/// Unrecognized options are named by number.
pub fn describe(opt: &Opt) -> NamedOption {
  let known = match opt.number.known() {
    | Some(known) => known,
    | None => return NamedOption::new(opt.number.0, OptionValue::Bytes(opt.value.0.clone())),
  };

  let bytes = || OptionValue::Bytes(opt.value.0.clone());

  let value = match known.format {
    | OptFormat::Empty => OptionValue::Bool(true),
    | OptFormat::Opaque => bytes(),
    | OptFormat::String => opt.value
                              .as_str()
                              .map(|s| OptionValue::Str(s.to_string()))
                              .unwrap_or_else(bytes),
    | OptFormat::Uint => {
      let n = opt.value.as_uint();
      let mime = n.filter(|_| is_content_format(known.number))
                  .and_then(|n| u16::try_from(n).ok())
                  .and_then(|n| ContentFormat::from(n).mime());

      match (mime, n) {
        | (Some(mime), _) => OptionValue::Str(mime.to_string()),
        | (None, Some(n)) => OptionValue::Num(n),
        | (None, None) => bytes(),
      }
    },
  };

  NamedOption::new(known.name, value)
}

#[cfg(test)]
mod tests {
  use ccoap_msg::repeat;

  use super::*;

  fn s(s: &str) -> OptionValue {
    OptionValue::Str(s.into())
  }

  #[test]
  fn uint_options() {
    assert_eq!(normalize("Max-Age", &OptionValue::Num(60)),
               Ok(vec![Opt::new(no_repeat::MAX_AGE, vec![60u8])]));
    assert_eq!(normalize("max-age", &s("300")),
               Ok(vec![Opt::new(no_repeat::MAX_AGE, vec![1u8, 44])]));
    assert_eq!(normalize("Accept", &s("text/plain;charset=utf-8")),
               Ok(vec![Opt::new(no_repeat::ACCEPT, OptValue::uint(0))]));
    assert_eq!(normalize("Content-Format", &OptionValue::Num(42)),
               Ok(vec![Opt::new(no_repeat::CONTENT_FORMAT, vec![42u8])]));
  }

  #[test]
  fn string_and_opaque_options() {
    assert_eq!(normalize("Uri-Query", &OptionValue::Num(7)),
               Ok(vec![Opt::new(repeat::QUERY, "7")]));
    assert_eq!(normalize("ETag", &OptionValue::Bytes(vec![1, 2])),
               Ok(vec![Opt::new(repeat::ETAG, vec![1u8, 2])]));
    assert_eq!(normalize("If-Match", &s("v1")),
               Ok(vec![Opt::new(repeat::IF_MATCH, "v1")]));
  }

  #[test]
  fn empty_options() {
    assert_eq!(normalize("If-None-Match", &OptionValue::Bool(true)),
               Ok(vec![Opt::new(no_repeat::IF_NONE_MATCH, Vec::<u8>::new())]));
    assert_eq!(normalize("If-None-Match", &OptionValue::Bool(false)), Ok(vec![]));
  }

  #[test]
  fn rejects() {
    assert_eq!(normalize("X-Nope", &OptionValue::Num(1)),
               Err(OptionError::UnknownName("X-Nope".into())));
    assert_eq!(normalize("Max-Age", &s("soon")),
               Err(OptionError::InvalidValue { option: "Max-Age",
                                               value: s("soon") }));
    assert_eq!(normalize("Content-Format", &OptionValue::Num(70_000)),
               Err(OptionError::InvalidValue { option: "Content-Format",
                                               value: OptionValue::Num(70_000) }));
    assert_eq!(normalize("Uri-Host", &OptionValue::Many(vec![s("a"), s("b")])),
               Err(OptionError::NotRepeatable("Uri-Host")));
    assert!(normalize("If-None-Match", &OptionValue::Num(1)).is_err());
  }

  #[test]
  fn describes_response_options() {
    assert_eq!(describe(&Opt::new(no_repeat::CONTENT_FORMAT, OptValue::uint(40))),
               NamedOption::new("Content-Format", s("application/link-format")));
    assert_eq!(describe(&Opt::new(no_repeat::CONTENT_FORMAT, OptValue::uint(60))),
               NamedOption::new("Content-Format", OptionValue::Num(60)));
    assert_eq!(describe(&Opt::new(no_repeat::MAX_AGE, OptValue::uint(0))),
               NamedOption::new("Max-Age", OptionValue::Num(0)));
    assert_eq!(describe(&Opt::new(repeat::LOCATION_PATH, "a")),
               NamedOption::new("Location-Path", s("a")));
    assert_eq!(describe(&Opt::new(repeat::ETAG, vec![9u8])),
               NamedOption::new("ETag", OptionValue::Bytes(vec![9])));
    assert_eq!(describe(&Opt::new(OptNumber(2048), vec![1u8])),
               NamedOption::new("2048", OptionValue::Bytes(vec![1])));
  }
}
