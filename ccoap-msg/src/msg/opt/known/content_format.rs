use crate::OptValue;

/// Content-Format
///
/// ```
/// use ccoap_msg::ContentFormat;
///
/// assert_eq!(ContentFormat::from_mime("application/json"), Some(ContentFormat::Json));
/// assert_eq!(ContentFormat::from(40).mime(), Some("application/link-format"));
/// assert_eq!(u16::from(&ContentFormat::Other(60)), 60);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentFormat {
  /// `text/plain; charset=utf-8`
  Text,
  /// `application/link-format`
  LinkFormat,
  /// `application/xml`
  Xml,
  /// `application/octet-stream`
  OctetStream,
  /// `application/exi`
  Exi,
  /// `application/json`
  Json,
  /// Another content format
  Other(u16),
}

impl ContentFormat {
  /// Convert this content format to its option value
  pub fn value(&self) -> OptValue {
    OptValue::uint(u16::from(self).into())
  }

  /// Mime type of a registered format
  pub fn mime(&self) -> Option<&'static str> {
    use ContentFormat::*;
    match self {
      | Text => Some("text/plain"),
      | LinkFormat => Some("application/link-format"),
      | Xml => Some("application/xml"),
      | OctetStream => Some("application/octet-stream"),
      | Exi => Some("application/exi"),
      | Json => Some("application/json"),
      | Other(_) => None,
    }
  }

  /// Find a registered format by mime type.
  ///
  /// Parameters (`; charset=utf-8`) and ASCII case are ignored.
  pub fn from_mime(mime: &str) -> Option<Self> {
    use ContentFormat::*;
    let essence = mime.split(';').next().unwrap_or_default().trim();
    [Text, LinkFormat, Xml, OctetStream, Exi, Json].into_iter()
                                                   .find(|f| {
                                                     f.mime()
                                                      .map(|m| m.eq_ignore_ascii_case(essence))
                                                      .unwrap_or(false)
                                                   })
  }

  /// Whether payloads of this format are text
  pub fn is_text(&self) -> bool {
    use ContentFormat::*;
    matches!(self, Text | LinkFormat | Xml | Json)
  }
}

impl<'a> From<&'a ContentFormat> for u16 {
  fn from(f: &'a ContentFormat) -> Self {
    use ContentFormat::*;
    match *f {
      | Text => 0,
      | LinkFormat => 40,
      | Xml => 41,
      | OctetStream => 42,
      | Exi => 47,
      | Json => 50,
      | Other(n) => n,
    }
  }
}

impl From<u16> for ContentFormat {
  fn from(n: u16) -> Self {
    use ContentFormat::*;
    match n {
      | 0 => Text,
      | 40 => LinkFormat,
      | 41 => Xml,
      | 42 => OctetStream,
      | 47 => Exi,
      | 50 => Json,
      | n => Other(n),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mime_ignores_params_and_case() {
    assert_eq!(ContentFormat::from_mime("Text/Plain; charset=utf-8"),
               Some(ContentFormat::Text));
    assert_eq!(ContentFormat::from_mime("image/png"), None);
  }

  #[test]
  fn value_is_minimal_uint() {
    assert_eq!(ContentFormat::Text.value().0, vec![]);
    assert_eq!(ContentFormat::Json.value().0, vec![50]);
  }
}
