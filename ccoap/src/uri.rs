use ::core::fmt;
use ::core::str::FromStr;

use ccoap_msg::{no_repeat, repeat, Opt};
use no_std_net::IpAddr;
use std_alloc::string::{String, ToString};
use std_alloc::vec::Vec;

/// A parsed `coap://host[:port]/path[?query]` URI
///
/// ```
/// use ccoap::uri::Uri;
///
/// let uri: Uri = "coap://10.0.0.5/sensor/temp?unit=c".parse().unwrap();
/// assert_eq!(uri.host, "10.0.0.5");
/// assert_eq!(uri.port, 5683);
/// assert_eq!(uri.path, vec!["sensor", "temp"]);
/// assert_eq!(uri.query, vec!["unit=c"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
  /// Host name or IP literal, without IPv6 brackets
  pub host: String,
  /// Port; 5683 when the URI names none
  pub port: u16,
  /// Percent-decoded path segments
  pub path: Vec<String>,
  /// Percent-decoded query arguments, split on `&`
  pub query: Vec<String>,
}

/// Ways a URI can be rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
  /// No `scheme://` prefix
  MissingScheme,
  /// A scheme other than `coap`
  UnsupportedScheme(String),
  /// Nothing between `://` and the path
  EmptyHost,
  /// Host could not be understood
  InvalidHost(String),
  /// Port not in `1..=65535`
  InvalidPort(String),
  /// URIs naming a fragment are not valid CoAP URIs
  Fragment,
  /// A `%` not followed by two hex digits, or decoding produced invalid UTF-8
  InvalidPercentEncoding,
}

impl fmt::Display for UriError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::MissingScheme => write!(f, "uri has no scheme"),
      | Self::UnsupportedScheme(s) => write!(f, "unsupported scheme {:?}", s),
      | Self::EmptyHost => write!(f, "uri has no host"),
      | Self::InvalidHost(h) => write!(f, "invalid host {:?}", h),
      | Self::InvalidPort(p) => write!(f, "invalid port {:?}", p),
      | Self::Fragment => write!(f, "uri may not have a fragment"),
      | Self::InvalidPercentEncoding => write!(f, "invalid percent-encoding"),
    }
  }
}

fn percent_decode(s: &str) -> Result<String, UriError> {
  let bytes = s.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      | b'%' => {
        let hex = bytes.get(i + 1..i + 3)
                       .and_then(|h| ::core::str::from_utf8(h).ok())
                       .and_then(|h| u8::from_str_radix(h, 16).ok())
                       .ok_or(UriError::InvalidPercentEncoding)?;
        out.push(hex);
        i += 3;
      },
      | b => {
        out.push(b);
        i += 1;
      },
    }
  }

  String::from_utf8(out).map_err(|_| UriError::InvalidPercentEncoding)
}

fn split_host_port(authority: &str) -> Result<(&str, Option<&str>), UriError> {
  if let Some(bracketed) = authority.strip_prefix('[') {
    let (host, after) = bracketed.split_once(']')
                                 .ok_or_else(|| UriError::InvalidHost(authority.to_string()))?;
    match after {
      | "" => Ok((host, None)),
      | _ => after.strip_prefix(':')
                  .map(|port| (host, Some(port)))
                  .ok_or_else(|| UriError::InvalidHost(authority.to_string())),
    }
  } else {
    match authority.split_once(':') {
      | Some((_, port)) if port.contains(':') => Err(UriError::InvalidHost(authority.to_string())),
      | Some((host, port)) => Ok((host, Some(port))),
      | None => Ok((authority, None)),
    }
  }
}

impl Uri {
  /// Parse a `coap://` URI
  pub fn parse(uri: &str) -> Result<Uri, UriError> {
    let uri = uri.trim();
    let (scheme, rest) = uri.split_once("://").ok_or(UriError::MissingScheme)?;

    if !scheme.eq_ignore_ascii_case("coap") {
      return Err(UriError::UnsupportedScheme(scheme.to_string()));
    }

    if rest.contains('#') {
      return Err(UriError::Fragment);
    }

    let authority_end = rest.find(|c: char| c == '/' || c == '?').unwrap_or(rest.len());
    let (authority, rest) = rest.split_at(authority_end);

    if authority.contains('@') {
      return Err(UriError::InvalidHost(authority.to_string()));
    }

    let (host, port) = split_host_port(authority)?;
    if host.is_empty() {
      return Err(UriError::EmptyHost);
    }

    let port = match port {
      | None | Some("") => crate::DEFAULT_PORT,
      | Some(p) => p.parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| UriError::InvalidPort(p.to_string()))?,
    };

    let (path, query) = match rest.split_once('?') {
      | Some((path, query)) => (path, query),
      | None => (rest, ""),
    };

    let path = match path {
      | "" | "/" => Vec::new(),
      | path => path.trim_start_matches('/')
                    .split('/')
                    .map(percent_decode)
                    .collect::<Result<Vec<_>, _>>()?,
    };

    let query = match query {
      | "" => Vec::new(),
      | query => query.split('&')
                      .map(percent_decode)
                      .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(Uri { host: percent_decode(host)?.to_ascii_lowercase(),
             port,
             path,
             query })
  }

  /// Whether the host is an IP literal (as opposed to a name needing resolution)
  pub fn host_is_ip(&self) -> bool {
    self.host.parse::<IpAddr>().is_ok()
  }

  /// The Uri-Host, Uri-Path and Uri-Query options a request to this URI carries.
  ///
  /// Uri-Host is left out for IP literals and Uri-Port is always left out,
  /// since the destination address already carries them.
  ///
  /// ```
  /// use ccoap::uri::Uri;
  /// use ccoap_msg::{no_repeat, repeat, Opt};
  ///
  /// let uri = Uri::parse("coap://Example.com:61616/a%20b").unwrap();
  /// assert_eq!(uri.opts(),
  ///            vec![Opt::new(no_repeat::HOST, "example.com"), Opt::new(repeat::PATH, "a b")]);
  /// ```
  pub fn opts(&self) -> Vec<Opt> {
    let host = Some(&self.host).filter(|_| !self.host_is_ip())
                               .map(|h| Opt::new(no_repeat::HOST, h.as_str()));
    let path = self.path.iter().map(|s| Opt::new(repeat::PATH, s.as_str()));
    let query = self.query.iter().map(|s| Opt::new(repeat::QUERY, s.as_str()));

    host.into_iter().chain(path).chain(query).collect()
  }
}

impl FromStr for Uri {
  type Err = UriError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uri::parse(s)
  }
}
