use ::std::io;

pub(crate) fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}

fn v6_to_std(ip: no_std_net::Ipv6Addr) -> ::std::net::Ipv6Addr {
  let [a, b, c, d, e, f, g, h] = ip.segments();
  ::std::net::Ipv6Addr::new(a, b, c, d, e, f, g, h)
}

fn v6_from_std(ip: ::std::net::Ipv6Addr) -> no_std_net::Ipv6Addr {
  let [a, b, c, d, e, f, g, h] = ip.segments();
  no_std_net::Ipv6Addr::new(a, b, c, d, e, f, g, h)
}

pub(crate) fn ip_to_std(ip: no_std_net::IpAddr) -> ::std::net::IpAddr {
  match ip {
    | no_std_net::IpAddr::V4(ip) => {
      let [a, b, c, d] = ip.octets();
      ::std::net::IpAddr::V4(::std::net::Ipv4Addr::new(a, b, c, d))
    },
    | no_std_net::IpAddr::V6(ip) => ::std::net::IpAddr::V6(v6_to_std(ip)),
  }
}

pub(crate) fn ip_from_std(ip: ::std::net::IpAddr) -> no_std_net::IpAddr {
  match ip {
    | ::std::net::IpAddr::V4(ip) => {
      let [a, b, c, d] = ip.octets();
      no_std_net::IpAddr::V4(no_std_net::Ipv4Addr::new(a, b, c, d))
    },
    | ::std::net::IpAddr::V6(ip) => no_std_net::IpAddr::V6(v6_from_std(ip)),
  }
}

pub(crate) fn to_std(addr: no_std_net::SocketAddr) -> ::std::net::SocketAddr {
  match addr {
    | no_std_net::SocketAddr::V6(v6) => {
      ::std::net::SocketAddr::V6(::std::net::SocketAddrV6::new(v6_to_std(*v6.ip()),
                                                               v6.port(),
                                                               v6.flowinfo(),
                                                               v6.scope_id()))
    },
    | v4 => ::std::net::SocketAddr::new(ip_to_std(v4.ip()), v4.port()),
  }
}

pub(crate) fn from_std(addr: ::std::net::SocketAddr) -> no_std_net::SocketAddr {
  match addr {
    | ::std::net::SocketAddr::V6(v6) => {
      no_std_net::SocketAddr::V6(no_std_net::SocketAddrV6::new(v6_from_std(*v6.ip()),
                                                               v6.port(),
                                                               v6.flowinfo(),
                                                               v6.scope_id()))
    },
    | v4 => no_std_net::SocketAddr::new(ip_from_std(v4.ip()), v4.port()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn addresses_survive_conversion() {
    for addr in ["10.0.0.5:5683", "[fe80::1]:61616", "224.0.1.187:5683"] {
      let std_addr: ::std::net::SocketAddr = addr.parse().unwrap();
      assert_eq!(to_std(from_std(std_addr)), std_addr);
    }
  }

  #[test]
  fn would_block_is_not_an_error() {
    assert!(matches!(io_to_nb(io::ErrorKind::WouldBlock.into()),
                     nb::Error::WouldBlock));
    assert!(matches!(io_to_nb(io::ErrorKind::ConnectionRefused.into()),
                     nb::Error::Other(_)));
  }
}
