use ::std::sync::{Mutex, MutexGuard};
use ::std::time::{Duration, SystemTime, UNIX_EPOCH};

use embedded_time::duration::Milliseconds;
use no_std_net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::config::Config;
use crate::core::{Core, Error, What, When};
use crate::discovery::DiscoveredDevice;
use crate::net::Socket;
use crate::platform::Platform;
use crate::req::{Req, ReqId};
use crate::resp::Resp;
use crate::std::Std;

/// How long to sleep between polls of an unsettled exchange
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A blocking CoAP request client.
///
/// Every method takes `&self`; the runtime lives behind a mutex, so a
/// `Client` may be shared between threads (e.g. in an `Arc`) and each
/// caller blocks only on its own exchange.
#[derive(Debug)]
pub struct Client<P: Platform> {
  core: Mutex<Core<P>>,
}

/// Helper methods on Client Results
pub trait ClientResultExt<T> {
  /// If we timed out waiting for a response, consider that Ok(None).
  ///
  /// Usually used to handle sending non-confirmable requests that
  /// the server may have received but not responded to.
  fn timeout_ok(self) -> Result<Option<T>, Error>;
}

impl<T> ClientResultExt<T> for Result<T, Error> {
  fn timeout_ok(self) -> Result<Option<T>, Error> {
    match self {
      | Ok(t) => Ok(Some(t)),
      | Err(Error { what: What::Timeout,
                    .. }) => Ok(None),
      | Err(e) => Err(e),
    }
  }
}

impl Client<Std> {
  /// Create a new Client bound to `0.0.0.0:port`, for a platform
  /// supporting Rust's standard library.
  ///
  /// Port 0 lets the operating system choose. Requests to IPv6
  /// destinations fail with `INVALID_ARGUMENT`; DNS names use their
  /// first IPv4 address.
  ///
  /// ```no_run
  /// use ccoap::blocking::Client;
  ///
  /// let client = Client::new_std(0).unwrap();
  /// let rep = client.get("coap://127.0.0.1/hello").unwrap();
  ///
  /// println!("Hello, {}!", rep.payload_string().unwrap());
  /// ```
  pub fn new_std(port: u16) -> Result<Self, Error> {
    Client::<Std>::new_std_config(port, Config::default())
  }

  /// Create a new std client with a specific runtime config
  pub fn new_std_config(port: u16, config: Config) -> Result<Self, Error> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let sock = <::std::net::UdpSocket as Socket>::bind(addr).map_err(|e| {
                 When::None.what(What::SockError(format!("binding {} failed: {}", addr, e)))
               })?;

    let seed = SystemTime::now().duration_since(UNIX_EPOCH)
                                .map(|d| d.as_nanos() as u64)
                                .unwrap_or_default();

    log::debug!("bound {}", addr);
    Ok(Client::new(Core::new_seeded(config, crate::std::Clock::new(), sock, seed)))
  }
}

impl<P: Platform> Client<P> {
  /// Create a new request client around a runtime
  pub fn new(core: Core<P>) -> Self {
    Self { core: Mutex::new(core) }
  }

  /// The runtime config
  pub fn config(&self) -> Config {
    *self.lock().config()
  }

  // poisoning is ignored; no `Core` method panics midway through a state change
  fn lock(&self) -> MutexGuard<'_, Core<P>> {
    self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn block_on<T>(&self,
                 mut poll: impl FnMut(&mut Core<P>) -> nb::Result<T, Error>)
                 -> Result<T, Error> {
    loop {
      let polled = poll(&mut self.lock());

      match polled {
        | Ok(t) => break Ok(t),
        | Err(nb::Error::Other(e)) => break Err(e),
        | Err(nb::Error::WouldBlock) => ::std::thread::sleep(POLL_INTERVAL),
      }
    }
  }

  /// Send a request and wait for its response
  ///
  /// ```no_run
  /// use ccoap::blocking::Client;
  /// use ccoap::req::ReqBuilder;
  /// use ccoap::ContentFormat;
  ///
  /// let client = Client::new_std(0).unwrap();
  /// let req = ReqBuilder::get("coap://10.0.0.5/sensor/temp").id(3)
  ///                                                         .accept(ContentFormat::Text)
  ///                                                         .build()
  ///                                                         .unwrap();
  ///
  /// let rep = client.request(req).unwrap();
  /// assert_eq!(rep.id.0, 3);
  /// ```
  pub fn request(&self, req: Req) -> Result<Resp, Error> {
    let ex = self.lock().submit(req)?;
    self.block_on(|core| core.poll_exchange(ex))
  }

  /// Send a confirmable GET request
  pub fn get(&self, uri: impl AsRef<str>) -> Result<Resp, Error> {
    self.request(Req::get(uri.as_ref()))
  }

  /// Send a confirmable POST request
  pub fn post(&self, uri: impl AsRef<str>, payload: impl Into<Vec<u8>>) -> Result<Resp, Error> {
    self.request(Req::post(uri.as_ref(), payload))
  }

  /// Send a confirmable PUT request
  pub fn put(&self, uri: impl AsRef<str>, payload: impl Into<Vec<u8>>) -> Result<Resp, Error> {
    self.request(Req::put(uri.as_ref(), payload))
  }

  /// Send a confirmable DELETE request
  pub fn delete(&self, uri: impl AsRef<str>) -> Result<Resp, Error> {
    self.request(Req::delete(uri.as_ref()))
  }

  /// Look for CoAP devices on the local network, collecting
  /// replies for `timeout_ms` milliseconds.
  pub fn discover(&self, timeout_ms: u64) -> Result<Vec<DiscoveredDevice>, Error> {
    let handle = self.lock().discover(Milliseconds(timeout_ms))?;
    self.block_on(|core| core.poll_discovery(handle))
  }

  /// [`Client::discover`] with the configured default window
  pub fn discover_default(&self) -> Result<Vec<DiscoveredDevice>, Error> {
    self.discover(self.config().discovery.default_window.0)
  }

  /// Abandon every in-flight request carrying `id`.
  ///
  /// Threads blocked on those requests wake with an `INVALID_ACTION` error.
  pub fn cancel(&self, id: impl Into<ReqId>) -> usize {
    self.lock().cancel(id.into())
  }
}

#[cfg(test)]
mod tests {
  use ::std::sync::Arc;

  use ccoap_msg::{Code, Message, Payload, Type};

  use super::*;
  use crate::core::ErrorKind;
  use crate::retry::Strategy;
  use crate::test::{self, addr, ClockMock, SockMock};

  fn client() -> (Arc<Client<test::Platform>>, ClockMock, SockMock) {
    let clock = ClockMock::new();
    let sock = SockMock::new();
    let mut config = Config::default();
    config.msg.con.unacked_retry_strategy = Strategy::Exponential { init_min: Milliseconds(2000),
                                                                    init_max: Milliseconds(2000) };

    let core = Core::new_seeded(config, clock.clone(), sock.clone(), 3);
    (Arc::new(Client::new(core)), clock, sock)
  }

  /// Wait for the client to send something, then take it
  fn next_sent(sock: &SockMock) -> Message {
    loop {
      if let Some(sent) = sock.sent().pop() {
        sock.clear_sent();
        return sent.unwrap();
      }
      ::std::thread::sleep(Duration::from_millis(1));
    }
  }

  #[test]
  fn get_blocks_until_response() {
    let (client, _, sock) = client();

    let server = {
      let sock = sock.clone();
      ::std::thread::spawn(move || {
        let req = next_sent(&sock);
        sock.push(addr(5, 5683),
                  &Message { id: req.id,
                             token: req.token,
                             ty: Type::Ack,
                             code: Code::new(2, 5),
                             opts: vec![],
                             payload: Payload(b"23.4".to_vec()) });
      })
    };

    let rep = client.get("coap://10.0.0.5/sensor/temp").unwrap();
    server.join().unwrap();

    assert_eq!(rep.id, ReqId(-1));
    assert_eq!(u8::from(rep.code), 69);
    assert_eq!(rep.payload_string().unwrap(), "23.4");
  }

  #[test]
  fn cancel_wakes_blocked_caller() {
    let (client, _, sock) = client();

    let caller = {
      let client = client.clone();
      ::std::thread::spawn(move || {
        let mut req = Req::get("coap://10.0.0.5/slow");
        req.id = ReqId(9);
        client.request(req)
      })
    };

    next_sent(&sock);
    assert_eq!(client.cancel(9), 1);

    let e = caller.join().unwrap().unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidAction);
    assert_eq!(e.id, ReqId(9));
  }

  #[test]
  fn non_timeout_is_ok_none() {
    let (client, clock, _) = client();

    clock.set(0);
    let mut req = Req::get("coap://10.0.0.5/x");
    req.confirmable = false;

    let ticker = {
      let clock = clock.clone();
      ::std::thread::spawn(move || {
        ::std::thread::sleep(Duration::from_millis(20));
        clock.set(100_000);
      })
    };

    assert_eq!(client.request(req).timeout_ok(), Ok(None));
    ticker.join().unwrap();
  }

  #[test]
  fn invalid_uri_fails_immediately() {
    let (client, _, sock) = client();
    assert_eq!(client.get("not a uri").unwrap_err().kind(),
               ErrorKind::InvalidArgument);
    assert!(sock.sent().is_empty());
  }
}
