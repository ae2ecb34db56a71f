#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use ccoap_msg::{Code, Id, Message, Payload, TryFromBytes, TryIntoBytes, Type};

pub fn init_logger() {
  simple_logger::init_with_level(log::Level::Trace).ok();
}

/// A CoAP peer on the loopback interface, scripted by the test
pub struct Peer {
  sock: UdpSocket,
}

impl Peer {
  pub fn bind() -> Self {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    Self { sock }
  }

  pub fn port(&self) -> u16 {
    self.sock.local_addr().unwrap().port()
  }

  pub fn uri(&self, path: &str) -> String {
    format!("coap://127.0.0.1:{}/{}", self.port(), path)
  }

  /// Wait for the next datagram and decode it
  pub fn recv(&self) -> (Message, SocketAddr) {
    let mut buf = [0u8; 1152];
    let (n, from) = self.sock.recv_from(&mut buf).unwrap();
    (Message::try_from_bytes(&buf[..n]).unwrap(), from)
  }

  pub fn send(&self, msg: &Message, to: SocketAddr) {
    self.sock.send_to(&msg.try_into_bytes().unwrap(), to).unwrap();
  }
}

pub fn reply(req: &Message, ty: Type, id: Id, code: Code, payload: &str) -> Message {
  Message { id,
            token: req.token,
            ty,
            code,
            opts: vec![],
            payload: Payload(payload.as_bytes().to_vec()) }
}

pub fn content(req: &Message, payload: &str) -> Message {
  reply(req, Type::Ack, req.id, Code::new(2, 5), payload)
}
