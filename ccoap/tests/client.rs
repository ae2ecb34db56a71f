use std::thread;
use std::time::Duration;

use ccoap::blocking::{Client, ClientResultExt};
use ccoap::config::Config;
use ccoap::core::ErrorKind;
use ccoap::req::{Req, ReqId};
use ccoap::retry::Strategy;
use ccoap_msg::{repeat, Code, Id, Message, Opt, Type};
use embedded_time::duration::Milliseconds;

mod common;
use common::*;

fn fast_config() -> Config {
  let mut config = Config::default();
  config.msg.con.unacked_retry_strategy = Strategy::Exponential { init_min: Milliseconds(50),
                                                                  init_max: Milliseconds(50) };
  config.msg.con.acked_response_timeout = Milliseconds(2_000);
  config.msg.non.response_timeout = Milliseconds(300);
  config
}

#[test]
fn get_piggybacked_content() {
  init_logger();
  let peer = Peer::bind();
  let uri = peer.uri("sensor/temp");

  let server = thread::spawn(move || {
    let (req, from) = peer.recv();
    assert_eq!(req.ty, Type::Con);
    assert_eq!(req.code, Code::new(0, 1));
    assert_eq!(req.opts,
               vec![Opt::new(repeat::PATH, "sensor"), Opt::new(repeat::PATH, "temp")]);
    peer.send(&content(&req, "23.4"), from);
  });

  let client = Client::new_std(0).unwrap();
  let rep = client.get(uri).unwrap();
  server.join().unwrap();

  assert_eq!(rep.id, ReqId(-1));
  assert_eq!(u8::from(rep.code), 69);
  assert_eq!(rep.payload_string().unwrap(), "23.4");
  assert!(rep.options.is_empty());
}

#[test]
fn separate_response_is_acknowledged() {
  init_logger();
  let peer = Peer::bind();
  let uri = peer.uri("slow");

  let server = thread::spawn(move || {
    let (req, from) = peer.recv();
    peer.send(&Message::ack(req.id), from);

    thread::sleep(Duration::from_millis(100));
    peer.send(&reply(&req, Type::Con, Id(4321), Code::new(2, 4), "changed"), from);

    let ack = loop {
      match peer.recv() {
        | (msg, _) if msg.ty == Type::Ack => break msg,
        | _ => continue,
      }
    };
    assert_eq!(ack, Message::ack(Id(4321)));
  });

  let client = Client::new_std_config(0, fast_config()).unwrap();
  let mut req = Req::put(uri, "on");
  req.id = ReqId(12);
  let rep = client.request(req).unwrap();
  server.join().unwrap();

  assert_eq!(rep.id, ReqId(12));
  assert_eq!(rep.code, Code::new(2, 4));
  assert_eq!(rep.payload, b"changed".to_vec());
}

#[test]
fn lost_request_is_retransmitted() {
  init_logger();
  let peer = Peer::bind();
  let uri = peer.uri("led");

  let server = thread::spawn(move || {
    let (first, _) = peer.recv();
    let (again, from) = peer.recv();
    assert_eq!(first, again);
    peer.send(&content(&again, "ok"), from);
  });

  let client = Client::new_std_config(0, fast_config()).unwrap();
  let rep = client.post(uri, "on").unwrap();
  server.join().unwrap();

  assert_eq!(rep.payload_string().unwrap(), "ok");
}

#[test]
fn unacknowledged_post_fails_with_request_id() {
  init_logger();
  let peer = Peer::bind();

  let client = Client::new_std_config(0, fast_config()).unwrap();
  let mut req = Req::post(peer.uri("led"), "on");
  req.id = ReqId(7);

  let e = client.request(req).unwrap_err();
  assert_eq!(e.kind(), ErrorKind::ConnectionFailed);
  assert_eq!(e.id, ReqId(7));

  let mut sends = 0;
  let mut ids = vec![];
  while sends < 5 {
    let (msg, _) = peer.recv();
    ids.push(msg.id);
    sends += 1;
  }
  assert!(ids.iter().all(|id| *id == ids[0]));
}

#[test]
fn non_confirmable_without_reply_times_out() {
  init_logger();
  let peer = Peer::bind();

  let client = Client::new_std_config(0, fast_config()).unwrap();
  let mut req = Req::get(peer.uri("x"));
  req.confirmable = false;

  assert_eq!(client.request(req).timeout_ok(), Ok(None));

  let (msg, _) = peer.recv();
  assert_eq!(msg.ty, Type::Non);
}

#[test]
fn bad_requests_fail_before_io() {
  init_logger();
  let client = Client::new_std(0).unwrap();

  assert_eq!(client.get("coap://127.0.0.1:0/x").unwrap_err().kind(),
             ErrorKind::InvalidArgument);
  assert_eq!(client.get("coaps://127.0.0.1/x").unwrap_err().kind(),
             ErrorKind::InvalidArgument);
  assert_eq!(client.get("coap://no-such-host.invalid/x")
                   .unwrap_err()
                   .kind(),
             ErrorKind::DestinationIsUnreachable);
}

#[test]
fn ipv4_client_rejects_ipv6_destinations() {
  init_logger();
  let client = Client::new_std(0).unwrap();

  let mut req = Req::get("coap://[::1]:5683/x");
  req.id = ReqId(3);
  let e = client.request(req).unwrap_err();
  assert_eq!(e.kind(), ErrorKind::InvalidArgument);
  assert_eq!(e.id, ReqId(3));
}

#[test]
fn localhost_reaches_ipv4_peer() {
  init_logger();
  let peer = Peer::bind();
  let uri = format!("coap://localhost:{}/hello", peer.port());

  let server = thread::spawn(move || {
    let (req, from) = peer.recv();
    peer.send(&content(&req, "hi"), from);
  });

  let client = Client::new_std_config(0, fast_config()).unwrap();
  let rep = client.get(uri).unwrap();
  server.join().unwrap();

  assert_eq!(rep.payload_string().unwrap(), "hi");
}

#[test]
fn request_json_round_trip() {
  init_logger();
  let peer = Peer::bind();
  let req = serde_json::json!({
    "id": 5,
    "method": "POST",
    "uri": peer.uri("config"),
    "options": [{"name": "Uri-Query", "value": ["a=1", "b=2"]}],
    "payload": {"on": true},
  });

  let server = thread::spawn(move || {
    let (req, from) = peer.recv();
    assert_eq!(req.payload.0, br#"{"on":true}"#.to_vec());
    assert_eq!(req.content_format(), Some(ccoap::ContentFormat::Json));
    assert_eq!(req.get(repeat::QUERY).count(), 2);
    peer.send(&content(&req, "done"), from);
  });

  let client = Client::new_std(0).unwrap();
  let rep = client.request_json(&req.to_string()).unwrap();
  server.join().unwrap();

  assert_eq!(serde_json::to_value(rep).unwrap(),
             serde_json::json!({"id": 5, "code": 69, "payload": "done", "options": []}));

  let e = client.request_json(r#"{"id": 9, "uri": "http://x"}"#).unwrap_err();
  assert_eq!(serde_json::to_value(&e).unwrap()["code"], 1);
  assert_eq!(e.id, ReqId(9));
}

#[test]
fn client_is_shared_between_threads() {
  init_logger();
  let a = Peer::bind();
  let b = Peer::bind();
  let (uri_a, uri_b) = (a.uri("a"), b.uri("b"));

  let servers = [a, b].map(|peer| {
                        thread::spawn(move || {
                          let (req, from) = peer.recv();
                          let path = req.get(repeat::PATH)
                                        .next()
                                        .and_then(|v| v.as_str())
                                        .unwrap()
                                        .to_string();
                          peer.send(&content(&req, &path), from);
                        })
                      });

  let client = std::sync::Arc::new(Client::new_std(0).unwrap());
  let callers = [uri_a, uri_b].map(|uri| {
                                let client = client.clone();
                                thread::spawn(move || client.get(uri).unwrap().payload_string().unwrap())
                              });

  let [ra, rb] = callers.map(|c| c.join().unwrap());
  servers.into_iter().for_each(|s| s.join().unwrap());

  assert_eq!((ra.as_str(), rb.as_str()), ("a", "b"));
}
