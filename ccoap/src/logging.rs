use std_alloc::format;
use std_alloc::string::String;

use ccoap_msg::Message;

pub(crate) fn msg_summary(msg: &Message) -> String {
  format!("{:?} {:?} {} id={} token={:02x?} with {} byte payload",
          msg.code.kind(),
          msg.ty,
          msg.code,
          msg.id.0,
          msg.token.as_bytes(),
          msg.payload.0.len())
}

#[cfg(test)]
mod tests {
  use ccoap_msg::{Code, Id, Message, Payload, Token, Type};

  use super::*;

  #[test]
  fn summary() {
    let msg = Message { id: Id(3),
                        ty: Type::Ack,
                        code: Code::new(2, 5),
                        token: Token::from_bytes(&[0xab]),
                        opts: vec![],
                        payload: Payload(b"23.4".to_vec()) };
    assert_eq!(msg_summary(&msg),
               "Response Ack 2.05 id=3 token=[ab] with 4 byte payload");
  }
}
