use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::*;

/// Codec for node messages: `[1 byte type][bincode payload]`.
///
/// Payloads use fixed-width little-endian integers and are bounded by
/// `max_message_size`, checked on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codec {
    pub max_message_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

type DecodeFn = fn(&Codec, &[u8]) -> ProtocolResult<Message>;

/// Payload decoders indexed by `MsgType` code - 1.
static DECODERS: [DecodeFn; 9] = [
    decode_body::<PingMsg>,
    decode_body::<PongMsg>,
    decode_body::<JoinFeedMsg>,
    decode_body::<LeaveFeedMsg>,
    decode_body::<RootMsg>,
    decode_body::<RequestDataMsg>,
    decode_body::<DataMsg>,
    decode_body::<RequestRegistryMsg>,
    decode_body::<RegistryMsg>,
];

fn decode_body<T>(codec: &Codec, payload: &[u8]) -> ProtocolResult<Message>
where
    T: DeserializeOwned + Into<Message>,
{
    let mut rest = payload;
    let body: T = codec
        .options()
        .deserialize_from(&mut rest)
        .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
    if !rest.is_empty() {
        return Err(ProtocolError::IncompleteDecoding {
            consumed: 1 + payload.len() - rest.len(),
            total: 1 + payload.len(),
        });
    }
    Ok(body.into())
}

impl Codec {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    fn base_options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_little_endian()
    }

    /// Decoding options; the limit bounds allocations driven by length
    /// prefixes in untrusted input.
    fn options(&self) -> impl Options {
        Self::base_options().with_limit(self.max_message_size as u64)
    }

    fn serialize<T: Serialize>(&self, body: &T) -> ProtocolResult<Vec<u8>> {
        Self::base_options()
            .serialize(body)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Encode a message: type byte followed by its payload.
    pub fn encode(&self, msg: &Message) -> ProtocolResult<Vec<u8>> {
        let payload = match msg {
            Message::Ping(body) => self.serialize(body)?,
            Message::Pong(body) => self.serialize(body)?,
            Message::JoinFeed(body) => self.serialize(body)?,
            Message::LeaveFeed(body) => self.serialize(body)?,
            Message::Root(body) => self.serialize(body)?,
            Message::RequestData(body) => self.serialize(body)?,
            Message::Data(body) => self.serialize(body)?,
            Message::RequestRegistry(body) => self.serialize(body)?,
            Message::Registry(body) => self.serialize(body)?,
        };
        let size = payload.len() + 1;
        if size > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }
        let mut buf = Vec::with_capacity(size);
        buf.push(msg.msg_type().code());
        buf.extend_from_slice(&payload);
        tracing::trace!(msg = %msg.msg_type(), size, "encoded message");
        Ok(buf)
    }

    /// Decode a message. The whole input must be consumed.
    pub fn decode(&self, data: &[u8]) -> ProtocolResult<Message> {
        let (&code, payload) = data.split_first().ok_or(ProtocolError::EmptyMessage)?;
        if data.len() > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: data.len(),
                max: self.max_message_size,
            });
        }
        let msg_type = MsgType::from_code(code);
        let decode = msg_type
            .index()
            .map(|index| DECODERS[index])
            .ok_or(ProtocolError::UnknownMessageType(code))?;
        tracing::trace!(msg = %msg_type, size = data.len(), "decoding message");
        decode(self, payload)
    }

    /// Discriminator of an encoded message without decoding its payload.
    pub fn peek_type(data: &[u8]) -> ProtocolResult<MsgType> {
        let &code = data.first().ok_or(ProtocolError::EmptyMessage)?;
        let msg_type = MsgType::from_code(code);
        if !msg_type.is_known() {
            return Err(ProtocolError::UnknownMessageType(code));
        }
        Ok(msg_type)
    }
}

impl Message {
    /// Encode with the default codec.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Codec::default().encode(self)
    }

    /// Decode with the default codec.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        Codec::default().decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxo_types::{FeedId, Reference, RegistryRef};
    use proptest::prelude::*;

    fn feed() -> FeedId {
        FeedId::from_raw([7; 32])
    }

    fn root_pack() -> RootPack {
        RootPack {
            root: vec![1, 2, 3],
            hash: Reference::from_hash([1; 32]),
            sig: vec![9; 64],
            seq: 42,
            prev: Reference::blank(),
        }
    }

    macro_rules! roundtrip_test {
        ($name:ident, $msg:expr) => {
            #[test]
            fn $name() {
                let msg: Message = $msg.into();
                let encoded = msg.encode().unwrap();
                assert_eq!(encoded[0], msg.msg_type().code());
                let decoded = Message::decode(&encoded).unwrap();
                assert_eq!(decoded, msg);
            }
        };
    }

    roundtrip_test!(ping_roundtrip, PingMsg);
    roundtrip_test!(pong_roundtrip, PongMsg);
    roundtrip_test!(join_feed_roundtrip, JoinFeedMsg { feed: feed() });
    roundtrip_test!(leave_feed_roundtrip, LeaveFeedMsg { feed: feed() });
    roundtrip_test!(root_roundtrip, RootMsg {
        feed: feed(),
        root: root_pack(),
    });
    roundtrip_test!(request_data_roundtrip, RequestDataMsg {
        reference: Reference::from_hash([3; 32]),
    });
    roundtrip_test!(data_roundtrip, DataMsg {
        data: b"object bytes".to_vec(),
    });
    roundtrip_test!(request_registry_roundtrip, RequestRegistryMsg {
        reference: RegistryRef::from_hash([4; 32]),
    });
    roundtrip_test!(registry_roundtrip, RegistryMsg {
        registry: vec![0, 0, 0, 0],
    });

    #[test]
    fn ping_is_a_single_byte() {
        assert_eq!(Message::from(PingMsg).encode().unwrap(), vec![1]);
        assert_eq!(Message::from(PongMsg).encode().unwrap(), vec![2]);
    }

    #[test]
    fn type_codes_are_one_to_nine() {
        let msgs: Vec<Message> = vec![
            PingMsg.into(),
            PongMsg.into(),
            JoinFeedMsg { feed: feed() }.into(),
            LeaveFeedMsg { feed: feed() }.into(),
            RootMsg { feed: feed(), root: root_pack() }.into(),
            RequestDataMsg { reference: Reference::blank() }.into(),
            DataMsg { data: vec![] }.into(),
            RequestRegistryMsg { reference: RegistryRef::blank() }.into(),
            RegistryMsg { registry: vec![] }.into(),
        ];
        let codes: Vec<u8> = msgs.iter().map(|m| m.msg_type().code()).collect();
        assert_eq!(codes, (1..=9).collect::<Vec<u8>>());
    }

    #[test]
    fn decode_empty() {
        assert_eq!(Message::decode(&[]), Err(ProtocolError::EmptyMessage));
        assert_eq!(Codec::peek_type(&[]), Err(ProtocolError::EmptyMessage));
    }

    #[test]
    fn decode_unknown_type() {
        assert_eq!(Message::decode(&[0]), Err(ProtocolError::UnknownMessageType(0)));
        assert_eq!(Message::decode(&[10, 1, 2]), Err(ProtocolError::UnknownMessageType(10)));
        assert_eq!(Codec::peek_type(&[10]), Err(ProtocolError::UnknownMessageType(10)));
        assert_eq!(Codec::peek_type(&[5]), Ok(MsgType::ROOT));
    }

    #[test]
    fn decode_trailing_byte() {
        let mut encoded = Message::from(JoinFeedMsg { feed: feed() }).encode().unwrap();
        let total = encoded.len() + 1;
        encoded.push(0);
        assert_eq!(
            Message::decode(&encoded),
            Err(ProtocolError::IncompleteDecoding {
                consumed: total - 1,
                total,
            })
        );
        assert_eq!(
            Message::decode(&[1, 0]),
            Err(ProtocolError::IncompleteDecoding { consumed: 1, total: 2 })
        );
    }

    #[test]
    fn decode_truncated_payload() {
        let encoded = Message::from(RequestDataMsg {
            reference: Reference::from_hash([3; 32]),
        })
        .encode()
        .unwrap();
        assert!(matches!(
            Message::decode(&encoded[..encoded.len() - 1]),
            Err(ProtocolError::Deserialization(_))
        ));
    }

    #[test]
    fn size_limit() {
        let codec = Codec::new(16);
        let big: Message = DataMsg { data: vec![0; 64] }.into();
        assert!(matches!(
            codec.encode(&big),
            Err(ProtocolError::MessageTooLarge { max: 16, .. })
        ));
        let encoded = big.encode().unwrap();
        assert!(matches!(
            codec.decode(&encoded),
            Err(ProtocolError::MessageTooLarge { max: 16, .. })
        ));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // DATA with a declared length far beyond the input
        let mut encoded = vec![MsgType::DATA.code()];
        encoded.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            Message::decode(&encoded),
            Err(ProtocolError::Deserialization(_))
        ));
    }

    proptest! {
        #[test]
        fn data_roundtrip_any_bytes(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let msg: Message = DataMsg { data }.into();
            let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded, msg);
        }

        #[test]
        fn arbitrary_input_never_panics(data in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = Message::decode(&data);
        }
    }
}
