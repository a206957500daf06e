use std::fmt;

use cxo_types::{FeedId, Reference, RegistryRef};
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// One-byte message discriminator. Any byte can be held; only 1..=9 name
/// a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MsgType(u8);

impl MsgType {
    pub const PING: Self = Self(1);
    pub const PONG: Self = Self(2);
    pub const ADD: Self = Self(3);
    pub const DEL: Self = Self(4);
    pub const ROOT: Self = Self(5);
    pub const RQDT: Self = Self(6);
    pub const DATA: Self = Self(7);
    pub const RQREG: Self = Self(8);
    pub const REG: Self = Self(9);

    const NAMES: [&'static str; 9] = [
        "PING", "PONG", "ADD", "DEL", "ROOT", "RQDT", "DATA", "RQREG", "REG",
    ];

    pub const fn from_code(code: u8) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u8 {
        self.0
    }

    /// Position in the message table, if the code names a message.
    pub(crate) fn index(&self) -> Option<usize> {
        let index = usize::from(self.0).checked_sub(1)?;
        (index < Self::NAMES.len()).then_some(index)
    }

    pub fn is_known(&self) -> bool {
        self.index().is_some()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => f.write_str(Self::NAMES[index]),
            None => write!(f, "MsgType<{}>", self.0),
        }
    }
}

/// Signed root of a feed, carried opaquely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootPack {
    /// Encoded root object.
    pub root: Vec<u8>,
    pub hash: Reference,
    pub sig: Vec<u8>,
    pub seq: u64,
    /// Hash of the previous root; blank for the first one.
    pub prev: Reference,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingMsg;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongMsg;

/// Subscribe to a feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinFeedMsg {
    pub feed: FeedId,
}

/// Unsubscribe from a feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveFeedMsg {
    pub feed: FeedId,
}

/// A new root of a feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootMsg {
    pub feed: FeedId,
    pub root: RootPack,
}

/// Ask for the object with the given reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDataMsg {
    pub reference: Reference,
}

/// Object bytes answering a data request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMsg {
    pub data: Vec<u8>,
}

/// Ask for the registry with the given identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRegistryMsg {
    pub reference: RegistryRef,
}

/// Canonical registry encoding answering a registry request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMsg {
    pub registry: Vec<u8>,
}

macro_rules! messages {
    ($($variant:ident($body:ident) => $ty:ident),* $(,)?) => {
        /// All messages exchanged between nodes.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Message {
            $($variant($body),)*
        }

        impl Message {
            pub fn msg_type(&self) -> MsgType {
                match self {
                    $(Self::$variant(_) => MsgType::$ty,)*
                }
            }

            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl From<$body> for Message {
                fn from(body: $body) -> Self {
                    Self::$variant(body)
                }
            }
        )*
    };
}

messages! {
    Ping(PingMsg) => PING,
    Pong(PongMsg) => PONG,
    JoinFeed(JoinFeedMsg) => ADD,
    LeaveFeed(LeaveFeedMsg) => DEL,
    Root(RootMsg) => ROOT,
    RequestData(RequestDataMsg) => RQDT,
    Data(DataMsg) => DATA,
    RequestRegistry(RequestRegistryMsg) => RQREG,
    Registry(RegistryMsg) => REG,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_type_display() {
        assert_eq!(MsgType::PING.to_string(), "PING");
        assert_eq!(MsgType::RQREG.to_string(), "RQREG");
        assert_eq!(MsgType::REG.to_string(), "REG");
        assert_eq!(MsgType::from_code(0).to_string(), "MsgType<0>");
        assert_eq!(MsgType::from_code(10).to_string(), "MsgType<10>");
    }

    #[test]
    fn known_codes() {
        assert!(!MsgType::from_code(0).is_known());
        for code in 1..=9 {
            assert!(MsgType::from_code(code).is_known());
        }
        assert!(!MsgType::from_code(10).is_known());
        assert!(!MsgType::from_code(255).is_known());
    }

    #[test]
    fn type_names() {
        assert_eq!(Message::from(PingMsg).type_name(), "Ping");
        let msg = Message::from(DataMsg { data: vec![] });
        assert_eq!(msg.type_name(), "Data");
        assert_eq!(msg.msg_type(), MsgType::DATA);
    }
}
