//! Message framing for CXO nodes.
//!
//! Every message is one discriminator byte followed by a bincode payload.
//! The message set is closed: codes 1 through 9, see [`MsgType`]. Decoding
//! dispatches through a table indexed by the code and requires the payload
//! to be consumed exactly.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::Codec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    DataMsg, JoinFeedMsg, LeaveFeedMsg, Message, MsgType, PingMsg, PongMsg, RegistryMsg,
    RequestDataMsg, RequestRegistryMsg, RootMsg, RootPack, MAX_MESSAGE_SIZE,
};
