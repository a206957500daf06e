use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,

    #[error("invalid message type: {0}")]
    UnknownMessageType(u8),

    /// The payload decoded but bytes were left over.
    #[error("incomplete decoding: consumed {consumed} of {total} bytes")]
    IncompleteDecoding { consumed: usize, total: usize },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
