//! Error types.

use std::io;

/// Errors raised while decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Reserved bits must be zero")]
    ReservedBitsNotZero,
    #[error("Invalid opcode")]
    InvalidOpCode,
    #[error("Fragmented frames are not supported")]
    FragmentedFrame,
    #[error("Client frames must be masked")]
    UnmaskedFrame,
    #[error("Payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge { len: u64, max: usize },
}

/// Errors raised while encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Buffer too small")]
    BufferTooSmall,
}

/// Errors raised during the upgrade exchange, on either side.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("Malformed HTTP message: {0}")]
    Malformed(
        #[source]
        #[from]
        httparse::Error,
    ),
    #[error("Missing Sec-WebSocket-Key header")]
    MissingKey,
    #[error("Invalid status code")]
    InvalidStatusCode,
    #[error("Missing or invalid upgrade header")]
    MissingOrInvalidUpgrade,
    #[error("Missing or invalid connection header")]
    MissingOrInvalidConnection,
    #[error("Missing or invalid accept header")]
    MissingOrInvalidAccept,
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Handshake message exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// A peer violated the wire protocol. Fatal for that connection only.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Handshake error: {0}")]
    Handshake(
        #[source]
        #[from]
        HandshakeError,
    ),
    #[error("Decode error: {0}")]
    Decode(
        #[source]
        #[from]
        DecodeError,
    ),
}

/// A bounded resource ran out.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Receive buffer overflow: {len} + {additional} bytes exceeds capacity {capacity}")]
    BufferOverflow {
        len: usize,
        additional: usize,
        capacity: usize,
    },
    #[error("Too many connections (max {max})")]
    TooManyConnections { max: usize },
}

/// A connection-fatal error.
///
/// Raised for one connection; the server closes that connection and keeps serving the others.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(
        #[source]
        #[from]
        ProtocolError,
    ),
    #[error("Resource exhausted: {0}")]
    Resource(
        #[source]
        #[from]
        ResourceError,
    ),
    #[error("Transport error: {0}")]
    Transport(
        #[source]
        #[from]
        io::Error,
    ),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Protocol(ProtocolError::Decode(err))
    }
}

impl From<HandshakeError> for Error {
    fn from(err: HandshakeError) -> Self {
        Error::Protocol(ProtocolError::Handshake(err))
    }
}

/// Errors raised by the [`Client`](crate::client::Client).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Io error: {0}")]
    Io(
        #[source]
        #[from]
        io::Error,
    ),
    #[error("Handshake error: {0}")]
    Handshake(
        #[source]
        #[from]
        HandshakeError,
    ),
    #[error("Encode error: {0}")]
    Encode(
        #[source]
        #[from]
        EncodeError,
    ),
}
