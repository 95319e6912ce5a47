use crate::OpCode;

/// An outbound data message. Every message is sent as a single final frame.
#[derive(Debug, Clone, Copy)]
pub enum Message<'a> {
    /// A text WebSocket message
    Text(&'a str),
    /// A binary WebSocket message
    Binary(&'a [u8]),
}

impl<'a> Message<'a> {
    pub const fn opcode(&self) -> OpCode {
        match self {
            Message::Text(_) => OpCode::Text,
            Message::Binary(_) => OpCode::Binary,
        }
    }

    pub const fn payload(&self) -> &'a [u8] {
        match self {
            Message::Text(payload) => payload.as_bytes(),
            Message::Binary(payload) => payload,
        }
    }

    /// Get the length of the WebSocket message.
    pub const fn len(&self) -> usize {
        self.payload().len()
    }

    /// Returns true if the WebSocket message has no content.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
