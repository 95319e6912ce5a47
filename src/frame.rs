use crate::OpCode;

/// Size of the fixed part of a frame header.
pub const MIN_HEADER_SIZE: usize = 2;

/// Size of a mask key.
pub const MASK_SIZE: usize = 4;

/// A decoded frame.
///
/// Lives only as long as the buffer it was decoded from. The payload is already unmasked.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Indicates if this is the final frame in a message.
    fin: bool,
    /// The opcode of the frame.
    opcode: OpCode,
    /// The masking key the frame was sent with.
    mask: Option<[u8; 4]>,
    /// The payload of the frame.
    payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub const fn new(fin: bool, opcode: OpCode, mask: Option<[u8; 4]>, payload: &'a [u8]) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload,
        }
    }

    /// Returns whether this is the final frame in a message.
    pub const fn is_final(&self) -> bool {
        self.fin
    }

    /// Returns the opcode of the frame.
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Returns the mask key the frame was sent with, if any.
    pub const fn mask(&self) -> Option<[u8; 4]> {
        self.mask
    }

    /// Returns the unmasked payload of the frame.
    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

/// Number of extended payload length bytes needed for `payload_len`.
pub const fn extended_len_size(payload_len: usize) -> usize {
    if payload_len < 126 {
        0
    } else if payload_len < 65536 {
        2
    } else {
        8
    }
}

#[derive(Debug)]
pub struct Header {
    fin: bool,
    opcode: OpCode,
    mask: Option<[u8; 4]>,
    payload_len: usize,
}

impl Header {
    pub const fn new(fin: bool, opcode: OpCode, mask: Option<[u8; 4]>, payload_len: usize) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload_len,
        }
    }

    /// Encoded size of the header, mask key included.
    pub const fn len(&self) -> usize {
        let mask = match self.mask {
            Some(_) => MASK_SIZE,
            None => 0,
        };

        MIN_HEADER_SIZE + extended_len_size(self.payload_len) + mask
    }

    /// writes the header into the dst buffer.
    pub fn write(&self, dst: &mut [u8]) -> Option<usize> {
        let size = self.len();

        if dst.len() < size {
            return None;
        }

        dst[0] = (self.fin as u8) << 7 | (self.opcode as u8);

        let masked = (self.mask.is_some() as u8) << 7;
        let len = self.payload_len;

        let offset = match extended_len_size(len) {
            0 => {
                dst[1] = masked | len as u8;
                2
            }
            2 => {
                dst[1] = masked | 126;
                dst[2..4].copy_from_slice(&(len as u16).to_be_bytes());
                4
            }
            _ => {
                dst[1] = masked | 127;
                dst[2..10].copy_from_slice(&(len as u64).to_be_bytes());
                10
            }
        };

        if let Some(mask) = self.mask {
            dst[offset..offset + MASK_SIZE].copy_from_slice(&mask);
        }

        Some(size)
    }
}
