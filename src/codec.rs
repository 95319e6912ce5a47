use rand::Rng;
use rand_core::RngCore;

use crate::{
    Frame, Message, OpCode,
    error::{DecodeError, EncodeError},
    frame::{Header, MASK_SIZE, MIN_HEADER_SIZE, extended_len_size},
};

/// How the encoder picks mask keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Masking {
    /// A fresh key from the codec's rng for every frame.
    Random,
    /// The same key for every frame.
    ///
    /// Only for deterministic tests. Predictable masks defeat the purpose of masking.
    Fixed([u8; 4]),
}

/// Returns the size of an encoded, masked frame carrying `payload_len` bytes.
pub const fn encoded_len(payload_len: usize) -> usize {
    MIN_HEADER_SIZE + extended_len_size(payload_len) + MASK_SIZE + payload_len
}

/// Client to server frame codec.
///
/// Decoding expects masked frames and unmasks them in place. Encoding always produces
/// masked, final frames.
#[derive(Debug)]
pub struct FramesCodec<R = ()> {
    masking: Masking,
    max_payload_len: usize,
    rng: R,
}

impl FramesCodec<()> {
    /// A codec that only decodes.
    pub const fn decoder() -> Self {
        Self::new(())
    }
}

impl<R> FramesCodec<R> {
    pub const fn new(rng: R) -> Self {
        Self {
            masking: Masking::Random,
            max_payload_len: usize::MAX,
            rng,
        }
    }

    /// Frames announcing a larger payload fail with [`DecodeError::PayloadTooLarge`].
    pub const fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Use `key` for every encoded frame. See [`Masking::Fixed`].
    pub const fn with_fixed_mask(mut self, key: [u8; 4]) -> Self {
        self.masking = Masking::Fixed(key);
        self
    }

    pub const fn masking(&self) -> Masking {
        self.masking
    }

    pub const fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Decodes one frame from the start of `src`.
    ///
    /// Returns `Ok(None)` while `src` holds an incomplete frame. On success the payload is
    /// unmasked in place and the number of consumed bytes is returned alongside the frame.
    pub fn decode<'buf>(
        &self,
        src: &'buf mut [u8],
    ) -> Result<Option<(Frame<'buf>, usize)>, DecodeError> {
        if src.len() < MIN_HEADER_SIZE {
            return Ok(None);
        }

        let fin = src[0] & 0b10000000 != 0;

        if src[0] & 0b01110000 != 0 {
            return Err(DecodeError::ReservedBitsNotZero);
        }

        let opcode = OpCode::try_from(src[0] & 0b00001111)?;

        if !fin || opcode == OpCode::Continuation {
            return Err(DecodeError::FragmentedFrame);
        }

        if src[1] & 0b10000000 == 0 {
            return Err(DecodeError::UnmaskedFrame);
        }

        let length_code = src[1] & 0x7F;
        let extra = match length_code {
            126 => 2,
            127 => 8,
            _ => 0,
        };

        if src.len() < MIN_HEADER_SIZE + extra {
            return Ok(None);
        }

        let payload_len = match extra {
            0 => length_code as u64,
            2 => u16::from_be_bytes([src[2], src[3]]) as u64,
            _ => u64::from_be_bytes([
                src[2], src[3], src[4], src[5], src[6], src[7], src[8], src[9],
            ]),
        };

        let too_large = DecodeError::PayloadTooLarge {
            len: payload_len,
            max: self.max_payload_len,
        };

        let payload_len = match usize::try_from(payload_len) {
            Ok(len) if len <= self.max_payload_len => len,
            _ => return Err(too_large),
        };

        let header_len = MIN_HEADER_SIZE + extra + MASK_SIZE;
        let frame_len = header_len.checked_add(payload_len).ok_or(too_large)?;

        if src.len() < frame_len {
            return Ok(None);
        }

        let offset = MIN_HEADER_SIZE + extra;
        let mask = [
            src[offset],
            src[offset + 1],
            src[offset + 2],
            src[offset + 3],
        ];

        let payload = &mut src[header_len..frame_len];

        crate::mask::unmask(payload, mask);

        Ok(Some((Frame::new(fin, opcode, Some(mask), payload), frame_len)))
    }
}

impl<R: RngCore> FramesCodec<R> {
    fn next_mask(&mut self) -> [u8; 4] {
        match self.masking {
            Masking::Random => self.rng.random(),
            Masking::Fixed(key) => key,
        }
    }

    pub(crate) fn encode_frame(
        &mut self,
        fin: bool,
        opcode: OpCode,
        payload: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, EncodeError> {
        let mask = self.next_mask();
        let header = Header::new(fin, opcode, Some(mask), payload.len());

        let head_len = header.write(dst).ok_or(EncodeError::BufferTooSmall)?;
        let end = head_len + payload.len();

        if dst.len() < end {
            return Err(EncodeError::BufferTooSmall);
        }

        dst[head_len..end].copy_from_slice(payload);
        crate::mask::unmask(&mut dst[head_len..end], mask);

        Ok(end)
    }

    /// Encodes `message` as a single masked, final frame into `dst`.
    ///
    /// Returns the number of bytes written. `dst` must hold at least
    /// [`encoded_len`]`(message.len())` bytes.
    pub fn encode(&mut self, message: Message<'_>, dst: &mut [u8]) -> Result<usize, EncodeError> {
        self.encode_frame(true, message.opcode(), message.payload(), dst)
    }

    pub fn encode_to_vec(&mut self, message: Message<'_>) -> Vec<u8> {
        let mut dst = vec![0; encoded_len(message.len())];

        let written = self.encode(message, &mut dst).expect("Bug: buffer sized by encoded_len");

        dst.truncate(written);
        dst
    }
}
