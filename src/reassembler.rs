use crate::{
    Frame, FramesCodec, OpCode, RecvBuffer,
    error::{DecodeError, Error, ResourceError},
};

/// Outcome of one decode pass over the accumulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reassembled {
    /// Frames decoded during the pass.
    pub frames: usize,
    /// Bytes consumed from the front of the accumulator.
    pub consumed: usize,
    /// A close frame was decoded. Bytes after it are left undecoded.
    pub close: bool,
}

/// Carves complete frames out of arbitrarily split stream data.
#[derive(Debug)]
pub struct Reassembler {
    recv: RecvBuffer,
}

impl Reassembler {
    pub const fn new(capacity: usize) -> Self {
        Self {
            recv: RecvBuffer::new(capacity),
        }
    }

    /// Bytes received but not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        self.recv.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.recv.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.recv.capacity()
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ResourceError> {
        self.recv.append(bytes)
    }

    /// Drops `n` bytes from the front, e.g. a handshake head.
    pub fn consume(&mut self, n: usize) {
        self.recv.compact(n);
    }

    /// Decodes every complete frame currently buffered, in stream order, then compacts.
    ///
    /// Incomplete trailing bytes stay buffered for the next call.
    pub fn drain<R, F>(
        &mut self,
        codec: &FramesCodec<R>,
        mut on_frame: F,
    ) -> Result<Reassembled, DecodeError>
    where
        F: FnMut(Frame<'_>),
    {
        let mut reassembled = Reassembled::default();

        let result = loop {
            let src = &mut self.recv.as_mut_slice()[reassembled.consumed..];

            match codec.decode(src) {
                Ok(None) => break Ok(()),
                Ok(Some((frame, consumed))) => {
                    reassembled.consumed += consumed;
                    reassembled.frames += 1;

                    let close = frame.opcode() == OpCode::Close;

                    on_frame(frame);

                    if close {
                        reassembled.close = true;

                        break Ok(());
                    }
                }
                Err(err) => break Err(err),
            }
        };

        self.recv.compact(reassembled.consumed);

        result.map(|()| reassembled)
    }

    /// [`append`](Self::append) followed by [`drain`](Self::drain).
    pub fn receive<R, F>(
        &mut self,
        codec: &FramesCodec<R>,
        bytes: &[u8],
        on_frame: F,
    ) -> Result<Reassembled, Error>
    where
        F: FnMut(Frame<'_>),
    {
        self.append(bytes)?;

        Ok(self.drain(codec, on_frame)?)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::Message;

    fn encode(payloads: &[&[u8]]) -> Vec<u8> {
        let mut codec = FramesCodec::new(StdRng::seed_from_u64(1));

        payloads
            .iter()
            .flat_map(|payload| codec.encode_to_vec(Message::Binary(payload)))
            .collect()
    }

    fn collect(
        reassembler: &mut Reassembler,
        bytes: &[u8],
    ) -> (Vec<Vec<u8>>, Result<Reassembled, Error>) {
        let mut payloads = Vec::new();

        let result = reassembler.receive(&FramesCodec::decoder(), bytes, |frame| {
            payloads.push(frame.payload().to_vec())
        });

        (payloads, result)
    }

    #[test]
    fn incomplete_frame_is_kept() {
        let stream = encode(&[b"hello"]);
        let mut reassembler = Reassembler::new(64);

        let (payloads, result) = collect(&mut reassembler, &stream[..4]);

        assert!(payloads.is_empty());
        assert_eq!(result.unwrap().frames, 0);
        assert_eq!(reassembler.buffered(), &stream[..4]);

        let (payloads, result) = collect(&mut reassembler, &stream[4..]);

        assert_eq!(payloads, vec![b"hello".to_vec()]);
        assert_eq!(result.unwrap().consumed, stream.len());
        assert!(reassembler.is_empty());
    }

    #[test]
    fn residue_is_compacted() {
        let stream = encode(&[b"first", b"second"]);
        let first_len = crate::codec::encoded_len(5);
        let mut reassembler = Reassembler::new(64);

        let (payloads, result) = collect(&mut reassembler, &stream[..first_len + 3]);

        assert_eq!(payloads, vec![b"first".to_vec()]);
        assert_eq!(result.unwrap().consumed, first_len);
        assert_eq!(reassembler.buffered(), &stream[first_len..first_len + 3]);
    }

    #[test]
    fn overflow() {
        let stream = encode(&[&[0u8; 100]]);
        let mut reassembler = Reassembler::new(64);

        let (payloads, result) = collect(&mut reassembler, &stream);

        assert!(payloads.is_empty());
        assert!(matches!(
            result.unwrap_err(),
            Error::Resource(ResourceError::BufferOverflow { .. })
        ));
        assert!(reassembler.is_empty());
    }

    #[test]
    fn stops_at_close_frame() {
        let mut stream = encode(&[b"data"]);
        stream.extend_from_slice(&[0x88, 0x80, 0, 0, 0, 0]);
        stream.extend_from_slice(&encode(&[b"ignored"]));

        let mut reassembler = Reassembler::new(64);

        let (payloads, result) = collect(&mut reassembler, &stream);
        let reassembled = result.unwrap();

        assert!(reassembled.close);
        assert_eq!(reassembled.frames, 2);
        assert_eq!(payloads, vec![b"data".to_vec(), Vec::new()]);
    }

    #[test]
    fn decode_error() {
        let mut reassembler = Reassembler::new(64);

        let (_, result) = collect(&mut reassembler, &[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);

        assert!(matches!(
            result.unwrap_err(),
            Error::Protocol(crate::error::ProtocolError::Decode(
                DecodeError::UnmaskedFrame
            ))
        ));
    }
}
