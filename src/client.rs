//! Client side: upgrade handshake and masked frame sending.

use rand::rngs::StdRng;
use rand_core::RngCore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{
    FramesCodec, Message,
    codec::encoded_len,
    error::{ClientError, HandshakeError},
    handshake,
    http::{self, MAX_HEADERS},
    options::ConnectOptions,
};

/// Upper bound on the size of the server's handshake response.
pub const MAX_RESPONSE_LEN: usize = 8 * 1024;

/// A WebSocket client over an already connected stream.
#[derive(Debug)]
pub struct Client<S, R = StdRng> {
    stream: S,
    codec: FramesCodec<R>,
    write_buffer: Vec<u8>,
}

impl<S, R> Client<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: RngCore,
{
    /// Performs the upgrade handshake over `stream`.
    ///
    /// `rng` provides the handshake nonce and the mask key of every frame sent afterwards.
    pub async fn connect(
        options: ConnectOptions<'_, '_>,
        mut stream: S,
        mut rng: R,
    ) -> Result<Self, ClientError> {
        let sec_key = handshake::generate_sec_key(&mut rng);

        let request = http::upgrade_request(
            options.path(),
            options.host(),
            &sec_key,
            options.headers(),
        );

        stream.write_all(&request).await?;

        let mut response = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];

        loop {
            let n = stream.read(&mut chunk).await?;

            if n == 0 {
                return Err(HandshakeError::ConnectionClosed.into());
            }

            response.extend_from_slice(&chunk[..n]);

            if let Some((parsed, _)) = http::parse_response::<MAX_HEADERS>(&response)? {
                handshake::verify_response(&parsed, &sec_key)?;

                break;
            }

            if response.len() > MAX_RESPONSE_LEN {
                return Err(HandshakeError::TooLarge {
                    max: MAX_RESPONSE_LEN,
                }
                .into());
            }
        }

        debug!(path = options.path(), "Handshake completed");

        Ok(Self {
            stream,
            codec: FramesCodec::new(rng),
            write_buffer: Vec::new(),
        })
    }

    /// Masks every subsequent frame with `key`. See [`Masking::Fixed`](crate::Masking::Fixed).
    pub fn with_fixed_mask(mut self, key: [u8; 4]) -> Self {
        self.codec = self.codec.with_fixed_mask(key);
        self
    }

    /// Sends `message` as one masked, final frame.
    pub async fn send(&mut self, message: Message<'_>) -> Result<(), ClientError> {
        self.write_buffer.resize(encoded_len(message.len()), 0);

        let n = self.codec.encode(message, &mut self.write_buffer)?;

        self.stream.write_all(&self.write_buffer[..n]).await?;

        Ok(())
    }

    /// Sends an empty close frame.
    pub async fn send_close(&mut self) -> Result<(), ClientError> {
        self.write_buffer.resize(encoded_len(0), 0);

        let n = self
            .codec
            .encode_frame(true, crate::OpCode::Close, &[], &mut self.write_buffer)?;

        self.stream.write_all(&self.write_buffer[..n]).await?;

        Ok(())
    }

    /// Shuts down the write side of the stream and returns it.
    pub async fn shutdown(mut self) -> Result<S, ClientError> {
        self.stream.shutdown().await?;

        Ok(self.stream)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
