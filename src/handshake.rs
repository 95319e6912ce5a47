//! Upgrade negotiation: accept key derivation and validation for both sides.

use base64::{Engine as _, engine::general_purpose};
use rand_core::RngCore;
use sha1::{Digest, Sha1};

use crate::{
    error::HandshakeError,
    http::{self, HeaderExt, MAX_HEADERS, Response},
};

/// Fixed GUID appended to the client nonce before hashing.
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derives the `Sec-WebSocket-Accept` value for `sec_key`.
pub fn generate_sec_accept(sec_key: &[u8]) -> [u8; 28] {
    let mut sha1 = Sha1::new();

    sha1.update(sec_key);
    sha1.update(GUID);

    let hash = sha1.finalize();

    debug_assert!(hash.len() == 20, "SHA1 hash should be 20 bytes long");

    // 28 = ((4 * hash.len() + 2) / 3 + 3) & !3 = ((4 * 20 + 2) / 3 + 3) & !3
    let mut encoded: [u8; 28] = [0; 28];

    general_purpose::STANDARD
        .encode_slice(hash, &mut encoded)
        .expect("Bug: sec_accept encoding failed");

    encoded
}

/// Generates a random `Sec-WebSocket-Key` value.
pub fn generate_sec_key<R: RngCore>(rng: &mut R) -> [u8; 24] {
    let mut key: [u8; 16] = [0; 16];

    rng.fill_bytes(&mut key);

    // 24 = ((4 * key.len() + 2) / 3 + 3) & !3 = ((4 * 16 + 2) / 3 + 3) & !3
    let mut encoded: [u8; 24] = [0; 24];

    general_purpose::STANDARD
        .encode_slice(key, &mut encoded)
        .expect("Bug: sec_key encoding failed");

    encoded
}

/// A parsed upgrade request, ready to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    accept_key: [u8; 28],
    consumed: usize,
}

impl Accepted {
    pub const fn accept_key(&self) -> &[u8; 28] {
        &self.accept_key
    }

    /// Number of bytes the request head occupied. Anything after it is frame data.
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// The `101 Switching Protocols` response to send back.
    pub fn response(&self) -> Vec<u8> {
        http::switching_protocols(&self.accept_key)
    }
}

/// Server side of the exchange.
///
/// Returns `Ok(None)` while the request head is still incomplete.
pub fn accept(src: &[u8]) -> Result<Option<Accepted>, HandshakeError> {
    let Some((request, consumed)) = http::parse_request::<MAX_HEADERS>(src)? else {
        return Ok(None);
    };

    let sec_key = request
        .headers()
        .header_value("sec-websocket-key")
        .map(<[u8]>::trim_ascii)
        .filter(|key| !key.is_empty())
        .ok_or(HandshakeError::MissingKey)?;

    Ok(Some(Accepted {
        accept_key: generate_sec_accept(sec_key),
        consumed,
    }))
}

/// Client side of the exchange: validates the server's response to a request sent with `sec_key`.
pub fn verify_response<const N: usize>(
    response: &Response<'_, N>,
    sec_key: &[u8],
) -> Result<(), HandshakeError> {
    if !matches!(response.code(), 101) {
        return Err(HandshakeError::InvalidStatusCode);
    }

    if !response
        .headers()
        .header_value_str("upgrade")
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
    {
        return Err(HandshakeError::MissingOrInvalidUpgrade);
    }

    if !response
        .headers()
        .header_value_str("connection")
        .is_some_and(|v| v.eq_ignore_ascii_case("upgrade"))
    {
        return Err(HandshakeError::MissingOrInvalidConnection);
    }

    let sec_accept = generate_sec_accept(sec_key);

    if response
        .headers()
        .header_value("sec-websocket-accept")
        .is_none_or(|v| v != sec_accept)
    {
        return Err(HandshakeError::MissingOrInvalidAccept);
    }

    Ok(())
}
