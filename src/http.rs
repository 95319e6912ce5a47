//! HTTP/1.1 pieces of the upgrade exchange.

pub use httparse::Header;
use httparse::Status;

use crate::error::HandshakeError;

/// Maximum number of headers parsed from a request or response.
pub const MAX_HEADERS: usize = 32;

pub trait HeaderExt<'buf> {
    /// Returns the value of the first header named `name`, compared case-insensitively.
    fn header_value(&self, name: &str) -> Option<&'buf [u8]>;

    fn header_value_str(&self, name: &str) -> Option<&'buf str> {
        self.header_value(name)
            .and_then(|v| core::str::from_utf8(v).ok())
    }
}

impl<'buf> HeaderExt<'buf> for [Header<'buf>] {
    fn header_value(&self, name: &str) -> Option<&'buf [u8]> {
        self.iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value)
    }
}

#[derive(Debug)]
pub struct Request<'buf, const N: usize> {
    method: &'buf str,
    path: &'buf str,
    version: u8,
    headers: [Header<'buf>; N],
}

impl<'buf, const N: usize> Request<'buf, N> {
    pub const fn method(&self) -> &'buf str {
        self.method
    }

    pub const fn path(&self) -> &'buf str {
        self.path
    }

    /// Minor HTTP version, `1` for HTTP/1.1.
    pub const fn version(&self) -> u8 {
        self.version
    }

    pub fn headers(&self) -> &[Header<'buf>] {
        &self.headers
    }
}

#[derive(Debug)]
pub struct Response<'buf, const N: usize> {
    code: u16,
    headers: [Header<'buf>; N],
}

impl<'buf, const N: usize> Response<'buf, N> {
    pub const fn code(&self) -> u16 {
        self.code
    }

    pub fn headers(&self) -> &[Header<'buf>] {
        &self.headers
    }
}

/// Parses a request head from `src`.
///
/// Returns `Ok(None)` until the blank line ending the head has arrived. On success the number
/// of bytes making up the head is returned alongside the request.
pub fn parse_request<const N: usize>(
    src: &[u8],
) -> Result<Option<(Request<'_, N>, usize)>, HandshakeError> {
    let mut headers = [httparse::EMPTY_HEADER; N];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(src)? {
        Status::Complete(len) => {
            let method = request.method.unwrap_or_default();
            let path = request.path.unwrap_or_default();
            let version = request.version.unwrap_or_default();

            Ok(Some((
                Request {
                    method,
                    path,
                    version,
                    headers,
                },
                len,
            )))
        }
        Status::Partial => Ok(None),
    }
}

/// Parses a response head from `src`. See [`parse_request`].
pub fn parse_response<const N: usize>(
    src: &[u8],
) -> Result<Option<(Response<'_, N>, usize)>, HandshakeError> {
    let mut headers = [httparse::EMPTY_HEADER; N];
    let mut response = httparse::Response::new(&mut headers);

    match response.parse(src)? {
        Status::Complete(len) => {
            let code = response.code.unwrap_or_default();

            Ok(Some((Response { code, headers }, len)))
        }
        Status::Partial => Ok(None),
    }
}

fn write_header(dst: &mut Vec<u8>, name: &str, value: &[u8]) {
    dst.extend_from_slice(name.as_bytes());
    dst.extend_from_slice(b": ");
    dst.extend_from_slice(value);
    dst.extend_from_slice(b"\r\n");
}

/// The `101 Switching Protocols` response carrying `accept_key`.
pub fn switching_protocols(accept_key: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(128);

    dst.extend_from_slice(b"HTTP/1.1 101 Switching Protocols\r\n");
    write_header(&mut dst, "Upgrade", b"websocket");
    write_header(&mut dst, "Connection", b"Upgrade");
    write_header(&mut dst, "Sec-WebSocket-Accept", accept_key);
    dst.extend_from_slice(b"\r\n");

    dst
}

/// The client's upgrade request.
pub fn upgrade_request(
    path: &str,
    host: &str,
    sec_key: &[u8],
    additional_headers: &[Header<'_>],
) -> Vec<u8> {
    let mut dst = Vec::with_capacity(256);

    dst.extend_from_slice(b"GET ");
    dst.extend_from_slice(path.as_bytes());
    dst.extend_from_slice(b" HTTP/1.1\r\n");

    write_header(&mut dst, "Host", host.as_bytes());
    write_header(&mut dst, "Upgrade", b"websocket");
    write_header(&mut dst, "Connection", b"Upgrade");
    write_header(&mut dst, "Sec-WebSocket-Key", sec_key);
    write_header(&mut dst, "Sec-WebSocket-Version", b"13");

    for header in additional_headers.iter() {
        write_header(&mut dst, header.name, header.value);
    }

    dst.extend_from_slice(b"\r\n");

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_request() {
        let src = b"GET / HTTP/1.1\r\nHost: localhost\r\nSec-WebSocket-Key: abc";

        assert!(parse_request::<MAX_HEADERS>(src).unwrap().is_none());
    }

    #[test]
    fn request_headers_are_case_insensitive() {
        let src = b"GET /chat HTTP/1.1\r\nsec-websocket-key: abc\r\n\r\ntrailing";

        let (request, len) = parse_request::<MAX_HEADERS>(src).unwrap().unwrap();

        assert_eq!(len, src.len() - b"trailing".len());
        assert_eq!(request.method(), "GET");
        assert_eq!(request.path(), "/chat");
        assert_eq!(request.version(), 1);
        assert_eq!(
            request.headers().header_value_str("Sec-WebSocket-Key"),
            Some("abc")
        );
    }

    #[test]
    fn malformed_request() {
        let src = b"GET / HTTP/1.1\r\nBad Header\r\n\r\n";

        let error = parse_request::<MAX_HEADERS>(src).unwrap_err();

        assert!(matches!(error, HandshakeError::Malformed(_)));
    }

    #[test]
    fn switching_protocols_format() {
        let response = switching_protocols(b"s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");

        assert_eq!(
            response,
            b"HTTP/1.1 101 Switching Protocols\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
            \r\n"
        );
    }

    #[test]
    fn upgrade_request_round_trips_through_parser() {
        let request = upgrade_request(
            "/ws",
            "localhost:8331",
            b"dGhlIHNhbXBsZSBub25jZQ==",
            &[Header {
                name: "User-Agent",
                value: b"wsmux",
            }],
        );

        let (parsed, len) = parse_request::<MAX_HEADERS>(&request).unwrap().unwrap();

        assert_eq!(len, request.len());
        assert_eq!(parsed.path(), "/ws");
        assert_eq!(
            parsed.headers().header_value("sec-websocket-key"),
            Some(&b"dGhlIHNhbXBsZSBub25jZQ=="[..])
        );
        assert_eq!(parsed.headers().header_value("user-agent"), Some(&b"wsmux"[..]));
    }
}
