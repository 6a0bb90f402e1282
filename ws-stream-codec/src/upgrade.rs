use std::fmt::{self, Write};
use std::result;
use std::str;

use bytes::{Buf, BytesMut};
use httparse::{Header, Response};
use log::debug;
use sha1::Sha1;
use tokio_util::codec::Decoder;

use crate::{Error, HandshakeError, Result};

type Sha1Digest = [u8; sha1::DIGEST_LENGTH];

const WS_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

fn build_ws_accept(key: &str) -> Sha1Digest {
    let mut s = Sha1::new();
    s.update(key.as_bytes());
    s.update(WS_GUID);
    s.digest().bytes()
}

fn header<'a, 'header: 'a>(
    headers: &'a [Header<'header>],
    name: &'static str,
) -> result::Result<&'header [u8], HandshakeError> {
    let header = headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .ok_or(HandshakeError::MissingHeader(name))?;

    Ok(header.value)
}

fn validate_server_response(expected_ws_accept: Option<&Sha1Digest>, data: &[u8]) -> Result<Option<usize>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut response = Response::new(&mut headers);
    let status = response.parse(data).map_err(HandshakeError::from)?;
    let response_len = match status {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let code = response.code.ok_or(HandshakeError::Malformed(httparse::Error::Status))?;
    debug!("upgrade response: HTTP {} {}", code, response.reason.unwrap_or(""));

    if code != 101 {
        return Err(HandshakeError::Status {
            code,
            reason: response.reason.filter(|r| !r.is_empty()).map(str::to_owned),
        }
        .into());
    }

    if let Some(expected_ws_accept) = expected_ws_accept {
        let actual = header(response.headers, "Sec-WebSocket-Accept")?;
        let actual = String::from_utf8_lossy(actual);
        let expected = base64::encode(expected_ws_accept);
        if actual.trim() != expected {
            return Err(HandshakeError::AcceptMismatch {
                expected,
                actual: actual.into_owned(),
            }
            .into());
        }
    }

    Ok(Some(response_len))
}

/// Where the upgrade request is sent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    /// Host name or address, sent in the `Host` header.
    pub host: &'a str,
    /// TCP port. Added to the `Host` header unless it is the default for the scheme.
    pub port: u16,
    /// Whether the connection runs over TLS, which makes 443 the default port rather than 80.
    pub use_tls: bool,
    /// Path, plus `?query` if there is one. An empty string is sent as `/`.
    pub resource: &'a str,
}

impl<'a> RequestTarget<'a> {
    /// Returns the port implied by the scheme when none is given.
    pub fn default_port(use_tls: bool) -> u16 {
        if use_tls {
            443
        } else {
            80
        }
    }
}

/// Builds the HTTP `Connection: Upgrade` request that opens a WebSocket connection.
///
/// `key` is the base64 form of the 16-byte nonce. `headers` are appended after the protocol headers.
pub fn build_request(target: &RequestTarget<'_>, key: &str, headers: &[(String, String)]) -> String {
    let mut s = String::new();
    write_request(&mut s, target, key, headers).expect("formatting request failed");
    s
}

fn write_request(
    s: &mut String,
    target: &RequestTarget<'_>,
    key: &str,
    headers: &[(String, String)],
) -> fmt::Result {
    let resource = if target.resource.is_empty() { "/" } else { target.resource };
    write!(s, "GET {resource} HTTP/1.1\r\n", resource = resource)?;

    write!(s, "Host: {host}", host = target.host)?;
    if target.port != RequestTarget::default_port(target.use_tls) {
        write!(s, ":{port}", port = target.port)?;
    }

    write!(
        s,
        "\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: {key}\r\n",
        key = key
    )?;

    for (name, value) in headers {
        write!(s, "{name}: {value}\r\n", name = name, value = value)?;
    }

    s.push_str("\r\n");
    Ok(())
}

/// Tokio decoder for parsing the server's response to the client's HTTP `Connection: Upgrade` request.
///
/// Yields `()` once a complete response with status 101 has been consumed from the buffer. Bytes after the
/// response are left in the buffer; they are the start of the WebSocket stream.
#[derive(Clone, Debug)]
pub struct UpgradeCodec {
    ws_accept: Option<Sha1Digest>,
}

impl UpgradeCodec {
    /// Returns an `UpgradeCodec` that accepts any `101` response.
    ///
    /// The `Sec-WebSocket-Accept` header is not checked.
    #[must_use]
    pub fn new() -> Self {
        UpgradeCodec { ws_accept: None }
    }

    /// Returns an `UpgradeCodec` that also checks the server's `Sec-WebSocket-Accept` header.
    ///
    /// The `key` parameter provides the string passed to the server via the HTTP `Sec-WebSocket-Key` header.
    #[must_use]
    pub fn verifying(key: &str) -> Self {
        UpgradeCodec {
            ws_accept: Some(build_ws_accept(key)),
        }
    }
}

impl Default for UpgradeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for UpgradeCodec {
    type Item = ();
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<()>> {
        if let Some(response_len) = validate_server_response(self.ws_accept.as_ref(), src)? {
            src.advance(response_len);
            Ok(Some(()))
        } else {
            Ok(None)
        }
    }
}
