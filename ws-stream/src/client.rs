use std::io::{self, Read, Write};
use std::net::TcpStream;

use log::debug;
use url::Url;
use ws_stream_codec::{build_request, RequestTarget, UpgradeCodec};

use crate::sync;
use crate::{
    Client, Error, FrameCodec, HandshakeError, KeySource, NetworkStream, PrefixedStream, Result, ThreadRngSource,
    WebSocketConnection,
};

/// Establishes a WebSocket connection.
///
/// `ws://...`, `wss://...`, `http://...` and `https://...` URIs are supported. TLS is used for `wss` and `https`;
/// every other scheme connects over plain TCP.
#[derive(Debug)]
pub struct ClientBuilder<K = ThreadRngSource> {
    host: String,
    resource: String,
    port: Option<u16>,
    use_tls: bool,
    key: Option<[u8; 16]>,
    headers: Vec<(String, String)>,
    verify_accept: bool,
    keys: K,
}

impl ClientBuilder {
    /// Creates a `ClientBuilder` that connects to a given WebSocket URI.
    ///
    /// # Errors
    ///
    /// Fails with `HandshakeError::InvalidUri` if the URI cannot be parsed, and with `MissingHost` or
    /// `MissingPath` if it lacks either part.
    pub fn new(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| HandshakeError::InvalidUri(format!("{}: {}", uri, e)))?;
        Self::from_url(&url)
    }

    /// Creates a `ClientBuilder` from an already parsed URL.
    ///
    /// # Errors
    ///
    /// Fails with `HandshakeError::MissingHost` or `HandshakeError::MissingPath` if the URL lacks either part.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or(HandshakeError::MissingHost)?;
        if url.path().is_empty() {
            return Err(HandshakeError::MissingPath.into());
        }

        let mut resource = url.path().to_owned();
        if let Some(query) = url.query() {
            resource.push('?');
            resource.push_str(query);
        }

        let use_tls = matches!(url.scheme(), "wss" | "https");
        Ok(Self::from_parts(host, &resource, url.port(), use_tls))
    }

    /// Creates a `ClientBuilder` from its parts. An empty `path` requests `/`.
    ///
    /// When `port` is `None` it defaults to 443 with TLS and 80 without.
    pub fn from_parts(host: &str, path: &str, port: Option<u16>, use_tls: bool) -> Self {
        let resource = if path.is_empty() { "/" } else { path };

        ClientBuilder {
            host: host.to_owned(),
            resource: resource.to_owned(),
            port,
            use_tls,
            key: None,
            headers: Vec::new(),
            verify_accept: false,
            keys: ThreadRngSource,
        }
    }
}

impl<K: KeySource> ClientBuilder<K> {
    /// Replaces the source of random bytes used for the handshake nonce and for frame masks.
    pub fn key_source<K2: KeySource>(self, keys: K2) -> ClientBuilder<K2> {
        ClientBuilder {
            host: self.host,
            resource: self.resource,
            port: self.port,
            use_tls: self.use_tls,
            key: self.key,
            headers: self.headers,
            verify_accept: self.verify_accept,
            keys,
        }
    }

    /// Sends `key` as the handshake nonce instead of drawing 16 random bytes.
    #[must_use]
    pub fn key(mut self, key: [u8; 16]) -> Self {
        self.key = Some(key);
        self
    }

    /// Adds an extra HTTP header to the upgrade request.
    pub fn add_header(&mut self, name: String, value: String) {
        self.headers.push((name, value));
    }

    /// Controls whether the server's `Sec-WebSocket-Accept` header is checked against the nonce.
    ///
    /// Off by default, in which case any `101` response completes the handshake.
    #[must_use]
    pub fn verify_accept(mut self, verify: bool) -> Self {
        self.verify_accept = verify;
        self
    }

    /// Returns the host to connect to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the path and query that will be requested.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the port to connect to, after applying the default for the scheme.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| RequestTarget::default_port(self.use_tls))
    }

    /// Returns `true` if the connection will use TLS.
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Establishes a connection to the WebSocket server, over TLS if required.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Transport` if connecting or the TLS handshake fails, and with `Error::Handshake` if the
    /// server does not accept the upgrade.
    pub fn connect(self) -> Result<Client<K>> {
        let stream = self.tcp_connect()?;

        let stream: Box<dyn NetworkStream + Send + 'static> = if self.use_tls {
            Box::new(crate::ssl::wrap(&self.host, stream)?)
        } else {
            Box::new(stream)
        };

        self.connect_on(stream)
    }

    /// Establishes a connection to the WebSocket server over plain TCP, even if TLS was asked for.
    ///
    /// # Errors
    ///
    /// As for [`connect`](#method.connect).
    pub fn connect_insecure(self) -> Result<WebSocketConnection<TcpStream, K>> {
        let stream = self.tcp_connect()?;
        self.connect_on(stream)
    }

    /// Takes over an already established stream and uses it to send and receive WebSocket messages.
    ///
    /// This method assumes that the TLS connection has already been established, if needed. It sends an HTTP
    /// `Connection: Upgrade` request and waits for a `101 Switching Protocols` response before proceeding.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Transport` if writing or reading from the stream fails, and with `Error::Handshake` if
    /// the server responds with any other status.
    pub fn connect_on<S: Read + Write>(mut self, mut stream: S) -> Result<WebSocketConnection<S, K>> {
        let key_bytes = match self.key {
            Some(key) => key,
            None => {
                let mut key = [0; 16];
                self.keys.fill_bytes(&mut key);
                key
            }
        };

        let key = base64::encode(&key_bytes);
        let target = RequestTarget {
            host: &self.host,
            port: self.port(),
            use_tls: self.use_tls,
            resource: &self.resource,
        };

        let request = build_request(&target, &key, &self.headers);
        stream.write_all(request.as_bytes())?;
        stream.flush()?;
        debug!("sent upgrade request for {}{}", self.host, self.resource);

        let codec = if self.verify_accept {
            UpgradeCodec::verifying(&key)
        } else {
            UpgradeCodec::new()
        };

        let mut framed = sync::Framed::new(stream, codec);
        framed
            .receive()?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no HTTP Upgrade response"))?;

        let (stream, read_buf) = framed.into_parts();
        debug!("upgraded connection to {}, {} bytes already buffered", self.host, read_buf.len());
        Ok(WebSocketConnection::from_parts(
            PrefixedStream::new(read_buf, stream),
            FrameCodec::with_key_source(self.keys),
        ))
    }

    fn tcp_connect(&self) -> Result<TcpStream> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let port = self.port();
        debug!("connecting to {}:{} (tls: {})", host, port, self.use_tls);
        TcpStream::connect((host, port)).map_err(Error::from)
    }
}
