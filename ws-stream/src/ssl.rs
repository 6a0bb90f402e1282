#[cfg(all(feature = "ssl-native-tls", feature = "ssl-openssl"))]
compile_error!("Features ssl-native-tls and ssl-openssl can't be used at the same time");

use std::error;
use std::io;

use crate::Error;

fn tls_error<E>(e: E) -> Error
where
    E: Into<Box<dyn error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::Other, e).into()
}

#[cfg(feature = "ssl-native-tls")]
mod inner {
    use std::net::TcpStream;

    use log::debug;
    use native_tls::{HandshakeError, TlsConnector, TlsStream};

    use super::tls_error;
    use crate::Result;

    pub fn wrap(domain: &str, stream: TcpStream) -> Result<TlsStream<TcpStream>> {
        let cx = TlsConnector::builder().build().map_err(tls_error)?;
        let stream = cx.connect(domain, stream).map_err(|e| match e {
            HandshakeError::Failure(e) => tls_error(e),
            HandshakeError::WouldBlock(_) => tls_error("TLS handshake would block"),
        })?;

        debug!("TLS session established with {}", domain);
        Ok(stream)
    }
}

#[cfg(feature = "ssl-openssl")]
mod inner {
    use std::net::TcpStream;

    use log::debug;
    use openssl::ssl::{SslConnector, SslMethod, SslStream};

    use super::tls_error;
    use crate::Result;

    pub fn wrap(domain: &str, stream: TcpStream) -> Result<SslStream<TcpStream>> {
        let ssl = SslConnector::builder(SslMethod::tls())
            .map_err(tls_error)?
            .build()
            .configure()
            .map_err(tls_error)?
            .into_ssl(domain)
            .map_err(tls_error)?;

        let mut stream = SslStream::new(ssl, stream).map_err(tls_error)?;
        stream.connect().map_err(tls_error)?;

        debug!("TLS session established with {}", domain);
        Ok(stream)
    }
}

#[cfg(not(any(feature = "ssl-native-tls", feature = "ssl-openssl")))]
mod inner {
    use std::net::TcpStream;

    use super::tls_error;
    use crate::Result;

    pub fn wrap(domain: &str, _stream: TcpStream) -> Result<TcpStream> {
        Err(tls_error(format!(
            "can't connect to {} with TLS: built without a TLS feature",
            domain
        )))
    }
}

pub use self::inner::*;
