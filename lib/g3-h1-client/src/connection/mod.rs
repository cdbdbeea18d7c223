/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use url::Url;

use g3_types::net::{HttpProxy, Proxy, UpstreamAddr};

use crate::HttpClientError;

mod saved;
pub(crate) use saved::{HttpConnection, HttpConnectionState};

mod tcp;
pub use tcp::TcpConnectionProvider;

pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub type BoxHttpStream = Box<dyn AsyncStream>;

/// The origin server a connection leads to
#[derive(Clone, Debug)]
pub struct HttpDestination {
    addr: UpstreamAddr,
    is_https: bool,
}

impl HttpDestination {
    pub fn new(addr: UpstreamAddr, is_https: bool) -> Self {
        HttpDestination { addr, is_https }
    }

    pub fn from_url(url: &Url) -> Result<Self, HttpClientError> {
        let is_https = match url.scheme() {
            "http" => false,
            "https" => true,
            s => {
                return Err(HttpClientError::InvalidArgument(format!(
                    "unsupported url scheme {s}"
                )));
            }
        };
        let addr = UpstreamAddr::from_url(url)
            .map_err(|e| HttpClientError::InvalidArgument(format!("invalid url {url}: {e}")))?;
        Ok(HttpDestination { addr, is_https })
    }

    #[inline]
    pub fn addr(&self) -> &UpstreamAddr {
        &self.addr
    }

    #[inline]
    pub fn is_https(&self) -> bool {
        self.is_https
    }

    pub fn same_as(&self, other: &HttpDestination) -> bool {
        self.is_https == other.is_https && self.addr.eq_ignore_case(&other.addr)
    }

    /// The http proxy to send requests to in absolute form, if no tunnel is needed.
    ///
    /// Only plain http requests to port 80 go this way.
    pub fn forward_proxy<'a>(&self, proxy: Option<&'a Proxy>) -> Option<&'a HttpProxy> {
        match proxy {
            Some(Proxy::Http(p)) if !self.is_https && self.addr.port() == 80 => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for HttpDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_https {
            write!(f, "https://{}", self.addr)
        } else {
            write!(f, "http://{}", self.addr)
        }
    }
}

/// Open the transport for a destination.
///
/// The returned stream should be ready to send http requests, which means
/// proxy negotiation and tls handshake should already be done.
#[async_trait]
pub trait HttpConnectionProvider: Send {
    async fn new_connection(
        &mut self,
        destination: &HttpDestination,
    ) -> Result<BoxHttpStream, HttpClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn destination_from_url() {
        let url = Url::parse("https://Example.COM/index.html").unwrap();
        let d = HttpDestination::from_url(&url).unwrap();
        assert!(d.is_https());
        assert_eq!(d.addr().port(), 443);
        assert_eq!(d.to_string(), "https://example.com:443");

        let url = Url::parse("http://example.com:443/").unwrap();
        let d2 = HttpDestination::from_url(&url).unwrap();
        assert!(!d.same_as(&d2));

        let url = Url::parse("ftp://example.com/").unwrap();
        assert!(HttpDestination::from_url(&url).is_err());
    }

    #[test]
    fn forward_proxy() {
        let proxy = Proxy::from_str("http://127.0.0.1:3128").unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let d = HttpDestination::from_url(&url).unwrap();
        assert!(d.forward_proxy(Some(&proxy)).is_some());
        assert!(d.forward_proxy(None).is_none());

        let url = Url::parse("https://example.com/").unwrap();
        let d = HttpDestination::from_url(&url).unwrap();
        assert!(d.forward_proxy(Some(&proxy)).is_none());

        let proxy = Proxy::from_str("socks5://127.0.0.1:1080").unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let d = HttpDestination::from_url(&url).unwrap();
        assert!(d.forward_proxy(Some(&proxy)).is_none());
    }
}
