/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use g3_types::net::{Host, Proxy, RustlsClientConfig, UpstreamAddr};

use super::{BoxHttpStream, HttpConnectionProvider, HttpDestination};
use crate::{HttpClientConfig, HttpClientError, ProxyConnectError, log_msg};

/// Connect directly or through the configured proxy, then do tls handshake for https
pub struct TcpConnectionProvider {
    proxy: Option<Proxy>,
    connect_timeout: Duration,
    negotiation_timeout: Duration,
    max_header_size: usize,
    tls: RustlsClientConfig,
}

impl TcpConnectionProvider {
    pub fn new(config: &HttpClientConfig) -> anyhow::Result<Self> {
        let tls = config
            .tls
            .build()
            .context("failed to build tls client config")?;
        Ok(TcpConnectionProvider {
            proxy: config.proxy.clone(),
            connect_timeout: config.connect_timeout,
            negotiation_timeout: config.rw_timeout,
            max_header_size: config.max_header_size,
            tls,
        })
    }

    async fn tcp_connect_to(addr: &UpstreamAddr) -> io::Result<TcpStream> {
        match addr.host() {
            Host::Ip(ip) => TcpStream::connect(SocketAddr::new(*ip, addr.port())).await,
            Host::Domain(domain) => TcpStream::connect((domain.as_str(), addr.port())).await,
        }
    }

    async fn negotiate(
        &self,
        proxy: &Proxy,
        stream: &mut TcpStream,
        destination: &HttpDestination,
    ) -> Result<(), ProxyConnectError> {
        let target = destination.addr();
        let fut = async {
            match proxy {
                Proxy::Http(p) => {
                    if destination.forward_proxy(Some(proxy)).is_some() {
                        return Ok(());
                    }
                    g3_http::connect::http_connect_to(
                        stream,
                        &p.auth,
                        target,
                        self.max_header_size,
                    )
                    .await?;
                }
                Proxy::Socks4(p) => {
                    g3_socks::v4::client::socks4_connect_to(stream, &p.user_id, target).await?;
                }
                Proxy::Socks5(p) => {
                    let bind = g3_socks::v5::client::socks5_connect_to(stream, &p.auth, target)
                        .await?;
                    log_msg!("socks5 proxy {} bind to {}", p.peer(), bind);
                }
            }
            Ok::<(), ProxyConnectError>(())
        };
        match tokio::time::timeout(self.negotiation_timeout, fut).await {
            Ok(r) => r,
            Err(_) => Err(ProxyConnectError::NegotiationTimedOut),
        }
    }

    async fn tls_handshake(
        &self,
        stream: TcpStream,
        destination: &HttpDestination,
    ) -> Result<BoxHttpStream, HttpClientError> {
        let tls_name = ServerName::try_from(destination.addr().host())
            .map_err(HttpClientError::ConnectionError)?;
        let connector = TlsConnector::from(self.tls.driver.clone());
        match tokio::time::timeout(
            self.tls.handshake_timeout,
            connector.connect(tls_name, stream),
        )
        .await
        {
            Ok(Ok(tls_stream)) => Ok(Box::new(tls_stream)),
            Ok(Err(e)) => Err(HttpClientError::ConnectionError(e)),
            Err(_) => Err(HttpClientError::ConnectionError(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out to tls handshake with {}", destination.addr()),
            ))),
        }
    }

    async fn connect(
        &self,
        destination: &HttpDestination,
    ) -> Result<BoxHttpStream, HttpClientError> {
        let peer = match &self.proxy {
            Some(proxy) => proxy.peer(),
            None => destination.addr(),
        };
        let mut stream = Self::tcp_connect_to(peer)
            .await
            .map_err(HttpClientError::ConnectionError)?;
        log_msg!("tcp connected to {} for {}", peer, destination);

        if let Some(proxy) = &self.proxy {
            self.negotiate(proxy, &mut stream, destination).await?;
        }

        if destination.is_https() {
            self.tls_handshake(stream, destination).await
        } else {
            Ok(Box::new(stream))
        }
    }
}

#[async_trait]
impl HttpConnectionProvider for TcpConnectionProvider {
    async fn new_connection(
        &mut self,
        destination: &HttpDestination,
    ) -> Result<BoxHttpStream, HttpClientError> {
        match tokio::time::timeout(self.connect_timeout, self.connect(destination)).await {
            Ok(r) => r,
            Err(_) => Err(HttpClientError::ConnectionError(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out to connect to {destination}"),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    #[tokio::test]
    async fn direct_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ping");
        });

        let config = HttpClientConfig::default();
        let mut provider = TcpConnectionProvider::new(&config).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let destination = HttpDestination::from_url(&url).unwrap();
        let mut stream = provider.new_connection(&destination).await.unwrap();
        stream.write_all(b"ping").await.unwrap();
        stream.flush().await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn socks4_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 9];
            stream.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, [0x04, 0x01, 0x00, 0x50, 10, 0, 0, 1, 0x00]);
            stream
                .write_all(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0])
                .await
                .unwrap();
        });

        let config = HttpClientConfig {
            proxy: Some(Proxy::from_str(&format!("socks4://127.0.0.1:{port}")).unwrap()),
            ..Default::default()
        };
        let mut provider = TcpConnectionProvider::new(&config).unwrap();
        let url = Url::parse("http://10.0.0.1/").unwrap();
        let destination = HttpDestination::from_url(&url).unwrap();
        provider.new_connection(&destination).await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_proxy_forward() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            assert_eq!(buf, b"GET");
        });

        let config = HttpClientConfig {
            proxy: Some(Proxy::from_str(&format!("http://127.0.0.1:{port}")).unwrap()),
            ..Default::default()
        };
        let mut provider = TcpConnectionProvider::new(&config).unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let destination = HttpDestination::from_url(&url).unwrap();
        let mut stream = provider.new_connection(&destination).await.unwrap();
        stream.write_all(b"GET").await.unwrap();
        stream.shutdown().await.unwrap();
        drop(stream);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn proxy_negotiation_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            // hold the connection without reply until the client gives up
            stream.read_to_end(&mut buf).await.unwrap();
            assert_eq!(buf, [0x05, 0x01, 0x00]);
        });

        let config = HttpClientConfig {
            proxy: Some(Proxy::from_str(&format!("socks5://127.0.0.1:{port}")).unwrap()),
            rw_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let mut provider = TcpConnectionProvider::new(&config).unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let destination = HttpDestination::from_url(&url).unwrap();
        let e = provider.new_connection(&destination).await.err().unwrap();
        assert!(matches!(
            e,
            HttpClientError::ProxyError(ProxyConnectError::NegotiationTimedOut)
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = HttpClientConfig::default();
        let mut provider = TcpConnectionProvider::new(&config).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let destination = HttpDestination::from_url(&url).unwrap();
        let e = provider.new_connection(&destination).await.err().unwrap();
        assert!(matches!(e, HttpClientError::ConnectionError(_)));
    }
}
