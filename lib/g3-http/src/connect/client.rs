/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite};

use g3_io_ext::{RecvBufReader, RecvLineError};
use g3_types::net::{HttpAuth, UpstreamAddr};

use super::{HttpConnectError, HttpConnectRequest};
use crate::HttpStatusLine;
use crate::header::proxy_authorization_basic;

/// Open a tunnel to `addr` through an http proxy.
///
/// The proxy must reply `200` with no data following the response header.
pub async fn http_connect_to<S>(
    stream: &mut S,
    auth: &HttpAuth,
    addr: &UpstreamAddr,
    max_header_size: usize,
) -> Result<(), HttpConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut req = HttpConnectRequest::new(addr);

    match auth {
        HttpAuth::None => {}
        HttpAuth::Basic(a) => {
            let line = proxy_authorization_basic(&a.username, &a.password);
            req.append_dyn_header(line);
        }
    }

    req.send(stream)
        .await
        .map_err(HttpConnectError::WriteFailed)?;

    let mut reader = RecvBufReader::with_capacity(1024, &mut *stream);
    let block = reader
        .limited_read_delimited(false, max_header_size)
        .await
        .map_err(|e| match e {
            RecvLineError::IoError(e) => HttpConnectError::ReadFailed(e),
            RecvLineError::LineTooLong => HttpConnectError::TooLargeHeader(max_header_size),
        })?;
    if block.is_empty() || !(block.ends_with(b"\r\n\r\n") || block.ends_with(b"\n\n")) {
        return Err(HttpConnectError::RemoteClosed);
    }

    let status_line = block.split(|c| *c == b'\n').next().unwrap_or_default();
    let rsp = HttpStatusLine::parse(status_line).map_err(HttpConnectError::InvalidStatusLine)?;
    if rsp.code != 200 {
        return Err(HttpConnectError::UnexpectedStatusCode(
            rsp.code,
            rsp.reason.to_string(),
        ));
    }

    let left = reader.buffered_len();
    if left > 0 {
        return Err(HttpConnectError::UnexpectedData(left));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use g3_types::auth::{Password, Username};
    use g3_types::net::HttpBasicAuth;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn connect_ok() {
        let mut stream = Builder::new()
            .write(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .read(b"HTTP/1.1 200 Connection established\r\n\r\n")
            .build();
        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        http_connect_to(&mut stream, &HttpAuth::None, &addr, 4096)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn connect_with_auth() {
        let auth = HttpAuth::Basic(HttpBasicAuth::new(
            Username::from_original("user").unwrap(),
            Password::from_original("pass").unwrap(),
        ));
        let mut stream = Builder::new()
            .write(
                b"CONNECT 10.0.0.1:8443 HTTP/1.1\r\n\
                  Host: 10.0.0.1:8443\r\n\
                  Proxy-Authorization: Basic dXNlcjpwYXNz\r\n\r\n",
            )
            .read(b"HTTP/1.0 200 OK\r\nProxy-Agent: test\r\n\r\n")
            .build();
        let addr = UpstreamAddr::from_str("10.0.0.1:8443").unwrap();
        http_connect_to(&mut stream, &auth, &addr, 4096)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn connect_refused() {
        let mut stream = Builder::new()
            .write(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .read(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
            .build();
        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        let e = http_connect_to(&mut stream, &HttpAuth::None, &addr, 4096)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpConnectError::UnexpectedStatusCode(407, _)));
    }

    #[tokio::test]
    async fn connect_extra_data() {
        let mut stream = Builder::new()
            .write(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .read(b"HTTP/1.1 200 OK\r\n\r\nextra")
            .build();
        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        let e = http_connect_to(&mut stream, &HttpAuth::None, &addr, 4096)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpConnectError::UnexpectedData(5)));
    }

    #[tokio::test]
    async fn connect_closed() {
        let mut stream = Builder::new()
            .write(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n")
            .build();
        let addr = UpstreamAddr::from_str("example.com:443").unwrap();
        let e = http_connect_to(&mut stream, &HttpAuth::None, &addr, 4096)
            .await
            .unwrap_err();
        assert!(matches!(e, HttpConnectError::RemoteClosed));
    }
}
