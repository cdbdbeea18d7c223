/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::io::{AsyncRead, AsyncWrite};

use g3_types::net::{Host, UpstreamAddr};

use super::{SocksConnectError, SocksNegotiationError, SocksV4Reply, SocksV4Request};

/// SOCKS4 has no domain support, so domains are resolved locally to an IPv4 address
async fn resolve_ipv4(addr: &UpstreamAddr) -> Result<Ipv4Addr, SocksConnectError> {
    match addr.host() {
        Host::Ip(IpAddr::V4(ip4)) => Ok(*ip4),
        Host::Ip(IpAddr::V6(ip6)) => ip6
            .to_ipv4_mapped()
            .ok_or(SocksConnectError::InvalidProtocol(
                SocksNegotiationError::InvalidAddrType,
            )),
        Host::Domain(domain) => {
            let addrs = tokio::net::lookup_host((domain.as_str(), addr.port()))
                .await
                .map_err(|e| SocksConnectError::ResolveFailed(domain.to_string(), e.to_string()))?;
            for a in addrs {
                if let SocketAddr::V4(a4) = a {
                    return Ok(*a4.ip());
                }
            }
            Err(SocksConnectError::ResolveFailed(
                domain.to_string(),
                "no ipv4 address found".to_string(),
            ))
        }
    }
}

pub async fn socks4_connect_to<S>(
    stream: &mut S,
    user_id: &str,
    addr: &UpstreamAddr,
) -> Result<(), SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ip = resolve_ipv4(addr).await?;
    let req = SocksV4Request::new(ip, addr.port(), user_id)?;
    req.send(stream)
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let rsp = SocksV4Reply::recv(stream).await?;
    match rsp {
        SocksV4Reply::RequestGranted => Ok(()),
        _ => Err(SocksConnectError::RequestFailed(format!(
            "request failed: {}",
            rsp.error_message()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn connect_ipv4() {
        let mut stream = Builder::new()
            .write(&[0x04, 0x01, 0x00, 0x50, 93, 184, 216, 34, 0x00])
            .read(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0])
            .build();
        let addr = UpstreamAddr::from_str("93.184.216.34:80").unwrap();
        socks4_connect_to(&mut stream, "", &addr).await.unwrap();
    }

    #[tokio::test]
    async fn connect_rejected() {
        let mut stream = Builder::new()
            .write(&[0x04, 0x01, 0x01, 0xBB, 127, 0, 0, 1, b'u', 0x00])
            .read(&[0x00, 0x5B, 0, 0, 0, 0, 0, 0])
            .build();
        let addr = UpstreamAddr::from_str("127.0.0.1:443").unwrap();
        let e = socks4_connect_to(&mut stream, "u", &addr)
            .await
            .unwrap_err();
        assert!(matches!(e, SocksConnectError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn connect_ipv6_unsupported() {
        let mut stream = Builder::new().build();
        let addr = UpstreamAddr::from_str("[2001:db8::1]:80").unwrap();
        let e = socks4_connect_to(&mut stream, "", &addr)
            .await
            .unwrap_err();
        assert!(matches!(e, SocksConnectError::InvalidProtocol(_)));
    }

    #[tokio::test]
    async fn resolve_localhost() {
        let addr = UpstreamAddr::from_str("localhost:80").unwrap();
        let ip = resolve_ipv4(&addr).await.unwrap();
        assert!(ip.is_loopback());
    }
}
