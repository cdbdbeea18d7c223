/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncRead, AsyncReadExt};

use g3_types::net::UpstreamAddr;

use super::{SocksNegotiationError, SocksReplyParseError};

#[derive(Debug)]
pub enum Socks5Reply {
    Succeeded(UpstreamAddr),
    GeneralServerFailure,
    ForbiddenByRule,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    ConnectionTimedOut,
    Unassigned(u8),
}

impl Socks5Reply {
    fn new(code: u8, addr: UpstreamAddr) -> Self {
        match code {
            0x00 => Socks5Reply::Succeeded(addr),
            0x01 => Socks5Reply::GeneralServerFailure,
            0x02 => Socks5Reply::ForbiddenByRule,
            0x03 => Socks5Reply::NetworkUnreachable,
            0x04 => Socks5Reply::HostUnreachable,
            0x05 => Socks5Reply::ConnectionRefused,
            0x06 => Socks5Reply::TtlExpired,
            0x07 => Socks5Reply::CommandNotSupported,
            0x08 => Socks5Reply::AddressTypeNotSupported,
            0x09 => Socks5Reply::ConnectionTimedOut,
            n => Socks5Reply::Unassigned(n),
        }
    }

    pub(crate) const fn error_message(&self) -> &'static str {
        match self {
            // message from rfc1928
            Socks5Reply::Succeeded(_) => "Succeeded",
            Socks5Reply::GeneralServerFailure => "General SOCKS server failure",
            Socks5Reply::ForbiddenByRule => "Connection not allowed by ruleset",
            Socks5Reply::NetworkUnreachable => "Network unreachable",
            Socks5Reply::HostUnreachable => "Host unreachable",
            Socks5Reply::ConnectionRefused => "Connection refused",
            Socks5Reply::TtlExpired => "TTL expired",
            Socks5Reply::CommandNotSupported => "Command not supported",
            Socks5Reply::AddressTypeNotSupported => "Address type not supported",
            Socks5Reply::ConnectionTimedOut => "Connection attempt timed out",
            Socks5Reply::Unassigned(_) => "unassigned reply code",
        }
    }

    /// Read the whole reply, including the bound address, so that no reply byte
    /// is left in the stream
    pub(crate) async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await?;
        if buf[0] != 0x05 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }

        let code = buf[1];

        let addr = match buf[3] {
            0x01 => {
                let mut ip_bytes = [0u8; 4];
                reader.read_exact(&mut ip_bytes).await?;
                let port = reader.read_u16().await?;
                UpstreamAddr::from_ip_and_port(IpAddr::V4(Ipv4Addr::from(ip_bytes)), port)
            }
            0x03 => {
                let len = reader.read_u8().await?;
                let mut domain = vec![0u8; len as usize];
                reader.read_exact(&mut domain).await?;
                let port = reader.read_u16().await?;
                let domain = std::str::from_utf8(&domain)
                    .map_err(|_| SocksNegotiationError::InvalidDomainString)?;
                if domain.is_empty() {
                    UpstreamAddr::from_ip_and_port(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
                } else {
                    UpstreamAddr::from_host_str_and_port(domain, port)
                        .map_err(|_| SocksNegotiationError::InvalidDomainString)?
                }
            }
            0x04 => {
                let mut ip_bytes = [0u8; 16];
                reader.read_exact(&mut ip_bytes).await?;
                let port = reader.read_u16().await?;
                UpstreamAddr::from_ip_and_port(IpAddr::V6(Ipv6Addr::from(ip_bytes)), port)
            }
            _ => return Err(SocksNegotiationError::InvalidAddrType.into()),
        };

        Ok(Socks5Reply::new(code, addr))
    }
}
