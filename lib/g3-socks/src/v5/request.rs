/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use g3_types::net::{Host, UpstreamAddr};

use super::{SOCKS_CMD_TCP_CONNECT, SocksNegotiationError};

pub struct Socks5Request;

impl Socks5Request {
    pub fn encode_connect(addr: &UpstreamAddr) -> Result<BytesMut, SocksNegotiationError> {
        let mut buf = BytesMut::with_capacity(262);
        buf.put_u8(0x05);
        buf.put_u8(SOCKS_CMD_TCP_CONNECT);
        buf.put_u8(0x00);
        match addr.host() {
            Host::Domain(domain) => {
                let len = u8::try_from(domain.len())
                    .map_err(|_| SocksNegotiationError::InvalidDomainString)?;
                if len == 0 {
                    return Err(SocksNegotiationError::InvalidDomainString);
                }
                buf.put_u8(0x03);
                buf.put_u8(len);
                buf.put_slice(domain.as_bytes());
            }
            Host::Ip(IpAddr::V4(ip4)) => {
                buf.put_u8(0x01);
                buf.put_slice(&ip4.octets());
            }
            Host::Ip(IpAddr::V6(ip6)) => {
                buf.put_u8(0x04);
                buf.put_slice(&ip6.octets());
            }
        }
        buf.put_u16(addr.port());
        Ok(buf)
    }

    pub(crate) async fn send<W>(writer: &mut W, buf: &[u8]) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(buf).await?;
        writer.flush().await
    }
}
