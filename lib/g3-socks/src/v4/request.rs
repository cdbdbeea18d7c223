/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{SOCKS_CMD_TCP_CONNECT, SocksNegotiationError};

/// A SOCKS4 CONNECT request, the destination should already be resolved
pub struct SocksV4Request<'a> {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub user_id: &'a str,
}

impl<'a> SocksV4Request<'a> {
    pub fn new(ip: Ipv4Addr, port: u16, user_id: &'a str) -> Result<Self, SocksNegotiationError> {
        if user_id.as_bytes().contains(&0) {
            return Err(SocksNegotiationError::InvalidUserIdString);
        }
        Ok(SocksV4Request { ip, port, user_id })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(9 + self.user_id.len());
        buf.put_u8(0x04);
        buf.put_u8(SOCKS_CMD_TCP_CONNECT);
        buf.put_u16(self.port);
        buf.put_slice(&self.ip.octets());
        buf.put_slice(self.user_id.as_bytes());
        buf.put_u8(0x00);
        buf
    }

    pub(crate) async fn send<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(self.encode().as_ref()).await?;
        writer.flush().await
    }
}
