/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{SocksNegotiationError, SocksReplyParseError};

#[derive(Debug, PartialEq, Eq)]
pub enum SocksV4Reply {
    RequestGranted,
    RequestRejectedOrFailed,
    ClientIdentDNotConnected,
    UserIdNotMatch,
    Unassigned(u8),
}

impl SocksV4Reply {
    fn new(code: u8) -> Self {
        match code {
            0x5A => SocksV4Reply::RequestGranted,
            0x5B => SocksV4Reply::RequestRejectedOrFailed,
            0x5C => SocksV4Reply::ClientIdentDNotConnected,
            0x5D => SocksV4Reply::UserIdNotMatch,
            _ => SocksV4Reply::Unassigned(code),
        }
    }

    pub(crate) const fn error_message(&self) -> &'static str {
        match self {
            SocksV4Reply::RequestGranted => "request granted",
            SocksV4Reply::RequestRejectedOrFailed => "request rejected or failed",
            SocksV4Reply::ClientIdentDNotConnected => {
                "request rejected because SOCKS server cannot connect to identd on the client"
            }
            SocksV4Reply::UserIdNotMatch => {
                "request rejected because the client program and identd report different user-ids"
            }
            SocksV4Reply::Unassigned(_) => "unassigned reply code",
        }
    }

    /// Read the 8 byte reply
    pub(crate) async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).await?;

        // some servers echo the request version
        if buf[0] != 0x00 && buf[0] != 0x04 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }

        Ok(SocksV4Reply::new(buf[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn recv_granted() {
        let mut stream = Builder::new().read(&[0, 0x5A, 0, 0, 0, 0, 0, 0]).build();
        let reply = SocksV4Reply::recv(&mut stream).await.unwrap();
        assert_eq!(reply, SocksV4Reply::RequestGranted);
    }

    #[tokio::test]
    async fn recv_rejected() {
        let mut stream = Builder::new().read(&[0, 0x5B, 0, 0, 0, 0, 0, 0]).build();
        let reply = SocksV4Reply::recv(&mut stream).await.unwrap();
        assert_eq!(reply, SocksV4Reply::RequestRejectedOrFailed);
    }

    #[tokio::test]
    async fn recv_invalid() {
        let mut stream = Builder::new().read(&[5, 0x5A, 0, 0, 0, 0, 0, 0]).build();
        assert!(SocksV4Reply::recv(&mut stream).await.is_err());

        let mut stream = Builder::new().read(&[0, 0x5A, 0]).build();
        assert!(matches!(
            SocksV4Reply::recv(&mut stream).await,
            Err(SocksReplyParseError::ReadFailed(_))
        ));
    }
}
