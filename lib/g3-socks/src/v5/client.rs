/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite};

use g3_types::net::{SocksAuth, UpstreamAddr};

use super::{Socks5Reply, Socks5Request, SocksAuthMethod, SocksConnectError, auth};

async fn socks5_login<S>(stream: &mut S, auth: &SocksAuth) -> Result<(), SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let auth_method = auth::send_and_recv_method(&mut reader, &mut writer, auth).await?;
    match auth_method {
        SocksAuthMethod::None => Ok(()),
        SocksAuthMethod::User => {
            if let SocksAuth::User(username, password) = auth {
                auth::proceed_with_user(&mut reader, &mut writer, username, password).await
            } else {
                Err(SocksConnectError::NoAuthMethodAvailable)
            }
        }
        _ => Err(SocksConnectError::NoAuthMethodAvailable),
    }
}

/// tcp connect through a socks5 proxy
///
/// return the bind address reported by the server
pub async fn socks5_connect_to<S>(
    stream: &mut S,
    auth: &SocksAuth,
    addr: &UpstreamAddr,
) -> Result<UpstreamAddr, SocksConnectError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    socks5_login(stream, auth).await?;

    let req = Socks5Request::encode_connect(addr)?;
    Socks5Request::send(stream, req.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let rsp = Socks5Reply::recv(stream).await?;
    match rsp {
        Socks5Reply::Succeeded(addr) => Ok(addr),
        Socks5Reply::ConnectionTimedOut => Err(SocksConnectError::PeerTimeout),
        _ => Err(SocksConnectError::RequestFailed(format!(
            "request failed: {}",
            rsp.error_message()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_types::auth::{Password, Username};
    use std::str::FromStr;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn connect_no_auth() {
        let mut stream = Builder::new()
            .write(&[5, 1, 0])
            .read(&[5, 0])
            .write(&[5, 1, 0, 1, 93, 184, 216, 34, 0, 0x50])
            .read(&[5, 0, 0, 1, 127, 0, 0, 1, 0x04, 0x38])
            .build();
        let addr = UpstreamAddr::from_str("93.184.216.34:80").unwrap();
        let bind = socks5_connect_to(&mut stream, &SocksAuth::None, &addr)
            .await
            .unwrap();
        assert_eq!(bind.to_string(), "127.0.0.1:1080");
    }

    #[tokio::test]
    async fn connect_user_auth() {
        let auth = SocksAuth::User(
            Username::from_original("u").unwrap(),
            Password::from_original("p").unwrap(),
        );
        let mut stream = Builder::new()
            .write(&[5, 1, 2])
            .read(&[5, 2])
            .write(&[1, 1, b'u', 1, b'p'])
            .read(&[1, 0])
            .write(&[5, 1, 0, 3, 4, b'h', b'o', b's', b't', 0x01, 0xBB])
            .read(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0])
            .build();
        let addr = UpstreamAddr::from_str("host:443").unwrap();
        socks5_connect_to(&mut stream, &auth, &addr).await.unwrap();
    }

    #[tokio::test]
    async fn connect_timed_out() {
        let mut stream = Builder::new()
            .write(&[5, 1, 0])
            .read(&[5, 0])
            .write(&[5, 1, 0, 1, 10, 0, 0, 2, 0, 0x50])
            .read(&[5, 9, 0, 1, 0, 0, 0, 0, 0, 0])
            .build();
        let addr = UpstreamAddr::from_str("10.0.0.2:80").unwrap();
        let e = socks5_connect_to(&mut stream, &SocksAuth::None, &addr)
            .await
            .unwrap_err();
        assert!(matches!(e, SocksConnectError::PeerTimeout));
    }
}
