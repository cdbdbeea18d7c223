/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use g3_types::auth::{Password, Username};
use g3_types::net::SocksAuth;

use super::{SocksAuthMethod, SocksConnectError, SocksNegotiationError};

fn auth_method(auth: &SocksAuth) -> SocksAuthMethod {
    match auth {
        SocksAuth::None => SocksAuthMethod::None,
        SocksAuth::User(_, _) => SocksAuthMethod::User,
    }
}

/// Offer a single auth method and return the one selected by the server
pub(crate) async fn send_and_recv_method<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &SocksAuth,
) -> Result<SocksAuthMethod, SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let method = auth_method(auth);
    let msg = [0x05, 0x01, method.code()];
    writer
        .write_all(&msg)
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    writer.flush().await.map_err(SocksConnectError::WriteFailed)?;

    let mut buf = [0u8; 2];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(SocksConnectError::from_read_error)?;
    if buf[0] != 0x05 {
        return Err(SocksNegotiationError::InvalidVersion.into());
    }

    let selected = SocksAuthMethod::from(buf[1]);
    if selected == SocksAuthMethod::NoAcceptable {
        return Err(SocksConnectError::NoAuthMethodAvailable);
    }
    if selected != method {
        return Err(SocksNegotiationError::InvalidAuthMethod.into());
    }
    Ok(selected)
}

/// Username/password sub-negotiation, see rfc1929
pub(crate) async fn proceed_with_user<R, W>(
    reader: &mut R,
    writer: &mut W,
    username: &Username,
    password: &Password,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(3 + username.len() as usize + password.len() as usize);
    buf.put_u8(0x01);
    buf.put_u8(username.len());
    buf.put_slice(username.as_bytes());
    buf.put_u8(password.len());
    buf.put_slice(password.as_bytes());
    writer
        .write_all(buf.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    writer.flush().await.map_err(SocksConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    reader
        .read_exact(&mut rsp)
        .await
        .map_err(SocksConnectError::from_read_error)?;
    if rsp[0] != 0x01 {
        return Err(SocksConnectError::UnsupportedAuthVersion);
    }
    if rsp[1] != 0x00 {
        return Err(SocksConnectError::AuthFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn method_none() {
        let mut stream = Builder::new()
            .write(&[0x05, 0x01, 0x00])
            .read(&[0x05, 0x00])
            .build();
        let (mut r, mut w) = tokio::io::split(&mut stream);
        let method = send_and_recv_method(&mut r, &mut w, &SocksAuth::None)
            .await
            .unwrap();
        assert_eq!(method, SocksAuthMethod::None);
    }

    #[tokio::test]
    async fn method_rejected() {
        let mut stream = Builder::new()
            .write(&[0x05, 0x01, 0x00])
            .read(&[0x05, 0xFF])
            .build();
        let (mut r, mut w) = tokio::io::split(&mut stream);
        let e = send_and_recv_method(&mut r, &mut w, &SocksAuth::None)
            .await
            .unwrap_err();
        assert!(matches!(e, SocksConnectError::NoAuthMethodAvailable));
    }

    #[tokio::test]
    async fn user_auth() {
        let username = Username::from_original("root").unwrap();
        let password = Password::from_original("toor").unwrap();

        let mut stream = Builder::new()
            .write(&[0x01, 4, b'r', b'o', b'o', b't', 4, b't', b'o', b'o', b'r'])
            .read(&[0x01, 0x00])
            .build();
        let (mut r, mut w) = tokio::io::split(&mut stream);
        proceed_with_user(&mut r, &mut w, &username, &password)
            .await
            .unwrap();

        let mut stream = Builder::new()
            .write(&[0x01, 4, b'r', b'o', b'o', b't', 4, b't', b'o', b'o', b'r'])
            .read(&[0x01, 0x01])
            .build();
        let (mut r, mut w) = tokio::io::split(&mut stream);
        let e = proceed_with_user(&mut r, &mut w, &username, &password)
            .await
            .unwrap_err();
        assert!(matches!(e, SocksConnectError::AuthFailed));
    }
}
