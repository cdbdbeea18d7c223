/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocksNegotiationError {
    #[error("invalid version code")]
    InvalidVersion,
    #[error("invalid auth method")]
    InvalidAuthMethod,
    #[error("invalid user id string")]
    InvalidUserIdString,
    #[error("invalid domain string")]
    InvalidDomainString,
    #[error("invalid addr type")]
    InvalidAddrType,
    #[error("invalid user auth message")]
    InvalidUserAuthMsg,
}

#[derive(Error, Debug)]
pub enum SocksReplyParseError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
}

#[derive(Error, Debug)]
pub enum SocksConnectError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("remote closed")]
    RemoteClosed,
    #[error("no auth method available")]
    NoAuthMethodAvailable,
    #[error("unsupported auth version")]
    UnsupportedAuthVersion,
    #[error("auth failed")]
    AuthFailed,
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
    #[error("resolve {0} failed: {1}")]
    ResolveFailed(String, String),
    #[error("peer timeout")]
    PeerTimeout,
    #[error("request failed: {0}")]
    RequestFailed(String),
}

impl From<SocksReplyParseError> for SocksConnectError {
    fn from(e: SocksReplyParseError) -> Self {
        match e {
            SocksReplyParseError::ReadFailed(e) => SocksConnectError::from_read_error(e),
            SocksReplyParseError::InvalidProtocol(e) => SocksConnectError::InvalidProtocol(e),
        }
    }
}

impl SocksConnectError {
    pub(crate) fn from_read_error(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SocksConnectError::RemoteClosed
        } else {
            SocksConnectError::ReadFailed(e)
        }
    }
}
