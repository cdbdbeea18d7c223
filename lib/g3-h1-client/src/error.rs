/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use bytes::Bytes;
use thiserror::Error;
use url::Url;

use g3_http::body::HttpBodyDecodeError;
use g3_http::client::HttpResponseParseError;
use g3_http::connect::HttpConnectError;
use g3_socks::SocksConnectError;

#[derive(Debug, Error)]
pub enum ProxyConnectError {
    #[error("http connect failed: {0}")]
    HttpConnectFailed(#[from] HttpConnectError),
    #[error("socks connect failed: {0}")]
    SocksConnectFailed(#[from] SocksConnectError),
    #[error("timed out to negotiate with proxy")]
    NegotiationTimedOut,
}

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("connection error: {0:?}")]
    ConnectionError(io::Error),
    #[error("transmission error: {0:?}")]
    TransmissionError(io::Error),
    #[error("response error: {0}")]
    ResponseError(#[from] HttpResponseParseError),
    #[error("response body error: {0}")]
    ResponseBodyError(HttpBodyDecodeError),
    #[error("{} error status {code} {reason}", status_class(.code))]
    ProtocolStatusError {
        code: u16,
        reason: String,
        body: Bytes,
    },
    #[error("received data exceeds the max receive buffer size {0}")]
    BufferOverflowError(u64),
    #[error("proxy error: {0}")]
    ProxyError(#[from] ProxyConnectError),
    #[error("response body is already consumed")]
    ContentStateError,
    #[error("cancelled")]
    Cancelled,
    #[error("client is disposed")]
    ObjectDisposed,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("request to {url} failed after {attempts} attempts: {source}")]
    ReconnectExhausted {
        url: Url,
        attempts: usize,
        source: Box<HttpClientError>,
    },
}

fn status_class(code: &u16) -> &'static str {
    if *code < 500 { "client" } else { "server" }
}

impl From<HttpBodyDecodeError> for HttpClientError {
    fn from(e: HttpBodyDecodeError) -> Self {
        match e {
            HttpBodyDecodeError::BodyTooLarge(max) => HttpClientError::BufferOverflowError(max),
            e => HttpClientError::ResponseBodyError(e),
        }
    }
}

impl HttpClientError {
    /// Failures before a response head is received, which may be retried on a new connection
    pub fn is_reconnectable(&self) -> bool {
        match self {
            HttpClientError::ConnectionError(_)
            | HttpClientError::TransmissionError(_)
            | HttpClientError::ProxyError(_) => true,
            HttpClientError::ResponseError(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpClientError::ProtocolStatusError { code, .. } => Some(*code),
            HttpClientError::ReconnectExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }
}
