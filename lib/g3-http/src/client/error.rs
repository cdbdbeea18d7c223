/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use http::Version;
use thiserror::Error;

use g3_io_ext::RecvLineError;

use crate::HttpLineParseError;

#[derive(Debug, Error)]
pub enum HttpResponseParseError {
    #[error("empty response")]
    EmptyResponse,
    #[error("remote closed")]
    RemoteClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid version {0:?}")]
    InvalidVersion(Version),
    #[error("invalid status line: {0}")]
    InvalidStatusLine(HttpLineParseError),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

impl HttpResponseParseError {
    pub(crate) fn from_recv_error(e: RecvLineError, max_header_size: usize) -> Self {
        match e {
            RecvLineError::IoError(e) => HttpResponseParseError::IoFailed(e),
            RecvLineError::LineTooLong => HttpResponseParseError::TooLargeHeader(max_header_size),
        }
    }

    /// The peer went away or stalled before a complete head arrived
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HttpResponseParseError::EmptyResponse
                | HttpResponseParseError::RemoteClosed
                | HttpResponseParseError::IoFailed(_)
        )
    }
}
