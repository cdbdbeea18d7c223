/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::HttpLineParseError;

#[derive(Debug, Error)]
pub enum HttpBodyDecodeError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("timeout waiting for data")]
    DataTimeout,
    #[error("remote closed before the body is complete")]
    PrematureClose,
    #[error("invalid chunk line: {0}")]
    InvalidChunkLine(#[from] HttpLineParseError),
    #[error("too long chunk line")]
    ChunkLineTooLong,
    #[error("unsupported compression format {0}")]
    UnsupportedCompression(String),
    #[error("decode failed: {0:?}")]
    DecodeFailed(io::Error),
    #[error("body size exceeds the max allowed size {0}")]
    BodyTooLarge(u64),
}
