/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::HttpBodyDecodeError;

mod coding;
pub use coding::ContentDecoder;

mod decoder;
pub use decoder::{DEFAULT_MAX_CHUNK_LINE_SIZE, HttpBodyDecoder, HttpBodyProgress};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpBodyFraming {
    Chunked,
    Sized(u64),
    /// read until the peer closes the connection
    Unsized,
}
