/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use atoi::FromRadix16Checked;

use super::HttpLineParseError;

pub struct HttpChunkedLine<'a> {
    pub chunk_size: u64,
    pub extension: Option<&'a str>,
}

impl<'a> HttpChunkedLine<'a> {
    /// Parse a chunk size line, surrounding whitespace allowed.
    ///
    /// A line with no size at all is treated as the last chunk.
    pub fn parse(buf: &'a [u8]) -> Result<HttpChunkedLine<'a>, HttpLineParseError> {
        let line = std::str::from_utf8(buf)?.trim();
        if line.is_empty() {
            return Ok(HttpChunkedLine {
                chunk_size: 0,
                extension: None,
            });
        }

        let (size, extension) = match memchr::memchr(b';', line.as_bytes()) {
            Some(p) => (line[..p].trim_end(), Some(line[p + 1..].trim())),
            None => (line, None),
        };

        let (chunk_size, offset) = u64::from_radix_16_checked(size.as_bytes());
        if offset == 0 || offset != size.len() {
            return Err(HttpLineParseError::InvalidChunkSize);
        }
        let Some(chunk_size) = chunk_size else {
            return Err(HttpLineParseError::InvalidChunkSize);
        };

        Ok(HttpChunkedLine {
            chunk_size,
            extension,
        })
    }
}
