/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Deflate,
    Brotli,
}

impl ContentCoding {
    /// Parse a `Content-Encoding` value.
    ///
    /// Returns `Ok(None)` for an empty value, `identity` and `none`, and
    /// `Err` with the original value for any unsupported coding.
    pub fn parse(value: &str) -> Result<Option<Self>, &str> {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("identity") || v.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        if v.eq_ignore_ascii_case("gzip") || v.eq_ignore_ascii_case("x-gzip") {
            Ok(Some(ContentCoding::Gzip))
        } else if v.eq_ignore_ascii_case("deflate") {
            Ok(Some(ContentCoding::Deflate))
        } else if v.eq_ignore_ascii_case("br") {
            Ok(Some(ContentCoding::Brotli))
        } else {
            Err(value)
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentCoding::Gzip => "gzip",
            ContentCoding::Deflate => "deflate",
            ContentCoding::Brotli => "br",
        }
    }
}

impl fmt::Display for ContentCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get the `charset` parameter of a `Content-Type` value
pub fn content_type_charset(value: &str) -> Option<&str> {
    value.split(';').skip(1).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        if k.trim().eq_ignore_ascii_case("charset") {
            Some(v.trim().trim_matches('"'))
        } else {
            None
        }
    })
}
