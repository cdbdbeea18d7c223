/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use atoi::FromRadix10;

use super::HttpLineParseError;

pub struct HttpStatusLine<'a> {
    pub version: u8,
    pub code: u16,
    pub reason: &'a str,
}

impl<'a> HttpStatusLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpStatusLine<'a>, HttpLineParseError> {
        const MINIMAL_LENGTH: usize = 12; // HTTP/1.x XYZ

        if buf.len() < MINIMAL_LENGTH {
            return Err(HttpLineParseError::NotLongEnough);
        }

        let Some(p) = memchr::memchr(b' ', buf) else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        let version: u8 = match &buf[0..p] {
            b"HTTP/1.0" => 0,
            b"HTTP/1.1" => 1,
            b"HTTP/2.0" | b"HTTP/2" => 2,
            _ => return Err(HttpLineParseError::InvalidVersion),
        };

        let left = &buf[p + 1..];
        let (code, len) = u16::from_radix_10(left);
        if len != 3 {
            return Err(HttpLineParseError::InvalidStatusCode);
        }

        let reason = if left.len() > len {
            match left[len] {
                b' ' | b'\r' | b'\n' => std::str::from_utf8(&left[len..])?.trim(),
                _ => return Err(HttpLineParseError::InvalidStatusCode),
            }
        } else {
            ""
        };

        Ok(HttpStatusLine {
            version,
            code,
            reason,
        })
    }
}
