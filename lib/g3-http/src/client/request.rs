/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::BufMut;
use http::Method;

/// A request head with headers kept in insertion order
pub struct HttpRequestHead {
    pub method: Method,
    target: String,
    headers: Vec<(String, String)>,
}

impl HttpRequestHead {
    /// `target` is the path and query, or the absolute uri if sent to a proxy
    pub fn new(method: Method, target: String) -> Self {
        HttpRequestHead {
            method,
            target,
            headers: Vec::with_capacity(16),
        }
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn append<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.push((name.into(), value.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);
        self.serialize_to(&mut buf);
        buf
    }

    pub fn serialize_to(&self, buf: &mut Vec<u8>) {
        buf.put_slice(self.method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.target.as_bytes());
        buf.put_slice(b" HTTP/1.1\r\n");
        for (name, value) in &self.headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");
    }
}
