/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A request body
#[async_trait]
pub trait HttpContent: Send + Sync {
    fn content_type(&self) -> Option<&str>;
    fn content_length(&self) -> u64;
    /// Write exactly `content_length` bytes to `sink`
    async fn write(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<()>;
}

pub struct BytesContent {
    data: Bytes,
    content_type: String,
}

impl BytesContent {
    pub fn new<T: Into<Bytes>>(data: T) -> Self {
        BytesContent::with_content_type(data, "application/octet-stream")
    }

    pub fn with_content_type<T: Into<Bytes>>(data: T, content_type: &str) -> Self {
        BytesContent {
            data: data.into(),
            content_type: content_type.to_string(),
        }
    }
}

#[async_trait]
impl HttpContent for BytesContent {
    fn content_type(&self) -> Option<&str> {
        Some(&self.content_type)
    }

    fn content_length(&self) -> u64 {
        self.data.len() as u64
    }

    async fn write(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<()> {
        sink.write_all(&self.data).await
    }
}

pub struct StringContent {
    inner: BytesContent,
}

impl StringContent {
    pub fn new(s: String) -> Self {
        StringContent::with_content_type(s, "text/plain; charset=utf-8")
    }

    pub fn with_content_type(s: String, content_type: &str) -> Self {
        StringContent {
            inner: BytesContent::with_content_type(s, content_type),
        }
    }
}

#[async_trait]
impl HttpContent for StringContent {
    fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }

    fn content_length(&self) -> u64 {
        self.inner.content_length()
    }

    async fn write(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> io::Result<()> {
        self.inner.write(sink).await
    }
}
