/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

pub const DEFAULT_RECV_BUF_SIZE: usize = 8192;
const SCRATCH_INITIAL_SIZE: usize = 1500;

#[derive(Debug, Error)]
pub enum RecvLineError {
    #[error("io error: {0:?}")]
    IoError(#[from] io::Error),
    #[error("line too long")]
    LineTooLong,
}

/// A receive buffer in front of a socket.
///
/// Delimited reads collect bytes into a scratch buffer until the terminator is
/// found. Bytes read past the terminator stay in the receive buffer and are
/// served first by later delimited reads, by [`RecvBufReader::read_into`] and
/// by the [`AsyncRead`] impl.
pub struct RecvBufReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    scratch: Vec<u8>,
}

fn reserve_doubled(scratch: &mut Vec<u8>, additional: usize) {
    let need = scratch.len().saturating_add(additional);
    if need <= scratch.capacity() {
        return;
    }
    let mut new_cap = scratch.capacity().max(SCRATCH_INITIAL_SIZE);
    while new_cap < need {
        new_cap = new_cap.saturating_mul(2);
    }
    scratch.reserve_exact(new_cap - scratch.len());
}

impl<R> RecvBufReader<R> {
    pub fn new(inner: R) -> Self {
        RecvBufReader::with_capacity(DEFAULT_RECV_BUF_SIZE, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        RecvBufReader {
            inner,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            len: 0,
            scratch: Vec::with_capacity(SCRATCH_INITIAL_SIZE),
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Received but not yet consumed bytes
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..self.len]
    }

    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.len - self.pos
    }

    fn header_end_reached(&self) -> bool {
        self.scratch.ends_with(b"\r\n\r\n") || self.scratch.ends_with(b"\n\n")
    }

    /// Move buffered bytes into the scratch buffer, stopping right after the terminator.
    fn scan_buffered(&mut self, line_mode: bool, max_len: usize) -> Result<bool, RecvLineError> {
        while self.pos < self.len {
            let allowed = max_len.saturating_sub(self.scratch.len());
            if allowed == 0 {
                return Err(RecvLineError::LineTooLong);
            }
            let end = self.len.min(self.pos.saturating_add(allowed));
            let window = &self.buf[self.pos..end];

            let Some(p) = memchr::memchr(b'\n', window) else {
                reserve_doubled(&mut self.scratch, window.len());
                self.scratch.extend_from_slice(window);
                self.pos = end;
                if self.scratch.len() >= max_len {
                    return Err(RecvLineError::LineTooLong);
                }
                continue;
            };

            let segment = &window[..=p];
            reserve_doubled(&mut self.scratch, segment.len());
            self.scratch.extend_from_slice(segment);
            self.pos += segment.len();

            if line_mode {
                return Ok(true);
            }
            if self.scratch == b"\r\n" || self.scratch == b"\n" {
                // blank lines ahead of a header block
                self.scratch.clear();
                continue;
            }
            if self.header_end_reached() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<R> RecvBufReader<R>
where
    R: AsyncRead + Unpin,
{
    async fn fill_buf(&mut self) -> io::Result<usize> {
        self.pos = 0;
        self.len = 0;
        let nr = self.inner.read(&mut self.buf).await?;
        self.len = nr;
        Ok(nr)
    }

    /// Read until the terminator, with no limit on the length.
    ///
    /// In line mode the terminator is a single `\n`, otherwise it is the
    /// blank line ending a header block. The terminator is included in the
    /// returned bytes. If the peer closes the connection first, all bytes
    /// collected so far are returned, which will be empty if nothing arrived.
    pub async fn read_delimited(&mut self, line_mode: bool) -> Result<&[u8], RecvLineError> {
        self.limited_read_delimited(line_mode, usize::MAX).await
    }

    pub async fn limited_read_delimited(
        &mut self,
        line_mode: bool,
        max_len: usize,
    ) -> Result<&[u8], RecvLineError> {
        self.scratch.clear();
        loop {
            if self.scan_buffered(line_mode, max_len)? {
                break;
            }
            if self.fill_buf().await? == 0 {
                break;
            }
        }
        Ok(&self.scratch)
    }

    /// Copy buffered bytes into `dest`, or read from the socket if there are none
    pub async fn read_into(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        if dest.is_empty() {
            return Ok(0);
        }
        if self.pos < self.len {
            let n = dest.len().min(self.len - self.pos);
            dest[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        self.inner.read(dest).await
    }
}

impl<R> AsyncRead for RecvBufReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos >= this.len {
            if buf.remaining() >= this.buf.len() {
                return Pin::new(&mut this.inner).poll_read(cx, buf);
            }
            let mut fill_buf = ReadBuf::new(&mut this.buf);
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut fill_buf))?;
            this.pos = 0;
            this.len = fill_buf.filled().len();
        }
        let n = buf.remaining().min(this.len - this.pos);
        buf.put_slice(&this.buf[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl<R> AsyncWrite for RecvBufReader<R>
where
    R: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio_util::io::StreamReader;

    const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";

    #[tokio::test]
    async fn header_block() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(RESPONSE)]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        assert_eq!(reader.buffered(), b"hello");

        let mut body = [0u8; 16];
        let len = reader.read_into(&mut body).await.unwrap();
        assert_eq!(&body[..len], b"hello");
        let len = reader.read_into(&mut body).await.unwrap();
        assert_eq!(len, 0);
    }

    #[tokio::test]
    async fn small_reads_keep_leftover() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(b"hello world".as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let mut small = [0u8; 5];
        reader.read_exact(&mut small).await.unwrap();
        assert_eq!(&small, b"hello");
        assert_eq!(reader.buffered(), b" world");
    }

    #[tokio::test]
    async fn one_byte_split() {
        let chunks: Vec<io::Result<&[u8]>> = RESPONSE.chunks(1).map(Ok).collect();
        let stream = tokio_stream::iter(chunks);
        let mut reader = RecvBufReader::with_capacity(1, StreamReader::new(stream));

        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");

        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn line_mode() {
        let data1 = b"4\r\nWi";
        let data2 = b"ki\r\n5\r\npedia\r\n0\r\n\r\n";
        let stream = tokio_stream::iter(vec![
            io::Result::Ok(data1.as_slice()),
            io::Result::Ok(data2.as_slice()),
        ]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"4\r\n");
        let mut chunk = [0u8; 4];
        reader.read_exact(&mut chunk).await.unwrap();
        assert_eq!(&chunk, b"Wiki");

        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"\r\n");
        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"5\r\n");
        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"pedia\r\n");
        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"0\r\n");
        let line = reader.read_delimited(true).await.unwrap();
        assert_eq!(line, b"\r\n");
        let line = reader.read_delimited(true).await.unwrap();
        assert!(line.is_empty());
    }

    #[tokio::test]
    async fn leading_blank_lines() {
        let data = b"\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n";
        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head, b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[tokio::test]
    async fn closed_mid_header() {
        let data = b"HTTP/1.1 200 OK\r\nContent-";
        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head, data);
        let head = reader.read_delimited(false).await.unwrap();
        assert!(head.is_empty());
    }

    #[tokio::test]
    async fn too_long() {
        let data = b"HTTP/1.1 200 OK\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n";
        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));

        let r = reader.limited_read_delimited(false, 32).await;
        assert!(matches!(r, Err(RecvLineError::LineTooLong)));

        let data = b"ffffffffffffffffffff\r\n";
        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));
        let r = reader.limited_read_delimited(true, 8).await;
        assert!(matches!(r, Err(RecvLineError::LineTooLong)));

        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::new(StreamReader::new(stream));
        let line = reader.limited_read_delimited(true, data.len()).await.unwrap();
        assert_eq!(line, data);
    }

    #[tokio::test]
    async fn scratch_growth() {
        let mut data = b"HTTP/1.1 200 OK\r\nX-Pad: ".to_vec();
        data.extend(std::iter::repeat_n(b'a', 5000));
        data.extend_from_slice(b"\r\n\r\n");
        let stream = tokio_stream::iter(vec![io::Result::Ok(data.as_slice())]);
        let mut reader = RecvBufReader::with_capacity(512, StreamReader::new(stream));

        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head.len(), data.len());
    }

    #[tokio::test]
    async fn write_through() {
        let mock = tokio_test::io::Builder::new()
            .write(b"GET / HTTP/1.1\r\n\r\n")
            .read(RESPONSE)
            .build();
        let mut reader = RecvBufReader::new(mock);

        reader.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        reader.flush().await.unwrap();
        let head = reader.read_delimited(false).await.unwrap();
        assert_eq!(head.len(), RESPONSE.len() - 5);
        assert_eq!(reader.buffered_len(), 5);
    }
}
