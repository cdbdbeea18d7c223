/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use g3_io_ext::{RecvBufReader, RecvLineError, SizeLimitedReader};

use super::{ContentDecoder, HttpBodyDecodeError, HttpBodyFraming};
use crate::HttpChunkedLine;
use crate::header::ContentCoding;

pub const DEFAULT_MAX_CHUNK_LINE_SIZE: usize = 4096;
const RAW_BUFFER_SIZE: usize = 8192;
const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(60);

/// Called after each raw read with the body bytes received so far and the
/// content length if known
pub type HttpBodyProgress = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    ChunkSize,
    ChunkData,
    Data,
    Finished,
    Done,
}

/// Decode a response body out of the receive buffer of a connection.
///
/// The framing selects how the end of the body is found, the optional
/// content coding is removed on the fly. Output comes as a sequence of
/// [`Bytes`] chunks through [`HttpBodyDecoder::next_chunk`].
pub struct HttpBodyDecoder<'a, R> {
    reader: SizeLimitedReader<&'a mut RecvBufReader<R>>,
    framing: HttpBodyFraming,
    state: DecodeState,
    decoder: Option<ContentDecoder>,
    raw_buf: Box<[u8]>,
    data_timeout: Duration,
    max_chunk_line_size: usize,
    max_body_size: u64,
    html_sniffing: bool,
    html_found: Option<bool>,
    html_tail: Vec<u8>,
    received: u64,
    decoded: u64,
    content_length: Option<u64>,
    progress: Option<HttpBodyProgress>,
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

impl<'a, R> HttpBodyDecoder<'a, R>
where
    R: AsyncRead + Unpin,
{
    /// Create a decoder, failing at once if the declared size is above `max_body_size`
    pub fn new(
        reader: &'a mut RecvBufReader<R>,
        framing: HttpBodyFraming,
        coding: Option<ContentCoding>,
        max_body_size: u64,
    ) -> Result<Self, HttpBodyDecodeError> {
        let (limit, state, content_length) = match framing {
            HttpBodyFraming::Chunked => (Some(0), DecodeState::ChunkSize, None),
            HttpBodyFraming::Sized(size) => {
                if size > max_body_size {
                    return Err(HttpBodyDecodeError::BodyTooLarge(max_body_size));
                }
                let state = if size == 0 {
                    DecodeState::Finished
                } else {
                    DecodeState::Data
                };
                (Some(size), state, Some(size))
            }
            HttpBodyFraming::Unsized => (None, DecodeState::Data, None),
        };
        Ok(HttpBodyDecoder {
            reader: SizeLimitedReader::new(reader, limit),
            framing,
            state,
            decoder: coding.map(ContentDecoder::new),
            raw_buf: vec![0u8; RAW_BUFFER_SIZE].into_boxed_slice(),
            data_timeout: DEFAULT_DATA_TIMEOUT,
            max_chunk_line_size: DEFAULT_MAX_CHUNK_LINE_SIZE,
            max_body_size,
            html_sniffing: false,
            html_found: None,
            html_tail: Vec::new(),
            received: 0,
            decoded: 0,
            content_length,
            progress: None,
        })
    }

    pub fn set_data_timeout(&mut self, timeout: Duration) {
        self.data_timeout = timeout;
    }

    pub fn set_max_chunk_line_size(&mut self, size: usize) {
        self.max_chunk_line_size = size;
    }

    /// Stop reading an unsized identity body once `</html>` is seen, if the
    /// body starts with an `<html` tag
    pub fn set_html_sniffing(&mut self, enable: bool) {
        self.html_sniffing = enable;
    }

    pub fn set_progress(&mut self, progress: HttpBodyProgress) {
        self.progress = Some(progress);
    }

    #[inline]
    pub fn framing(&self) -> HttpBodyFraming {
        self.framing
    }

    /// The declared content length, or the decoded size once finished
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Raw body bytes read from the connection
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    #[inline]
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == DecodeState::Done
    }

    async fn read_line(&mut self) -> Result<Vec<u8>, HttpBodyDecodeError> {
        let max_len = self.max_chunk_line_size;
        let reader = self.reader.get_mut();
        match tokio::time::timeout(
            self.data_timeout,
            reader.limited_read_delimited(true, max_len),
        )
        .await
        {
            Ok(Ok(line)) => Ok(line.to_vec()),
            Ok(Err(RecvLineError::IoError(e))) => Err(HttpBodyDecodeError::ReadFailed(e)),
            Ok(Err(RecvLineError::LineTooLong)) => Err(HttpBodyDecodeError::ChunkLineTooLong),
            Err(_) => Err(HttpBodyDecodeError::DataTimeout),
        }
    }

    async fn read_chunk_size(&mut self) -> Result<(), HttpBodyDecodeError> {
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                debug!("connection closed while waiting for the chunk size line");
                self.state = DecodeState::Finished;
                return Ok(());
            }
            if line == b"\r\n" || line == b"\n" {
                continue;
            }

            let chunk = HttpChunkedLine::parse(&line)?;
            if chunk.chunk_size == 0 {
                self.drain_trailer().await?;
                self.state = DecodeState::Finished;
            } else {
                self.reader.reset_limit(Some(chunk.chunk_size));
                self.state = DecodeState::ChunkData;
            }
            return Ok(());
        }
    }

    async fn drain_trailer(&mut self) -> Result<(), HttpBodyDecodeError> {
        loop {
            let line = self.read_line().await?;
            if line.is_empty() || line == b"\r\n" || line == b"\n" {
                return Ok(());
            }
        }
    }

    async fn read_raw(&mut self) -> Result<usize, HttpBodyDecodeError> {
        match tokio::time::timeout(self.data_timeout, self.reader.read(&mut self.raw_buf)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(HttpBodyDecodeError::ReadFailed(e)),
            Err(_) => Err(HttpBodyDecodeError::DataTimeout),
        }
    }

    fn account_decoded(&mut self, len: usize) -> Result<(), HttpBodyDecodeError> {
        self.decoded += len as u64;
        if self.decoded > self.max_body_size {
            return Err(HttpBodyDecodeError::BodyTooLarge(self.max_body_size));
        }
        Ok(())
    }

    fn sniff_html_end(&mut self, data: &[u8]) -> bool {
        if !self.html_sniffing
            || self.decoder.is_some()
            || self.framing != HttpBodyFraming::Unsized
        {
            return false;
        }

        let html_found = *self
            .html_found
            .get_or_insert_with(|| contains_ignore_ascii_case(data, b"<html"));
        if !html_found {
            return false;
        }

        self.html_tail.extend_from_slice(data);
        let found = contains_ignore_ascii_case(&self.html_tail, b"</html>");
        let skip = self.html_tail.len().saturating_sub(6);
        self.html_tail.drain(..skip);
        found
    }

    fn finish(&mut self) -> Result<Option<Bytes>, HttpBodyDecodeError> {
        let mut tail = None;
        if let Some(decoder) = self.decoder.take() {
            let data = decoder.finish().map_err(HttpBodyDecodeError::DecodeFailed)?;
            if !data.is_empty() {
                self.account_decoded(data.len())?;
                tail = Some(data);
            }
        }
        if self.content_length.is_none() {
            self.content_length = Some(self.decoded);
        }
        self.state = DecodeState::Done;
        Ok(tail)
    }

    /// Get the next decoded chunk, `None` at the end of the body
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, HttpBodyDecodeError> {
        loop {
            match self.state {
                DecodeState::Done => return Ok(None),
                DecodeState::Finished => {
                    if let Some(tail) = self.finish()? {
                        return Ok(Some(tail));
                    }
                    return Ok(None);
                }
                DecodeState::ChunkSize => self.read_chunk_size().await?,
                DecodeState::ChunkData | DecodeState::Data => {
                    let nr = self.read_raw().await?;
                    if nr == 0 {
                        match self.reader.remaining() {
                            Some(0) => {
                                if self.state == DecodeState::ChunkData {
                                    self.state = DecodeState::ChunkSize;
                                } else {
                                    self.state = DecodeState::Finished;
                                }
                            }
                            Some(_) => return Err(HttpBodyDecodeError::PrematureClose),
                            None => self.state = DecodeState::Finished,
                        }
                        continue;
                    }

                    self.received += nr as u64;
                    if let Some(progress) = &self.progress {
                        progress(self.received, self.content_length);
                    }

                    let data = match &mut self.decoder {
                        Some(decoder) => decoder
                            .feed(&self.raw_buf[..nr])
                            .map_err(HttpBodyDecodeError::DecodeFailed)?,
                        None => Bytes::copy_from_slice(&self.raw_buf[..nr]),
                    };
                    if self.sniff_html_end(&data) {
                        debug!("end of html document found in unsized body");
                        self.state = DecodeState::Finished;
                    }
                    if data.is_empty() {
                        continue;
                    }
                    self.account_decoded(data.len())?;
                    return Ok(Some(data));
                }
            }
        }
    }

    pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, HttpBodyDecodeError> {
        let mut total = 0;
        while let Some(data) = self.next_chunk().await? {
            buf.extend_from_slice(&data);
            total += data.len();
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    use flate2::Compression;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use tokio::io::Result;
    use tokio_util::io::StreamReader;

    const TEXT: &[u8] = b"Wikipedia is a free online encyclopedia";

    fn split_reader(parts: Vec<Vec<u8>>) -> RecvBufReader<impl AsyncRead + Unpin> {
        let stream = tokio_stream::iter(parts.into_iter().map(|p| Result::Ok(Bytes::from(p))));
        RecvBufReader::new(StreamReader::new(stream))
    }

    fn chunked(data: &[u8], piece: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for p in data.chunks(piece) {
            out.extend_from_slice(format!("{:x}\r\n", p.len()).as_bytes());
            out.extend_from_slice(p);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0\r\n\r\n");
        out
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn brotli(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
            encoder.write_all(data).unwrap();
        }
        out
    }

    async fn decode_all<R: AsyncRead + Unpin>(
        reader: &mut RecvBufReader<R>,
        framing: HttpBodyFraming,
        coding: Option<ContentCoding>,
    ) -> (Vec<u8>, Option<u64>) {
        let mut decoder = HttpBodyDecoder::new(reader, framing, coding, u64::MAX).unwrap();
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).await.unwrap();
        assert!(decoder.is_finished());
        (buf, decoder.content_length())
    }

    #[tokio::test]
    async fn identity_sized() {
        let mut body = TEXT.to_vec();
        body.extend_from_slice(b"HTTP/1.1 200 OK\r\n");
        let mut reader = split_reader(vec![body]);
        let (data, len) =
            decode_all(&mut reader, HttpBodyFraming::Sized(TEXT.len() as u64), None).await;
        assert_eq!(data, TEXT);
        assert_eq!(len, Some(TEXT.len() as u64));
        // the next response is left in the buffer
        assert_eq!(reader.buffered(), b"HTTP/1.1 200 OK\r\n");
    }

    #[tokio::test]
    async fn identity_chunked() {
        let mut reader = split_reader(vec![
            b"4\r\nWiki\r\n5\r\npedia\r\n".to_vec(),
            b"0\r\n\r\n".to_vec(),
        ]);
        let (data, len) = decode_all(&mut reader, HttpBodyFraming::Chunked, None).await;
        assert_eq!(data, b"Wikipedia");
        assert_eq!(len, Some(9));
    }

    #[tokio::test]
    async fn chunked_split_everywhere() {
        let body = chunked(TEXT, 5);
        let parts = body.iter().map(|b| vec![*b]).collect();
        let mut reader = split_reader(parts);
        let (data, _) = decode_all(&mut reader, HttpBodyFraming::Chunked, None).await;
        assert_eq!(data, TEXT);
    }

    #[tokio::test]
    async fn chunked_with_extension_and_trailer() {
        let mut reader = split_reader(vec![
            b"4;name=value\r\nWiki\r\n0\r\nExpires: never\r\n\r\nNEXT".to_vec(),
        ]);
        let (data, _) = decode_all(&mut reader, HttpBodyFraming::Chunked, None).await;
        assert_eq!(data, b"Wiki");
        assert_eq!(reader.buffered(), b"NEXT");
    }

    #[tokio::test]
    async fn identity_unsized() {
        let mut reader = split_reader(vec![b"Wiki".to_vec(), b"pedia".to_vec()]);
        let (data, len) = decode_all(&mut reader, HttpBodyFraming::Unsized, None).await;
        assert_eq!(data, b"Wikipedia");
        assert_eq!(len, Some(9));
    }

    #[tokio::test]
    async fn gzip_all_framings() {
        let compressed = gzip(TEXT);

        let mut reader = split_reader(vec![chunked(&compressed, 7)]);
        let (data, len) =
            decode_all(&mut reader, HttpBodyFraming::Chunked, Some(ContentCoding::Gzip)).await;
        assert_eq!(data, TEXT);
        assert_eq!(len, Some(TEXT.len() as u64));

        let mut reader = split_reader(vec![compressed.clone()]);
        let (data, len) = decode_all(
            &mut reader,
            HttpBodyFraming::Sized(compressed.len() as u64),
            Some(ContentCoding::Gzip),
        )
        .await;
        assert_eq!(data, TEXT);
        assert_eq!(len, Some(compressed.len() as u64));

        let mut reader = split_reader(vec![compressed]);
        let (data, _) =
            decode_all(&mut reader, HttpBodyFraming::Unsized, Some(ContentCoding::Gzip)).await;
        assert_eq!(data, TEXT);
    }

    #[tokio::test]
    async fn deflate_all_framings() {
        let compressed = zlib(TEXT);

        let mut reader = split_reader(vec![chunked(&compressed, 3)]);
        let (data, _) =
            decode_all(&mut reader, HttpBodyFraming::Chunked, Some(ContentCoding::Deflate)).await;
        assert_eq!(data, TEXT);

        let mut reader = split_reader(vec![compressed.clone()]);
        let (data, _) = decode_all(
            &mut reader,
            HttpBodyFraming::Sized(compressed.len() as u64),
            Some(ContentCoding::Deflate),
        )
        .await;
        assert_eq!(data, TEXT);

        let mut reader = split_reader(vec![compressed]);
        let (data, _) =
            decode_all(&mut reader, HttpBodyFraming::Unsized, Some(ContentCoding::Deflate)).await;
        assert_eq!(data, TEXT);
    }

    #[tokio::test]
    async fn brotli_all_framings() {
        let compressed = brotli(TEXT);

        let mut reader = split_reader(vec![chunked(&compressed, 10)]);
        let (data, _) =
            decode_all(&mut reader, HttpBodyFraming::Chunked, Some(ContentCoding::Brotli)).await;
        assert_eq!(data, TEXT);

        let mut reader = split_reader(vec![compressed.clone()]);
        let (data, _) = decode_all(
            &mut reader,
            HttpBodyFraming::Sized(compressed.len() as u64),
            Some(ContentCoding::Brotli),
        )
        .await;
        assert_eq!(data, TEXT);

        let mut reader = split_reader(vec![compressed]);
        let (data, _) =
            decode_all(&mut reader, HttpBodyFraming::Unsized, Some(ContentCoding::Brotli)).await;
        assert_eq!(data, TEXT);
    }

    #[tokio::test]
    async fn premature_close() {
        let mut reader = split_reader(vec![b"Wiki".to_vec()]);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Sized(9), None, u64::MAX).unwrap();
        let mut buf = Vec::new();
        let e = decoder.read_to_end(&mut buf).await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::PrematureClose));
        assert_eq!(buf, b"Wiki");

        let mut reader = split_reader(vec![b"9\r\nWiki".to_vec()]);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Chunked, None, u64::MAX).unwrap();
        let e = decoder.read_to_end(&mut buf).await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::PrematureClose));
    }

    #[tokio::test]
    async fn invalid_chunk_size() {
        let mut reader = split_reader(vec![b"zz\r\nWiki\r\n0\r\n\r\n".to_vec()]);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Chunked, None, u64::MAX).unwrap();
        let mut buf = Vec::new();
        let e = decoder.read_to_end(&mut buf).await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::InvalidChunkLine(_)));
    }

    #[tokio::test]
    async fn body_too_large() {
        let mut reader = split_reader(vec![TEXT.to_vec()]);
        let r = HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Sized(100), None, 10);
        assert!(matches!(r, Err(HttpBodyDecodeError::BodyTooLarge(10))));

        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Unsized, None, 10).unwrap();
        let mut buf = Vec::new();
        let e = decoder.read_to_end(&mut buf).await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::BodyTooLarge(10)));

        let compressed = gzip(TEXT);
        let mut reader = split_reader(vec![chunked(&compressed, 16)]);
        let mut decoder = HttpBodyDecoder::new(
            &mut reader,
            HttpBodyFraming::Chunked,
            Some(ContentCoding::Gzip),
            10,
        )
        .unwrap();
        let e = decoder.read_to_end(&mut buf).await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::BodyTooLarge(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn data_timeout() {
        let (client, _server) = tokio::io::duplex(64);
        let mut reader = RecvBufReader::new(client);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Sized(4), None, u64::MAX).unwrap();
        decoder.set_data_timeout(Duration::from_secs(1));
        let e = decoder.next_chunk().await.unwrap_err();
        assert!(matches!(e, HttpBodyDecodeError::DataTimeout));
    }

    #[tokio::test]
    async fn html_sniffing() {
        let mut reader = split_reader(vec![
            b"<HTML><body>hi</bo".to_vec(),
            b"dy></ht".to_vec(),
            b"ml>".to_vec(),
            b"garbage".to_vec(),
        ]);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Unsized, None, u64::MAX).unwrap();
        decoder.set_html_sniffing(true);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"<HTML><body>hi</body></html>");
    }

    #[tokio::test]
    async fn progress() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_c = seen.clone();
        let mut reader = split_reader(vec![b"Wiki".to_vec(), b"pedia".to_vec()]);
        let mut decoder =
            HttpBodyDecoder::new(&mut reader, HttpBodyFraming::Sized(9), None, u64::MAX).unwrap();
        decoder.set_progress(Arc::new(move |received: u64, total: Option<u64>| {
            assert_eq!(total, Some(9));
            seen_c.store(received, Ordering::Relaxed);
        }));
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).await.unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 9);
        assert_eq!(decoder.received(), 9);
    }
}
