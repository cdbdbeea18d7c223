/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};

use bytes::Bytes;
use flate2::write::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::header::ContentCoding;

const BROTLI_BUFFER_SIZE: usize = 4096;

enum DecoderInner {
    Gzip(GzDecoder<Vec<u8>>),
    Zlib(ZlibDecoder<Vec<u8>>),
    RawDeflate(DeflateDecoder<Vec<u8>>),
    Brotli(Box<brotli::DecompressorWriter<Vec<u8>>>),
    /// deflate data with the zlib header not checked yet
    DeflateUndetermined(Vec<u8>),
}

fn is_zlib_header(b0: u8, b1: u8) -> bool {
    (b0 & 0x0F) == 0x08 && (u16::from(b0) * 256 + u16::from(b1)) % 31 == 0
}

/// A push based content decoder.
///
/// Compressed bytes are fed in and whatever could be decoded so far comes out,
/// so the caller never blocks on the decoder while waiting for more input.
pub struct ContentDecoder {
    inner: DecoderInner,
}

impl ContentDecoder {
    pub fn new(coding: ContentCoding) -> Self {
        let inner = match coding {
            ContentCoding::Gzip => DecoderInner::Gzip(GzDecoder::new(Vec::new())),
            ContentCoding::Deflate => DecoderInner::DeflateUndetermined(Vec::with_capacity(2)),
            ContentCoding::Brotli => DecoderInner::Brotli(Box::new(
                brotli::DecompressorWriter::new(Vec::new(), BROTLI_BUFFER_SIZE),
            )),
        };
        ContentDecoder { inner }
    }

    fn determine_deflate(pending: &[u8]) -> DecoderInner {
        if pending.len() >= 2 && is_zlib_header(pending[0], pending[1]) {
            DecoderInner::Zlib(ZlibDecoder::new(Vec::new()))
        } else {
            DecoderInner::RawDeflate(DeflateDecoder::new(Vec::new()))
        }
    }

    fn write_inner(&mut self, data: &[u8]) -> io::Result<Bytes> {
        let out = match &mut self.inner {
            DecoderInner::Gzip(d) => {
                d.write_all(data)?;
                d.flush()?;
                std::mem::take(d.get_mut())
            }
            DecoderInner::Zlib(d) => {
                d.write_all(data)?;
                d.flush()?;
                std::mem::take(d.get_mut())
            }
            DecoderInner::RawDeflate(d) => {
                d.write_all(data)?;
                d.flush()?;
                std::mem::take(d.get_mut())
            }
            DecoderInner::Brotli(d) => {
                d.write_all(data)?;
                std::mem::take(d.get_mut())
            }
            DecoderInner::DeflateUndetermined(pending) => {
                pending.extend_from_slice(data);
                if pending.len() < 2 {
                    return Ok(Bytes::new());
                }
                let pending = std::mem::take(pending);
                self.inner = Self::determine_deflate(&pending);
                return self.write_inner(&pending);
            }
        };
        Ok(Bytes::from(out))
    }

    pub fn feed(&mut self, data: &[u8]) -> io::Result<Bytes> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        self.write_inner(data)
    }

    /// Flush the remaining output and check the end of the compressed stream
    pub fn finish(mut self) -> io::Result<Bytes> {
        if let DecoderInner::DeflateUndetermined(pending) = &mut self.inner {
            if pending.is_empty() {
                return Ok(Bytes::new());
            }
            let pending = std::mem::take(pending);
            self.inner = Self::determine_deflate(&pending);
            let mut head = self.write_inner(&pending)?.to_vec();
            let tail = self.finish_inner()?;
            head.extend_from_slice(&tail);
            return Ok(Bytes::from(head));
        }
        self.finish_inner().map(Bytes::from)
    }

    fn finish_inner(&mut self) -> io::Result<Vec<u8>> {
        match &mut self.inner {
            DecoderInner::Gzip(d) => {
                d.try_finish()?;
                Ok(std::mem::take(d.get_mut()))
            }
            DecoderInner::Zlib(d) => {
                d.try_finish()?;
                Ok(std::mem::take(d.get_mut()))
            }
            DecoderInner::RawDeflate(d) => {
                d.try_finish()?;
                Ok(std::mem::take(d.get_mut()))
            }
            DecoderInner::Brotli(d) => {
                d.close()?;
                Ok(std::mem::take(d.get_mut()))
            }
            DecoderInner::DeflateUndetermined(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};

    const TEXT: &[u8] = b"Wikipedia is a free online encyclopedia, Wikipedia is a free online encyclopedia";

    fn decode_in_pieces(coding: ContentCoding, data: &[u8], piece: usize) -> Vec<u8> {
        let mut decoder = ContentDecoder::new(coding);
        let mut out = Vec::new();
        for p in data.chunks(piece) {
            out.extend_from_slice(&decoder.feed(p).unwrap());
        }
        out.extend_from_slice(&decoder.finish().unwrap());
        out
    }

    #[test]
    fn gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TEXT).unwrap();
        let data = encoder.finish().unwrap();

        assert_eq!(decode_in_pieces(ContentCoding::Gzip, &data, 1), TEXT);
        assert_eq!(decode_in_pieces(ContentCoding::Gzip, &data, 4096), TEXT);
    }

    #[test]
    fn deflate_zlib_wrapped() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TEXT).unwrap();
        let data = encoder.finish().unwrap();
        assert!(is_zlib_header(data[0], data[1]));

        assert_eq!(decode_in_pieces(ContentCoding::Deflate, &data, 1), TEXT);
        assert_eq!(decode_in_pieces(ContentCoding::Deflate, &data, 7), TEXT);
    }

    #[test]
    fn deflate_raw() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TEXT).unwrap();
        let data = encoder.finish().unwrap();

        assert_eq!(decode_in_pieces(ContentCoding::Deflate, &data, 3), TEXT);
        assert_eq!(decode_in_pieces(ContentCoding::Deflate, &data, 1024), TEXT);
    }

    #[test]
    fn brotli() {
        let mut data = Vec::new();
        {
            let mut encoder = brotli::CompressorWriter::new(&mut data, 4096, 5, 22);
            encoder.write_all(TEXT).unwrap();
        }

        assert_eq!(decode_in_pieces(ContentCoding::Brotli, &data, 5), TEXT);
        assert_eq!(decode_in_pieces(ContentCoding::Brotli, &data, 4096), TEXT);
    }

    #[test]
    fn truncated_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TEXT).unwrap();
        let data = encoder.finish().unwrap();

        let mut decoder = ContentDecoder::new(ContentCoding::Gzip);
        let _ = decoder.feed(&data[..data.len() / 2]).unwrap();
        assert!(decoder.finish().is_err());
    }
}
