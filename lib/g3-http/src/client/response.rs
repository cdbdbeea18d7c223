/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use log::debug;
use tokio::io::AsyncRead;
use url::{Position, Url};

use g3_io_ext::RecvBufReader;

use super::HttpResponseParseError;
use crate::body::{HttpBodyDecodeError, HttpBodyFraming};
use crate::header::{
    Charset, ContentCoding, HttpCookies, HttpKeepAliveParams, connection_has_close,
    content_type_charset,
};
use crate::{HttpHeaderLine, HttpLineParseError, HttpStatusLine};

#[derive(Debug)]
pub struct HttpResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    /// all headers except `Set-Cookie`
    pub headers: HeaderMap,
    pub cookies: HttpCookies,
    content_length: Option<u64>,
    content_type: Option<String>,
    content_encoding: Option<String>,
    transfer_encoding: Option<String>,
    connection: Option<String>,
    location: Option<String>,
    charset: Charset,
    keep_alive: HttpKeepAliveParams,
    header_size: usize,
    empty_body: bool,
}

impl HttpResponseHead {
    fn new(version: Version, code: u16, reason: String, charset: Charset) -> Self {
        HttpResponseHead {
            version,
            code,
            reason,
            headers: HeaderMap::new(),
            cookies: HttpCookies::default(),
            content_length: None,
            content_type: None,
            content_encoding: None,
            transfer_encoding: None,
            connection: None,
            location: None,
            charset,
            keep_alive: HttpKeepAliveParams::default(),
            header_size: 0,
            empty_body: false,
        }
    }

    /// Read and parse a response head.
    ///
    /// Interim `1xx` responses other than `101` are skipped. The relative
    /// `Location` value is resolved against `request_url`, and `charset` is
    /// used if the `Content-Type` header has no charset parameter.
    pub async fn parse<R>(
        reader: &mut RecvBufReader<R>,
        method: &Method,
        request_url: &Url,
        charset: Charset,
        max_header_size: usize,
    ) -> Result<Self, HttpResponseParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header_size: usize = 0;
        loop {
            let block = reader
                .limited_read_delimited(false, max_header_size)
                .await
                .map_err(|e| HttpResponseParseError::from_recv_error(e, max_header_size))?;
            if block.is_empty() {
                return if header_size == 0 {
                    Err(HttpResponseParseError::EmptyResponse)
                } else {
                    Err(HttpResponseParseError::RemoteClosed)
                };
            }
            if !block.ends_with(b"\n\n") && !block.ends_with(b"\r\n\r\n") {
                return Err(HttpResponseParseError::RemoteClosed);
            }
            header_size += block.len();

            let mut rsp = HttpResponseHead::parse_block(block, charset)?;
            if (100..200).contains(&rsp.code) && rsp.code != 101 {
                debug!("skip interim response {} {}", rsp.code, rsp.reason);
                continue;
            }

            rsp.header_size = header_size;
            rsp.post_parse(method, request_url);
            return Ok(rsp);
        }
    }

    fn parse_block(block: &[u8], charset: Charset) -> Result<Self, HttpResponseParseError> {
        let mut lines = block.split(|c| *c == b'\n');
        let status_line = lines.next().unwrap_or_default();
        let mut rsp = HttpResponseHead::build_from_status_line(status_line, charset)?;

        for line in lines {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            rsp.parse_header_line(line)?;
        }
        Ok(rsp)
    }

    fn build_from_status_line(
        line_buf: &[u8],
        charset: Charset,
    ) -> Result<Self, HttpResponseParseError> {
        let rsp =
            HttpStatusLine::parse(line_buf).map_err(HttpResponseParseError::InvalidStatusLine)?;
        let version = match rsp.version {
            0 => Version::HTTP_10,
            1 => Version::HTTP_11,
            _ => return Err(HttpResponseParseError::InvalidVersion(Version::HTTP_2)),
        };

        Ok(HttpResponseHead::new(
            version,
            rsp.code,
            rsp.reason.to_string(),
            charset,
        ))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpResponseParseError> {
        let header =
            HttpHeaderLine::parse(line_buf).map_err(HttpResponseParseError::InvalidHeaderLine)?;
        self.handle_header(header)
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpResponseParseError> {
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "set-cookie" => {
                if !self.cookies.parse_set_cookie(header.value) {
                    debug!("ignore invalid set-cookie value {}", header.value);
                }
                return Ok(());
            }
            "content-length" => {
                if self.content_length.is_none() {
                    let content_length = u64::from_str(header.value)
                        .map_err(|_| HttpResponseParseError::InvalidContentLength)?;
                    self.content_length = Some(content_length);
                }
            }
            "content-type" => set_first(&mut self.content_type, header.value),
            "content-encoding" => set_first(&mut self.content_encoding, header.value),
            "transfer-encoding" => set_first(&mut self.transfer_encoding, header.value),
            "connection" => set_first(&mut self.connection, header.value),
            "location" => set_first(&mut self.location, header.value),
            "keep-alive" => {
                let params = HttpKeepAliveParams::parse(header.value);
                if params.timeout.is_some() {
                    self.keep_alive.timeout = params.timeout;
                }
                if params.max.is_some() {
                    self.keep_alive.max = params.max;
                }
            }
            _ => {}
        }

        let value = HeaderValue::from_bytes(header.value.as_bytes()).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    fn post_parse(&mut self, method: &Method, request_url: &Url) {
        if let Some(content_type) = &self.content_type {
            if let Some(label) = content_type_charset(content_type) {
                self.charset = Charset::from_label(label);
            }
        }

        if let Some(location) = self.location.take() {
            self.location = Some(normalize_location(&location, request_url));
        }

        self.empty_body = self.content_length == Some(0)
            || *method == Method::HEAD
            || self.code < 200
            || self.code == 204
            || self.code == 304;
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Set the content length found after the body is decoded
    pub fn set_content_length(&mut self, len: u64) {
        self.content_length = Some(len);
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    pub fn transfer_encoding(&self) -> Option<&str> {
        self.transfer_encoding.as_deref()
    }

    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn connection_close(&self) -> bool {
        match &self.connection {
            Some(v) => connection_has_close(v),
            None => self.version == Version::HTTP_10,
        }
    }

    /// The absolute redirect location
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Size of the header block, including skipped interim responses
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Header size plus the declared body size
    pub fn expected_total_length(&self) -> Option<u64> {
        self.content_length.map(|n| n + self.header_size as u64)
    }

    pub fn keep_alive_timeout(&self) -> Option<Duration> {
        self.keep_alive.timeout
    }

    pub fn keep_alive_max(&self) -> Option<usize> {
        self.keep_alive.max
    }

    pub fn is_empty_body(&self) -> bool {
        self.empty_body
    }

    pub fn is_chunked(&self) -> bool {
        self.transfer_encoding
            .as_ref()
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    }

    /// How the end of the body is found, `None` if there is no body
    pub fn body_framing(&self) -> Option<HttpBodyFraming> {
        if self.empty_body {
            None
        } else if self.is_chunked() {
            Some(HttpBodyFraming::Chunked)
        } else if let Some(len) = self.content_length {
            Some(HttpBodyFraming::Sized(len))
        } else {
            Some(HttpBodyFraming::Unsized)
        }
    }

    pub fn content_coding(&self) -> Result<Option<ContentCoding>, HttpBodyDecodeError> {
        match &self.content_encoding {
            Some(v) => ContentCoding::parse(v)
                .map_err(|v| HttpBodyDecodeError::UnsupportedCompression(v.to_string())),
            None => Ok(None),
        }
    }
}

fn set_first(field: &mut Option<String>, value: &str) {
    if field.is_none() {
        *field = Some(value.to_string());
    }
}

fn normalize_location(location: &str, request_url: &Url) -> String {
    if location.starts_with("//") {
        format!("{}:{location}", request_url.scheme())
    } else if location.starts_with('/') {
        format!(
            "{}://{}{location}",
            request_url.scheme(),
            &request_url[Position::BeforeHost..Position::AfterPort]
        )
    } else {
        location.to_string()
    }
}
