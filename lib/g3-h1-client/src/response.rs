/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Version};
use tokio_util::sync::CancellationToken;
use url::Url;

use g3_http::body::HttpBodyDecoder;
use g3_http::client::HttpResponseHead;
use g3_http::header::{Charset, HttpCookies};
use g3_io_ext::StatsStream;

use crate::HttpClientError;
use crate::connection::{BoxHttpStream, HttpConnectionState};

/// A followed redirection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectRecord {
    pub from: Url,
    pub to: Url,
    pub code: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

pub(crate) type HttpConnectionBodyDecoder<'a> = HttpBodyDecoder<'a, StatsStream<BoxHttpStream>>;

pub(crate) enum HttpClientBody<'a> {
    Empty,
    Reading(HttpConnectionBodyDecoder<'a>),
    Consumed,
}

/// A received response.
///
/// The body is read from the connection of the client, so the client is
/// borrowed until the response is dropped. A body that is not read to the
/// end makes the next request use a new connection.
pub struct HttpClientResponse<'a> {
    head: HttpResponseHead,
    url: Url,
    redirects: Vec<RedirectRecord>,
    elapsed: Duration,
    body: HttpClientBody<'a>,
    conn_state: &'a mut HttpConnectionState,
    cancel: CancellationToken,
}

impl<'a> HttpClientResponse<'a> {
    pub(crate) fn new(
        head: HttpResponseHead,
        url: Url,
        redirects: Vec<RedirectRecord>,
        elapsed: Duration,
        body: HttpClientBody<'a>,
        conn_state: &'a mut HttpConnectionState,
        cancel: CancellationToken,
    ) -> Self {
        HttpClientResponse {
            head,
            url,
            redirects,
            elapsed,
            body,
            conn_state,
            cancel,
        }
    }

    #[inline]
    pub fn head(&self) -> &HttpResponseHead {
        &self.head
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.head.code
    }

    pub fn reason(&self) -> &str {
        &self.head.reason
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Cookies set by this response
    pub fn cookies(&self) -> &HttpCookies {
        &self.head.cookies
    }

    /// The url of the final request, after redirections
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn redirects(&self) -> &[RedirectRecord] {
        &self.redirects
    }

    /// Time from sending the request to receiving the response head
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The declared content length, or the decoded body size once the body is read
    pub fn content_length(&self) -> Option<u64> {
        self.head.content_length()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.head.content_type()
    }

    pub fn charset(&self) -> Charset {
        self.head.charset()
    }

    pub fn is_empty_body(&self) -> bool {
        self.head.is_empty_body()
    }

    /// Get the next piece of the decoded body, `None` at the end.
    ///
    /// Fails with [`HttpClientError::ContentStateError`] once the end has been returned.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, HttpClientError> {
        match self.body {
            HttpClientBody::Empty => {
                self.body = HttpClientBody::Consumed;
                return Ok(None);
            }
            HttpClientBody::Consumed => return Err(HttpClientError::ContentStateError),
            HttpClientBody::Reading(_) => {}
        }
        let HttpClientBody::Reading(decoder) = &mut self.body else {
            return Err(HttpClientError::ContentStateError);
        };

        let r = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(HttpClientError::Cancelled),
            r = decoder.next_chunk() => r.map_err(HttpClientError::from),
        };
        match r {
            Ok(Some(data)) => Ok(Some(data)),
            Ok(None) => {
                if self.head.content_length().is_none()
                    && let Some(len) = decoder.content_length()
                {
                    self.head.set_content_length(len);
                }
                self.conn_state.body_finished();
                self.body = HttpClientBody::Consumed;
                Ok(None)
            }
            Err(e) => {
                self.conn_state.set_close();
                self.body = HttpClientBody::Consumed;
                Err(e)
            }
        }
    }

    pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, HttpClientError> {
        if matches!(self.body, HttpClientBody::Consumed) {
            return Err(HttpClientError::ContentStateError);
        }
        let mut total = 0;
        while let Some(data) = self.next_chunk().await? {
            buf.extend_from_slice(&data);
            total += data.len();
        }
        Ok(total)
    }

    pub async fn bytes(&mut self) -> Result<Bytes, HttpClientError> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    /// Read the body as text in the charset of the response
    pub async fn text(&mut self) -> Result<String, HttpClientError> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(self.head.charset().decode(&buf).into_owned())
    }
}
