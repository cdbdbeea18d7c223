/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::Method;
use log::warn;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::{Position, Url};

use g3_http::body::HttpBodyDecoder;
use g3_http::client::{HttpRequestHead, HttpResponseHead, HttpResponseParseError};
use g3_http::header::{Charset, HttpCookies};
use g3_io_ext::{NilStreamIoStats, StatsStream};

use crate::connection::{
    BoxHttpStream, HttpConnection, HttpConnectionProvider, HttpDestination,
    TcpConnectionProvider,
};
use crate::log_msg;
use crate::progress::UploadProgressStats;
use crate::response::HttpClientBody;
use crate::{
    HttpClientConfig, HttpClientError, HttpClientRequest, HttpClientResponse, HttpContent,
    HttpTransferProgress, RedirectRecord,
};

struct ReceivedResponse {
    head: HttpResponseHead,
    url: Url,
    redirects: Vec<RedirectRecord>,
    elapsed: Duration,
}

/// A HTTP/1.1 client that keeps at most one connection.
///
/// Requests are sent one at a time, and the response borrows the client
/// until it is dropped.
pub struct HttpClient<P = TcpConnectionProvider> {
    config: HttpClientConfig,
    provider: P,
    conn: Option<HttpConnection>,
    cookies: HttpCookies,
    temp_headers: Vec<(String, String)>,
    cancel: CancellationToken,
    upload_progress: Option<HttpTransferProgress>,
    download_progress: Option<HttpTransferProgress>,
    disposed: bool,
}

impl HttpClient<TcpConnectionProvider> {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let provider = TcpConnectionProvider::new(&config)?;
        Ok(HttpClient::with_provider(config, provider))
    }
}

impl<P: HttpConnectionProvider> HttpClient<P> {
    pub fn with_provider(config: HttpClientConfig, provider: P) -> Self {
        HttpClient {
            config,
            provider,
            conn: None,
            cookies: HttpCookies::default(),
            temp_headers: Vec::new(),
            cancel: CancellationToken::new(),
            upload_progress: None,
            download_progress: None,
            disposed: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Cookies collected from responses and added by the caller
    #[inline]
    pub fn cookies(&self) -> &HttpCookies {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut HttpCookies {
        &mut self.cookies
    }

    #[inline]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Replace the token checked by all following calls.
    ///
    /// A cancelled token stays cancelled, so a new one is needed to use the
    /// client again after a cancellation.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    pub fn set_upload_progress(&mut self, progress: HttpTransferProgress) {
        self.upload_progress = Some(progress);
    }

    pub fn set_download_progress(&mut self, progress: HttpTransferProgress) {
        self.download_progress = Some(progress);
    }

    /// Add a header for the next request only, redirections excluded
    pub fn add_temp_header(&mut self, name: &str, value: &str) -> Result<(), HttpClientError> {
        if name.trim().is_empty() {
            return Err(HttpClientError::InvalidArgument(
                "empty header name".to_string(),
            ));
        }
        self.temp_headers
            .push((name.trim().to_string(), value.trim().to_string()));
        Ok(())
    }

    /// Add cookies from a `Cookie` header line or value like `a=1; b=2`.
    ///
    /// Returns the number of cookies added.
    pub fn add_raw_cookie(&mut self, source: &str) -> Result<usize, HttpClientError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(HttpClientError::InvalidArgument(
                "empty cookie string".to_string(),
            ));
        }
        if !self.config.cookies {
            return Err(HttpClientError::InvalidArgument(
                "cookies are disabled".to_string(),
            ));
        }
        let pairs = match source.get(..7) {
            Some(prefix) if prefix.eq_ignore_ascii_case("cookie:") => &source[7..],
            _ => source,
        };
        Ok(self.cookies.parse_cookie_pairs(pairs))
    }

    #[inline]
    pub fn has_connection(&self) -> bool {
        self.conn.is_some()
    }

    /// Drop the current connection
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            log_msg!(
                "close connection to {} after {} requests",
                conn.destination,
                conn.state.served()
            );
        }
    }

    /// Close the connection and refuse all following requests
    pub fn dispose(&mut self) {
        self.close();
        self.temp_headers.clear();
        self.disposed = true;
    }

    pub async fn get(&mut self, url: &str) -> Result<HttpClientResponse<'_>, HttpClientError> {
        self.send(HttpClientRequest::get(url)).await
    }

    pub async fn head(&mut self, url: &str) -> Result<HttpClientResponse<'_>, HttpClientError> {
        self.send(HttpClientRequest::new(Method::HEAD, url)).await
    }

    pub async fn post<C: HttpContent + 'static>(
        &mut self,
        url: &str,
        body: C,
    ) -> Result<HttpClientResponse<'_>, HttpClientError> {
        self.send(HttpClientRequest::post(url, body)).await
    }

    /// Send the request, following redirections and reconnecting on
    /// transport failures as configured, and return the final response
    /// with its body not yet read.
    pub async fn send(
        &mut self,
        req: HttpClientRequest,
    ) -> Result<HttpClientResponse<'_>, HttpClientError> {
        if self.disposed {
            return Err(HttpClientError::ObjectDisposed);
        }
        if self.cancel.is_cancelled() {
            return Err(HttpClientError::Cancelled);
        }

        let cancel = self.cancel.clone();
        let r = tokio::select! {
            biased;

            _ = cancel.cancelled() => None,
            r = self.send_request(req) => Some(r),
        };
        let received = match r {
            Some(r) => r?,
            None => {
                self.close();
                return Err(HttpClientError::Cancelled);
            }
        };

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_response_status(received.head.code, &received.head.reason);

        let Some(conn) = self.conn.as_mut() else {
            return Err(HttpClientError::ConnectionError(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection lost after response head received",
            )));
        };
        let HttpConnection { reader, state, .. } = conn;

        let body = match received.head.body_framing() {
            None => HttpClientBody::Empty,
            Some(framing) => {
                let coding = match received.head.content_coding() {
                    Ok(coding) => coding,
                    Err(e) => {
                        state.set_close();
                        return Err(e.into());
                    }
                };
                let mut decoder = match HttpBodyDecoder::new(
                    reader,
                    framing,
                    coding,
                    self.config.max_receive_buffer_size,
                ) {
                    Ok(d) => d,
                    Err(e) => {
                        state.set_close();
                        return Err(e.into());
                    }
                };
                decoder.set_data_timeout(self.config.data_timeout);
                decoder.set_max_chunk_line_size(self.config.max_chunk_line_size);
                decoder.set_html_sniffing(self.config.legacy_html_sniffing);
                if let Some(progress) = &self.download_progress {
                    decoder.set_progress(progress.clone());
                }
                HttpClientBody::Reading(decoder)
            }
        };

        Ok(HttpClientResponse::new(
            received.head,
            received.url,
            received.redirects,
            received.elapsed,
            body,
            state,
            self.cancel.clone(),
        ))
    }

    fn resolve_url(&self, url: &str) -> Result<Url, HttpClientError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(HttpClientError::InvalidArgument("empty url".to_string()));
        }
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let Some(base) = &self.config.base_url else {
                    return Err(HttpClientError::InvalidArgument(format!(
                        "relative url {url} without base url"
                    )));
                };
                let full = format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                );
                Url::parse(&full).map_err(|e| {
                    HttpClientError::InvalidArgument(format!("invalid url {full}: {e}"))
                })?
            }
            Err(e) => {
                return Err(HttpClientError::InvalidArgument(format!(
                    "invalid url {url}: {e}"
                )));
            }
        };
        Ok(parsed)
    }

    async fn send_request(
        &mut self,
        req: HttpClientRequest,
    ) -> Result<ReceivedResponse, HttpClientError> {
        let HttpClientRequest {
            mut method,
            url,
            headers,
            mut body,
        } = req;
        let mut url = self.resolve_url(&url)?;
        let mut temp_headers = std::mem::take(&mut self.temp_headers);
        let mut redirects: Vec<RedirectRecord> = Vec::new();
        let mut retries: usize = 0;

        loop {
            let time_start = Instant::now();
            let head = match self
                .round_trip(&method, &url, &headers, &temp_headers, body.as_deref())
                .await
            {
                Ok(head) => head,
                Err(e) if e.is_reconnectable() && self.config.reconnect.enable => {
                    self.close();
                    if retries >= self.config.reconnect.limit {
                        return Err(HttpClientError::ReconnectExhausted {
                            url,
                            attempts: retries + 1,
                            source: Box::new(e),
                        });
                    }
                    retries += 1;
                    log_msg!(
                        "request to {} failed: {}, retry #{} in {:?}",
                        url,
                        e,
                        retries,
                        self.config.reconnect.delay
                    );
                    tokio::time::sleep(self.config.reconnect.delay).await;
                    continue;
                }
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            };
            retries = 0;
            let elapsed = time_start.elapsed();

            if self.config.cookies {
                self.cookies.merge(&head.cookies);
            }

            if self.config.protocol_error && head.code >= 400 {
                let data = match self.read_error_body(&head).await {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("failed to read body of {} response: {e}", head.code);
                        self.close();
                        Bytes::new()
                    }
                };
                return Err(HttpClientError::ProtocolStatusError {
                    code: head.code,
                    reason: head.reason,
                    body: data,
                });
            }

            if self.config.redirect.enable
                && redirects.len() < self.config.redirect.limit
                && let Some(to) = self.redirect_target(&url, &head)
            {
                log_msg!("redirect {} {} -> {}", head.code, url, to);
                redirects.push(RedirectRecord {
                    from: url,
                    to: to.clone(),
                    code: head.code,
                    content_length: head.content_length(),
                    content_type: head.content_type().map(|s| s.to_string()),
                });
                self.close();
                url = to;
                method = Method::GET;
                body = None;
                temp_headers.clear();
                continue;
            }

            return Ok(ReceivedResponse {
                head,
                url,
                redirects,
                elapsed,
            });
        }
    }

    fn redirect_target(&self, url: &Url, head: &HttpResponseHead) -> Option<Url> {
        let location = head.location()?;
        let to = match url.join(location) {
            Ok(u) => u,
            Err(e) => {
                warn!("invalid redirect location {location}: {e}");
                return None;
            }
        };
        if !self.config.redirect.only_other_domain {
            return Some(to);
        }
        let same_host = match (url.host_str(), to.host_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };
        if !same_host || url.scheme() != to.scheme() {
            Some(to)
        } else {
            None
        }
    }

    async fn round_trip(
        &mut self,
        method: &Method,
        url: &Url,
        headers: &[(String, String)],
        temp_headers: &[(String, String)],
        body: Option<&dyn HttpContent>,
    ) -> Result<HttpResponseHead, HttpClientError> {
        let destination = HttpDestination::from_url(url)?;
        let body = if *method == Method::GET { None } else { body };

        let mut conn = match self.conn.take() {
            Some(conn) if conn.reusable_for(&destination, &self.config.keep_alive) => {
                log_msg!(
                    "reuse connection to {} after {} requests",
                    conn.destination,
                    conn.state.served()
                );
                conn
            }
            _ => {
                let stream = self.provider.new_connection(&destination).await?;
                log_msg!("new connection to {}", destination);
                HttpConnection::new(destination, stream, self.config.recv_buffer_size)
            }
        };

        let req_head =
            self.build_request_head(method, url, &conn.destination, headers, temp_headers, body);
        let buf = req_head.serialize();
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_request_head(&buf);

        if let (Some(progress), Some(content)) = (&self.upload_progress, body) {
            conn.set_stats(Arc::new(UploadProgressStats::new(
                buf.len(),
                content.content_length(),
                progress.clone(),
            )));
        }
        let r = tokio::time::timeout(
            self.config.rw_timeout,
            write_request(conn.reader.get_mut(), &buf, body),
        )
        .await;
        conn.set_stats(Arc::new(NilStreamIoStats::default()));
        match r {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(HttpClientError::TransmissionError(e)),
            Err(_) => {
                return Err(HttpClientError::TransmissionError(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out to send request",
                )));
            }
        }

        let head = match tokio::time::timeout(
            self.config.rw_timeout,
            HttpResponseHead::parse(
                &mut conn.reader,
                method,
                url,
                self.config.charset,
                self.config.max_header_size,
            ),
        )
        .await
        {
            Ok(Ok(head)) => head,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(HttpResponseParseError::IoFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out to receive response head",
                ))
                .into());
            }
        };
        conn.state
            .update(&head, self.config.keep_alive.is_enabled());
        self.conn = Some(conn);
        Ok(head)
    }

    fn build_request_head(
        &self,
        method: &Method,
        url: &Url,
        destination: &HttpDestination,
        headers: &[(String, String)],
        temp_headers: &[(String, String)],
        body: Option<&dyn HttpContent>,
    ) -> HttpRequestHead {
        let forward_proxy = destination.forward_proxy(self.config.proxy.as_ref());
        let target = if forward_proxy.is_some() {
            url[..Position::AfterQuery].to_string()
        } else {
            url[Position::BeforePath..Position::AfterQuery].to_string()
        };
        let mut head = HttpRequestHead::new(method.clone(), target);

        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => head.append("Host", format!("{host}:{port}")),
            None => head.append("Host", host),
        }
        if let Some(ua) = &self.config.user_agent {
            head.append("User-Agent", ua.as_str());
        }
        if !self.config.has_persistent_header("Accept") {
            head.append("Accept", self.config.accept.as_str());
        }
        if !self.config.has_persistent_header("Accept-Language") {
            head.append("Accept-Language", self.config.accept_language.as_str());
        }
        if self.config.content_encoding {
            head.append("Accept-Encoding", "deflate, gzip, br");
        }
        if let Some(v) = &self.config.authorization {
            head.append("Authorization", v.as_str());
        } else if let Some(v) = self.config.auth.header_value() {
            head.append("Authorization", v);
        }
        if let Some(referer) = &self.config.referer {
            head.append("Referer", referer.as_str());
        }
        match self.config.charset {
            Charset::Utf8 => head.append("Accept-Charset", "utf-8"),
            charset => head.append("Accept-Charset", format!("{},utf-8", charset.name())),
        }
        if *method != Method::GET {
            let len = body.map(|c| c.content_length()).unwrap_or(0);
            if len > 0
                && let Some(content_type) = body.and_then(|c| c.content_type())
            {
                head.append("Content-Type", content_type);
            }
            head.append("Content-Length", len.to_string());
        }
        let keep_alive = if self.config.keep_alive.is_enabled() {
            "keep-alive"
        } else {
            "close"
        };
        if let Some(proxy) = forward_proxy {
            if let Some(v) = proxy.auth.header_value() {
                head.append("Proxy-Authorization", v);
            }
            head.append("Proxy-Connection", keep_alive);
        } else {
            head.append("Connection", keep_alive);
        }
        if self.config.cookies
            && let Some(v) = self.cookies.to_header_value()
        {
            head.append("Cookie", v);
        }
        for (name, value) in self
            .config
            .headers
            .iter()
            .chain(temp_headers)
            .chain(headers)
        {
            head.append(name.as_str(), value.as_str());
        }
        head
    }

    async fn read_error_body(&mut self, head: &HttpResponseHead) -> Result<Bytes, HttpClientError> {
        let Some(framing) = head.body_framing() else {
            return Ok(Bytes::new());
        };
        let Some(conn) = self.conn.as_mut() else {
            return Ok(Bytes::new());
        };
        let coding = head.content_coding()?;
        let mut decoder = HttpBodyDecoder::new(
            &mut conn.reader,
            framing,
            coding,
            self.config.max_receive_buffer_size,
        )?;
        decoder.set_data_timeout(self.config.data_timeout);
        decoder.set_max_chunk_line_size(self.config.max_chunk_line_size);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).await?;
        conn.state.body_finished();
        Ok(Bytes::from(buf))
    }
}

async fn write_request(
    writer: &mut StatsStream<BoxHttpStream>,
    head: &[u8],
    body: Option<&dyn HttpContent>,
) -> io::Result<()> {
    writer.write_all(head).await?;
    if let Some(content) = body
        && content.content_length() > 0
    {
        content.write(writer).await?;
    }
    writer.flush().await
}
