/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use g3_http::body::DEFAULT_MAX_CHUNK_LINE_SIZE;
use g3_http::header::Charset;
use g3_types::net::{HttpAuth, HttpKeepAliveConfig, Proxy, RustlsClientConfigBuilder};

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;
const DEFAULT_RECV_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpRedirectConfig {
    pub enable: bool,
    pub limit: usize,
    /// only follow a location on another host, or the same host with another scheme
    pub only_other_domain: bool,
}

impl Default for HttpRedirectConfig {
    fn default() -> Self {
        HttpRedirectConfig {
            enable: true,
            limit: 3,
            only_other_domain: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpReconnectConfig {
    pub enable: bool,
    /// retries after the first attempt
    pub limit: usize,
    pub delay: Duration,
}

impl Default for HttpReconnectConfig {
    fn default() -> Self {
        HttpReconnectConfig {
            enable: true,
            limit: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub rw_timeout: Duration,
    pub data_timeout: Duration,
    pub keep_alive: HttpKeepAliveConfig,
    pub redirect: HttpRedirectConfig,
    pub reconnect: HttpReconnectConfig,
    pub content_encoding: bool,
    pub cookies: bool,
    pub protocol_error: bool,
    pub max_receive_buffer_size: u64,
    pub proxy: Option<Proxy>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub accept: String,
    pub accept_language: String,
    pub referer: Option<String>,
    /// literal `Authorization` value, takes precedence over `auth`
    pub authorization: Option<String>,
    pub auth: HttpAuth,
    pub charset: Charset,
    pub headers: Vec<(String, String)>,
    pub max_header_size: usize,
    pub max_chunk_line_size: usize,
    pub recv_buffer_size: usize,
    pub legacy_html_sniffing: bool,
    pub tls: RustlsClientConfigBuilder,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpClientConfig {
            connect_timeout: DEFAULT_TIMEOUT,
            rw_timeout: DEFAULT_TIMEOUT,
            data_timeout: DEFAULT_TIMEOUT,
            keep_alive: HttpKeepAliveConfig::default(),
            redirect: HttpRedirectConfig::default(),
            reconnect: HttpReconnectConfig::default(),
            content_encoding: true,
            cookies: true,
            protocol_error: true,
            max_receive_buffer_size: i32::MAX as u64,
            proxy: None,
            base_url: None,
            user_agent: None,
            accept: "*/*".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: None,
            authorization: None,
            auth: HttpAuth::None,
            charset: Charset::Utf8,
            headers: Vec::new(),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_chunk_line_size: DEFAULT_MAX_CHUNK_LINE_SIZE,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            legacy_html_sniffing: false,
            tls: RustlsClientConfigBuilder::default(),
        }
    }
}

impl HttpClientConfig {
    pub(crate) fn has_persistent_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}
