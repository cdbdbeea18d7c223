/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod debug;
pub use debug::{H1_CLIENT_DEBUG_LOG_LEVEL, H1_CLIENT_DEBUG_LOG_TARGET};

mod config;
pub use config::{HttpClientConfig, HttpReconnectConfig, HttpRedirectConfig};

mod error;
pub use error::{HttpClientError, ProxyConnectError};

pub mod connection;

mod content;
pub use content::{BytesContent, HttpContent, StringContent};

mod progress;
pub use progress::HttpTransferProgress;

mod request;
pub use request::HttpClientRequest;

mod response;
pub use response::{HttpClientResponse, RedirectRecord};

mod client;
pub use client::HttpClient;
