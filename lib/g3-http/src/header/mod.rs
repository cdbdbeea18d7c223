/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod auth;
pub use auth::{basic_authorization_value, proxy_authorization_basic};

mod charset;
pub use charset::Charset;

mod connection;
pub use connection::connection_has_close;

mod content;
pub use content::{ContentCoding, content_type_charset};

mod cookie;
pub use cookie::HttpCookies;

mod keep_alive;
pub use keep_alive::HttpKeepAliveParams;
