/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod host;
mod http;
mod proxy;
mod upstream;

#[cfg(feature = "rustls")]
mod rustls;

pub use host::Host;
pub use http::{HttpAuth, HttpBasicAuth, HttpKeepAliveConfig};
pub use proxy::{HttpProxy, Proxy, ProxyParseError, Socks4Proxy, Socks5Proxy, SocksAuth};
pub use upstream::UpstreamAddr;

#[cfg(feature = "rustls")]
pub use self::rustls::{RustlsClientConfig, RustlsClientConfigBuilder};
