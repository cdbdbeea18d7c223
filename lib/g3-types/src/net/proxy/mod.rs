/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::auth::AuthParseError;
use crate::net::UpstreamAddr;

mod http;
pub use self::http::HttpProxy;

mod socks4;
pub use socks4::Socks4Proxy;

mod socks5;
pub use socks5::{Socks5Proxy, SocksAuth};

#[derive(Debug, Error)]
pub enum ProxyParseError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid scheme")]
    InvalidScheme,
    #[error("no host found")]
    NoHostFound,
    #[error("auth parse failed: {0}")]
    InvalidAuth(#[from] AuthParseError),
}

/// A proxy endpoint, immutable once attached to a client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proxy {
    Http(HttpProxy),
    Socks4(Socks4Proxy),
    Socks5(Socks5Proxy),
}

impl Proxy {
    pub fn peer(&self) -> &UpstreamAddr {
        match self {
            Proxy::Http(p) => p.peer(),
            Proxy::Socks4(p) => p.peer(),
            Proxy::Socks5(p) => p.peer(),
        }
    }

    #[inline]
    pub fn is_http(&self) -> bool {
        matches!(self, Proxy::Http(_))
    }

    pub fn protocol(&self) -> &'static str {
        match self {
            Proxy::Http(_) => "http",
            Proxy::Socks4(_) => "socks4",
            Proxy::Socks5(_) => "socks5",
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol(), self.peer())
    }
}

impl TryFrom<&Url> for Proxy {
    type Error = ProxyParseError;

    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        match value.scheme().to_ascii_lowercase().as_str() {
            "http" => {
                let p = HttpProxy::from_url_authority(value)?;
                Ok(Proxy::Http(p))
            }
            "socks4" | "socks4a" => {
                let p = Socks4Proxy::from_url_authority(value)?;
                Ok(Proxy::Socks4(p))
            }
            "socks5" | "socks5h" => {
                let p = Socks5Proxy::from_url_authority(value)?;
                Ok(Proxy::Socks5(p))
            }
            _ => Err(ProxyParseError::InvalidScheme),
        }
    }
}

impl FromStr for Proxy {
    type Err = ProxyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        Proxy::try_from(&url)
    }
}
