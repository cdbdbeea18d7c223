/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use anyhow::anyhow;
use url::Url;

use super::Host;

/// A destination (host and port) to connect to
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    pub fn from_ip_and_port(ip: IpAddr, port: u16) -> Self {
        UpstreamAddr {
            host: Host::Ip(ip),
            port,
        }
    }

    pub fn from_host_str_and_port(host: &str, port: u16) -> anyhow::Result<Self> {
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }

    /// Get the destination address of an url, using the default port of the scheme if missing
    pub fn from_url(url: &Url) -> anyhow::Result<Self> {
        let host = url.host().ok_or_else(|| anyhow!("no host found in url"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("no port found in url"))?;
        Ok(UpstreamAddr {
            host: Host::from(host),
            port,
        })
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty() || self.port == 0
    }

    pub fn eq_ignore_case(&self, other: &UpstreamAddr) -> bool {
        self.port == other.port && self.host.eq_ignore_case(&other.host)
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host.authority_host(), self.port)
    }
}

impl FromStr for UpstreamAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(p) = memchr::memrchr(b':', s.as_bytes()) else {
            return Err(anyhow!("no port found"));
        };
        let host_s = &s[..p];
        if host_s.starts_with(':') || (host_s.contains(':') && !host_s.starts_with('[')) {
            return Err(anyhow!("ipv6 address should be enclosed in square brackets"));
        }
        let port = u16::from_str(&s[p + 1..]).map_err(|e| anyhow!("invalid port: {e}"))?;
        UpstreamAddr::from_host_str_and_port(host_s, port)
    }
}
