/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use anyhow::anyhow;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Host {
    Ip(IpAddr),
    Domain(String),
}

impl Host {
    pub fn is_empty(&self) -> bool {
        match self {
            Host::Ip(ip) => ip.is_unspecified(),
            Host::Domain(domain) => domain.is_empty(),
        }
    }

    fn from_maybe_mapped_ip6(ip6: Ipv6Addr) -> Self {
        match ip6.to_ipv4_mapped() {
            Some(ip4) => Host::Ip(IpAddr::V4(ip4)),
            None => Host::Ip(IpAddr::V6(ip6)),
        }
    }

    fn from_domain_str(domain: &str) -> anyhow::Result<Self> {
        let domain = idna::domain_to_ascii(domain).map_err(|e| anyhow!("invalid domain: {e}"))?;
        Ok(Host::Domain(domain))
    }

    /// The host part of an http authority, with ipv6 addresses inside square brackets
    pub fn authority_host(&self) -> String {
        match self {
            Host::Ip(IpAddr::V6(ip6)) => format!("[{ip6}]"),
            Host::Ip(ip) => ip.to_string(),
            Host::Domain(domain) => domain.clone(),
        }
    }

    /// Compare hosts, ignoring the case of domain names
    pub fn eq_ignore_case(&self, other: &Host) -> bool {
        match (self, other) {
            (Host::Ip(a), Host::Ip(b)) => a == b,
            (Host::Domain(a), Host::Domain(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(ip) => write!(f, "{ip}"),
            Host::Domain(domain) => f.write_str(domain),
        }
    }
}

impl From<url::Host<&str>> for Host {
    fn from(v: url::Host<&str>) -> Self {
        match v {
            url::Host::Ipv4(ip4) => Host::Ip(IpAddr::V4(ip4)),
            url::Host::Ipv6(ip6) => Host::from_maybe_mapped_ip6(ip6),
            // non-special schemes such as socks5 keep ip addresses as opaque hosts
            url::Host::Domain(domain) => match IpAddr::from_str(domain) {
                Ok(ip) => Host::Ip(ip),
                Err(_) => Host::Domain(domain.to_string()),
            },
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Host::Ip(ip)
    }
}

impl FromStr for Host {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(first) = s.as_bytes().first() else {
            return Err(anyhow!("empty string"));
        };
        match first {
            b'[' => {
                let Some(inner) = s[1..].strip_suffix(']') else {
                    return Err(anyhow!("no closing square bracket found"));
                };
                Ipv6Addr::from_str(inner)
                    .map(Host::from_maybe_mapped_ip6)
                    .map_err(|_| anyhow!("invalid ipv6 ip in squared brackets"))
            }
            b':' => Ipv6Addr::from_str(s)
                .map(Host::from_maybe_mapped_ip6)
                .map_err(|_| anyhow!("invalid ipv6 ip")),
            _ => match IpAddr::from_str(s) {
                Ok(IpAddr::V6(ip6)) => Ok(Host::from_maybe_mapped_ip6(ip6)),
                Ok(ip) => Ok(Host::Ip(ip)),
                Err(_) => Host::from_domain_str(s),
            },
        }
    }
}
