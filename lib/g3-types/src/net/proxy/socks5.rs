/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::auth::{AuthParseError, Password, Username};
use crate::net::{Host, UpstreamAddr};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SocksAuth {
    #[default]
    None,
    User(Username, Password),
}

impl TryFrom<&Url> for SocksAuth {
    type Error = AuthParseError;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        let u = url.username();
        if u.is_empty() {
            return Ok(SocksAuth::None);
        }
        let username = Username::from_encoded(u)?;
        let password = match url.password() {
            Some(p) => Password::from_encoded(p)?,
            None => return Err(AuthParseError::InvalidPassword),
        };
        Ok(SocksAuth::User(username, password))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Socks5Proxy {
    peer: UpstreamAddr,
    pub auth: SocksAuth,
}

impl Socks5Proxy {
    pub fn new(peer: UpstreamAddr, auth: SocksAuth) -> Self {
        Socks5Proxy { peer, auth }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(1080);

        let peer = UpstreamAddr::new(Host::from(host), port);

        let auth = SocksAuth::try_from(url)?;

        Ok(Socks5Proxy { peer, auth })
    }
}
