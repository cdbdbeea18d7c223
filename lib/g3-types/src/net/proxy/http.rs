/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::net::{Host, HttpAuth, UpstreamAddr};

const DEFAULT_HTTP_PROXY_PORT: u16 = 80;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpProxy {
    peer: UpstreamAddr,
    pub auth: HttpAuth,
}

impl HttpProxy {
    pub fn new(peer: UpstreamAddr, auth: HttpAuth) -> Self {
        HttpProxy { peer, auth }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(DEFAULT_HTTP_PROXY_PORT);
        let peer = UpstreamAddr::new(Host::from(host), port);

        let auth = HttpAuth::try_from(url)?;

        Ok(HttpProxy { peer, auth })
    }
}
