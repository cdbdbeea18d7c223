/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::auth::{AuthParseError, Username};
use crate::net::{Host, UpstreamAddr};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Socks4Proxy {
    peer: UpstreamAddr,
    /// Sent as the USERID field of the request, may be empty
    pub user_id: String,
}

impl Socks4Proxy {
    pub fn new(peer: UpstreamAddr) -> Self {
        Socks4Proxy {
            peer,
            user_id: String::new(),
        }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(1080);
        let peer = UpstreamAddr::new(Host::from(host), port);

        let user_id = match url.username() {
            "" => String::new(),
            s => {
                let user = Username::from_encoded(s)?;
                if user.as_bytes().contains(&0) {
                    return Err(AuthParseError::InvalidUsername.into());
                }
                user.as_original().to_string()
            }
        };

        Ok(Socks4Proxy { peer, user_id })
    }
}
