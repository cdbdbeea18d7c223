/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use crate::auth::{AuthParseError, Password, Username};

mod basic;
pub use basic::HttpBasicAuth;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HttpAuth {
    #[default]
    None,
    Basic(HttpBasicAuth),
}

impl HttpAuth {
    pub fn is_none(&self) -> bool {
        matches!(self, HttpAuth::None)
    }

    /// The value of an `Authorization` or `Proxy-Authorization` header
    pub fn header_value(&self) -> Option<String> {
        match self {
            HttpAuth::None => None,
            HttpAuth::Basic(basic) => Some(format!("Basic {}", basic.encoded_value())),
        }
    }
}

impl TryFrom<&Url> for HttpAuth {
    type Error = AuthParseError;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        let u = url.username();
        if u.is_empty() {
            return Ok(HttpAuth::None);
        }

        let username = Username::from_encoded(u)?;
        let password = match url.password() {
            Some(p) => Password::from_encoded(p)?,
            None => return Err(AuthParseError::InvalidPassword),
        };
        Ok(HttpAuth::Basic(HttpBasicAuth::new(username, password)))
    }
}
