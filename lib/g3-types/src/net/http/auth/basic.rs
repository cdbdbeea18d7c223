/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use base64::prelude::*;

use crate::auth::{Password, Username};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBasicAuth {
    pub username: Username,
    pub password: Password,
    encoded_value: String,
}

impl HttpBasicAuth {
    pub fn new(username: Username, password: Password) -> Self {
        let us = username.as_bytes();
        let ps = password.as_bytes();
        let mut buf = Vec::with_capacity(us.len() + 1 + ps.len());
        buf.extend_from_slice(us);
        buf.push(b':');
        buf.extend_from_slice(ps);

        let encoded_value = BASE64_STANDARD.encode(buf);

        HttpBasicAuth {
            username,
            password,
            encoded_value,
        }
    }

    #[inline]
    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode() {
        let auth = HttpBasicAuth::new(
            Username::from_original("Aladdin").unwrap(),
            Password::from_original("open sesame").unwrap(),
        );
        assert_eq!(auth.encoded_value(), "QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }
}
