/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use base64::prelude::*;

use g3_types::auth::{Password, Username};

/// The value of a Basic `Authorization` header
pub fn basic_authorization_value(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{username}:{password}"))
    )
}

pub fn proxy_authorization_basic(username: &Username, password: &Password) -> String {
    format!(
        "Proxy-Authorization: {}\r\n",
        basic_authorization_value(username.as_original(), password.as_original())
    )
}
