/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod http;
mod proxy;

pub use http::{as_http_header_list, as_http_keepalive_config};
pub use proxy::as_proxy;
