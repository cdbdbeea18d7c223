/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod auth;
pub use auth::{HttpAuth, HttpBasicAuth};

mod keepalive;
pub use keepalive::HttpKeepAliveConfig;
