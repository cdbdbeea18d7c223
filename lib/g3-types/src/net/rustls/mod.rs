/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod client;
pub use client::{RustlsClientConfig, RustlsClientConfigBuilder};

mod verifier;
