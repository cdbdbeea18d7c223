/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod parse;
pub use parse::{HttpChunkedLine, HttpHeaderLine, HttpLineParseError, HttpStatusLine};

pub mod body;
pub mod client;
pub mod connect;
pub mod header;
