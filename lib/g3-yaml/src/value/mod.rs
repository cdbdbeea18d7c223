/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod auth;
mod net;
mod primary;

pub use auth::{as_password, as_username};
pub use net::*;
pub use primary::{as_bool, as_string, as_usize};

#[cfg(feature = "rustls")]
mod rustls;
#[cfg(feature = "rustls")]
pub use self::rustls::as_rustls_client_config_builder;
