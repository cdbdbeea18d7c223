/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use log::Level;

pub const H1_CLIENT_DEBUG_LOG_LEVEL: Level = Level::Debug;
pub const H1_CLIENT_DEBUG_LOG_TARGET: &str = "h1-client";

#[macro_export]
macro_rules! log_msg {
    ($s:literal, $($arg:tt)+) => (
        log::log!(target: $crate::H1_CLIENT_DEBUG_LOG_TARGET, $crate::H1_CLIENT_DEBUG_LOG_LEVEL, concat!(": ", $s), $($arg)+)
    )
}

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_request_head(head: &[u8]) {
    for line in String::from_utf8_lossy(head).lines() {
        log::log!(
            target: H1_CLIENT_DEBUG_LOG_TARGET,
            H1_CLIENT_DEBUG_LOG_LEVEL,
            "> {}",
            line
        );
    }
}

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_response_status(code: u16, reason: &str) {
    log::log!(
        target: H1_CLIENT_DEBUG_LOG_TARGET,
        H1_CLIENT_DEBUG_LOG_LEVEL,
        "< {} {}",
        code,
        reason
    );
}
