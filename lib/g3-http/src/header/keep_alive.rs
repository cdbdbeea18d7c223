/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

/// Parameters of a `Keep-Alive` response header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HttpKeepAliveParams {
    pub timeout: Option<Duration>,
    pub max: Option<usize>,
}

impl HttpKeepAliveParams {
    /// Parse `timeout=<secs>, max=<n>` in any order, unknown or invalid
    /// parameters are ignored
    pub fn parse(value: &str) -> Self {
        let mut params = HttpKeepAliveParams::default();
        for p in value.split([',', ';']) {
            let Some((k, v)) = p.split_once('=') else {
                continue;
            };
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "timeout" => {
                    if let Ok(secs) = u64::from_str(v) {
                        params.timeout = Some(Duration::from_secs(secs));
                    }
                }
                "max" => {
                    if let Ok(max) = usize::from_str(v) {
                        params.max = Some(max);
                    }
                }
                _ => {}
            }
        }
        params
    }
}
