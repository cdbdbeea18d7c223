/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

const DEFAULT_HTTP_KEEPALIVE_IDLE: u64 = 60;
const DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HttpKeepAliveConfig {
    enabled: bool,
    max_requests: usize,
    idle_expire: Duration,
}

impl Default for HttpKeepAliveConfig {
    fn default() -> Self {
        HttpKeepAliveConfig {
            enabled: false,
            max_requests: DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS,
            idle_expire: Duration::from_secs(DEFAULT_HTTP_KEEPALIVE_IDLE),
        }
    }
}

impl HttpKeepAliveConfig {
    pub fn new(idle_expire: Duration) -> Self {
        HttpKeepAliveConfig {
            enabled: true,
            max_requests: DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS,
            idle_expire,
        }
    }

    pub fn set_enable(&mut self, enable: bool) {
        self.enabled = enable;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the max requests to send on one connection, 0 means use the default value
    pub fn set_max_requests(&mut self, max: usize) {
        if max == 0 {
            self.max_requests = DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS;
        } else {
            self.max_requests = max;
        }
    }

    #[inline]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn set_idle_expire(&mut self, idle_expire: Duration) {
        self.idle_expire = idle_expire;
    }

    #[inline]
    pub fn idle_expire(&self) -> Duration {
        if self.enabled {
            self.idle_expire
        } else {
            Duration::ZERO
        }
    }
}
