/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use g3_http::body::HttpBodyFraming;
use g3_http::client::HttpResponseHead;
use g3_io_ext::{ArcStreamIoStats, NilStreamIoStats, RecvBufReader, StatsStream};
use g3_types::net::HttpKeepAliveConfig;

use super::{BoxHttpStream, HttpDestination};

pub(crate) type HttpConnectionReader = RecvBufReader<StatsStream<BoxHttpStream>>;

pub(crate) struct HttpConnectionState {
    served: usize,
    idle_since: Instant,
    server_max_requests: Option<usize>,
    server_idle_timeout: Option<Duration>,
    close: bool,
    pub(crate) body_drained: bool,
}

impl HttpConnectionState {
    fn new() -> Self {
        HttpConnectionState {
            served: 0,
            idle_since: Instant::now(),
            server_max_requests: None,
            server_idle_timeout: None,
            close: false,
            body_drained: true,
        }
    }

    /// Record a received response head
    pub(crate) fn update(&mut self, rsp: &HttpResponseHead, keep_alive: bool) {
        self.served += 1;
        self.idle_since = Instant::now();
        self.server_max_requests = rsp.keep_alive_max().filter(|n| *n > 0);
        self.server_idle_timeout = rsp.keep_alive_timeout();
        // an unsized body ends with the connection
        self.close = !keep_alive
            || rsp.connection_close()
            || rsp.body_framing() == Some(HttpBodyFraming::Unsized);
        self.body_drained = rsp.is_empty_body();
    }

    pub(crate) fn body_finished(&mut self) {
        self.body_drained = true;
        self.idle_since = Instant::now();
    }

    pub(crate) fn set_close(&mut self) {
        self.close = true;
    }

    #[inline]
    pub(crate) fn served(&self) -> usize {
        self.served
    }

    /// Check if this connection should be dropped instead of being used for the next request
    pub(crate) fn need_new_connection(&self, config: &HttpKeepAliveConfig, now: Instant) -> bool {
        if !config.is_enabled() || self.served == 0 || self.close || !self.body_drained {
            return true;
        }

        let max_requests = self.server_max_requests.unwrap_or(config.max_requests());
        if self.served >= max_requests {
            return true;
        }

        let idle_timeout = self.server_idle_timeout.unwrap_or(config.idle_expire());
        now.saturating_duration_since(self.idle_since) > idle_timeout
    }
}

pub(crate) struct HttpConnection {
    pub(crate) destination: HttpDestination,
    pub(crate) reader: HttpConnectionReader,
    pub(crate) state: HttpConnectionState,
}

impl HttpConnection {
    pub(crate) fn new(destination: HttpDestination, stream: BoxHttpStream, buf_size: usize) -> Self {
        let stats: ArcStreamIoStats = Arc::new(NilStreamIoStats::default());
        HttpConnection {
            destination,
            reader: RecvBufReader::with_capacity(buf_size, StatsStream::new(stream, stats)),
            state: HttpConnectionState::new(),
        }
    }

    pub(crate) fn reusable_for(
        &self,
        destination: &HttpDestination,
        config: &HttpKeepAliveConfig,
    ) -> bool {
        self.destination.same_as(destination)
            && !self.state.need_new_connection(config, Instant::now())
    }

    pub(crate) fn set_stats(&mut self, stats: ArcStreamIoStats) {
        self.reader.get_mut().reset_stats(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used_state(served: usize) -> HttpConnectionState {
        let mut state = HttpConnectionState::new();
        state.served = served;
        state
    }

    #[test]
    fn keep_alive_disabled() {
        let config = HttpKeepAliveConfig::default();
        let state = used_state(1);
        assert!(state.need_new_connection(&config, Instant::now()));
    }

    #[test]
    fn reuse() {
        let config = HttpKeepAliveConfig::new(Duration::from_secs(60));
        let state = used_state(1);
        assert!(!state.need_new_connection(&config, Instant::now()));

        let state = used_state(0);
        assert!(state.need_new_connection(&config, Instant::now()));
    }

    #[test]
    fn max_requests() {
        let mut config = HttpKeepAliveConfig::new(Duration::from_secs(60));
        config.set_max_requests(2);
        assert!(!used_state(1).need_new_connection(&config, Instant::now()));
        assert!(used_state(2).need_new_connection(&config, Instant::now()));

        let mut state = used_state(2);
        state.server_max_requests = Some(5);
        assert!(!state.need_new_connection(&config, Instant::now()));
        state.served = 5;
        assert!(state.need_new_connection(&config, Instant::now()));
    }

    #[test]
    fn close_or_undrained() {
        let config = HttpKeepAliveConfig::new(Duration::from_secs(60));
        let mut state = used_state(1);
        state.set_close();
        assert!(state.need_new_connection(&config, Instant::now()));

        let mut state = used_state(1);
        state.body_drained = false;
        assert!(state.need_new_connection(&config, Instant::now()));
        state.body_finished();
        assert!(!state.need_new_connection(&config, Instant::now()));
    }

    #[test]
    fn idle_timeout() {
        let config = HttpKeepAliveConfig::new(Duration::from_secs(60));
        let state = used_state(1);
        let later = state.idle_since + Duration::from_secs(61);
        assert!(state.need_new_connection(&config, later));

        let mut state = used_state(1);
        state.server_idle_timeout = Some(Duration::from_secs(5));
        let later = state.idle_since + Duration::from_secs(6);
        assert!(state.need_new_connection(&config, later));
        let later = state.idle_since + Duration::from_secs(4);
        assert!(!state.need_new_connection(&config, later));
    }
}
