/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub trait StreamIoStats {
    fn add_read_bytes(&self, size: usize);
    fn add_write_bytes(&self, size: usize);
}
pub type ArcStreamIoStats = Arc<dyn StreamIoStats + Send + Sync>;

#[derive(Default)]
pub struct NilStreamIoStats(());

impl StreamIoStats for NilStreamIoStats {
    fn add_read_bytes(&self, _size: usize) {}
    fn add_write_bytes(&self, _size: usize) {}
}

pin_project! {
    /// Report every successful read and write to a stats sink
    pub struct StatsStream<S> {
        #[pin]
        inner: S,
        stats: ArcStreamIoStats,
    }
}

impl<S> StatsStream<S> {
    pub fn new(inner: S, stats: ArcStreamIoStats) -> Self {
        StatsStream { inner, stats }
    }

    pub fn reset_stats(&mut self, stats: ArcStreamIoStats) {
        self.stats = stats;
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> AsyncRead for StatsStream<S>
where
    S: AsyncRead,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let old_filled_len = buf.filled().len();
        ready!(this.inner.poll_read(cx, buf))?;
        let nr = buf.filled().len() - old_filled_len;
        if nr > 0 {
            this.stats.add_read_bytes(nr);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S> AsyncWrite for StatsStream<S>
where
    S: AsyncWrite,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.project();
        let nw = ready!(this.inner.poll_write(cx, buf))?;
        if nw > 0 {
            this.stats.add_write_bytes(nw);
        }
        Poll::Ready(Ok(nw))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_shutdown(cx)
    }
}
