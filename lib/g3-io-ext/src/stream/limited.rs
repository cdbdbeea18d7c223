/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, ReadBuf};

pin_project! {
    /// Clamp reads to a byte budget.
    ///
    /// Once the budget is used up, every read returns 0 bytes, until a new
    /// budget is set by [`SizeLimitedReader::reset_limit`].
    pub struct SizeLimitedReader<R> {
        #[pin]
        inner: R,
        limit: Option<u64>,
        limit_read: u64,
        total_read: u64,
    }
}

impl<R> SizeLimitedReader<R> {
    pub fn new(inner: R, limit: Option<u64>) -> Self {
        SizeLimitedReader {
            inner,
            limit,
            limit_read: 0,
            total_read: 0,
        }
    }

    pub fn unlimited(inner: R) -> Self {
        SizeLimitedReader::new(inner, None)
    }

    pub fn reset_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
        self.limit_read = 0;
    }

    #[inline]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Bytes left in the current budget, `None` if there is no budget
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|l| l.saturating_sub(self.limit_read))
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// Bytes read within the current budget
    #[inline]
    pub fn limit_read(&self) -> u64 {
        self.limit_read
    }

    /// Bytes read since creation
    #[inline]
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> AsyncRead for SizeLimitedReader<R>
where
    R: AsyncRead,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let nr = match *this.limit {
            Some(limit) => {
                let left = limit.saturating_sub(*this.limit_read);
                if left == 0 || buf.remaining() == 0 {
                    return Poll::Ready(Ok(()));
                }
                let max = usize::try_from(left).unwrap_or(usize::MAX);
                let to_read = buf.remaining().min(max);
                let mut limited_buf = ReadBuf::new(buf.initialize_unfilled_to(to_read));
                ready!(this.inner.poll_read(cx, &mut limited_buf))?;
                let nr = limited_buf.filled().len();
                buf.advance(nr);
                nr
            }
            None => {
                let old_filled_len = buf.filled().len();
                ready!(this.inner.poll_read(cx, buf))?;
                buf.filled().len() - old_filled_len
            }
        };
        *this.limit_read += nr as u64;
        *this.total_read += nr as u64;
        Poll::Ready(Ok(()))
    }
}
