/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use g3_io_ext::StreamIoStats;

/// Called with the bytes transferred so far and the total size if known
pub type HttpTransferProgress = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Report the request body bytes written to the connection.
///
/// The request head is written first, so the first `head_len` bytes are not
/// counted.
pub(crate) struct UploadProgressStats {
    sent: AtomicU64,
    head_len: u64,
    total: u64,
    callback: HttpTransferProgress,
}

impl UploadProgressStats {
    pub(crate) fn new(head_len: usize, total: u64, callback: HttpTransferProgress) -> Self {
        UploadProgressStats {
            sent: AtomicU64::new(0),
            head_len: head_len as u64,
            total,
            callback,
        }
    }
}

impl StreamIoStats for UploadProgressStats {
    fn add_read_bytes(&self, _size: usize) {}

    fn add_write_bytes(&self, size: usize) {
        let sent = self.sent.fetch_add(size as u64, Ordering::Relaxed) + size as u64;
        if sent > self.head_len {
            (self.callback)(sent - self.head_len, Some(self.total));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn skip_head() {
        let records = Arc::new(Mutex::new(Vec::new()));
        let r = records.clone();
        let stats = UploadProgressStats::new(
            10,
            20,
            Arc::new(move |sent: u64, total: Option<u64>| r.lock().unwrap().push((sent, total))),
        );
        stats.add_write_bytes(8);
        stats.add_write_bytes(7);
        stats.add_write_bytes(15);
        assert_eq!(
            *records.lock().unwrap(),
            vec![(5, Some(20)), (20, Some(20))]
        );
    }
}
