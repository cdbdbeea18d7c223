/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod limited;
pub use limited::SizeLimitedReader;

mod stats;
pub use stats::{ArcStreamIoStats, NilStreamIoStats, StatsStream, StreamIoStats};
