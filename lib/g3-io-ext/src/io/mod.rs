/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod recv_buf;
pub use recv_buf::{DEFAULT_RECV_BUF_SIZE, RecvBufReader, RecvLineError};
