/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

#[macro_use]
mod macros;

mod hash;

pub mod humanize;
pub mod key;
pub mod value;

pub use hash::foreach_kv;
