/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub fn connection_has_close(value: &str) -> bool {
    value
        .split(',')
        .any(|v| v.trim().eq_ignore_ascii_case("close"))
}
