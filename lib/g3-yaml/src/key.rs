/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Config keys are matched case-insensitively, with `-` and `_` treated the same
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keys() {
        assert_eq!(normalize("Connect-Timeout"), "connect_timeout");
        assert_eq!(normalize("keep_alive"), "keep_alive");
        assert_eq!(normalize("MAX-HEADER_SIZE"), "max_header_size");
    }
}
