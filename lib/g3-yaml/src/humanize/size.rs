/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use humanize_rs::bytes::Bytes;
use yaml_rust::Yaml;

pub fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(value) => {
            let v = value.parse::<Bytes>()?;
            Ok(v.size())
        }
        Yaml::Integer(value) => Ok(usize::try_from(*value)?),
        _ => Err(anyhow!(
            "yaml value type for humanize usize should be 'string' or 'integer'"
        )),
    }
}

pub fn as_u64(v: &Yaml) -> anyhow::Result<u64> {
    match v {
        Yaml::String(value) => {
            let v = value.parse::<Bytes<u64>>()?;
            Ok(v.size())
        }
        Yaml::Integer(value) => Ok(u64::try_from(*value)?),
        _ => Err(anyhow!(
            "yaml value type for humanize u64 should be 'string' or 'integer'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sizes() {
        let v = yaml_str!("64KiB");
        assert_eq!(as_usize(&v).unwrap(), 65536);

        let v = yaml_str!("8K");
        assert_eq!(as_usize(&v).unwrap(), 8000);

        let v = Yaml::Integer(4096);
        assert_eq!(as_usize(&v).unwrap(), 4096);

        let v = Yaml::Integer(-1);
        assert!(as_usize(&v).is_err());

        let v = yaml_str!("2GiB");
        assert_eq!(as_u64(&v).unwrap(), 2 * 1024 * 1024 * 1024);

        let v = Yaml::Real("1.5".to_string());
        assert!(as_u64(&v).is_err());
    }
}
