/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use yaml_rust::Yaml;

use g3_types::net::RustlsClientConfigBuilder;

pub fn as_rustls_client_config_builder(value: &Yaml) -> anyhow::Result<RustlsClientConfigBuilder> {
    let mut builder = RustlsClientConfigBuilder::default();
    match value {
        Yaml::Hash(map) => {
            crate::foreach_kv(map, |k, v| match crate::key::normalize(k).as_str() {
                "use_native_ca_certs" | "native_ca_certs" => {
                    let enable = crate::value::as_bool(v)?;
                    builder.set_use_native_ca_certs(enable);
                    Ok(())
                }
                "insecure" | "insecure_skip_verify" => {
                    let insecure = crate::value::as_bool(v)?;
                    builder.set_insecure_skip_verify(insecure);
                    Ok(())
                }
                "handshake_timeout" => {
                    let timeout = crate::humanize::as_duration(v)?;
                    builder.set_handshake_timeout(timeout);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
        }
        Yaml::Boolean(true) | Yaml::Null => {}
        _ => {
            return Err(anyhow!(
                "yaml value type for 'rustls client config' should be 'map'"
            ));
        }
    }
    Ok(builder)
}
