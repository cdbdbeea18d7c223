/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use g3_types::net::HttpKeepAliveConfig;

pub fn as_http_keepalive_config(v: &Yaml) -> anyhow::Result<HttpKeepAliveConfig> {
    let mut config = HttpKeepAliveConfig::default();

    match v {
        Yaml::Hash(map) => {
            crate::foreach_kv(map, |k, v| match crate::key::normalize(k).as_str() {
                "enable" => {
                    let enable = crate::value::as_bool(v)?;
                    config.set_enable(enable);
                    Ok(())
                }
                "max_requests" | "max_request" => {
                    let max = crate::value::as_usize(v)?;
                    config.set_max_requests(max);
                    Ok(())
                }
                "idle_expire" | "timeout" => {
                    let idle_expire = crate::humanize::as_duration(v)?;
                    config.set_idle_expire(idle_expire);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
        }
        Yaml::Boolean(enable) => {
            config.set_enable(*enable);
        }
        _ => {
            let idle_expire = crate::humanize::as_duration(v)
                .context("invalid http keepalive idle_expire value")?;
            config.set_enable(true);
            config.set_idle_expire(idle_expire);
        }
    }

    Ok(config)
}

/// Parse a map of header name to value, keeping the order in the document
pub fn as_http_header_list(v: &Yaml) -> anyhow::Result<Vec<(String, String)>> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("yaml value type for http headers should be 'map'"));
    };

    let mut headers = Vec::with_capacity(map.len());
    crate::foreach_kv(map, |k, v| {
        if k.is_empty() || k.bytes().any(|b| b == b':' || b.is_ascii_whitespace()) {
            return Err(anyhow!("invalid http header name"));
        }
        let value = crate::value::as_string(v)?;
        if value.contains(['\r', '\n']) {
            return Err(anyhow!("invalid http header value"));
        }
        headers.push((k.to_string(), value));
        Ok(())
    })?;
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use yaml_rust::YamlLoader;

    #[test]
    fn keepalive_map() {
        let v = yaml_doc!("enable: true\nmax_requests: 10\nidle_expire: 30s");
        let config = as_http_keepalive_config(&v).unwrap();
        assert!(config.is_enabled());
        assert_eq!(config.max_requests(), 10);
        assert_eq!(config.idle_expire(), Duration::from_secs(30));

        let v = yaml_doc!("enable: true\nunknown: 1");
        assert!(as_http_keepalive_config(&v).is_err());
    }

    #[test]
    fn keepalive_short_forms() {
        let v = Yaml::Boolean(true);
        let config = as_http_keepalive_config(&v).unwrap();
        assert!(config.is_enabled());
        assert_eq!(config.max_requests(), 100);

        let v = yaml_str!("90s");
        let config = as_http_keepalive_config(&v).unwrap();
        assert!(config.is_enabled());
        assert_eq!(config.idle_expire(), Duration::from_secs(90));

        let v = Yaml::Array(vec![]);
        assert!(as_http_keepalive_config(&v).is_err());
    }

    #[test]
    fn header_list() {
        let v = yaml_doc!("X-Trace-Id: abc\nX-Retry: 1");
        let headers = as_http_header_list(&v).unwrap();
        assert_eq!(
            headers,
            vec![
                ("X-Trace-Id".to_string(), "abc".to_string()),
                ("X-Retry".to_string(), "1".to_string())
            ]
        );

        let v = yaml_doc!("\"Bad Name\": x");
        assert!(as_http_header_list(&v).is_err());

        let v = yaml_str!("X-A: b");
        assert!(as_http_header_list(&v).is_err());
    }
}
