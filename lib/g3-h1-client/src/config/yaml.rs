/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use g3_http::header::Charset;
use g3_types::net::{HttpAuth, HttpBasicAuth};

use super::{HttpClientConfig, HttpReconnectConfig, HttpRedirectConfig};

impl HttpRedirectConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        match value {
            Yaml::Hash(map) => {
                let mut config = HttpRedirectConfig::default();
                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "enable" => {
                        config.enable = g3_yaml::value::as_bool(v)
                            .context(format!("invalid bool value for key {k}"))?;
                        Ok(())
                    }
                    "limit" | "max" => {
                        config.limit = g3_yaml::value::as_usize(v)
                            .context(format!("invalid usize value for key {k}"))?;
                        Ok(())
                    }
                    "only_other_domain" | "only_if_other_domain" => {
                        config.only_other_domain = g3_yaml::value::as_bool(v)
                            .context(format!("invalid bool value for key {k}"))?;
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                Ok(config)
            }
            Yaml::Boolean(enable) => Ok(HttpRedirectConfig {
                enable: *enable,
                ..Default::default()
            }),
            Yaml::Integer(_) => {
                let limit = g3_yaml::value::as_usize(value)?;
                Ok(HttpRedirectConfig {
                    enable: limit > 0,
                    limit,
                    ..Default::default()
                })
            }
            _ => Err(anyhow!("invalid yaml type")),
        }
    }
}

impl HttpReconnectConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        match value {
            Yaml::Hash(map) => {
                let mut config = HttpReconnectConfig::default();
                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "enable" => {
                        config.enable = g3_yaml::value::as_bool(v)
                            .context(format!("invalid bool value for key {k}"))?;
                        Ok(())
                    }
                    "limit" | "max_retry" => {
                        config.limit = g3_yaml::value::as_usize(v)
                            .context(format!("invalid usize value for key {k}"))?;
                        Ok(())
                    }
                    "delay" => {
                        config.delay = g3_yaml::humanize::as_duration(v)
                            .context(format!("invalid humanize duration value for key {k}"))?;
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                Ok(config)
            }
            Yaml::Boolean(enable) => Ok(HttpReconnectConfig {
                enable: *enable,
                ..Default::default()
            }),
            _ => Err(anyhow!("invalid yaml type")),
        }
    }
}

impl HttpClientConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = value {
            let mut config = HttpClientConfig::default();
            let mut username = None;
            let mut password = None;
            g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                "connect_timeout" => {
                    config.connect_timeout = g3_yaml::humanize::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "rw_timeout" | "read_write_timeout" => {
                    config.rw_timeout = g3_yaml::humanize::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "data_timeout" => {
                    config.data_timeout = g3_yaml::humanize::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "keep_alive" | "keepalive" => {
                    config.keep_alive = g3_yaml::value::as_http_keepalive_config(v)
                        .context(format!("invalid http keepalive config value for key {k}"))?;
                    Ok(())
                }
                "redirect" => {
                    config.redirect = HttpRedirectConfig::parse_yaml(v)
                        .context(format!("invalid http redirect config value for key {k}"))?;
                    Ok(())
                }
                "reconnect" => {
                    config.reconnect = HttpReconnectConfig::parse_yaml(v)
                        .context(format!("invalid http reconnect config value for key {k}"))?;
                    Ok(())
                }
                "content_encoding" => {
                    config.content_encoding = g3_yaml::value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "cookies" | "cookie" => {
                    config.cookies = g3_yaml::value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "protocol_error" => {
                    config.protocol_error = g3_yaml::value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "max_receive_buffer_size" | "max_body_size" => {
                    config.max_receive_buffer_size = g3_yaml::humanize::as_u64(v)
                        .context(format!("invalid humanize u64 value for key {k}"))?;
                    Ok(())
                }
                "proxy" => {
                    let proxy = g3_yaml::value::as_proxy(v)
                        .context(format!("invalid proxy value for key {k}"))?;
                    config.proxy = Some(proxy);
                    Ok(())
                }
                "base_url" => {
                    let url = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    config.base_url = Some(url);
                    Ok(())
                }
                "user_agent" => {
                    let ua = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    config.user_agent = Some(ua);
                    Ok(())
                }
                "accept" => {
                    config.accept = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    Ok(())
                }
                "accept_language" => {
                    config.accept_language = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    Ok(())
                }
                "referer" => {
                    let referer = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    config.referer = Some(referer);
                    Ok(())
                }
                "authorization" => {
                    let value = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    config.authorization = Some(value);
                    Ok(())
                }
                "username" => {
                    let name = g3_yaml::value::as_username(v)
                        .context(format!("invalid username value for key {k}"))?;
                    username = Some(name);
                    Ok(())
                }
                "password" => {
                    let pass = g3_yaml::value::as_password(v)
                        .context(format!("invalid password value for key {k}"))?;
                    password = Some(pass);
                    Ok(())
                }
                "charset" => {
                    let label = g3_yaml::value::as_string(v)
                        .context(format!("invalid string value for key {k}"))?;
                    config.charset = Charset::from_label(&label);
                    Ok(())
                }
                "headers" => {
                    config.headers = g3_yaml::value::as_http_header_list(v)
                        .context(format!("invalid http header list value for key {k}"))?;
                    Ok(())
                }
                "max_header_size" => {
                    config.max_header_size = g3_yaml::humanize::as_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    Ok(())
                }
                "max_chunk_line_size" => {
                    config.max_chunk_line_size = g3_yaml::humanize::as_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    Ok(())
                }
                "recv_buffer_size" | "receive_buffer_size" => {
                    config.recv_buffer_size = g3_yaml::humanize::as_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    Ok(())
                }
                "legacy_html_sniffing" => {
                    config.legacy_html_sniffing = g3_yaml::value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "tls" | "tls_client" => {
                    config.tls = g3_yaml::value::as_rustls_client_config_builder(v)
                        .context(format!("invalid rustls tls client config value for key {k}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;

            match (username, password) {
                (Some(u), Some(p)) => config.auth = HttpAuth::Basic(HttpBasicAuth::new(u, p)),
                (None, None) => {}
                _ => return Err(anyhow!("username and password should be set together")),
            }
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}
