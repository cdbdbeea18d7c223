/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};
use http::Method;
use humanize_rs::ParseError;
use yaml_rust::YamlLoader;

use g3_h1_client::{BytesContent, HttpClientConfig, HttpClientRequest};
use g3_types::auth::{Password, Username};
use g3_types::net::{HttpAuth, HttpBasicAuth, Proxy};

const ARG_URL: &str = "url";
const ARG_CONFIG: &str = "config";
const ARG_METHOD: &str = "method";
const ARG_DATA: &str = "data";
const ARG_HEADER: &str = "header";
const ARG_COOKIE: &str = "cookie";
const ARG_USER: &str = "user";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_PROXY: &str = "proxy";
const ARG_CONNECT_TIMEOUT: &str = "connect-timeout";
const ARG_TIMEOUT: &str = "timeout";
const ARG_DATA_TIMEOUT: &str = "data-timeout";
const ARG_MAX_REDIRS: &str = "max-redirs";
const ARG_RETRY: &str = "retry";
const ARG_NO_COMPRESSION: &str = "no-compression";
const ARG_INSECURE: &str = "insecure";
const ARG_INCLUDE: &str = "include";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub(crate) struct FetchArgs {
    pub(crate) config: HttpClientConfig,
    pub(crate) request: HttpClientRequest,
    pub(crate) cookies: Option<String>,
    pub(crate) include_head: bool,
}

pub(crate) fn add_fetch_args(app: Command) -> Command {
    app.arg(
        Arg::new(ARG_URL)
            .required(true)
            .num_args(1)
            .value_hint(ValueHint::Url),
    )
    .arg(
        Arg::new(ARG_CONFIG)
            .help("Load client config from this yaml file")
            .value_name("CONFIG FILE")
            .short('c')
            .long(ARG_CONFIG)
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
    .arg(
        Arg::new(ARG_METHOD)
            .value_name("METHOD")
            .short('X')
            .long("request")
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_DATA)
            .help("Request body, read from file if prefixed with @")
            .value_name("DATA")
            .short('d')
            .long(ARG_DATA)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_HEADER)
            .help("Add a request header")
            .value_name("NAME: VALUE")
            .short('H')
            .long(ARG_HEADER)
            .action(ArgAction::Append)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_COOKIE)
            .help("Send cookies, like 'a=1; b=2'")
            .value_name("COOKIES")
            .short('b')
            .long(ARG_COOKIE)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_USER)
            .help("Basic auth credentials")
            .value_name("USER:PASSWORD")
            .short('u')
            .long(ARG_USER)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_USER_AGENT)
            .value_name("USER AGENT")
            .short('A')
            .long(ARG_USER_AGENT)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_PROXY)
            .help("Use a http, socks4 or socks5 proxy")
            .value_name("PROXY URL")
            .short('x')
            .long(ARG_PROXY)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_CONNECT_TIMEOUT)
            .help("Timeout for tcp connect, proxy negotiation and tls handshake")
            .value_name("TIMEOUT DURATION")
            .long(ARG_CONNECT_TIMEOUT)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_TIMEOUT)
            .help("Timeout for sending the request and receiving the response head")
            .value_name("TIMEOUT DURATION")
            .long(ARG_TIMEOUT)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_DATA_TIMEOUT)
            .help("Timeout for each read of the response body")
            .value_name("TIMEOUT DURATION")
            .long(ARG_DATA_TIMEOUT)
            .num_args(1),
    )
    .arg(
        Arg::new(ARG_MAX_REDIRS)
            .help("Max redirections to follow, 0 to disable")
            .value_name("COUNT")
            .long(ARG_MAX_REDIRS)
            .num_args(1)
            .value_parser(value_parser!(usize)),
    )
    .arg(
        Arg::new(ARG_RETRY)
            .help("Max reconnect retries, 0 to disable")
            .value_name("COUNT")
            .long(ARG_RETRY)
            .num_args(1)
            .value_parser(value_parser!(usize)),
    )
    .arg(
        Arg::new(ARG_NO_COMPRESSION)
            .help("Do not ask for compressed response body")
            .long(ARG_NO_COMPRESSION)
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new(ARG_INSECURE)
            .help("Skip tls server certificate verification")
            .short('k')
            .long(ARG_INSECURE)
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new(ARG_INCLUDE)
            .help("Print response headers to stderr")
            .short('i')
            .long(ARG_INCLUDE)
            .action(ArgAction::SetTrue),
    )
}

fn get_duration(args: &ArgMatches, id: &str) -> anyhow::Result<Option<Duration>> {
    let Some(v) = args.get_one::<String>(id) else {
        return Ok(None);
    };
    match humanize_rs::duration::parse(v) {
        Ok(d) => Ok(Some(d)),
        Err(ParseError::MissingUnit) => {
            let secs = u64::from_str(v).map_err(|_| anyhow!("invalid {id} value {v}"))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(e) => Err(anyhow!("invalid {id} value {v}: {e}")),
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<HttpClientConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    match docs.first() {
        Some(doc) => HttpClientConfig::parse_yaml(doc),
        None => Ok(HttpClientConfig::default()),
    }
}

fn parse_credentials(value: &str) -> anyhow::Result<HttpAuth> {
    let (user, pass) = value.split_once(':').unwrap_or((value, ""));
    let username = Username::from_original(user).context("invalid username")?;
    let password = Password::from_original(pass).context("invalid password")?;
    Ok(HttpAuth::Basic(HttpBasicAuth::new(username, password)))
}

pub(crate) fn parse_fetch_args(args: &ArgMatches) -> anyhow::Result<FetchArgs> {
    let url = args
        .get_one::<String>(ARG_URL)
        .ok_or_else(|| anyhow!("no target url set"))?;

    let mut config = match args.get_one::<PathBuf>(ARG_CONFIG) {
        Some(path) => load_config_file(path)?,
        None => HttpClientConfig::default(),
    };

    if let Some(values) = args.get_many::<String>(ARG_HEADER) {
        for v in values {
            let Some((name, value)) = v.split_once(':') else {
                return Err(anyhow!("invalid {ARG_HEADER} value {v}"));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(anyhow!("empty header name in {v}"));
            }
            config
                .headers
                .push((name.to_string(), value.trim().to_string()));
        }
    }
    if let Some(v) = args.get_one::<String>(ARG_USER) {
        config.auth = parse_credentials(v).context(format!("invalid {ARG_USER} value"))?;
    }
    if let Some(v) = args.get_one::<String>(ARG_USER_AGENT) {
        config.user_agent = Some(v.to_string());
    }
    if let Some(v) = args.get_one::<String>(ARG_PROXY) {
        let proxy = Proxy::from_str(v).map_err(|e| anyhow!("invalid proxy {v}: {e}"))?;
        config.proxy = Some(proxy);
    }
    if let Some(timeout) = get_duration(args, ARG_CONNECT_TIMEOUT)? {
        config.connect_timeout = timeout;
    }
    if let Some(timeout) = get_duration(args, ARG_TIMEOUT)? {
        config.rw_timeout = timeout;
    }
    if let Some(timeout) = get_duration(args, ARG_DATA_TIMEOUT)? {
        config.data_timeout = timeout;
    }
    if let Some(n) = args.get_one::<usize>(ARG_MAX_REDIRS) {
        config.redirect.enable = *n > 0;
        config.redirect.limit = *n;
    }
    if let Some(n) = args.get_one::<usize>(ARG_RETRY) {
        config.reconnect.enable = *n > 0;
        config.reconnect.limit = *n;
    }
    if args.get_flag(ARG_NO_COMPRESSION) {
        config.content_encoding = false;
    }
    if args.get_flag(ARG_INSECURE) {
        config.tls.set_insecure_skip_verify(true);
    }

    let data = match args.get_one::<String>(ARG_DATA) {
        Some(v) => match v.strip_prefix('@') {
            Some(path) => {
                Some(std::fs::read(path).map_err(|e| anyhow!("failed to read {path}: {e}"))?)
            }
            None => Some(v.as_bytes().to_vec()),
        },
        None => None,
    };
    let method = match args.get_one::<String>(ARG_METHOD) {
        Some(v) => Method::from_str(&v.to_ascii_uppercase())
            .map_err(|e| anyhow!("invalid method {v}: {e}"))?,
        None if data.is_some() => Method::POST,
        None => Method::GET,
    };

    let mut request = HttpClientRequest::new(method, url);
    if let Some(data) = data {
        request.set_body(BytesContent::with_content_type(data, FORM_CONTENT_TYPE));
    }

    Ok(FetchArgs {
        config,
        request,
        cookies: args.get_one::<String>(ARG_COOKIE).cloned(),
        include_head: args.get_flag(ARG_INCLUDE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_h1_client::HttpContent;

    fn parse(argv: &[&str]) -> anyhow::Result<FetchArgs> {
        let args = add_fetch_args(Command::new("g3fetch")).try_get_matches_from(argv)?;
        parse_fetch_args(&args)
    }

    #[test]
    fn defaults() {
        let args = parse(&["g3fetch", "http://example.com/"]).unwrap();
        assert_eq!(args.request.method, Method::GET);
        assert_eq!(args.request.url, "http://example.com/");
        assert!(args.request.body.is_none());
        assert!(args.config.redirect.enable);
        assert!(!args.include_head);
    }

    #[test]
    fn post_data() {
        let args = parse(&[
            "g3fetch",
            "-d",
            "a=1",
            "-H",
            "X-Test: yes",
            "-u",
            "root:toor",
            "http://example.com/",
        ])
        .unwrap();
        assert_eq!(args.request.method, Method::POST);
        let body = args.request.body.unwrap();
        assert_eq!(body.content_length(), 3);
        assert_eq!(body.content_type(), Some(FORM_CONTENT_TYPE));
        assert_eq!(
            args.config.headers,
            vec![("X-Test".to_string(), "yes".to_string())]
        );
        assert_eq!(
            args.config.auth.header_value().as_deref(),
            Some("Basic cm9vdDp0b29y")
        );
    }

    #[test]
    fn limits() {
        let args = parse(&[
            "g3fetch",
            "--max-redirs",
            "0",
            "--retry",
            "5",
            "--timeout",
            "10s",
            "--connect-timeout",
            "3",
            "-k",
            "-x",
            "socks5://127.0.0.1:1080",
            "http://example.com/",
        ])
        .unwrap();
        assert!(!args.config.redirect.enable);
        assert!(args.config.reconnect.enable);
        assert_eq!(args.config.reconnect.limit, 5);
        assert_eq!(args.config.rw_timeout, Duration::from_secs(10));
        assert_eq!(args.config.connect_timeout, Duration::from_secs(3));
        assert!(args.config.tls.insecure_skip_verify());
        assert!(matches!(args.config.proxy, Some(Proxy::Socks5(_))));
    }

    #[test]
    fn invalid() {
        assert!(parse(&["g3fetch", "-H", "no-colon", "http://example.com/"]).is_err());
        assert!(parse(&["g3fetch", "--timeout", "abc", "http://example.com/"]).is_err());
        assert!(parse(&["g3fetch", "-x", "ftp://127.0.0.1", "http://example.com/"]).is_err());
    }
}
