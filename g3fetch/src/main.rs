/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Command;
use tokio::io::AsyncWriteExt;

use g3_h1_client::{HttpClient, HttpClientError};

mod opts;
use opts::FetchArgs;

fn build_cli_args() -> Command {
    opts::add_fetch_args(
        Command::new(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .about(env!("CARGO_PKG_DESCRIPTION")),
    )
}

fn main() -> anyhow::Result<ExitCode> {
    #[cfg(feature = "rustls-ring")]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    let args = build_cli_args().get_matches();
    let fetch_args = opts::parse_fetch_args(&args)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(fetch(fetch_args))
}

async fn fetch(args: FetchArgs) -> anyhow::Result<ExitCode> {
    let FetchArgs {
        config,
        request,
        cookies,
        include_head,
    } = args;

    let mut client = HttpClient::new(config).context("failed to create http client")?;
    if let Some(cookies) = &cookies {
        client
            .add_raw_cookie(cookies)
            .context("invalid cookie value")?;
    }

    let token = client.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    let mut rsp = match client.send(request).await {
        Ok(rsp) => rsp,
        Err(HttpClientError::ProtocolStatusError { code, reason, body }) => {
            eprintln!("{code} {reason}");
            stdout.write_all(&body).await?;
            stdout.flush().await?;
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(anyhow!("request failed: {e}")),
    };

    for r in rsp.redirects() {
        eprintln!("{} {} -> {}", r.code, r.from, r.to);
    }
    eprintln!("{:?} {} {}", rsp.version(), rsp.code(), rsp.reason());
    if include_head {
        for (name, value) in rsp.headers() {
            eprintln!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
        eprintln!();
    }

    let mut total: u64 = 0;
    while let Some(data) = rsp.next_chunk().await? {
        stdout.write_all(&data).await?;
        total += data.len() as u64;
    }
    stdout.flush().await?;
    if include_head {
        eprintln!("received {total} bytes, head in {:?}", rsp.elapsed());
    }
    Ok(ExitCode::SUCCESS)
}
