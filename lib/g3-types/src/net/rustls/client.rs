/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use log::warn;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;

use super::verifier::InsecureServerCertVerifier;
use crate::net::Host;

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct RustlsClientConfig {
    pub driver: Arc<ClientConfig>,
    pub handshake_timeout: Duration,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RustlsClientConfigBuilder {
    use_native_ca_certs: bool,
    insecure_skip_verify: bool,
    handshake_timeout: Duration,
}

impl Default for RustlsClientConfigBuilder {
    fn default() -> Self {
        RustlsClientConfigBuilder {
            use_native_ca_certs: false,
            insecure_skip_verify: false,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

fn default_crypto_provider() -> Option<Arc<CryptoProvider>> {
    if let Some(provider) = CryptoProvider::get_default() {
        return Some(provider.clone());
    }
    #[cfg(feature = "rustls-ring")]
    {
        Some(Arc::new(rustls::crypto::ring::default_provider()))
    }
    #[cfg(not(feature = "rustls-ring"))]
    {
        None
    }
}

impl RustlsClientConfigBuilder {
    /// Load the trust anchors from the operating system instead of the bundled webpki roots
    pub fn set_use_native_ca_certs(&mut self, enable: bool) {
        self.use_native_ca_certs = enable;
    }

    /// INSECURE: accept any server certificate, including expired, self-signed or
    /// mismatched ones. Only meant for testing against hosts under your control.
    pub fn set_insecure_skip_verify(&mut self, insecure: bool) {
        self.insecure_skip_verify = insecure;
    }

    #[inline]
    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    fn load_root_store(&self) -> anyhow::Result<RootCertStore> {
        let mut roots = RootCertStore::empty();
        if self.use_native_ca_certs {
            let certs = rustls_native_certs::load_native_certs()
                .map_err(|e| anyhow!("failed to load native ca certs: {e}"))?;
            let (_added, ignored) = roots.add_parsable_certificates(certs);
            if ignored > 0 {
                warn!("{ignored} native ca certs are ignored as they can not be parsed");
            }
        } else {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
        Ok(roots)
    }

    pub fn build(&self) -> anyhow::Result<RustlsClientConfig> {
        let provider =
            default_crypto_provider().ok_or_else(|| anyhow!("no rustls crypto provider found"))?;

        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| anyhow!("failed to set tls protocol versions: {e}"))?;
        let mut config = if self.insecure_skip_verify {
            warn!("tls server certificate verification is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(InsecureServerCertVerifier::new(
                    provider,
                )))
                .with_no_client_auth()
        } else {
            let roots = self.load_root_store()?;
            builder.with_root_certificates(roots).with_no_client_auth()
        };
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(RustlsClientConfig {
            driver: Arc::new(config),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl TryFrom<&Host> for ServerName<'static> {
    type Error = io::Error;

    fn try_from(value: &Host) -> Result<Self, Self::Error> {
        match value {
            Host::Ip(ip) => Ok(ServerName::IpAddress((*ip).into())),
            Host::Domain(domain) => ServerName::try_from(domain.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e)),
        }
    }
}
