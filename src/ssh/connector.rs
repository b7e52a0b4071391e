// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Opening authenticated sessions.

use async_trait::async_trait;
use russh::keys::ssh_key::Algorithm;
use russh::client::Handle;
use russh::keys::PrivateKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::error::SessionError;
use super::handler::AcceptAllHandler;
use super::session::Session;
use super::transport::RusshTransport;
use crate::config::{HostCredentials, SshKeyType};

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Something that can turn credentials into an open [`Session`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, creds: &HostCredentials) -> Result<Session, SessionError>;
}

/// Connector backed by russh with public-key authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    connect_timeout: Duration,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl SshConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    fn client_config(&self) -> russh::client::Config {
        russh::client::Config {
            inactivity_timeout: None,
            ..Default::default()
        }
    }
}

/// Load the private key and check it matches the configured type.
pub fn load_private_key(creds: &HostCredentials) -> Result<PrivateKey, SessionError> {
    let key = russh::keys::load_secret_key(&creds.ssh_key_path, creds.password()).map_err(
        |e| SessionError::KeyLoad {
            path: creds.ssh_key_path.clone(),
            source: Box::new(e),
        },
    )?;

    let matches = match creds.ssh_key_type {
        SshKeyType::Rsa => matches!(key.algorithm(), Algorithm::Rsa { .. }),
        SshKeyType::Ed25519 => matches!(key.algorithm(), Algorithm::Ed25519),
    };
    if !matches {
        return Err(SessionError::KeyLoad {
            path: creds.ssh_key_path.clone(),
            source: format!(
                "key algorithm {} does not match configured type {}",
                key.algorithm(),
                creds.ssh_key_type
            )
            .into(),
        });
    }

    Ok(key)
}

/// Connect and authenticate with `key`. A partially built connection is
/// disconnected before an error is returned.
async fn handshake(
    config: Arc<russh::client::Config>,
    handler: AcceptAllHandler,
    creds: &HostCredentials,
    key: PrivateKey,
) -> Result<Handle<AcceptAllHandler>, SessionError> {
    let addr = (creds.domain.as_str(), creds.port);
    let mut handle = russh::client::connect(config, addr, handler)
        .await
        .map_err(|e| SessionError::transport(&creds.domain, e))?;
    tracing::debug!("Connected to {}", creds.address());

    // No hash algorithm means legacy ssh-rsa signatures for RSA keys;
    // rsa-sha2-256/512 are never offered. Ignored for ed25519.
    let auth = handle
        .authenticate_publickey(
            &creds.username,
            russh::keys::PrivateKeyWithHashAlg::new(Arc::new(key), None),
        )
        .await;

    let rejected = match auth {
        Ok(result) => !result.success(),
        Err(e) => {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "English")
                .await;
            return Err(SessionError::transport(&creds.domain, e));
        }
    };
    if rejected {
        let _ = handle
            .disconnect(russh::Disconnect::ByApplication, "", "English")
            .await;
        return Err(SessionError::AuthRejected {
            username: creds.username.clone(),
            domain: creds.domain.clone(),
        });
    }

    Ok(handle)
}

#[async_trait]
impl Connector for SshConnector {
    async fn open(&self, creds: &HostCredentials) -> Result<Session, SessionError> {
        let mut session = Session::new(&creds.domain);

        let key = load_private_key(creds)?;
        session.mark_key_loaded();
        tracing::debug!(
            "Loaded {} key from {}",
            creds.ssh_key_type,
            creds.ssh_key_path.display()
        );

        let config = Arc::new(self.client_config());
        let handler = AcceptAllHandler::new(&creds.domain);

        // Covers connect, key exchange and authentication.
        let handle = match timeout(
            self.connect_timeout,
            handshake(config, handler, creds, key),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "No authenticated session to {} within {}s",
                    creds.address(),
                    self.connect_timeout.as_secs()
                );
                return Err(SessionError::ConnectTimeout {
                    domain: creds.domain.clone(),
                    timeout_secs: self.connect_timeout.as_secs(),
                });
            }
        };

        tracing::info!("Authenticated to {}", creds);
        session.attach(Box::new(RusshTransport::new(&creds.domain, handle)));
        Ok(session)
    }
}
