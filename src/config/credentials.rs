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

//! Credential resolution: defaults merged with per-host overrides.
//!
//! Each field is taken from the host override when present, otherwise from
//! the resolved defaults, which themselves fall back to environment variables
//! and finally to built-in constants.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use zeroize::Zeroizing;

use super::error::ConfigError;
use super::types::{DefaultsSection, HostOverride};
use super::utils::expand_tilde;

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_KEY_PATH: &str = "~/.ssh/id_rsa";
pub const SUPPORTED_KEY_TYPES: [&str; 2] = ["rsa", "ed25519"];

pub const ENV_USERNAME: &str = "SSH_USERNAME_DEFAULT";
pub const ENV_PORT: &str = "SSH_PORT_DEFAULT";
pub const ENV_KEY_PATH: &str = "SSH_KEY_PATH_DEFAULT";
pub const ENV_KEY_PASSWORD: &str = "SSH_KEY_PASSWORD_DEFAULT";
pub const ENV_KEY_TYPE: &str = "SSH_KEY_TYPE_DEFAULT";

const HIDDEN: &str = "**HIDDEN**";

/// Supported private key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SshKeyType {
    #[default]
    Rsa,
    Ed25519,
}

impl FromStr for SshKeyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rsa" => Ok(SshKeyType::Rsa),
            "ed25519" => Ok(SshKeyType::Ed25519),
            _ => Err(ConfigError::UnsupportedKeyType {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SshKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SshKeyType::Rsa => write!(f, "rsa"),
            SshKeyType::Ed25519 => write!(f, "ed25519"),
        }
    }
}

/// Fallback credentials for every host. Loaded once per run.
#[derive(Clone)]
pub struct DefaultCredentials {
    pub port: u16,
    pub username: String,
    pub ssh_key_path: String,
    pub ssh_key_password: Option<Zeroizing<String>>,
    pub ssh_key_type: SshKeyType,
}

impl Default for DefaultCredentials {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            username: DEFAULT_USER.to_string(),
            ssh_key_path: DEFAULT_KEY_PATH.to_string(),
            ssh_key_password: None,
            ssh_key_type: SshKeyType::Rsa,
        }
    }
}

impl fmt::Debug for DefaultCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCredentials")
            .field("port", &self.port)
            .field("username", &self.username)
            .field("ssh_key_path", &self.ssh_key_path)
            .field(
                "ssh_key_password",
                &self.ssh_key_password.as_ref().map(|_| HIDDEN),
            )
            .field("ssh_key_type", &self.ssh_key_type)
            .finish()
    }
}

impl DefaultCredentials {
    /// Load defaults from the YAML section, then the process environment.
    pub fn load(section: Option<&DefaultsSection>) -> Result<Self, ConfigError> {
        Self::load_with_env(section, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<F>(section: Option<&DefaultsSection>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let empty = DefaultsSection::default();
        let section = section.unwrap_or(&empty);
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let port = match &section.port {
            Some(port) => port.to_port()?,
            None => match env(ENV_PORT) {
                Some(raw) => raw
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| ConfigError::InvalidPort {
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?,
                None => DEFAULT_PORT,
            },
        };

        let username = section
            .user
            .clone()
            .or_else(|| env(ENV_USERNAME))
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        let ssh_key_path = section
            .ssh_key_path
            .clone()
            .or_else(|| env(ENV_KEY_PATH))
            .unwrap_or_else(|| DEFAULT_KEY_PATH.to_string());

        let ssh_key_password = section
            .ssh_key_password
            .clone()
            .or_else(|| env(ENV_KEY_PASSWORD))
            .map(Zeroizing::new);

        let ssh_key_type = match section.ssh_key_type.clone().or_else(|| env(ENV_KEY_TYPE)) {
            Some(raw) => raw.parse::<SshKeyType>()?,
            None => SshKeyType::Rsa,
        };

        let defaults = Self {
            port,
            username,
            ssh_key_path,
            ssh_key_password,
            ssh_key_type,
        };
        tracing::debug!("Loaded defaults: {:?}", defaults);
        Ok(defaults)
    }
}

/// Fully resolved connection parameters for one host.
#[derive(Clone)]
pub struct HostCredentials {
    pub domain: String,
    pub port: u16,
    pub username: String,
    pub ssh_key_path: PathBuf,
    pub ssh_key_password: Option<Zeroizing<String>>,
    pub ssh_key_type: SshKeyType,
}

impl HostCredentials {
    /// `domain:port` for socket connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.domain, self.port)
    }

    pub fn password(&self) -> Option<&str> {
        self.ssh_key_password.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for HostCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCredentials")
            .field("domain", &self.domain)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("ssh_key_path", &self.ssh_key_path)
            .field(
                "ssh_key_password",
                &self.ssh_key_password.as_ref().map(|_| HIDDEN),
            )
            .field("ssh_key_type", &self.ssh_key_type)
            .finish()
    }
}

impl fmt::Display for HostCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.domain, self.port)
    }
}

/// Merge `defaults` and one host's `overrides` into a complete record.
pub fn resolve(
    defaults: &DefaultCredentials,
    overrides: &HostOverride,
) -> Result<HostCredentials, ConfigError> {
    let domain = overrides
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ConfigError::MissingDomain)?
        .to_string();

    let port = match &overrides.port {
        Some(port) => port.to_port()?,
        None => defaults.port,
    };

    let username = overrides
        .user
        .clone()
        .unwrap_or_else(|| defaults.username.clone());

    let key_path = overrides
        .ssh_key_path
        .as_deref()
        .unwrap_or(&defaults.ssh_key_path);

    let ssh_key_password = match &overrides.ssh_key_password {
        Some(password) => Some(Zeroizing::new(password.clone())),
        None => defaults.ssh_key_password.clone(),
    };

    let ssh_key_type = match &overrides.ssh_key_type {
        Some(raw) => raw.parse::<SshKeyType>()?,
        None => defaults.ssh_key_type,
    };

    let creds = HostCredentials {
        domain,
        port,
        username,
        ssh_key_path: expand_tilde(std::path::Path::new(key_path)),
        ssh_key_password,
        ssh_key_type,
    };

    tracing::debug!("domain: {}", creds.domain);
    tracing::debug!("port: {}", creds.port);
    tracing::debug!("username: {}", creds.username);
    tracing::debug!("ssh_key_path: {}", creds.ssh_key_path.display());
    tracing::debug!(
        "ssh_key_password: {}",
        creds.ssh_key_password.as_ref().map_or("None", |_| HIDDEN)
    );
    tracing::debug!("ssh_key_type: {}", creds.ssh_key_type);

    Ok(creds)
}
