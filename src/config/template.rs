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

//! Starter configuration files written by `init`.

use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::credentials::{DEFAULT_KEY_PATH, DEFAULT_USER};
use super::error::ConfigError;
use super::types::{
    CommandEntry, CommandItem, CommandsFile, DefaultsSection, DomainItem, DomainsFile,
    HostOverride, PortValue, ReportTarget,
};

pub const DEFAULT_DOMAINS_FILE: &str = "domains.yml";
pub const DEFAULT_COMMANDS_FILE: &str = "commands.yml";

pub fn starter_domains() -> DomainsFile {
    DomainsFile {
        defaults: Some(DefaultsSection {
            user: Some(DEFAULT_USER.to_string()),
            port: Some(PortValue::Text("22".to_string())),
            ssh_key_path: Some(DEFAULT_KEY_PATH.to_string()),
            ssh_key_password: None,
            ssh_key_type: Some("rsa".to_string()),
        }),
        domains: vec![DomainItem {
            domain: HostOverride {
                name: Some("localhost".to_string()),
                port: Some(PortValue::Number(22)),
                user: Some(DEFAULT_USER.to_string()),
                ssh_key_path: Some(DEFAULT_KEY_PATH.to_string()),
                ssh_key_password: None,
                ssh_key_type: Some("rsa".to_string()),
            },
        }],
    }
}

pub fn starter_commands() -> CommandsFile {
    let item = |command: &str, category: &str, field: &str| CommandItem {
        item: CommandEntry {
            command: command.to_string(),
            tag: Some("all".to_string()),
            report: ReportTarget {
                category: category.to_string(),
                field: field.to_string(),
            },
        },
    };

    CommandsFile {
        commands: vec![
            item("whoami", "whoami", "value"),
            item("hostname", "hostname", "value"),
            item("ssh -V", "ssh", "version"),
            item(
                "systemctl status fail2ban | grep running",
                "fail2ban",
                "status",
            ),
        ],
    }
}

/// Write `contents` to a new file, refusing to replace an existing one.
pub async fn write_new_yaml<T: serde::Serialize>(path: &Path, contents: &T) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    let yaml = serde_yaml::to_string(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ConfigError::AlreadyExists {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

    file.write_all(yaml.as_bytes())
        .await
        .map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    file.flush().await.map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Generated config file: {}", path.display());
    Ok(())
}

pub async fn generate_domains(path: &Path) -> Result<(), ConfigError> {
    write_new_yaml(path, &starter_domains()).await
}

pub async fn generate_commands(path: &Path) -> Result<(), ConfigError> {
    write_new_yaml(path, &starter_commands()).await
}
