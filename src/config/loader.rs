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

//! Loading of the domains and commands YAML files.

use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

use super::error::ConfigError;
use super::types::{CommandsFile, DomainsFile};
use super::utils::{ensure_file_exists, expand_tilde};

/// Read and deserialize a YAML file.
pub async fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let expanded_path = expand_tilde(path);
    ensure_file_exists(&expanded_path)?;

    let content = fs::read_to_string(&expanded_path)
        .await
        .map_err(|source| ConfigError::Read {
            path: expanded_path.clone(),
            source,
        })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: expanded_path,
        source,
    })
}

/// Read a YAML file as an untyped value, for structural verification.
pub async fn read_yaml_value(path: &Path) -> Result<serde_yaml::Value, ConfigError> {
    read_yaml::<serde_yaml::Value>(path).await
}

impl DomainsFile {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: DomainsFile = read_yaml(path).await?;
        tracing::debug!(
            "Loaded {} domain entries from {}",
            file.domains.len(),
            path.display()
        );
        Ok(file)
    }
}

impl CommandsFile {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: CommandsFile = read_yaml(path).await?;
        tracing::debug!(
            "Loaded {} commands from {}",
            file.commands.len(),
            path.display()
        );
        Ok(file)
    }
}
