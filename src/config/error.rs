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

//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use super::credentials::SUPPORTED_KEY_TYPES;

/// Errors raised while loading configuration or resolving host credentials.
///
/// When raised while loading the defaults or reading a file these abort the
/// run. When raised while resolving a single host they only affect that host.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported SSH key type '{value}'. Only following keys supported: {supported:?}", supported = SUPPORTED_KEY_TYPES)]
    UnsupportedKeyType { value: String },

    #[error("host entry has no 'name' (or 'host') value")]
    MissingDomain,

    #[error("invalid port '{value}': {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
