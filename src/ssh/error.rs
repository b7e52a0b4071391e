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

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while opening a session or running a command on it.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load private key {}", path.display())]
    KeyLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("authentication rejected for {username}@{domain}")]
    AuthRejected { username: String, domain: String },

    #[error("SSH transport error with {domain}")]
    Transport {
        domain: String,
        #[source]
        source: BoxError,
    },

    #[error("connection to {domain} timed out after {timeout_secs} seconds")]
    ConnectTimeout { domain: String, timeout_secs: u64 },

    #[error("SSH transport to {domain} is not active")]
    TransportInactive { domain: String },

    #[error("command '{command}' timed out after {timeout_secs} seconds")]
    CommandTimeout { command: String, timeout_secs: u64 },

    #[error("session to {domain} is closed")]
    Closed { domain: String },
}

/// Coarse classification of a session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    KeyLoad,
    Auth,
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::KeyLoad => write!(f, "key"),
            FailureKind::Auth => write!(f, "auth"),
            FailureKind::Transport => write!(f, "transport"),
        }
    }
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::KeyLoad { .. } => FailureKind::KeyLoad,
            SessionError::AuthRejected { .. } => FailureKind::Auth,
            SessionError::Transport { .. }
            | SessionError::ConnectTimeout { .. }
            | SessionError::TransportInactive { .. }
            | SessionError::CommandTimeout { .. }
            | SessionError::Closed { .. } => FailureKind::Transport,
        }
    }

    pub(crate) fn transport(domain: &str, source: impl Into<BoxError>) -> Self {
        SessionError::Transport {
            domain: domain.to_string(),
            source: source.into(),
        }
    }
}
