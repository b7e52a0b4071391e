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

//! Result types for batch execution.

use thiserror::Error;

use crate::config::ConfigError;
use crate::report::ResultAggregate;
use crate::ssh::{FailureKind, SessionError};

/// Why a single host did not complete.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid host configuration")]
    Config(#[from] ConfigError),

    #[error("no usable SSH session")]
    SessionUnavailable(#[source] SessionError),

    #[error("command '{command}' failed")]
    Command {
        command: String,
        #[source]
        source: SessionError,
    },

    #[error("host did not finish within {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("host task panicked: {0}")]
    Panicked(String),
}

impl HostError {
    /// Session failure class, when the failure came from SSH.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            HostError::SessionUnavailable(e) | HostError::Command { source: e, .. } => {
                Some(e.kind())
            }
            _ => None,
        }
    }
}

/// One failed host, for the end-of-run summary.
#[derive(Debug)]
pub struct HostFailure {
    pub domain: String,
    pub error: HostError,
}

impl HostFailure {
    /// Message including every cause, e.g.
    /// `no usable SSH session: authentication rejected for root@h1`.
    pub fn detail(&self) -> String {
        format_error_chain(&self.error)
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub aggregate: ResultAggregate,
    pub failures: Vec<HostFailure>,
    pub hosts_total: usize,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.hosts_total.saturating_sub(self.failures.len())
    }

    pub fn failure_for(&self, domain: &str) -> Option<&HostFailure> {
        self.failures.iter().find(|f| f.domain == domain)
    }
}

/// Join an error and all of its sources with `: `.
pub fn format_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
