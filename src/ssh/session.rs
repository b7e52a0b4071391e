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

//! A live, authenticated connection to one host.

use std::fmt;

use super::transport::Transport;

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    KeyLoaded,
    Connected,
    CommandRunning,
    CommandComplete,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unconnected => "unconnected",
            SessionState::KeyLoaded => "key-loaded",
            SessionState::Connected => "connected",
            SessionState::CommandRunning => "command-running",
            SessionState::CommandComplete => "command-complete",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

pub struct Session {
    domain: String,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
}

impl Session {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            transport: None,
            state: SessionState::Unconnected,
        }
    }

    /// Session that already owns an authenticated transport.
    pub fn connected(domain: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            domain: domain.into(),
            transport: Some(transport),
            state: SessionState::Connected,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn mark_key_loaded(&mut self) {
        self.state = SessionState::KeyLoaded;
    }

    pub(crate) fn attach(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
        self.state = SessionState::Connected;
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Disconnect the transport. Safe to call repeatedly and on a session
    /// that never connected.
    pub async fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.disconnect().await {
                tracing::debug!("Error while disconnecting from {}: {}", self.domain, e);
            }
            tracing::debug!("Closed session to {}", self.domain);
        }
        self.state = SessionState::Closed;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("domain", &self.domain)
            .field("state", &self.state)
            .field("open", &self.transport.is_some())
            .finish()
    }
}
