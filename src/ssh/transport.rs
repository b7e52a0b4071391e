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

//! Transport and channel abstractions over an authenticated SSH connection.
//!
//! The russh-backed implementations live here too. Tests substitute their
//! own implementations to exercise the session lifecycle without a server.

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg};

use super::error::SessionError;
use super::handler::AcceptAllHandler;

/// One event read from an exec channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Output bytes. Stderr is merged into this stream.
    Data(Vec<u8>),
    ExitStatus(u32),
    Eof,
    Close,
}

/// A connection to one host over which command channels are opened.
#[async_trait]
pub trait Transport: Send + Sync {
    fn is_active(&self) -> bool;

    /// Lightweight liveness probe sent before each command.
    async fn send_ignore(&self) -> Result<(), SessionError>;

    async fn open_channel(&self) -> Result<Box<dyn ExecChannel>, SessionError>;

    async fn disconnect(&self) -> Result<(), SessionError>;
}

/// A single command-execution channel.
#[async_trait]
pub trait ExecChannel: Send {
    async fn exec(&mut self, command: &str) -> Result<(), SessionError>;

    /// Half-close our side: the command will see end of stdin.
    async fn eof(&mut self) -> Result<(), SessionError>;

    /// Next event, or `None` once the channel is gone.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    async fn close(&mut self) -> Result<(), SessionError>;
}

/// russh connection handle.
pub struct RusshTransport {
    domain: String,
    handle: Handle<AcceptAllHandler>,
}

impl RusshTransport {
    pub fn new(domain: impl Into<String>, handle: Handle<AcceptAllHandler>) -> Self {
        Self {
            domain: domain.into(),
            handle,
        }
    }
}

#[async_trait]
impl Transport for RusshTransport {
    fn is_active(&self) -> bool {
        !self.handle.is_closed()
    }

    async fn send_ignore(&self) -> Result<(), SessionError> {
        self.handle
            .send_keepalive(false)
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))
    }

    async fn open_channel(&self) -> Result<Box<dyn ExecChannel>, SessionError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))?;
        Ok(Box::new(RusshChannel {
            domain: self.domain.clone(),
            channel,
        }))
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))
    }
}

struct RusshChannel {
    domain: String,
    channel: Channel<Msg>,
}

#[async_trait]
impl ExecChannel for RusshChannel {
    async fn exec(&mut self, command: &str) -> Result<(), SessionError> {
        self.channel
            .exec(true, command)
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))
    }

    async fn eof(&mut self) -> Result<(), SessionError> {
        self.channel
            .eof()
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let msg = self.channel.wait().await?;
            let event = match msg {
                ChannelMsg::Data { data } => ChannelEvent::Data(data.to_vec()),
                // stderr is combined with stdout
                ChannelMsg::ExtendedData { data, .. } => ChannelEvent::Data(data.to_vec()),
                ChannelMsg::ExitStatus { exit_status } => ChannelEvent::ExitStatus(exit_status),
                ChannelMsg::Eof => ChannelEvent::Eof,
                ChannelMsg::Close => ChannelEvent::Close,
                other => {
                    tracing::trace!("Ignoring channel message on {}: {:?}", self.domain, other);
                    continue;
                }
            };
            return Some(event);
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.channel
            .close()
            .await
            .map_err(|e| SessionError::transport(&self.domain, e))
    }
}
