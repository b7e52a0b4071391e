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

//! Running a single command on an open session.

use std::time::Duration;
use tokio::time::timeout;

use super::error::SessionError;
use super::session::{Session, SessionState};
use super::transport::{ChannelEvent, ExecChannel, Transport};

/// Output buffers grow in chunks of this size.
pub const READ_CHUNK_SIZE: usize = 4096;

/// How long to keep draining after the exit status arrived.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Default per-command timeout (5 minutes). Zero means unlimited.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Combined stdout and stderr, trimmed. `None` when nothing was printed.
    pub output: Option<String>,
    pub exit_status: Option<u32>,
}

/// Run `command` on `session` and collect its combined output.
///
/// `command_timeout` of `None` waits indefinitely.
pub async fn run_command(
    session: &mut Session,
    command: &str,
    command_timeout: Option<Duration>,
) -> Result<CommandResult, SessionError> {
    let domain = session.domain().to_string();
    let transport = session.transport().ok_or_else(|| SessionError::Closed {
        domain: domain.clone(),
    })?;

    if !transport.is_active() {
        tracing::error!("Something wrong with transport to {}", domain);
        return Err(SessionError::TransportInactive { domain });
    }

    if let Err(e) = transport.send_ignore().await {
        tracing::debug!("Keepalive probe to {} failed: {}", domain, e);
    }

    session.set_state(SessionState::CommandRunning);
    let transport = session.transport().ok_or_else(|| SessionError::Closed {
        domain: domain.clone(),
    })?;
    tracing::debug!("Executing on {}: {}", domain, command);

    // The timeout covers opening the channel as well as the command itself.
    let mut channel: Option<Box<dyn ExecChannel>> = None;
    let work = open_and_run(transport, command, &mut channel);
    let result = match command_timeout {
        Some(limit) => {
            let timed = timeout(limit, work).await;
            match timed {
                Ok(result) => result,
                Err(_) => {
                    if let Some(mut channel) = channel.take() {
                        let _ = channel.close().await;
                    }
                    Err(SessionError::CommandTimeout {
                        command: command.to_string(),
                        timeout_secs: limit.as_secs(),
                    })
                }
            }
        }
        None => work.await,
    };

    session.set_state(SessionState::CommandComplete);
    result
}

async fn open_and_run(
    transport: &dyn Transport,
    command: &str,
    slot: &mut Option<Box<dyn ExecChannel>>,
) -> Result<CommandResult, SessionError> {
    let channel = slot.insert(transport.open_channel().await?);
    exec_and_drain(channel.as_mut(), command).await
}

async fn exec_and_drain(
    channel: &mut dyn ExecChannel,
    command: &str,
) -> Result<CommandResult, SessionError> {
    channel.exec(command).await?;
    channel.eof().await?;

    let mut output: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut exit_status: Option<u32> = None;

    loop {
        // Data may still trail the exit status, so keep reading until the
        // channel ends, but do not hang on servers that never close it.
        let event = if exit_status.is_some() {
            match timeout(DRAIN_GRACE, channel.next_event()).await {
                Ok(event) => event,
                Err(_) => break,
            }
        } else {
            channel.next_event().await
        };

        match event {
            Some(ChannelEvent::Data(data)) => {
                if output.capacity() - output.len() < data.len() {
                    let chunks = data.len().div_ceil(READ_CHUNK_SIZE);
                    output.reserve(chunks * READ_CHUNK_SIZE);
                }
                output.extend_from_slice(&data);
            }
            Some(ChannelEvent::ExitStatus(status)) => exit_status = Some(status),
            Some(ChannelEvent::Eof) => {}
            Some(ChannelEvent::Close) | None => break,
        }
    }

    let _ = channel.close().await;

    Ok(CommandResult {
        output: decode_output(&output),
        exit_status,
    })
}

/// Lossy UTF-8 decode and trim; empty output becomes `None`.
pub fn decode_output(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
