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

//! Batch orchestration: every command on every host, one failure boundary
//! per host.
//!
//! For each host the credentials are resolved, a session is opened, the
//! commands run in order and their output is recorded, and the session is
//! closed again. Anything that goes wrong for one host is logged and added to
//! the failure list. The batch itself always runs to completion.

use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::result_types::{format_error_chain, BatchOutcome, HostError, HostFailure};
use crate::config::{resolve, CommandSpec, DefaultCredentials, HostOverride};
use crate::report::ResultAggregate;
use crate::ssh::{run_command, Connector, Session, DEFAULT_COMMAND_TIMEOUT_SECS};
use crate::ui::Console;

/// Per-host limit applied in parallel mode when none is configured.
pub const DEFAULT_PARALLEL_HOST_TIMEOUT_SECS: u64 = 900;

/// Immutable configuration of one batch run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Print intended actions only. No connection is made and nothing is
    /// recorded.
    pub dry_run: bool,
    pub verbose: bool,
    /// Hosts processed at once. 1 runs them strictly one after another.
    pub parallel: usize,
    pub command_timeout: Option<Duration>,
    /// Limit for one host from connect to close. `None` falls back to
    /// [`DEFAULT_PARALLEL_HOST_TIMEOUT_SECS`] when `parallel > 1`; a zero
    /// duration disables the limit.
    pub host_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            parallel: 1,
            command_timeout: Some(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS)),
            host_timeout: None,
        }
    }
}

impl RunOptions {
    /// The per-host limit actually enforced.
    pub fn effective_host_timeout(&self) -> Option<Duration> {
        match self.host_timeout {
            Some(limit) if limit.is_zero() => None,
            Some(limit) => Some(limit),
            None if self.parallel > 1 => {
                Some(Duration::from_secs(DEFAULT_PARALLEL_HOST_TIMEOUT_SECS))
            }
            None => None,
        }
    }
}

pub struct BatchRunner {
    connector: Arc<dyn Connector>,
    options: RunOptions,
    cancel: CancellationToken,
}

struct HostContext {
    connector: Arc<dyn Connector>,
    defaults: DefaultCredentials,
    commands: Vec<CommandSpec>,
    options: RunOptions,
    console: Console,
    cancel: CancellationToken,
    aggregate: Arc<Mutex<ResultAggregate>>,
}

impl HostContext {
    fn with_aggregate<R>(&self, f: impl FnOnce(&mut ResultAggregate) -> R) -> R {
        let mut aggregate = self
            .aggregate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut aggregate)
    }
}

impl BatchRunner {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            options: RunOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `commands` on every host in `hosts`, in order.
    pub async fn run(
        &self,
        defaults: &DefaultCredentials,
        hosts: &[HostOverride],
        commands: &[CommandSpec],
    ) -> BatchOutcome {
        let aggregate = Arc::new(Mutex::new(ResultAggregate::new()));
        let ctx = Arc::new(HostContext {
            connector: Arc::clone(&self.connector),
            defaults: defaults.clone(),
            commands: commands.to_vec(),
            options: self.options.clone(),
            console: Console::new(self.options.verbose),
            cancel: self.cancel.clone(),
            aggregate: Arc::clone(&aggregate),
        });

        let labels: Vec<String> = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| host_label(host, i))
            .collect();

        tracing::info!(
            "Running {} commands on {} hosts (parallel: {}, host timeout: {:?}, dry run: {})",
            commands.len(),
            hosts.len(),
            self.options.parallel.max(1),
            self.options.effective_host_timeout(),
            self.options.dry_run
        );

        let results: Vec<Result<(), HostError>> = if self.options.parallel <= 1 {
            let mut results = Vec::with_capacity(hosts.len());
            for (host, label) in hosts.iter().zip(&labels) {
                results.push(run_host(&ctx, host, label).await);
            }
            results
        } else {
            let semaphore = Arc::new(Semaphore::new(self.options.parallel));
            let tasks: Vec<_> = hosts
                .iter()
                .zip(&labels)
                .map(|(host, label)| {
                    let ctx = Arc::clone(&ctx);
                    let host = host.clone();
                    let label = label.clone();
                    let semaphore = Arc::clone(&semaphore);
                    tokio::spawn(async move {
                        let _permit = match semaphore.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => return Err(HostError::Cancelled),
                        };
                        run_host(&ctx, &host, &label).await
                    })
                })
                .collect();

            join_all(tasks)
                .await
                .into_iter()
                .map(|joined| joined.unwrap_or_else(|e| Err(HostError::Panicked(e.to_string()))))
                .collect()
        };

        drop(ctx);
        let mut aggregate = {
            let mut guard = aggregate
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };
        aggregate.reorder_hosts(&labels);

        let failures: Vec<HostFailure> = labels
            .into_iter()
            .zip(results)
            .filter_map(|(domain, result)| result.err().map(|error| HostFailure { domain, error }))
            .collect();

        tracing::info!(
            "Batch finished: {} hosts, {} failed",
            hosts.len(),
            failures.len()
        );

        BatchOutcome {
            aggregate,
            failures,
            hosts_total: hosts.len(),
        }
    }
}

/// Name used for a host in logs and in the failure summary.
fn host_label(host: &HostOverride, index: usize) -> String {
    match host.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("<entry #{}>", index + 1),
    }
}

/// Failure boundary around one host.
async fn run_host(ctx: &HostContext, host: &HostOverride, label: &str) -> Result<(), HostError> {
    if ctx.cancel.is_cancelled() {
        tracing::warn!("Skipping {}: run cancelled", label);
        return Err(HostError::Cancelled);
    }

    let deadline = ctx
        .options
        .effective_host_timeout()
        .map(|limit| (Instant::now() + limit, limit));
    let result = process_host(ctx, host, deadline).await;

    if let Err(e) = &result {
        tracing::error!("{}: {}", label, format_error_chain(e));
    }
    result
}

/// Resolves once the run is cancelled or the host deadline passes.
async fn interrupted(ctx: &HostContext, deadline: Option<(Instant, Duration)>) -> HostError {
    match deadline {
        Some((deadline, limit)) => tokio::select! {
            _ = ctx.cancel.cancelled() => HostError::Cancelled,
            _ = tokio::time::sleep_until(deadline) => HostError::TimedOut {
                timeout_secs: limit.as_secs(),
            },
        },
        None => {
            ctx.cancel.cancelled().await;
            HostError::Cancelled
        }
    }
}

async fn process_host(
    ctx: &HostContext,
    host: &HostOverride,
    deadline: Option<(Instant, Duration)>,
) -> Result<(), HostError> {
    let creds = resolve(&ctx.defaults, host)?;
    let domain = creds.domain.as_str();

    if ctx.options.dry_run {
        for spec in &ctx.commands {
            ctx.console.dry_run(domain, &spec.command);
            tracing::info!("Dry run on {}: {}", domain, spec.command);
        }
        return Ok(());
    }

    // The host shows up in the report even if it cannot be reached.
    ctx.with_aggregate(|aggregate| aggregate.ensure_host(domain));

    let opened = tokio::select! {
        error = interrupted(ctx, deadline) => return Err(error),
        opened = ctx.connector.open(&creds) => opened,
    };
    let mut session = opened.map_err(HostError::SessionUnavailable)?;
    ctx.console.verbose(format!("Connected to {creds}"));

    let result = tokio::select! {
        error = interrupted(ctx, deadline) => Err(error),
        result = run_commands(ctx, &mut session) => result,
    };

    session.close().await;
    result
}

async fn run_commands(ctx: &HostContext, session: &mut Session) -> Result<(), HostError> {
    let domain = session.domain().to_string();

    for spec in &ctx.commands {
        let result = run_command(session, &spec.command, ctx.options.command_timeout)
            .await
            .map_err(|source| HostError::Command {
                command: spec.command.clone(),
                source,
            })?;

        if result.output.is_none() {
            tracing::error!(
                "Error getting output: '{}' for command '{}'",
                domain,
                spec.command
            );
        }

        ctx.console.verbose(format!(
            "{domain} [{}/{}]{}: {}",
            spec.category_name,
            spec.field_name,
            spec.tag
                .as_deref()
                .map(|tag| format!(" ({tag})"))
                .unwrap_or_default(),
            result.output.as_deref().unwrap_or("null")
        ));

        ctx.with_aggregate(|aggregate| {
            aggregate.record(&domain, &spec.category_name, &spec.field_name, result.output)
        });
    }

    Ok(())
}
