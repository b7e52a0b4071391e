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

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cli::{ExecArgs, RunBatchArgs};
use crate::config::{CommandSpec, CommandsFile, DefaultCredentials, DomainsFile, HostOverride};
use crate::executor::{filter_domains, BatchOutcome, BatchRunner, RunOptions};
use crate::report::render;
use crate::ssh::SshConnector;
use crate::ui::{Console, OutputFormatter};

/// Load the domains file and its defaults.
pub(crate) async fn load_hosts(path: &Path) -> Result<(DefaultCredentials, Vec<HostOverride>)> {
    let domains = DomainsFile::load(path)
        .await
        .with_context(|| format!("Failed to load domains file {}", path.display()))?;
    let defaults = DefaultCredentials::load(domains.defaults.as_ref())
        .context("Invalid defaults in domains file")?;
    Ok((defaults, domains.host_overrides()))
}

pub(crate) fn run_options(args: &ExecArgs) -> RunOptions {
    RunOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
        parallel: usize::try_from(args.parallel).unwrap_or(usize::MAX),
        command_timeout: args.command_timeout(),
        host_timeout: args.host_timeout(),
    }
}

/// Run `commands` on the selected hosts and print the report.
pub(crate) async fn execute_and_report(
    defaults: &DefaultCredentials,
    hosts: &[HostOverride],
    commands: &[CommandSpec],
    args: &ExecArgs,
    cancel: CancellationToken,
) -> Result<BatchOutcome> {
    let console = Console::new(args.verbose);
    if args.verbose {
        print!(
            "{}",
            OutputFormatter::format_batch_header(commands.len(), hosts.len())
        );
    }
    if hosts.is_empty() {
        tracing::warn!("No hosts selected");
    }

    let connector =
        SshConnector::new().with_connect_timeout(Duration::from_secs(args.connect_timeout));
    let runner = BatchRunner::new(Arc::new(connector))
        .with_options(run_options(args))
        .with_cancellation(cancel);

    let outcome = runner.run(defaults, hosts, commands).await;

    console.print(render(&outcome.aggregate, args.view)?);

    if !outcome.failures.is_empty() || args.verbose {
        eprint!("{}", OutputFormatter::format_failures(&outcome.failures));
        eprint!(
            "{}",
            OutputFormatter::format_summary(
                outcome.hosts_total,
                outcome.succeeded(),
                outcome.failures.len()
            )
        );
    }

    Ok(outcome)
}

pub async fn run_batch(args: &RunBatchArgs, cancel: CancellationToken) -> Result<BatchOutcome> {
    let (defaults, hosts) = load_hosts(&args.file_domains).await?;
    let commands = CommandsFile::load(&args.file_commands)
        .await
        .with_context(|| {
            format!(
                "Failed to load commands file {}",
                args.file_commands.display()
            )
        })?
        .into_specs();

    let selected = filter_domains(&defaults, &hosts, args.filter.as_deref());
    execute_and_report(&defaults, &selected, &commands, &args.common, cancel).await
}
