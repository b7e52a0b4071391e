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

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::run_batch::{execute_and_report, load_hosts};
use crate::cli::RunCommandArgs;
use crate::config::CommandSpec;
use crate::executor::{filter_domains, BatchOutcome};

/// Run one ad-hoc command on every selected host.
pub async fn run_single_command(
    args: &RunCommandArgs,
    cancel: CancellationToken,
) -> Result<BatchOutcome> {
    let (defaults, hosts) = load_hosts(&args.file_domains).await?;
    let selected = filter_domains(&defaults, &hosts, args.filter_domain.as_deref());
    let commands = [CommandSpec::ad_hoc(&args.command)];
    execute_and_report(&defaults, &selected, &commands, &args.common, cancel).await
}
