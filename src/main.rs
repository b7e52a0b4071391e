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
use clap::Parser;
use tokio_util::sync::CancellationToken;

use fleetrun::{
    cli::{Cli, Commands},
    commands::{
        init::init_configs, run_batch::run_batch, run_command::run_single_command,
        verify::verify_file, version::show_version,
    },
    utils::init_logging,
};

/// Cancel the token on Ctrl-C so hosts not yet started are skipped.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling remaining hosts");
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.command.verbose(), cli.log_file.as_deref())?;

    match cli.command {
        Commands::RunBatch(args) => {
            run_batch(&args, cancel_on_ctrl_c()).await?;
        }
        Commands::RunCommand(args) => {
            run_single_command(&args, cancel_on_ctrl_c()).await?;
        }
        Commands::Verify {
            filename,
            target,
            verbose,
        } => {
            verify_file(&filename, target, verbose).await?;
        }
        Commands::Init {
            file_domains,
            file_commands,
            verbose,
        } => {
            init_configs(&file_domains, &file_commands, verbose).await?;
        }
        Commands::Version { verbose } => show_version(verbose),
    }

    Ok(())
}
