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

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::template::{DEFAULT_COMMANDS_FILE, DEFAULT_DOMAINS_FILE};
use crate::config::VerifyTarget;
use crate::report::ViewFormat;
use crate::utils::logging::DEFAULT_LOG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "fleetrun",
    version,
    about = "Run diagnostic commands over SSH across a fleet of servers",
    long_about = "fleetrun connects to every host listed in a domains file, runs the commands\nlisted in a commands file, and prints the collected output as JSON or as a table.\nA host that cannot be reached or authenticated is logged and skipped; the rest of\nthe batch still runs.",
    after_help = "EXAMPLES:\n  Generate starter configs:     fleetrun init\n  Check a domains file:         fleetrun verify --filename domains.yml\n  Run all commands:             fleetrun run-batch --view table\n  Run on matching hosts only:   fleetrun run-batch --filter web\n  One-off command:              fleetrun run-command --command \"uptime\""
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_LOG_FILE,
        value_name = "PATH",
        help = "Also append log output to this file (--log-file=PATH) [default when given without a path: fleetrun.log]"
    )]
    pub log_file: Option<PathBuf>,
}

impl Commands {
    /// Whether the chosen subcommand asked for verbose output.
    pub fn verbose(&self) -> bool {
        match self {
            Commands::RunBatch(args) => args.common.verbose,
            Commands::RunCommand(args) => args.common.verbose,
            Commands::Verify { verbose, .. }
            | Commands::Init { verbose, .. }
            | Commands::Version { verbose } => *verbose,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run every command from the commands file on every host",
        long_about = "Loads the domains and commands files, connects to each host in turn and runs\nall commands on it. Output is recorded under the category/field given for each\ncommand and printed once every host has been processed.\n\nExit codes: 0 (batch completed, even with host failures), 1 (configuration error)"
    )]
    RunBatch(RunBatchArgs),

    #[command(
        about = "Run a single command on every host",
        long_about = "Runs one command on each host from the domains file. The output is recorded\nunder category 'command', keyed by the command lower-cased with spaces\nreplaced by underscores."
    )]
    RunCommand(RunCommandArgs),

    #[command(about = "Check the structure of a domains or commands file")]
    Verify {
        #[arg(long, default_value = DEFAULT_DOMAINS_FILE, help = "YAML file to verify")]
        filename: PathBuf,

        #[arg(long, value_enum, default_value_t = VerifyTarget::Domains, help = "Which layout to check against")]
        target: VerifyTarget,

        #[arg(long, help = "Print the parsed file after verification")]
        verbose: bool,
    },

    #[command(about = "Generate starter domains and commands files")]
    Init {
        #[arg(long, default_value = DEFAULT_DOMAINS_FILE)]
        file_domains: PathBuf,

        #[arg(long, default_value = DEFAULT_COMMANDS_FILE)]
        file_commands: PathBuf,

        #[arg(long, help = "Show full error details")]
        verbose: bool,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(long, help = "Show a table with name, version and description")]
        verbose: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunBatchArgs {
    #[arg(long, default_value = DEFAULT_DOMAINS_FILE, help = "YAML file with defaults and hosts")]
    pub file_domains: PathBuf,

    #[arg(long, default_value = DEFAULT_COMMANDS_FILE, help = "YAML file with commands to run")]
    pub file_commands: PathBuf,

    #[arg(long, help = "Only hosts whose name contains this text (case-insensitive)")]
    pub filter: Option<String>,

    #[command(flatten)]
    pub common: ExecArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunCommandArgs {
    #[arg(long, default_value = "whoami", help = "Command to run on each host")]
    pub command: String,

    #[arg(long, default_value = DEFAULT_DOMAINS_FILE, help = "YAML file with defaults and hosts")]
    pub file_domains: PathBuf,

    #[arg(
        long,
        visible_alias = "filter",
        help = "Only hosts whose name contains this text (case-insensitive)"
    )]
    pub filter_domain: Option<String>,

    #[command(flatten)]
    pub common: ExecArgs,
}

/// Options shared by the commands that connect to hosts.
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    #[arg(long, value_enum, default_value_t = ViewFormat::Json, help = "Output format")]
    pub view: ViewFormat,

    #[arg(long, help = "Print progress and per-command output")]
    pub verbose: bool,

    #[arg(long, help = "Show what would run without connecting to any host")]
    pub dry_run: bool,

    #[arg(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Hosts processed at the same time (1 = one after another)"
    )]
    pub parallel: u64,

    #[arg(
        long,
        default_value = "300",
        help = "Command timeout in seconds (0 for unlimited)"
    )]
    pub timeout: u64,

    #[arg(long, default_value = "30", help = "SSH connection timeout in seconds")]
    pub connect_timeout: u64,

    #[arg(
        long,
        help = "Give up on a host after this many seconds (0 for unlimited) [default: unlimited, or 900 with --parallel > 1]"
    )]
    pub host_timeout: Option<u64>,
}

impl ExecArgs {
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    pub fn host_timeout(&self) -> Option<Duration> {
        self.host_timeout.map(Duration::from_secs)
    }
}
