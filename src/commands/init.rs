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
use owo_colors::OwoColorize;
use std::path::Path;

use crate::config::template::{generate_commands, generate_domains};
use crate::config::ConfigError;
use crate::executor::format_error_chain;

/// Write the starter domains and commands files.
///
/// Each file is handled on its own: an existing domains file does not stop
/// the commands file from being generated.
pub async fn init_configs(file_domains: &Path, file_commands: &Path, verbose: bool) -> Result<()> {
    report("domains", file_domains, generate_domains(file_domains).await, verbose)?;
    report("commands", file_commands, generate_commands(file_commands).await, verbose)?;
    Ok(())
}

fn report(
    kind: &str,
    path: &Path,
    result: Result<(), ConfigError>,
    verbose: bool,
) -> Result<()> {
    match result {
        Ok(()) => {
            println!(
                "Generated config file for {kind}: {}",
                path.display().to_string().green()
            );
            Ok(())
        }
        Err(e @ ConfigError::AlreadyExists { .. }) => {
            println!(
                "{} {}",
                "Config file already exists:".red(),
                path.display().to_string().yellow()
            );
            if verbose {
                println!("{}", format_error_chain(&e).red());
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
