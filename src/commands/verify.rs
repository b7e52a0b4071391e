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
use owo_colors::OwoColorize;
use std::path::Path;

use crate::config::validation::verify;
use crate::config::{ensure_file_exists, read_yaml_value, ValidationError, VerifyTarget};

/// Verify `filename` and print what was found.
///
/// Returns the problems found. A file that is missing or not YAML at all is
/// an error instead.
pub async fn verify_file(
    filename: &Path,
    target: VerifyTarget,
    verbose: bool,
) -> Result<Vec<ValidationError>> {
    ensure_file_exists(filename)?;
    let data = read_yaml_value(filename).await?;

    println!("Verify target: {}", target.to_string().green());

    let errors = verify(target, &data);
    if errors.is_empty() {
        println!("Valid YAML file: {}", filename.display().to_string().green());
    } else {
        println!(
            "Invalid YAML file: {}",
            filename.display().to_string().yellow()
        );
        println!("YAML errors:");
        for error in &errors {
            println!("  {} {}", "✗".red(), error.to_string().red());
        }
    }

    if verbose {
        let json = serde_json::to_string_pretty(&data)
            .context("Failed to render configuration as JSON")?;
        println!("{json}");
    }

    Ok(errors)
}
