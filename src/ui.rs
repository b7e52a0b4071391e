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

use owo_colors::OwoColorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::executor::HostFailure;

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// User-facing console output. Verbose messages are only shown when the
/// console was created verbose.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    verbose: bool,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn verbose(&self, message: impl AsRef<str>) {
        if self.verbose {
            println!("{}", message.as_ref().yellow());
        }
    }

    pub fn print(&self, text: impl AsRef<str>) {
        println!("{}", text.as_ref());
    }

    pub fn dry_run(&self, domain: &str, command: &str) {
        println!(
            "{} {} {}",
            "[dry-run]".dimmed(),
            domain.bold(),
            format!("would run: {command}").yellow()
        );
    }
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_batch_header(command_count: usize, host_count: usize) -> String {
        format!(
            "\n{} {} {} {} on {} {}\n",
            "►".cyan().bold(),
            "Running".cyan(),
            command_count.to_string().bold(),
            if command_count == 1 { "command" } else { "commands" },
            host_count.to_string().bold(),
            if host_count == 1 { "host" } else { "hosts" },
        )
    }

    pub fn format_failures(failures: &[HostFailure]) -> String {
        let mut output = String::new();
        if failures.is_empty() {
            return output;
        }

        output.push_str(&format!("\n{}\n", "Failed hosts:".red().bold()));
        for failure in failures {
            output.push_str(&format!(
                "  {} {}: {}\n",
                "✗".red(),
                failure.domain.red(),
                failure.detail().dimmed()
            ));
        }
        output
    }

    pub fn format_summary(total: usize, success: usize, failed: usize) -> String {
        let mut parts = Vec::new();

        parts.push(format!("{} hosts", total.to_string().bold()));

        if success > 0 {
            parts.push(format!(
                "{} {}",
                success.to_string().green().bold(),
                "successful".green()
            ));
        }

        if failed > 0 {
            parts.push(format!(
                "{} {}",
                failed.to_string().red().bold(),
                "failed".red()
            ));
        }

        let summary = parts.join(" • ");
        let rule = "═".repeat(terminal_width());

        format!(
            "\n{}\n{}\n{}\n",
            rule.dimmed(),
            format!(" Summary: {summary} ").bold(),
            rule.dimmed()
        )
    }
}

/// Split `s` so the first part is at most `max_width` columns wide.
pub fn split_at_width(s: &str, max_width: usize) -> (&str, &str) {
    let mut width = 0;
    let mut split_pos = 0;

    for (i, ch) in s.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        split_pos = i + ch.len_utf8();
    }

    s.split_at(split_pos)
}

/// Cut `s` to `max_width` columns, ending in `…` when shortened.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let (head, _) = split_at_width(s, max_width.saturating_sub(1));
    format!("{head}…")
}
