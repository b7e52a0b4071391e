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

//! Rendering of the result aggregate as JSON or as a table.

use anyhow::{Context, Result};
use std::fmt;
use unicode_width::UnicodeWidthStr;

use super::aggregate::ResultAggregate;
use crate::ui::truncate_to_width;

/// Widest a table cell may get before it is cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 48;
const NULL_CELL: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewFormat {
    #[default]
    Json,
    Table,
}

impl fmt::Display for ViewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewFormat::Json => write!(f, "json"),
            ViewFormat::Table => write!(f, "table"),
        }
    }
}

pub fn render(aggregate: &ResultAggregate, view: ViewFormat) -> Result<String> {
    match view {
        ViewFormat::Json => render_json(aggregate),
        ViewFormat::Table => Ok(render_table(aggregate)),
    }
}

pub fn render_json(aggregate: &ResultAggregate) -> Result<String> {
    serde_json::to_string_pretty(aggregate).context("Failed to serialize results as JSON")
}

/// Column headers: `category:field` pairs of the first host, in order.
pub fn table_columns(aggregate: &ResultAggregate) -> Vec<String> {
    let Some((_, first)) = aggregate.hosts().next() else {
        return Vec::new();
    };
    first
        .iter()
        .flat_map(|(category, fields)| {
            fields
                .keys()
                .map(move |field| format!("{category}:{field}"))
        })
        .collect()
}

/// Lay the aggregate out as a plain-text table.
///
/// Columns come from the first host. Every row lists its own values in its
/// own recording order, so hosts with a different command set do not line
/// up with the header.
pub fn render_table(aggregate: &ResultAggregate) -> String {
    let mut header = vec!["Domain".to_string()];
    header.extend(table_columns(aggregate));

    let rows: Vec<Vec<String>> = aggregate
        .hosts()
        .map(|(host, report)| {
            let mut row = vec![host.to_string()];
            for (_, fields) in report.iter() {
                for (_, value) in fields.iter() {
                    row.push(cell_text(value.as_deref()));
                }
            }
            row
        })
        .collect();

    let column_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; column_count];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut output = String::new();
    output.push_str(&format_row(&header, &widths));
    output.push_str(&separator(&widths));
    for row in &rows {
        output.push_str(&format_row(row, &widths));
    }
    output
}

fn cell_text(value: Option<&str>) -> String {
    let Some(value) = value else {
        return NULL_CELL.to_string();
    };
    let flat = value.lines().map(str::trim).collect::<Vec<_>>().join(" ");
    truncate_to_width(&flat, MAX_CELL_WIDTH)
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str(" │ ");
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}

fn separator(widths: &[usize]) -> String {
    let parts: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{}\n", parts.join("─┼─"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultAggregate {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("h1", "whoami", "value", Some("root".to_string()));
        aggregate.record("h1", "ssh", "version", Some("OpenSSH_9.6".to_string()));
        aggregate.record("h2", "whoami", "value", None);
        aggregate.record("h2", "ssh", "version", Some("OpenSSH_8.9".to_string()));
        aggregate
    }

    #[test]
    fn test_columns_come_from_first_host() {
        let mut aggregate = sample();
        aggregate.record("h3", "extra", "only_here", Some("x".to_string()));
        assert_eq!(
            table_columns(&aggregate),
            vec!["whoami:value".to_string(), "ssh:version".to_string()]
        );
    }

    #[test]
    fn test_table_layout() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Domain │ whoami:value │ ssh:version");
        assert!(lines[1].starts_with("───────┼─"));
        assert_eq!(lines[2], "h1     │ root         │ OpenSSH_9.6");
        assert_eq!(lines[3], "h2     │ null         │ OpenSSH_8.9");
    }

    #[test]
    fn test_table_flattens_multiline_values() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("h1", "uptime", "value", Some("line one\n  line two".to_string()));
        let table = render_table(&aggregate);
        assert!(table.contains("line one line two"));
    }

    #[test]
    fn test_json_view() {
        let json = render(&sample(), ViewFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["h1"]["whoami"]["value"], "root");
        assert!(parsed["h2"]["whoami"]["value"].is_null());
    }

    #[test]
    fn test_empty_aggregate() {
        let aggregate = ResultAggregate::new();
        assert_eq!(render_json(&aggregate).unwrap(), "{}");
        assert_eq!(render_table(&aggregate).lines().next(), Some("Domain"));
    }
}
