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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ConfigError;

/// Contents of the domains file.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct DomainsFile {
    #[serde(default)]
    pub defaults: Option<DefaultsSection>,

    #[serde(default)]
    pub domains: Vec<DomainItem>,
}

/// The `defaults` section of the domains file.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct DefaultsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,
    /// Written out as an explicit `null` so the starter file shows the key.
    #[serde(default)]
    pub ssh_key_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_type: Option<String>,
}

/// One entry of the `domains` list: `- domain: {...}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DomainItem {
    pub domain: HostOverride,
}

/// Per-host settings. Every field is optional and falls back to the defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HostOverride {
    #[serde(default, alias = "host", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_type: Option<String>,
}

impl HostOverride {
    /// Shorthand for an entry that only names the host.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A port as written in YAML: either `22` or `"22"`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    pub fn to_port(&self) -> Result<u16, ConfigError> {
        match self {
            PortValue::Number(port) => Ok(*port),
            PortValue::Text(text) => {
                text.trim()
                    .parse::<u16>()
                    .map_err(|e| ConfigError::InvalidPort {
                        value: text.clone(),
                        reason: e.to_string(),
                    })
            }
        }
    }
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        PortValue::Number(port)
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(port) => write!(f, "{port}"),
            PortValue::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Contents of the commands file.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct CommandsFile {
    #[serde(default)]
    pub commands: Vec<CommandItem>,
}

/// One entry of the `commands` list: `- item: {...}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommandItem {
    pub item: CommandEntry,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommandEntry {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub report: ReportTarget,
}

/// Where a command's output lands in the report.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportTarget {
    pub category: String,
    #[serde(default = "default_field")]
    pub field: String,
}

pub(super) fn default_field() -> String {
    "value".to_string()
}

/// What to run on each host and where its output is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub category_name: String,
    pub field_name: String,
    pub tag: Option<String>,
}

impl CommandSpec {
    pub fn new(
        command: impl Into<String>,
        category_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            category_name: category_name.into(),
            field_name: field_name.into(),
            tag: None,
        }
    }

    /// Spec for a one-off command: recorded under the `command` category,
    /// keyed by the lower-cased command with spaces replaced by underscores.
    pub fn ad_hoc(command: &str) -> Self {
        Self::new(
            command,
            "command",
            command.to_lowercase().replace(' ', "_"),
        )
    }
}

impl From<CommandEntry> for CommandSpec {
    fn from(entry: CommandEntry) -> Self {
        Self {
            command: entry.command,
            category_name: entry.report.category,
            field_name: entry.report.field,
            tag: entry.tag,
        }
    }
}

impl CommandsFile {
    /// Flatten the file into command specs, preserving order.
    pub fn into_specs(self) -> Vec<CommandSpec> {
        self.commands
            .into_iter()
            .map(|item| CommandSpec::from(item.item))
            .collect()
    }
}

impl DomainsFile {
    /// Per-host override mappings, in file order.
    pub fn host_overrides(&self) -> Vec<HostOverride> {
        self.domains.iter().map(|item| item.domain.clone()).collect()
    }
}
