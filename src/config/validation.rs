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

//! Structural verification of the YAML configuration files.
//!
//! Unlike loading, verification does not stop at the first problem. Every
//! issue found in one pass is returned so the operator can fix them together.

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

use super::credentials::SshKeyType;

/// One structural problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Where the problem is, e.g. `defaults` or `domains[2]`.
    pub location: String,
    pub message: String,
}

impl ValidationError {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Which file layout to verify against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VerifyTarget {
    Domains,
    Commands,
}

impl fmt::Display for VerifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyTarget::Domains => write!(f, "domains"),
            VerifyTarget::Commands => write!(f, "commands"),
        }
    }
}

pub fn verify(target: VerifyTarget, data: &Value) -> Vec<ValidationError> {
    match target {
        VerifyTarget::Domains => verify_domains(data),
        VerifyTarget::Commands => verify_commands(data),
    }
}

/// Check the layout of a domains file.
pub fn verify_domains(data: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(root) = data.as_mapping() else {
        errors.push(ValidationError::new("<root>", "document should be a mapping"));
        return errors;
    };

    match root.get("defaults") {
        None => errors.push(ValidationError::new("defaults", "section is missing")),
        Some(Value::Null) => errors.push(ValidationError::new("defaults", "section is empty")),
        Some(Value::Mapping(defaults)) => {
            check_no_nulls("defaults", defaults, &["ssh_key_password"], &mut errors);
            check_host_fields("defaults", defaults, &mut errors);
        }
        Some(_) => errors.push(ValidationError::new("defaults", "section should be a mapping")),
    }

    match root.get("domains") {
        None => errors.push(ValidationError::new("domains", "section is missing")),
        Some(Value::Null) => errors.push(ValidationError::new("domains", "section is empty")),
        Some(Value::Sequence(items)) => {
            if items.is_empty() {
                errors.push(ValidationError::new("domains", "section is empty"));
            }
            for (i, item) in items.iter().enumerate() {
                let location = format!("domains[{}]", i + 1);
                let Some(domain) = item.get("domain") else {
                    errors.push(ValidationError::new(location, "missing key 'domain'"));
                    continue;
                };
                let Some(domain) = domain.as_mapping() else {
                    errors.push(ValidationError::new(location, "'domain' should be a mapping"));
                    continue;
                };
                if !domain.contains_key("name") && !domain.contains_key("host") {
                    errors.push(ValidationError::new(&location, "missing key 'name'"));
                }
                check_no_nulls(&location, domain, &[], &mut errors);
                check_host_fields(&location, domain, &mut errors);
            }
        }
        Some(_) => errors.push(ValidationError::new("domains", "section should be a list")),
    }

    errors
}

/// Check the layout of a commands file.
pub fn verify_commands(data: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(items) = data.get("commands") else {
        errors.push(ValidationError::new("commands", "section is missing"));
        return errors;
    };
    let Some(items) = items.as_sequence() else {
        errors.push(ValidationError::new("commands", "section should be a list"));
        return errors;
    };
    if items.is_empty() {
        errors.push(ValidationError::new("commands", "section is empty"));
    }

    for (i, item) in items.iter().enumerate() {
        let location = format!("commands[{}]", i + 1);
        let Some(entry) = item.get("item").and_then(Value::as_mapping) else {
            errors.push(ValidationError::new(location, "missing mapping 'item'"));
            continue;
        };

        match entry.get("command") {
            Some(Value::String(cmd)) if !cmd.trim().is_empty() => {}
            Some(Value::String(_)) => {
                errors.push(ValidationError::new(&location, "'command' is empty"))
            }
            Some(_) => errors.push(ValidationError::new(&location, "'command' should be a string")),
            None => errors.push(ValidationError::new(&location, "missing key 'command'")),
        }

        match entry.get("report").and_then(Value::as_mapping) {
            None => errors.push(ValidationError::new(&location, "missing mapping 'report'")),
            Some(report) => match report.get("category") {
                Some(Value::String(_)) => {}
                Some(_) => errors.push(ValidationError::new(
                    &location,
                    "'report.category' should be a string",
                )),
                None => errors.push(ValidationError::new(&location, "missing key 'report.category'")),
            },
        }
    }

    errors
}

fn check_no_nulls(
    location: &str,
    section: &Mapping,
    nullable: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    for (key, value) in section {
        let key = key.as_str().unwrap_or("<non-string key>");
        if value.is_null() && !nullable.contains(&key) {
            errors.push(ValidationError::new(
                location,
                format!("value for '{key}' cannot be null"),
            ));
        }
    }
}

fn check_host_fields(location: &str, section: &Mapping, errors: &mut Vec<ValidationError>) {
    for key in ["ssh_key_path", "ssh_key_type", "user"] {
        if let Some(value) = section.get(key) {
            if !value.is_null() && !value.is_string() {
                errors.push(ValidationError::new(
                    location,
                    format!("'{key}' should be a string"),
                ));
            }
        }
    }

    if let Some(Value::String(key_type)) = section.get("ssh_key_type") {
        if SshKeyType::from_str(key_type).is_err() {
            errors.push(ValidationError::new(
                location,
                format!("unsupported ssh_key_type '{key_type}'"),
            ));
        }
    }

    match section.get("port") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) if n.as_u64().is_some_and(|p| p <= u16::MAX as u64) => {}
        Some(Value::String(s)) if s.trim().parse::<u16>().is_ok() => {}
        Some(other) => errors.push(ValidationError::new(
            location,
            format!("'port' should be an integer, got {}", describe(other)),
        )),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(_) => "a tagged value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_domains_file_has_no_errors() {
        let data = parse(
            r#"
defaults:
  port: "22"
  user: root
  ssh_key_path: ~/.ssh/id_rsa
  ssh_key_password: null
  ssh_key_type: rsa
domains:
  - domain:
      name: localhost
      port: 22
"#,
        );
        assert!(verify_domains(&data).is_empty());
    }

    #[test]
    fn test_collects_multiple_errors_in_one_pass() {
        let data = parse(
            r#"
domains:
  - domain:
      port: abc
      user: 42
  - other: x
"#,
        );
        let errors = verify_domains(&data);
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();

        assert!(rendered.contains(&"defaults: section is missing".to_string()));
        assert!(rendered.contains(&"domains[1]: missing key 'name'".to_string()));
        assert!(rendered.contains(&"domains[1]: 'user' should be a string".to_string()));
        assert!(rendered
            .iter()
            .any(|e| e.starts_with("domains[1]: 'port' should be an integer")));
        assert!(rendered.contains(&"domains[2]: missing key 'domain'".to_string()));
        assert!(errors.len() >= 5);
    }

    #[test]
    fn test_domains_must_be_list() {
        let data = parse("defaults:\n  user: root\ndomains: web1\n");
        let errors = verify_domains(&data);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "section should be a list");
    }

    #[test]
    fn test_null_values_are_reported() {
        let data = parse(
            "defaults:\n  user: null\ndomains:\n  - domain:\n      name: h1\n      ssh_key_path: null\n",
        );
        let errors = verify_domains(&data);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("cannot be null")));
    }

    #[test]
    fn test_host_alias_satisfies_name() {
        let data = parse("defaults:\n  user: root\ndomains:\n  - domain:\n      host: h1\n");
        assert!(verify_domains(&data).is_empty());
    }

    #[test]
    fn test_commands_file_checks() {
        let data = parse(
            r#"
commands:
  - item:
      command: whoami
      report: {category: whoami, field: value}
  - item:
      command: ""
  - nothing: here
"#,
        );
        let errors = verify_commands(&data);
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "commands[2]: 'command' is empty".to_string(),
                "commands[2]: missing mapping 'report'".to_string(),
                "commands[3]: missing mapping 'item'".to_string(),
            ]
        );
    }
}
