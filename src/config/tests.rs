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

//! Configuration tests.

use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::credentials::{DefaultCredentials, SshKeyType, ENV_KEY_TYPE, ENV_USERNAME};
use super::error::ConfigError;
use super::types::{CommandSpec, CommandsFile, DomainsFile, PortValue};
use super::utils::expand_tilde;

#[test]
#[serial]
fn test_expand_tilde() {
    let original_home = std::env::var("HOME").ok();
    std::env::set_var("HOME", "/home/user");

    assert_eq!(
        expand_tilde(Path::new("~/.ssh/id_rsa")),
        PathBuf::from("/home/user/.ssh/id_rsa")
    );
    assert_eq!(
        expand_tilde(Path::new("/etc/ssh/key")),
        PathBuf::from("/etc/ssh/key")
    );
    assert_eq!(expand_tilde(Path::new("~user/x")), PathBuf::from("~user/x"));
    assert_eq!(expand_tilde(Path::new("~")), PathBuf::from("/home/user"));

    if let Some(home) = original_home {
        std::env::set_var("HOME", home);
    } else {
        std::env::remove_var("HOME");
    }
}

#[test]
#[serial]
fn test_defaults_read_process_environment() {
    std::env::set_var(ENV_USERNAME, "envuser");
    std::env::set_var(ENV_KEY_TYPE, "ed25519");

    let defaults = DefaultCredentials::load(None).unwrap();
    assert_eq!(defaults.username, "envuser");
    assert_eq!(defaults.ssh_key_type, SshKeyType::Ed25519);

    std::env::remove_var(ENV_USERNAME);
    std::env::remove_var(ENV_KEY_TYPE);
}

#[test]
#[serial]
fn test_unsupported_env_key_type_is_fatal() {
    std::env::set_var(ENV_KEY_TYPE, "dsa");
    let result = DefaultCredentials::load(None);
    std::env::remove_var(ENV_KEY_TYPE);

    assert!(matches!(
        result,
        Err(ConfigError::UnsupportedKeyType { .. })
    ));
}

#[tokio::test]
async fn test_load_domains_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("domains.yml");
    std::fs::write(
        &path,
        r#"
defaults:
  port: "2222"
  user: admin
domains:
  - domain:
      name: web1.example.com
  - domain:
      host: db.example.com
      port: 22
"#,
    )
    .unwrap();

    let file = DomainsFile::load(&path).await.unwrap();
    let defaults = file.defaults.unwrap();
    assert_eq!(defaults.port, Some(PortValue::Text("2222".to_string())));
    assert_eq!(file.domains.len(), 2);
    assert_eq!(file.domains[0].domain.name.as_deref(), Some("web1.example.com"));
    assert_eq!(file.domains[1].domain.name.as_deref(), Some("db.example.com"));
    assert_eq!(file.domains[1].domain.port, Some(PortValue::Number(22)));
}

#[tokio::test]
async fn test_load_commands_file_defaults_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.yml");
    std::fs::write(
        &path,
        r#"
commands:
  - item:
      command: uptime
      report:
        category: system
  - item:
      command: whoami
      tag: all
      report: {category: whoami, field: user}
"#,
    )
    .unwrap();

    let specs = CommandsFile::load(&path).await.unwrap().into_specs();
    assert_eq!(specs[0], CommandSpec::new("uptime", "system", "value"));
    assert_eq!(specs[1].field_name, "user");
    assert_eq!(specs[1].tag.as_deref(), Some("all"));
}

#[tokio::test]
async fn test_missing_file_is_reported() {
    let err = DomainsFile::load(Path::new("/nonexistent/domains.yml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_malformed_yaml_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("domains.yml");
    std::fs::write(&path, "domains: [\n  - : :\n").unwrap();

    let err = DomainsFile::load(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_ad_hoc_command_field_name() {
    let spec = CommandSpec::ad_hoc("Uname -A");
    assert_eq!(spec.category_name, "command");
    assert_eq!(spec.field_name, "uname_-a");
    assert_eq!(spec.command, "Uname -A");
}
