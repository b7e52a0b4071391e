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

//! Configuration management for fleetrun.

pub mod credentials;
mod error;
mod loader;
pub mod template;
#[cfg(test)]
mod tests;
mod types;
mod utils;
pub mod validation;

// Re-export public types
pub use credentials::{resolve, DefaultCredentials, HostCredentials, SshKeyType};
pub use error::ConfigError;
pub use loader::{read_yaml, read_yaml_value};
pub use types::{
    CommandEntry, CommandItem, CommandSpec, CommandsFile, DefaultsSection, DomainItem,
    DomainsFile, HostOverride, PortValue, ReportTarget,
};
pub use utils::{ensure_file_exists, expand_tilde};
pub use validation::{ValidationError, VerifyTarget};
