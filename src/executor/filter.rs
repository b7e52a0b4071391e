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

use std::borrow::Cow;

use crate::config::{resolve, DefaultCredentials, HostOverride};

/// Keep hosts whose resolved domain contains `query`, ignoring case.
///
/// Without a query the input is returned as is. Entries that fail to resolve
/// are logged and dropped.
pub fn filter_domains<'a>(
    defaults: &DefaultCredentials,
    hosts: &'a [HostOverride],
    query: Option<&str>,
) -> Cow<'a, [HostOverride]> {
    let Some(query) = query else {
        return Cow::Borrowed(hosts);
    };
    let needle = query.to_lowercase();

    let selected: Vec<HostOverride> = hosts
        .iter()
        .filter(|host| match resolve(defaults, host) {
            Ok(creds) => creds.domain.to_lowercase().contains(&needle),
            Err(e) => {
                tracing::error!("Skipping host entry {:?}: {}", host.name, e);
                false
            }
        })
        .cloned()
        .collect();

    tracing::debug!(
        "Filter '{}' selected {} of {} hosts",
        query,
        selected.len(),
        hosts.len()
    );
    Cow::Owned(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<HostOverride> {
        vec![
            HostOverride::named("Web1.example.com"),
            HostOverride::named("db.example.com"),
        ]
    }

    fn names(hosts: &[HostOverride]) -> Vec<&str> {
        hosts.iter().filter_map(|h| h.name.as_deref()).collect()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let hosts = hosts();
        let filtered = filter_domains(&DefaultCredentials::default(), &hosts, Some("WEB"));
        assert_eq!(names(&filtered), vec!["Web1.example.com"]);
    }

    #[test]
    fn test_no_query_borrows_input() {
        let hosts = hosts();
        let filtered = filter_domains(&DefaultCredentials::default(), &hosts, None);
        assert!(matches!(filtered, Cow::Borrowed(_)));
        assert_eq!(names(&filtered), vec!["Web1.example.com", "db.example.com"]);
    }

    #[test]
    fn test_unresolvable_entries_are_dropped() {
        let mut hosts = hosts();
        hosts.push(HostOverride::default());
        hosts.push(HostOverride {
            name: Some("web2.example.com".to_string()),
            ssh_key_type: Some("dsa".to_string()),
            ..HostOverride::default()
        });

        let filtered = filter_domains(&DefaultCredentials::default(), &hosts, Some("example"));
        assert_eq!(names(&filtered), vec!["Web1.example.com", "db.example.com"]);
    }

    #[test]
    fn test_no_match() {
        let hosts = hosts();
        let filtered = filter_domains(&DefaultCredentials::default(), &hosts, Some("mail"));
        assert!(filtered.is_empty());
    }
}
