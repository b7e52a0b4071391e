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

//! Accumulated command results: host → category → field → output.
//!
//! Hosts, categories and fields all keep the order in which they were first
//! recorded. The table view relies on this to derive its columns.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Insertion-ordered map with linear lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> V) -> &mut V {
        let index = match self.position(key) {
            Some(index) => index,
            None => {
                self.entries.push((key.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: &str, value: V) {
        match self.position(key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// field → output
pub type FieldMap = OrderedMap<Option<String>>;
/// category → fields
pub type HostReport = OrderedMap<FieldMap>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultAggregate {
    hosts: OrderedMap<HostReport>,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `host` has an entry, even if nothing is ever recorded for it.
    pub fn ensure_host(&mut self, host: &str) {
        self.hosts.get_or_insert_with(host, HostReport::default);
    }

    pub fn record(&mut self, host: &str, category: &str, field: &str, output: Option<String>) {
        self.hosts
            .get_or_insert_with(host, HostReport::default)
            .get_or_insert_with(category, FieldMap::default)
            .insert(field, output);
    }

    /// `None` when the host/category/field was never recorded.
    pub fn get(&self, host: &str, category: &str, field: &str) -> Option<Option<&str>> {
        self.hosts
            .get(host)?
            .get(category)?
            .get(field)
            .map(|value| value.as_deref())
    }

    pub fn host(&self, host: &str) -> Option<&HostReport> {
        self.hosts.get(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &HostReport)> {
        self.hosts.iter()
    }

    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Reorder hosts to follow `order`. Hosts not named keep their relative
    /// order and go last.
    pub fn reorder_hosts<S: AsRef<str>>(&mut self, order: &[S]) {
        let rank = |host: &str| {
            order
                .iter()
                .position(|o| o.as_ref() == host)
                .unwrap_or(usize::MAX)
        };
        self.hosts.entries.sort_by_key(|(host, _)| rank(host));
    }
}

impl Serialize for ResultAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.hosts.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_shape() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("h1", "whoami", "value", Some("root".to_string()));
        aggregate.record("h1", "hostname", "value", Some("h1".to_string()));

        let json = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "h1": {
                    "whoami": {"value": "root"},
                    "hostname": {"value": "h1"}
                }
            })
        );
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut aggregate = ResultAggregate::new();
        aggregate.record("zeta", "b", "x", None);
        aggregate.record("alpha", "a", "x", None);
        aggregate.record("zeta", "a", "y", Some("1".to_string()));

        let hosts: Vec<&str> = aggregate.host_names().collect();
        assert_eq!(hosts, vec!["zeta", "alpha"]);

        let categories: Vec<&str> = aggregate.host("zeta").unwrap().keys().collect();
        assert_eq!(categories, vec!["b", "a"]);

        let text = serde_json::to_string(&aggregate).unwrap();
        assert_eq!(
            text,
            r#"{"zeta":{"b":{"x":null},"a":{"y":"1"}},"alpha":{"a":{"x":null}}}"#
        );
    }

    #[test]
    fn test_ensure_host_and_overwrite() {
        let mut aggregate = ResultAggregate::new();
        aggregate.ensure_host("h1");
        assert_eq!(aggregate.len(), 1);
        assert!(aggregate.host("h1").unwrap().is_empty());

        aggregate.record("h1", "c", "f", Some("old".to_string()));
        aggregate.record("h1", "c", "f", Some("new".to_string()));
        assert_eq!(aggregate.get("h1", "c", "f"), Some(Some("new")));
        assert_eq!(aggregate.get("h1", "c", "missing"), None);

        aggregate.ensure_host("h1");
        assert_eq!(aggregate.get("h1", "c", "f"), Some(Some("new")));
    }

    #[test]
    fn test_reorder_hosts() {
        let mut aggregate = ResultAggregate::new();
        for host in ["c", "a", "x", "b"] {
            aggregate.ensure_host(host);
        }
        aggregate.reorder_hosts(&["a", "b", "c"]);
        let hosts: Vec<&str> = aggregate.host_names().collect();
        assert_eq!(hosts, vec!["a", "b", "c", "x"]);
    }
}
