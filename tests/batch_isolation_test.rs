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

//! Batch orchestration tests against in-memory SSH transports.
//!
//! No network is involved: the connector hands out scripted transports whose
//! channels echo `<command>@<host>` split over two data chunks.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use fleetrun::config::{CommandSpec, DefaultCredentials, HostCredentials, HostOverride};
use fleetrun::executor::{
    BatchRunner, HostError, RunOptions, DEFAULT_PARALLEL_HOST_TIMEOUT_SECS,
};
use fleetrun::ssh::{
    ChannelEvent, Connector, ExecChannel, FailureKind, Session, SessionError, Transport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Ok,
    AuthFail,
    EmptyOutput,
    ChannelError,
    /// Connect takes this long before succeeding.
    SlowConnect(u64),
    /// Connect never completes.
    Hang,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    channels: AtomicUsize,
    executed: Mutex<Vec<String>>,
}

struct MockConnector {
    behaviours: HashMap<String, Behaviour>,
    counters: Arc<Counters>,
}

impl MockConnector {
    fn new(behaviours: &[(&str, Behaviour)]) -> Self {
        Self {
            behaviours: behaviours
                .iter()
                .map(|(host, b)| (host.to_string(), *b))
                .collect(),
            counters: Arc::new(Counters::default()),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, creds: &HostCredentials) -> Result<Session, SessionError> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        let behaviour = self
            .behaviours
            .get(&creds.domain)
            .copied()
            .unwrap_or(Behaviour::Ok);

        match behaviour {
            Behaviour::AuthFail => {
                return Err(SessionError::AuthRejected {
                    username: creds.username.clone(),
                    domain: creds.domain.clone(),
                })
            }
            Behaviour::SlowConnect(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            Behaviour::Hang => std::future::pending::<()>().await,
            _ => {}
        }

        Ok(Session::connected(
            &creds.domain,
            Box::new(MockTransport {
                domain: creds.domain.clone(),
                behaviour,
                counters: Arc::clone(&self.counters),
            }),
        ))
    }
}

struct MockTransport {
    domain: String,
    behaviour: Behaviour,
    counters: Arc<Counters>,
}

#[async_trait]
impl Transport for MockTransport {
    fn is_active(&self) -> bool {
        true
    }

    async fn send_ignore(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn open_channel(&self) -> Result<Box<dyn ExecChannel>, SessionError> {
        if self.behaviour == Behaviour::ChannelError {
            return Err(SessionError::Transport {
                domain: self.domain.clone(),
                source: "channel open refused".into(),
            });
        }
        self.counters.channels.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockChannel {
            domain: self.domain.clone(),
            empty: self.behaviour == Behaviour::EmptyOutput,
            events: VecDeque::new(),
            counters: Arc::clone(&self.counters),
        }))
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockChannel {
    domain: String,
    empty: bool,
    events: VecDeque<ChannelEvent>,
    counters: Arc<Counters>,
}

#[async_trait]
impl ExecChannel for MockChannel {
    async fn exec(&mut self, command: &str) -> Result<(), SessionError> {
        self.counters
            .executed
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.domain, command));

        if !self.empty {
            let text = format!("{command}@{}\n", self.domain);
            let (head, tail) = text.split_at(text.len() / 2);
            self.events.push_back(ChannelEvent::Data(head.as_bytes().to_vec()));
            self.events.push_back(ChannelEvent::Data(tail.as_bytes().to_vec()));
        }
        self.events.push_back(ChannelEvent::ExitStatus(0));
        self.events.push_back(ChannelEvent::Eof);
        self.events.push_back(ChannelEvent::Close);
        Ok(())
    }

    async fn eof(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.pop_front()
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

fn hosts(names: &[&str]) -> Vec<HostOverride> {
    names.iter().map(|name| HostOverride::named(*name)).collect()
}

fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("whoami", "whoami", "value"),
        CommandSpec::new("hostname", "hostname", "value"),
    ]
}

fn runner(connector: MockConnector, options: RunOptions) -> (BatchRunner, Arc<Counters>) {
    let counters = Arc::clone(&connector.counters);
    (
        BatchRunner::new(Arc::new(connector)).with_options(options),
        counters,
    )
}

#[tokio::test]
async fn test_failed_host_does_not_stop_batch() {
    let connector = MockConnector::new(&[("h2", Behaviour::AuthFail)]);
    let (runner, counters) = runner(connector, RunOptions::default());

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["h1", "h2", "h3"]),
            &commands(),
        )
        .await;

    let aggregate = &outcome.aggregate;
    assert_eq!(aggregate.get("h1", "whoami", "value"), Some(Some("whoami@h1")));
    assert_eq!(
        aggregate.get("h1", "hostname", "value"),
        Some(Some("hostname@h1"))
    );
    assert_eq!(aggregate.get("h3", "whoami", "value"), Some(Some("whoami@h3")));
    assert_eq!(
        aggregate.get("h3", "hostname", "value"),
        Some(Some("hostname@h3"))
    );

    // h2 was recorded before connecting, so it is present but empty
    assert!(aggregate.host("h2").unwrap().is_empty());
    let hosts_in_report: Vec<&str> = aggregate.host_names().collect();
    assert_eq!(hosts_in_report, vec!["h1", "h2", "h3"]);

    assert_eq!(outcome.hosts_total, 3);
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.failures.len(), 1);
    let failure = outcome.failure_for("h2").unwrap();
    assert!(matches!(failure.error, HostError::SessionUnavailable(_)));
    assert_eq!(failure.error.failure_kind(), Some(FailureKind::Auth));

    assert_eq!(counters.connects.load(Ordering::SeqCst), 3);
    assert_eq!(counters.disconnects.load(Ordering::SeqCst), 2);
    assert_eq!(counters.channels.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_commands_run_in_order_per_host() {
    let connector = MockConnector::new(&[]);
    let (runner, counters) = runner(connector, RunOptions::default());

    runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["a", "b"]),
            &commands(),
        )
        .await;

    assert_eq!(
        counters.executed.lock().unwrap().as_slice(),
        ["a:whoami", "a:hostname", "b:whoami", "b:hostname"]
    );
}

#[tokio::test]
async fn test_dry_run_records_nothing() {
    let connector = MockConnector::new(&[]);
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let (runner, counters) = runner(connector, options);

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["h1", "h2"]),
            &commands(),
        )
        .await;

    assert!(outcome.aggregate.is_empty());
    assert!(outcome.failures.is_empty());
    assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    assert_eq!(counters.channels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_report_shape_for_single_host() {
    let connector = MockConnector::new(&[]);
    let (runner, _) = runner(connector, RunOptions::default());

    let outcome = runner
        .run(&DefaultCredentials::default(), &hosts(&["h1"]), &commands())
        .await;

    let json = serde_json::to_value(&outcome.aggregate).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "h1": {
                "whoami": {"value": "whoami@h1"},
                "hostname": {"value": "hostname@h1"}
            }
        })
    );
}

#[tokio::test]
async fn test_empty_output_is_recorded_as_null() {
    let connector = MockConnector::new(&[("quiet", Behaviour::EmptyOutput)]);
    let (runner, _) = runner(connector, RunOptions::default());

    let outcome = runner
        .run(&DefaultCredentials::default(), &hosts(&["quiet"]), &commands())
        .await;

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.aggregate.get("quiet", "whoami", "value"), Some(None));
    let json = serde_json::to_value(&outcome.aggregate).unwrap();
    assert!(json["quiet"]["hostname"]["value"].is_null());
}

#[tokio::test]
async fn test_channel_error_aborts_host_and_closes_session() {
    let connector = MockConnector::new(&[("bad", Behaviour::ChannelError)]);
    let (runner, counters) = runner(connector, RunOptions::default());

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["bad", "good"]),
            &commands(),
        )
        .await;

    let failure = outcome.failure_for("bad").unwrap();
    match &failure.error {
        HostError::Command { command, .. } => assert_eq!(command, "whoami"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(failure.error.failure_kind(), Some(FailureKind::Transport));
    assert!(failure.detail().contains("channel open refused"));

    assert_eq!(
        outcome.aggregate.get("good", "hostname", "value"),
        Some(Some("hostname@good"))
    );
    assert_eq!(counters.disconnects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unresolvable_host_is_isolated() {
    let connector = MockConnector::new(&[]);
    let (runner, counters) = runner(connector, RunOptions::default());

    let mut host_list = hosts(&["h1"]);
    host_list.insert(
        0,
        HostOverride {
            name: Some("odd".to_string()),
            ssh_key_type: Some("dsa".to_string()),
            ..HostOverride::default()
        },
    );

    let outcome = runner
        .run(&DefaultCredentials::default(), &host_list, &commands())
        .await;

    let failure = outcome.failure_for("odd").unwrap();
    assert!(matches!(failure.error, HostError::Config(_)));
    assert!(outcome.aggregate.host("odd").is_none());
    assert_eq!(
        outcome.aggregate.get("h1", "whoami", "value"),
        Some(Some("whoami@h1"))
    );
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_run_keeps_host_order() {
    let connector = MockConnector::new(&[
        ("slow", Behaviour::SlowConnect(300)),
        ("medium", Behaviour::SlowConnect(100)),
        ("fast", Behaviour::SlowConnect(10)),
    ]);
    let options = RunOptions {
        parallel: 3,
        ..RunOptions::default()
    };
    let (runner, counters) = runner(connector, options);

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["slow", "medium", "fast"]),
            &commands(),
        )
        .await;

    assert!(outcome.failures.is_empty());
    let order: Vec<&str> = outcome.aggregate.host_names().collect();
    assert_eq!(order, vec!["slow", "medium", "fast"]);
    assert_eq!(counters.disconnects.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_host_timeout_isolates_stalled_host() {
    let connector = MockConnector::new(&[("stuck", Behaviour::Hang)]);
    let options = RunOptions {
        host_timeout: Some(Duration::from_secs(5)),
        ..RunOptions::default()
    };
    let (runner, _) = runner(connector, options);

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["stuck", "fine"]),
            &commands(),
        )
        .await;

    let failure = outcome.failure_for("stuck").unwrap();
    assert!(matches!(
        failure.error,
        HostError::TimedOut { timeout_secs: 5 }
    ));
    assert_eq!(
        outcome.aggregate.get("fine", "whoami", "value"),
        Some(Some("whoami@fine"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_parallel_run_applies_default_host_timeout() {
    let connector = MockConnector::new(&[("stuck", Behaviour::Hang)]);
    let options = RunOptions {
        parallel: 2,
        ..RunOptions::default()
    };
    let (runner, _) = runner(connector, options);

    let outcome = tokio::time::timeout(
        Duration::from_secs(DEFAULT_PARALLEL_HOST_TIMEOUT_SECS * 2),
        runner.run(
            &DefaultCredentials::default(),
            &hosts(&["stuck", "fine"]),
            &commands(),
        ),
    )
    .await
    .expect("parallel batch should not wait forever on a stalled host");

    let failure = outcome.failure_for("stuck").unwrap();
    match failure.error {
        HostError::TimedOut { timeout_secs } => {
            assert_eq!(timeout_secs, DEFAULT_PARALLEL_HOST_TIMEOUT_SECS)
        }
        ref other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        outcome.aggregate.get("fine", "whoami", "value"),
        Some(Some("whoami@fine"))
    );
}

#[tokio::test]
async fn test_cancelled_run_skips_all_hosts() {
    let connector = MockConnector::new(&[]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let counters = Arc::clone(&connector.counters);
    let runner = BatchRunner::new(Arc::new(connector)).with_cancellation(cancel);

    let outcome = runner
        .run(
            &DefaultCredentials::default(),
            &hosts(&["h1", "h2"]),
            &commands(),
        )
        .await;

    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome
        .failures
        .iter()
        .all(|f| matches!(f.error, HostError::Cancelled)));
    assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
}
