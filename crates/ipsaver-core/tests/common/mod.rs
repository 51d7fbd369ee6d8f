//! Test doubles and common utilities for monitor contract tests
//!
//! This module provides minimal test doubles that script lookup results and
//! storage failures without touching the network.

#![allow(dead_code)]

use ipsaver_core::error::{Error, Result};
use ipsaver_core::traits::{AddressFetcher, StatusStore};
use ipsaver_core::{MemoryStatusStore, MonitorConfig, MonitorEvent, StatusRecord};
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const V4_URL: &str = "http://v4.lookup.test/";
pub const V6_URL: &str = "http://v6.lookup.test/";
pub const HOUR: Duration = Duration::from_secs(3600);

/// What a scripted lookup answers
#[derive(Debug, Clone)]
pub enum Reply {
    Addr(IpAddr),
    NetworkDown,
    Garbage,
}

impl Reply {
    pub fn addr(s: &str) -> Self {
        Reply::Addr(s.parse().expect("valid test address"))
    }
}

#[derive(Default)]
struct FetcherState {
    scripts: HashMap<String, VecDeque<(Reply, Duration)>>,
    last: HashMap<String, (Reply, Duration)>,
    calls: Vec<(String, Instant)>,
}

/// An AddressFetcher answering from per-URL scripts
///
/// Each URL answers its queued replies in order and then repeats the last
/// one. Clones share the script and the call log.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    state: Arc<Mutex<FetcherState>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue immediate replies for `url`
    pub fn script(self, url: &str, replies: Vec<Reply>) -> Self {
        let delayed = replies.into_iter().map(|r| (r, Duration::ZERO)).collect();
        self.script_delayed(url, delayed)
    }

    /// Queue replies that take `delay` (virtual time) to arrive
    pub fn script_delayed(self, url: &str, replies: Vec<(Reply, Duration)>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(url.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Instants at which `url` was requested
    pub fn calls_to(&self, url: &str) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }

    fn next_reply(&self, url: &str) -> (Reply, Duration) {
        let mut state = self.state.lock().unwrap();
        state.calls.push((url.to_string(), Instant::now()));

        let next = state.scripts.get_mut(url).and_then(|q| q.pop_front());
        match next {
            Some(step) => {
                state.last.insert(url.to_string(), step.clone());
                step
            }
            None => state
                .last
                .get(url)
                .cloned()
                .unwrap_or((Reply::NetworkDown, Duration::ZERO)),
        }
    }
}

#[async_trait::async_trait]
impl AddressFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<IpAddr> {
        let (reply, delay) = self.next_reply(url);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Addr(ip) => Ok(ip),
            Reply::NetworkDown => Err(Error::network("connection refused")),
            Reply::Garbage => Err(Error::parse("Invalid IP address: <html>")),
        }
    }

    fn fetcher_name(&self) -> &'static str {
        "scripted"
    }
}

/// A StatusStore whose next `n` saves fail
#[derive(Clone, Default)]
pub struct FlakyStatusStore {
    inner: MemoryStatusStore,
    failures_left: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FlakyStatusStore {
    pub fn failing(n: usize, initial: StatusRecord) -> Self {
        Self {
            inner: MemoryStatusStore::with_record(initial),
            failures_left: Arc::new(AtomicUsize::new(n)),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> StatusRecord {
        self.inner.snapshot().await
    }
}

#[async_trait::async_trait]
impl StatusStore for FlakyStatusStore {
    async fn load(&self) -> StatusRecord {
        self.inner.load().await
    }

    async fn save(&self, record: &StatusRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::status_store("disk full"));
        }
        self.inner.save(record).await
    }

    fn location(&self) -> String {
        "flaky".to_string()
    }
}

/// Monitor configuration pointing at the scripted URLs, hourly
pub fn test_config() -> MonitorConfig {
    MonitorConfig::default().with_urls(V4_URL, V6_URL)
}

/// Wait for the end of the next cycle (persisted or abandoned)
pub async fn next_cycle_outcome(rx: &mut mpsc::Receiver<MonitorEvent>) -> MonitorEvent {
    loop {
        let event = rx.recv().await.expect("monitor event channel open");
        if matches!(
            event,
            MonitorEvent::StatusPersisted { .. } | MonitorEvent::CycleAbandoned { .. }
        ) {
            return event;
        }
    }
}

/// Assert two virtual-clock spans match within a millisecond
pub fn assert_span(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(1),
        "expected span {:?}, got {:?}",
        expected,
        actual
    );
}
