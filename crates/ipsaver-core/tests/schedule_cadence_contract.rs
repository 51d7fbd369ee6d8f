//! Contract Test: Fixed-Rate Scheduling
//!
//! Runs on tokio's paused clock, so hours pass instantly and deterministically.
//!
//! Constraints verified:
//! - No previous check → first cycle runs immediately
//! - A recent previous check resumes the hourly cadence from that check
//! - Cycles are exactly one interval apart (no drift)
//! - An overrunning cycle delays the next one but never overlaps it,
//!   and later cycles return to the original grid
//! - Shutdown is observed between cycles
//!
//! If this test fails, someone has replaced the fixed-rate timer with a
//! sleep-after-work loop or broken the restart catch-up.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use ipsaver_core::{IpMonitor, MemoryStatusStore, MonitorEvent, StatusRecord};
use std::time::Duration;
use tokio::time::Instant;

fn steady_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .script(V4_URL, vec![Reply::addr("203.0.113.9")])
        .script(V6_URL, vec![Reply::addr("2001:db8::9")])
}

#[tokio::test(start_paused = true)]
async fn first_cycle_is_immediate_then_hourly() {
    let fetcher = steady_fetcher();
    let store = MemoryStatusStore::new();
    let start = Instant::now();

    let (monitor, mut events) =
        IpMonitor::new(Box::new(fetcher.clone()), Box::new(store.clone()), test_config())
            .expect("monitor construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { monitor.run_with_shutdown(Some(shutdown_rx)).await });

    for _ in 0..3 {
        assert!(matches!(
            next_cycle_outcome(&mut events).await,
            MonitorEvent::StatusPersisted { .. }
        ));
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let calls = fetcher.calls_to(V4_URL);
    assert_eq!(calls.len(), 3);
    assert_span(calls[0] - start, Duration::ZERO);
    assert_span(calls[1] - calls[0], HOUR);
    assert_span(calls[2] - calls[1], HOUR);
    assert_eq!(fetcher.calls_to(V6_URL).len(), 3);
    assert_eq!(store.save_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn restart_resumes_cadence_from_last_check() {
    let last_check = Utc::now() - ChronoDuration::minutes(10);
    let store = MemoryStatusStore::with_record(StatusRecord::new(
        Some("203.0.113.9".parse().unwrap()),
        Some("2001:db8::9".parse().unwrap()),
        Some(last_check),
        Some(last_check),
    ));
    let fetcher = steady_fetcher();
    let start = Instant::now();

    let (monitor, mut events) =
        IpMonitor::new(Box::new(fetcher.clone()), Box::new(store.clone()), test_config())
            .expect("monitor construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { monitor.run_with_shutdown(Some(shutdown_rx)).await });

    match events.recv().await.unwrap() {
        MonitorEvent::Started { initial_delay, .. } => {
            let expected = Duration::from_secs(50 * 60);
            assert!(initial_delay <= expected);
            assert!(expected - initial_delay < Duration::from_secs(1));
        }
        other => panic!("expected Started, got {:?}", other),
    }

    match next_cycle_outcome(&mut events).await {
        MonitorEvent::StatusPersisted { record, changed } => {
            assert!(!changed);
            assert_eq!(record.last_update_time(), Some(last_check));
        }
        other => panic!("expected StatusPersisted, got {:?}", other),
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let calls = fetcher.calls_to(V4_URL);
    assert_eq!(calls.len(), 1);
    let waited = calls[0] - start;
    assert!(waited <= Duration::from_secs(50 * 60));
    assert!(waited > Duration::from_secs(50 * 60 - 1));
}

#[tokio::test(start_paused = true)]
async fn overdue_last_check_runs_immediately() {
    let last_check = Utc::now() - ChronoDuration::hours(2);
    let store = MemoryStatusStore::with_record(StatusRecord::new(
        None,
        None,
        Some(last_check),
        None,
    ));
    let fetcher = steady_fetcher();
    let start = Instant::now();

    let (monitor, mut events) =
        IpMonitor::new(Box::new(fetcher.clone()), Box::new(store), test_config())
            .expect("monitor construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { monitor.run_with_shutdown(Some(shutdown_rx)).await });

    next_cycle_outcome(&mut events).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    assert_span(fetcher.calls_to(V4_URL)[0] - start, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn overrunning_cycle_defers_next_without_drift() {
    let ninety_minutes = Duration::from_secs(90 * 60);
    let fetcher = ScriptedFetcher::new()
        .script_delayed(
            V4_URL,
            vec![
                (Reply::addr("203.0.113.9"), ninety_minutes),
                (Reply::addr("203.0.113.9"), Duration::ZERO),
            ],
        )
        .script(V6_URL, vec![Reply::addr("2001:db8::9")]);
    let start = Instant::now();

    let (monitor, mut events) = IpMonitor::new(
        Box::new(fetcher.clone()),
        Box::new(MemoryStatusStore::new()),
        test_config(),
    )
    .expect("monitor construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { monitor.run_with_shutdown(Some(shutdown_rx)).await });

    for _ in 0..3 {
        next_cycle_outcome(&mut events).await;
    }
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let calls = fetcher.calls_to(V4_URL);
    assert_eq!(calls.len(), 3);
    // Cycle 1 starts at 0 and runs for 90 minutes.
    assert_span(calls[0] - start, Duration::ZERO);
    // The missed 60-minute tick fires as soon as cycle 1 is done.
    assert_span(calls[1] - start, ninety_minutes);
    // Back on the hourly grid.
    assert_span(calls[2] - start, 2 * HOUR);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_between_cycles() {
    let fetcher = steady_fetcher();

    let (monitor, mut events) = IpMonitor::new(
        Box::new(fetcher.clone()),
        Box::new(MemoryStatusStore::new()),
        test_config(),
    )
    .expect("monitor construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { monitor.run_with_shutdown(Some(shutdown_rx)).await });

    next_cycle_outcome(&mut events).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "monitor should stop promptly");

    let mut saw_stopped = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, MonitorEvent::Stopped { .. }) {
            saw_stopped = true;
        }
    }
    assert!(saw_stopped, "Stopped event should be emitted");
    assert_eq!(fetcher.calls_to(V4_URL).len(), 1);
}
