//! Fixed-rate check scheduler
//!
//! The [`IpMonitor`] is responsible for:
//! - Loading the baseline record once at startup
//! - Resuming the hourly cadence from the last persisted check time
//! - Fetching both address families every interval
//! - Deriving the next record via [`crate::detector`]
//! - Persisting it and adopting it as the next baseline
//!
//! ## Architecture
//!
//! ```text
//!                         ┌──────────────┐
//!                         │  IpMonitor   │
//!                         └──────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//! ┌────────────────┐      ┌──────────────┐       ┌──────────────┐
//! │ AddressFetcher │      │   detector   │       │ StatusStore  │
//! │ (v4 + v6)      │      │  (decide)    │       │ (load/save)  │
//! └────────────────┘      └──────────────┘       └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch IPv4 and IPv6 concurrently; a failed family becomes absent
//! 2. Stamp the check time
//! 3. Decide the new record against the in-memory baseline
//! 4. Save it; on failure keep the old baseline for the next cycle
//! 5. Emit events for monitoring/logging

use chrono::{DateTime, Utc};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::detector;
use crate::error::Result;
use crate::status::{ObservedAddresses, StatusRecord};
use crate::traits::{AddressFamily, AddressFetcher, StatusStore, expect_ipv4, expect_ipv6};

/// Events emitted by the IpMonitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Baseline loaded, first cycle scheduled
    Started {
        initial_delay: Duration,
        baseline: StatusRecord,
    },

    /// A scheduled cycle began
    CycleStarted,

    /// One address family could not be resolved this cycle
    FetchFailed {
        family: AddressFamily,
        error: String,
    },

    /// The new record was saved and is now the baseline
    StatusPersisted {
        record: StatusRecord,
        changed: bool,
    },

    /// Saving failed; the previous baseline is kept
    CycleAbandoned {
        error: String,
    },

    /// Monitor stopped
    Stopped {
        reason: String,
    },
}

/// Delay before the first cycle
///
/// Resumes the cadence anchored at the last check instead of restarting it
/// on process start. No previous check means run immediately. A last check
/// in the future (clock skew) waits one full interval.
pub fn initial_delay(
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval: Duration,
) -> Duration {
    let Some(last_check) = last_check else {
        return Duration::ZERO;
    };

    match now.signed_duration_since(last_check).to_std() {
        Ok(elapsed) => interval.saturating_sub(elapsed),
        Err(_) => interval,
    }
}

/// Public IP status monitor
///
/// Runs one cycle at a time on a fixed-rate timer. The baseline record is
/// owned by the run loop and handed from cycle to cycle by value.
///
/// ## Lifecycle
///
/// 1. Create with [`IpMonitor::new()`]
/// 2. Start with [`IpMonitor::run()`]; it never returns on its own
///
/// ## Cadence
///
/// Ticks are anchored to the first fire time. A cycle that overruns the
/// interval delays the next tick until it finishes (cycles never overlap);
/// the late tick fires once and later ticks return to the original grid.
pub struct IpMonitor {
    /// Fetcher used for both lookup endpoints
    fetcher: Box<dyn AddressFetcher>,

    /// Where the record is persisted
    store: Box<dyn StatusStore>,

    /// IPv4 lookup endpoint
    ipv4_url: String,

    /// IPv6 lookup endpoint
    ipv6_url: String,

    /// Fixed-rate interval
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl IpMonitor {
    /// Create a new monitor
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields monitor events
    pub fn new(
        fetcher: Box<dyn AddressFetcher>,
        store: Box<dyn StatusStore>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let monitor = Self {
            fetcher,
            store,
            ipv4_url: config.ipv4_url,
            ipv6_url: config.ipv6_url,
            interval: config.interval,
            event_tx: tx,
        };

        Ok((monitor, rx))
    }

    /// Run the monitor until the process is killed
    pub async fn run(&self) {
        self.run_internal(None).await
    }

    /// Run the monitor until `shutdown_rx` fires
    ///
    /// Shutdown is only observed between cycles; a cycle in progress always
    /// completes. Intended for tests and embedding.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>) {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>) {
        let mut baseline = self.store.load().await;
        let delay = initial_delay(baseline.last_check_time(), Utc::now(), self.interval);

        info!(
            "Loaded status from {} ({}); first check in {:?}, then every {:?}",
            self.store.location(),
            baseline,
            delay,
            self.interval
        );
        self.emit_event(MonitorEvent::Started {
            initial_delay: delay,
            baseline: baseline.clone(),
        });

        let mut ticker = time::interval_at(Instant::now() + delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(ticker);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    Some(_) = ticks.next() => {
                        baseline = self.run_cycle(baseline).await;
                    }

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(MonitorEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            while ticks.next().await.is_some() {
                baseline = self.run_cycle(baseline).await;
            }
        }
    }

    /// Run one fetch-compare-persist cycle against `baseline`
    ///
    /// Returns the baseline for the next cycle: the new record if it was
    /// saved, otherwise `baseline` unchanged.
    pub async fn run_cycle(&self, baseline: StatusRecord) -> StatusRecord {
        self.emit_event(MonitorEvent::CycleStarted);

        let observed = self.observe().await;
        let check_time = Utc::now();
        let changed = detector::addresses_changed(&baseline.addresses(), &observed);
        let next = detector::decide(&baseline, observed, check_time);

        if let Err(e) = self.store.save(&next).await {
            error!(
                "Failed to persist status to {}, keeping previous baseline: {}",
                self.store.location(),
                e
            );
            self.emit_event(MonitorEvent::CycleAbandoned {
                error: e.to_string(),
            });
            return baseline;
        }

        if changed {
            info!(
                "Public address changed: ipv4 {:?} -> {:?}, ipv6 {:?} -> {:?}",
                baseline.ipv4(),
                next.ipv4(),
                baseline.ipv6(),
                next.ipv6()
            );
        } else {
            debug!("Public address unchanged ({})", next);
        }

        self.emit_event(MonitorEvent::StatusPersisted {
            record: next.clone(),
            changed,
        });
        next
    }

    /// Resolve both families concurrently
    async fn observe(&self) -> ObservedAddresses {
        let (ipv4, ipv6) = tokio::join!(self.fetch_ipv4(), self.fetch_ipv6());

        ObservedAddresses::new(
            self.absorb_failure(AddressFamily::V4, &self.ipv4_url, ipv4),
            self.absorb_failure(AddressFamily::V6, &self.ipv6_url, ipv6),
        )
    }

    async fn fetch_ipv4(&self) -> Result<Ipv4Addr> {
        let ip = self.fetcher.fetch(&self.ipv4_url).await?;
        expect_ipv4(ip)
    }

    async fn fetch_ipv6(&self) -> Result<Ipv6Addr> {
        let ip = self.fetcher.fetch(&self.ipv6_url).await?;
        expect_ipv6(ip)
    }

    /// A failed lookup is recorded as "no address" for that family
    fn absorb_failure<T>(
        &self,
        family: AddressFamily,
        url: &str,
        result: Result<T>,
    ) -> Option<T> {
        match result {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!(
                    "{} lookup via {} ({}) failed: {}",
                    family,
                    self.fetcher.fetcher_name(),
                    url,
                    e
                );
                self.emit_event(MonitorEvent::FetchFailed {
                    family,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Emit a monitor event
    fn emit_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; events are optional.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
