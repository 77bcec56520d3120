//! Metrics simulator: background task that keeps every server's monitored
//! resources moving.
//!
//! Each tick lists the store, draws fresh values in `0..=100` for every
//! configured resource of every server, and writes them back with one
//! partial update per server. Updates run concurrently and each one is
//! bounded by `store_timeout`; a failed update (deleted server, timeout,
//! store error) skips that server for this tick only. Nothing is read back,
//! so there is no read-modify-write on previous values.
//!
//! `tick()` is public so callers can single-step without a timer. `spawn()`
//! runs ticks on an interval until the returned handle is stopped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant, MissedTickBehavior};

use servwatch_core::error::ServWatchError;
use servwatch_core::model::{USAGE_MAX, USAGE_MIN};
use servwatch_core::{Server, ServerId, ServerUpdate};

use crate::config::SimulatorSection;
use crate::obs::GatewayMetrics;
use crate::store::ServerStore;

#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    pub interval: Duration,
    pub store_timeout: Duration,
    pub resources: Vec<String>,
    pub max_parallel_updates: usize,
}

impl From<&SimulatorSection> for SimulatorSettings {
    fn from(s: &SimulatorSection) -> Self {
        Self {
            interval: Duration::from_millis(s.interval_ms),
            store_timeout: Duration::from_millis(s.store_timeout_ms),
            resources: s.resources.clone(),
            max_parallel_updates: s.max_parallel_updates.max(1),
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Servers returned by the listing.
    pub listed: usize,
    /// Servers whose update call succeeded.
    pub updated: usize,
    /// Servers skipped because their update failed or timed out.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateOutcome {
    Updated,
    Unchanged,
    NotFound,
    Timeout,
    Error,
}

impl UpdateOutcome {
    fn as_str(self) -> &'static str {
        match self {
            UpdateOutcome::Updated => "updated",
            UpdateOutcome::Unchanged => "unchanged",
            UpdateOutcome::NotFound => "not_found",
            UpdateOutcome::Timeout => "timeout",
            UpdateOutcome::Error => "error",
        }
    }

    fn is_success(self) -> bool {
        matches!(self, UpdateOutcome::Updated | UpdateOutcome::Unchanged)
    }
}

struct Planned {
    id: ServerId,
    name: String,
    values: Vec<(String, i64)>,
}

pub struct MetricsSimulator {
    store: Arc<dyn ServerStore>,
    settings: SimulatorSettings,
    rng: Mutex<StdRng>,
    metrics: Arc<GatewayMetrics>,
}

impl MetricsSimulator {
    pub fn new(
        store: Arc<dyn ServerStore>,
        settings: SimulatorSettings,
        rng: StdRng,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            store,
            settings,
            rng: Mutex::new(rng),
            metrics,
        }
    }

    /// Build from config; seeded when `simulator.seed` is set.
    pub fn from_config(
        store: Arc<dyn ServerStore>,
        cfg: &SimulatorSection,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let rng = cfg.seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy);
        Self::new(store, SimulatorSettings::from(cfg), rng, metrics)
    }

    /// Run exactly one simulation pass over all servers.
    pub async fn tick(&self) -> TickReport {
        let started = Instant::now();
        self.metrics.simulator_ticks.inc(&[]);

        let servers = match timeout(self.settings.store_timeout, self.store.list()).await {
            Ok(Ok(servers)) => servers,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "simulator: listing servers failed, skipping tick");
                return TickReport::default();
            }
            Err(_) => {
                tracing::error!("simulator: listing servers timed out, skipping tick");
                return TickReport::default();
            }
        };

        let plans = self.draw(servers);
        let mut report = TickReport {
            listed: plans.len(),
            ..TickReport::default()
        };

        let mut results = stream::iter(plans)
            .map(|p| self.apply(p))
            .buffer_unordered(self.settings.max_parallel_updates);

        while let Some(outcome) = results.next().await {
            self.metrics.simulator_updates.inc(&[("outcome", outcome.as_str())]);
            if outcome.is_success() {
                report.updated += 1;
            } else {
                report.skipped += 1;
            }
        }

        self.metrics
            .simulator_last_tick_servers
            .set(&[], report.listed as i64);
        self.metrics
            .simulator_tick_duration
            .observe(&[], started.elapsed());

        tracing::debug!(
            listed = report.listed,
            updated = report.updated,
            skipped = report.skipped,
            "simulator tick done"
        );
        report
    }

    /// Draw new values for every server while holding the RNG lock once.
    fn draw(&self, servers: Vec<Server>) -> Vec<Planned> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        servers
            .into_iter()
            .map(|s| Planned {
                id: s.id,
                name: s.name,
                values: self
                    .settings
                    .resources
                    .iter()
                    .map(|r| (r.clone(), rng.gen_range(USAGE_MIN..=USAGE_MAX)))
                    .collect(),
            })
            .collect()
    }

    async fn apply(&self, plan: Planned) -> UpdateOutcome {
        let update = plan
            .values
            .iter()
            .fold(ServerUpdate::default(), |u, (r, v)| u.metric(r.clone(), *v));

        match timeout(self.settings.store_timeout, self.store.update(&plan.id, update)).await {
            Ok(Ok(changed)) => {
                tracing::info!(
                    server = %plan.name,
                    id = %plan.id,
                    values = %format_values(&plan.values),
                    "updated simulated metrics"
                );
                if changed {
                    UpdateOutcome::Updated
                } else {
                    UpdateOutcome::Unchanged
                }
            }
            Ok(Err(ServWatchError::NotFound(_))) => {
                tracing::warn!(id = %plan.id, "simulator: server vanished before update, skipping");
                UpdateOutcome::NotFound
            }
            Ok(Err(e)) => {
                tracing::warn!(id = %plan.id, error = %e, "simulator: update failed, skipping");
                UpdateOutcome::Error
            }
            Err(_) => {
                tracing::warn!(id = %plan.id, "simulator: update timed out, skipping");
                UpdateOutcome::Timeout
            }
        }
    }

    /// Start the periodic loop. The first tick fires one interval after start.
    ///
    /// The loop lives as long as the returned handle: dropping the handle
    /// stops it just like [`SimulatorHandle::stop`], without waiting.
    pub fn spawn(self: Arc<Self>) -> SimulatorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        SimulatorHandle { stop_tx, join }
    }

    async fn run(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        let every = self.settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_ms = every.as_millis() as u64, "metrics simulator started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("metrics simulator stopped");
    }
}

fn format_values(values: &[(String, i64)]) -> String {
    values
        .iter()
        .map(|(r, v)| format!("{r}={v}%"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stop signal + join handle for a spawned simulator.
///
/// Dropping it closes the stop channel, which ends the loop after any
/// in-flight tick.
#[must_use = "dropping the handle stops the simulator"]
pub struct SimulatorHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Signal the loop to exit and wait for it. A tick already in flight
    /// finishes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "simulator task ended abnormally");
        }
    }
}
