//! Shared application state for the servwatch gateway.
//!
//! The store handle is constructed once at startup and passed in explicitly;
//! both the request layer and the simulator hold the same `Arc`.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use servwatch_core::clock::{Clock, SystemClock};
use servwatch_core::error::{Result, ServWatchError};

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;
use crate::simulator::MetricsSimulator;
use crate::store::{InMemoryServerStore, ServerStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    store: Arc<dyn ServerStore>,
    metrics: Arc<GatewayMetrics>,
    clock: Arc<dyn Clock>,
    history_rng: Mutex<StdRng>,
}

impl AppState {
    /// Build state around an existing store, using the system clock.
    pub fn new(cfg: GatewayConfig, store: Arc<dyn ServerStore>) -> Self {
        Self::with_clock(cfg, store, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: GatewayConfig, store: Arc<dyn ServerStore>, clock: Arc<dyn Clock>) -> Self {
        let history_rng = cfg
            .signals
            .seed
            .map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                metrics: Arc::new(GatewayMetrics::default()),
                clock,
                history_rng: Mutex::new(history_rng),
            }),
        }
    }

    /// In-memory store populated with `seed_servers` from the config.
    pub async fn bootstrap(cfg: GatewayConfig) -> Result<Self> {
        let store: Arc<dyn ServerStore> = Arc::new(InMemoryServerStore::new());
        for seed in &cfg.seed_servers {
            let id = store.insert(seed.to_new_server()).await?;
            tracing::info!(%id, name = %seed.name, "seeded server");
        }
        Ok(Self::new(cfg, store))
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<dyn ServerStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.cfg.gateway.store_timeout_ms)
    }

    /// Await a store call under `gateway.store_timeout_ms`; expiry is `Timeout`.
    pub async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout(), op).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(timeout_ms = self.inner.cfg.gateway.store_timeout_ms, "store call timed out");
                Err(ServWatchError::Timeout)
            }
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Run `f` with exclusive access to the history RNG.
    pub fn with_history_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .inner
            .history_rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Simulator sharing this state's store and metrics registry.
    pub fn simulator(&self) -> MetricsSimulator {
        MetricsSimulator::from_config(
            self.store(),
            &self.inner.cfg.simulator,
            Arc::clone(&self.inner.metrics),
        )
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Extra gauge lines for `/metrics`.
    pub async fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        match self.bounded(self.inner.store.count()).await {
            Ok(n) => vec![("servwatch_servers", n as u64)],
            Err(e) => {
                tracing::warn!(error = %e, "metrics: store count failed");
                Vec::new()
            }
        }
    }
}
