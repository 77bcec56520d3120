//! Metrics simulator behaviour, single-stepped through `tick()`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use servwatch_core::error::{Result, ServWatchError};
use servwatch_core::model::{CPU_USAGE, MEMORY_USAGE};
use servwatch_core::{Metrics, NewServer, Server, ServerId, ServerUpdate};
use servwatch_gateway::obs::GatewayMetrics;
use servwatch_gateway::simulator::{MetricsSimulator, SimulatorSettings, TickReport};
use servwatch_gateway::store::{InMemoryServerStore, ServerStore};

fn settings() -> SimulatorSettings {
    SimulatorSettings {
        interval: Duration::from_secs(5),
        store_timeout: Duration::from_millis(200),
        resources: vec![CPU_USAGE.into(), MEMORY_USAGE.into()],
        max_parallel_updates: 8,
    }
}

fn simulator(store: Arc<dyn ServerStore>, metrics: Arc<GatewayMetrics>) -> MetricsSimulator {
    MetricsSimulator::new(store, settings(), StdRng::seed_from_u64(0xC0FFEE), metrics)
}

/// Wraps the in-memory store; fails or stalls updates for chosen ids.
struct FaultyStore {
    inner: InMemoryServerStore,
    failing: HashSet<ServerId>,
    stalling: HashSet<ServerId>,
    ghosts: Vec<Server>,
}

impl FaultyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryServerStore::new(),
            failing: HashSet::new(),
            stalling: HashSet::new(),
            ghosts: Vec::new(),
        }
    }
}

#[async_trait]
impl ServerStore for FaultyStore {
    async fn list(&self) -> Result<Vec<Server>> {
        let mut all = self.inner.list().await?;
        all.extend(self.ghosts.iter().cloned());
        Ok(all)
    }
    async fn get(&self, id: &ServerId) -> Result<Server> {
        self.inner.get(id).await
    }
    async fn insert(&self, doc: NewServer) -> Result<ServerId> {
        self.inner.insert(doc).await
    }
    async fn update(&self, id: &ServerId, update: ServerUpdate) -> Result<bool> {
        if self.failing.contains(id) {
            return Err(ServWatchError::Unavailable("injected".into()));
        }
        if self.stalling.contains(id) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.inner.update(id, update).await
    }
    async fn delete(&self, id: &ServerId) -> Result<()> {
        self.inner.delete(id).await
    }
    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

fn assert_in_range(m: &Metrics) {
    for r in [CPU_USAGE, MEMORY_USAGE] {
        let v = m.get(r).unwrap_or_else(|| panic!("{r} missing after tick"));
        assert!((0..=100).contains(&v), "{r}={v}");
    }
}

#[tokio::test]
async fn tick_keeps_every_server_in_range() {
    let store = Arc::new(InMemoryServerStore::new());
    for i in 0..25 {
        store.insert(NewServer::named(format!("srv-{i}"))).await.unwrap();
    }
    let metrics = Arc::new(GatewayMetrics::default());
    let sim = simulator(store.clone(), metrics.clone());

    for _ in 0..5 {
        let report = sim.tick().await;
        assert_eq!(report.listed, 25);
        assert_eq!(report.updated, 25);
        assert_eq!(report.skipped, 0);

        for s in store.list().await.unwrap() {
            assert_in_range(&s.metrics);
        }
    }

    assert_eq!(metrics.simulator_last_tick_servers.get(&[]), 25);
    assert_eq!(metrics.simulator_tick_duration.count(&[]), 5);
}

#[tokio::test]
async fn tick_only_touches_monitored_fields() {
    let store = Arc::new(InMemoryServerStore::new());
    let metrics: Metrics = [(CPU_USAGE, 45), ("disk_usage", 12)].into_iter().collect();
    let id = store
        .insert(NewServer::named("Server A").with_metrics(metrics))
        .await
        .unwrap();

    simulator(store.clone(), Arc::new(GatewayMetrics::default())).tick().await;

    let s = store.get(&id).await.unwrap();
    assert_eq!(s.name, "Server A");
    assert_eq!(s.metrics.get("disk_usage"), Some(12));
    assert_in_range(&s.metrics);
}

#[tokio::test]
async fn failing_update_does_not_block_others() {
    let mut store = FaultyStore::new();
    let bad = store.inner.insert(NewServer::named("bad")).await.unwrap();
    let good = store.inner.insert(NewServer::named("good")).await.unwrap();
    store.failing.insert(bad);
    let store = Arc::new(store);

    let metrics = Arc::new(GatewayMetrics::default());
    let report = simulator(store.clone(), metrics.clone()).tick().await;

    assert_eq!(report, TickReport { listed: 2, updated: 1, skipped: 1 });
    assert_in_range(&store.get(&good).await.unwrap().metrics);
    assert!(store.get(&bad).await.unwrap().metrics.is_empty());
    assert_eq!(metrics.simulator_updates.get(&[("outcome", "error")]), 1);
}

#[tokio::test]
async fn deleted_between_list_and_update_is_skipped() {
    let mut store = FaultyStore::new();
    let live = store.inner.insert(NewServer::named("live")).await.unwrap();
    store
        .ghosts
        .push(NewServer::named("ghost").into_server(ServerId::generate()));
    let store = Arc::new(store);

    let metrics = Arc::new(GatewayMetrics::default());
    let sim = simulator(store.clone(), metrics.clone());

    let first = sim.tick().await;
    assert_eq!(first, TickReport { listed: 2, updated: 1, skipped: 1 });
    // the loop keeps going on the next tick
    let second = sim.tick().await;
    assert_eq!(second.updated, 1);

    assert_in_range(&store.get(&live).await.unwrap().metrics);
    assert_eq!(metrics.simulator_updates.get(&[("outcome", "not_found")]), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_update_times_out_and_tick_completes() {
    let mut store = FaultyStore::new();
    let slow = store.inner.insert(NewServer::named("slow")).await.unwrap();
    let fast = store.inner.insert(NewServer::named("fast")).await.unwrap();
    store.stalling.insert(slow);
    let store = Arc::new(store);

    let metrics = Arc::new(GatewayMetrics::default());
    let report = simulator(store.clone(), metrics.clone()).tick().await;

    assert_eq!(report, TickReport { listed: 2, updated: 1, skipped: 1 });
    assert_in_range(&store.get(&fast).await.unwrap().metrics);
    assert_eq!(metrics.simulator_updates.get(&[("outcome", "timeout")]), 1);
}

#[tokio::test]
async fn empty_store_tick_is_a_noop() {
    let store = Arc::new(InMemoryServerStore::new());
    let report = simulator(store, Arc::new(GatewayMetrics::default())).tick().await;
    assert_eq!(report, TickReport::default());
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_ticks_on_interval_until_stopped() {
    let store = Arc::new(InMemoryServerStore::new());
    let id = store.insert(NewServer::named("a")).await.unwrap();

    let metrics = Arc::new(GatewayMetrics::default());
    let handle = Arc::new(simulator(store.clone(), metrics.clone())).spawn();

    // first tick fires one interval after start
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(metrics.simulator_ticks.get(&[]), 0);
    assert!(store.get(&id).await.unwrap().metrics.is_empty());

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(metrics.simulator_ticks.get(&[]), 2);
    assert_in_range(&store.get(&id).await.unwrap().metrics);

    handle.stop().await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(metrics.simulator_ticks.get(&[]), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_loop() {
    let store = Arc::new(InMemoryServerStore::new());
    store.insert(NewServer::named("a")).await.unwrap();

    let metrics = Arc::new(GatewayMetrics::default());
    drop(Arc::new(simulator(store, metrics.clone())).spawn());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(metrics.simulator_ticks.get(&[]), 0);
}

#[tokio::test]
async fn same_seed_produces_same_values() {
    async fn run_once() -> Metrics {
        let store = Arc::new(InMemoryServerStore::new());
        let id = store.insert(NewServer::named("a")).await.unwrap();
        simulator(store.clone(), Arc::new(GatewayMetrics::default())).tick().await;
        store.get(&id).await.unwrap().metrics
    }

    assert_eq!(run_once().await, run_once().await);
}
