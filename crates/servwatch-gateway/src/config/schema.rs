use serde::Deserialize;
use servwatch_core::error::{Result, ServWatchError};
use servwatch_core::model::{CPU_USAGE, MEMORY_USAGE};
use servwatch_core::{Metrics, NewServer};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub simulator: SimulatorSection,

    #[serde(default)]
    pub signals: SignalsSection,

    #[serde(default)]
    pub seed_servers: Vec<SeedServer>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            simulator: SimulatorSection::default(),
            signals: SignalsSection::default(),
            seed_servers: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ServWatchError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.simulator.validate()?;

        for s in &self.seed_servers {
            if s.name.trim().is_empty() {
                return Err(ServWatchError::BadRequest("seed_servers[].name must not be blank".into()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Deadline for each store call made while serving a request.
    #[serde(default = "default_request_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            store_timeout_ms: default_request_store_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ServWatchError::BadRequest(
                "gateway.listen must be a valid socket address".into(),
            ));
        }
        if !(1..=60_000).contains(&self.store_timeout_ms) {
            return Err(ServWatchError::BadRequest(
                "gateway.store_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

fn default_request_store_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    #[serde(default = "default_resources")]
    pub resources: Vec<String>,

    #[serde(default = "default_max_parallel_updates")]
    pub max_parallel_updates: usize,

    /// Fixed RNG seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            resources: default_resources(),
            max_parallel_updates: default_max_parallel_updates(),
            seed: None,
        }
    }
}

impl SimulatorSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(ServWatchError::BadRequest(
                "simulator.interval_ms must be between 100 and 3600000".into(),
            ));
        }
        if self.store_timeout_ms == 0 || self.store_timeout_ms >= self.interval_ms {
            return Err(ServWatchError::BadRequest(
                "simulator.store_timeout_ms must be > 0 and less than interval_ms".into(),
            ));
        }
        if !(1..=1024).contains(&self.max_parallel_updates) {
            return Err(ServWatchError::BadRequest(
                "simulator.max_parallel_updates must be between 1 and 1024".into(),
            ));
        }
        if self.resources.is_empty() {
            return Err(ServWatchError::BadRequest("simulator.resources must not be empty".into()));
        }
        for (i, r) in self.resources.iter().enumerate() {
            if r.trim().is_empty() {
                return Err(ServWatchError::BadRequest(
                    "simulator.resources must not contain blank names".into(),
                ));
            }
            if self.resources[..i].contains(r) {
                return Err(ServWatchError::BadRequest(format!(
                    "simulator.resources lists {r} twice"
                )));
            }
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_interval_ms() -> u64 {
    5000
}
fn default_store_timeout_ms() -> u64 {
    1000
}
fn default_resources() -> Vec<String> {
    vec![CPU_USAGE.into(), MEMORY_USAGE.into()]
}
fn default_max_parallel_updates() -> usize {
    16
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalsSection {
    /// Fixed seed for the history RNG; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Server inserted at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedServer {
    pub name: String,
    #[serde(default)]
    pub metrics: Metrics,
}

impl SeedServer {
    pub fn to_new_server(&self) -> NewServer {
        NewServer::named(self.name.clone()).with_metrics(self.metrics.clone())
    }
}
