#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use servwatch_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
simulator:
  interval_msec: 5000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.store_timeout_ms, 1000);
    assert!(cfg.simulator.enabled);
    assert_eq!(cfg.simulator.interval_ms, 5000);
    assert_eq!(cfg.simulator.resources, vec!["cpu_usage", "memory_usage"]);
    assert!(cfg.seed_servers.is_empty());
}

#[test]
fn full_config_with_seed_servers() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
simulator:
  interval_ms: 2000
  store_timeout_ms: 500
  resources: [cpu_usage, memory_usage, disk_usage]
  max_parallel_updates: 4
  seed: 99
signals:
  seed: 7
seed_servers:
  - name: "Server A"
    metrics: { cpu_usage: 45, memory_usage: 70 }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.simulator.seed, Some(99));
    assert_eq!(cfg.signals.seed, Some(7));
    assert_eq!(cfg.seed_servers[0].metrics.cpu_usage(), 45);
}

#[test]
fn wrong_version_is_unsupported() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn timeout_must_be_shorter_than_interval() {
    let bad = r#"
version: 1
simulator:
  interval_ms: 1000
  store_timeout_ms: 1000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn duplicate_resources_rejected() {
    let bad = r#"
version: 1
simulator:
  resources: [cpu_usage, cpu_usage]
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn bad_listen_rejected() {
    let bad = r#"
version: 1
gateway:
  listen: "not an address"
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn zero_request_store_timeout_is_rejected() {
    let bad = r#"
version: 1
gateway:
  store_timeout_ms: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}
