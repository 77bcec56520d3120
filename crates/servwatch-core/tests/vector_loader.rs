//! JSON test vector loader shared by signal tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;
use servwatch_core::Metrics;

#[derive(Debug, Deserialize)]
pub struct VectorFile {
    pub description: String,
    pub cases: Vec<FailureCase>,
}

#[derive(Debug, Deserialize)]
pub struct FailureCase {
    pub description: String,
    pub metrics: Metrics,
    pub expect: bool,
}

pub fn load(name: &str) -> VectorFile {
    let path = format!("{}/tests/vectors/{name}", env!("CARGO_MANIFEST_DIR"));
    let s = fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"));
    serde_json::from_str(&s).expect("invalid vector file")
}
