//! Derived signals computed from one server's metric snapshot.
//!
//! Nothing here touches the store or is persisted: every signal is a pure
//! function of the snapshot plus the injected clock/RNG.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::clock::Clock;
use crate::model::{clamp_usage, Metrics};

/// CPU usage strictly above this flags a likely failure.
pub const FAILURE_CPU_THRESHOLD: i64 = 80;

/// Maintenance is scheduled this many days after the request.
pub const MAINTENANCE_LEAD_DAYS: i64 = 7;

/// Number of synthetic history points.
pub const HISTORY_POINTS: usize = 10;

/// Max absolute offset applied to each history point.
pub const HISTORY_JITTER: i64 = 10;

/// Format of history time labels.
pub const HISTORY_LABEL_FORMAT: &str = "%H:%M";

/// True iff the snapshot's CPU usage exceeds [`FAILURE_CPU_THRESHOLD`].
pub fn predict_failure(metrics: &Metrics) -> bool {
    metrics.cpu_usage() > FAILURE_CPU_THRESHOLD
}

/// `now + MAINTENANCE_LEAD_DAYS`.
pub fn maintenance_date(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(MAINTENANCE_LEAD_DAYS)
}

/// Maintenance date for a request made now. Identical for every server.
pub fn generate_maintenance_schedule(clock: &dyn Clock) -> DateTime<Utc> {
    maintenance_date(clock.now())
}

/// Synthetic CPU history: parallel label/value series, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

/// One history point: `current + offset`, clamped to the usage range.
pub fn perturb(current: i64, offset: i64) -> i64 {
    clamp_usage(current.saturating_add(offset))
}

/// Fabricate [`HISTORY_POINTS`] samples around the current CPU usage.
///
/// Labels are one minute apart and the last one is `now`. Values are
/// regenerated on every call; no past samples exist anywhere.
pub fn generate_history<R: Rng + ?Sized>(metrics: &Metrics, now: DateTime<Utc>, rng: &mut R) -> History {
    let current = metrics.cpu_usage();

    let data = (0..HISTORY_POINTS)
        .map(|_| perturb(current, rng.gen_range(-HISTORY_JITTER..=HISTORY_JITTER)))
        .collect();

    let labels = (0..HISTORY_POINTS)
        .map(|i| {
            let back = (HISTORY_POINTS - 1 - i) as i64;
            (now - Duration::minutes(back))
                .format(HISTORY_LABEL_FORMAT)
                .to_string()
        })
        .collect();

    History { labels, data }
}
