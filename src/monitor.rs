//! Uptime monitor: threshold evaluation and alert cooldown tracking.
//!
//! State is in-memory only; a restart resets all cooldowns. That is accepted
//! for a single monitor instance. Recovery alerts bypass the cooldown so an
//! all-clear is never delayed.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::Deserialize;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Health payload of the storefront's `/health` endpoint, as the monitor
/// reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub db_latency_ms: u64,
}

#[derive(Debug, Clone)]
pub enum Probe {
    Unreachable(String),
    Reachable {
        report: HealthReport,
        response_ms: u64,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub db_latency_ms: u64,
    pub response_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 90.0,
            memory_percent: 90.0,
            db_latency_ms: 1_000,
            response_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Down,
    Cpu,
    Memory,
    DbLatency,
    Response,
    Degraded,
}

impl AlertKind {
    fn label(&self) -> &'static str {
        match self {
            AlertKind::Down => "DOWN",
            AlertKind::Cpu => "CPU",
            AlertKind::Memory => "MEMORY",
            AlertKind::DbLatency => "DB LATENCY",
            AlertKind::Response => "RESPONSE TIME",
            AlertKind::Degraded => "DEGRADED",
        }
    }
}

fn breaches(probe: &Probe, t: &Thresholds) -> Vec<(AlertKind, String)> {
    match probe {
        Probe::Unreachable(reason) => {
            vec![(AlertKind::Down, format!("target unreachable: {reason}"))]
        }
        Probe::Reachable {
            report,
            response_ms,
        } => {
            let mut out = Vec::new();
            if report.status != "ok" {
                out.push((
                    AlertKind::Degraded,
                    format!("service reports status {:?}", report.status),
                ));
            }
            if report.cpu_percent > t.cpu_percent {
                out.push((
                    AlertKind::Cpu,
                    format!("cpu at {:.1}% (limit {:.0}%)", report.cpu_percent, t.cpu_percent),
                ));
            }
            if report.memory_percent > t.memory_percent {
                out.push((
                    AlertKind::Memory,
                    format!(
                        "memory at {:.1}% (limit {:.0}%)",
                        report.memory_percent, t.memory_percent
                    ),
                ));
            }
            if report.db_latency_ms > t.db_latency_ms {
                out.push((
                    AlertKind::DbLatency,
                    format!(
                        "db ping {}ms (limit {}ms)",
                        report.db_latency_ms, t.db_latency_ms
                    ),
                ));
            }
            if *response_ms > t.response_ms {
                out.push((
                    AlertKind::Response,
                    format!("health fetch took {}ms (limit {}ms)", response_ms, t.response_ms),
                ));
            }
            out
        }
    }
}

pub struct AlertTracker {
    cooldown: Duration,
    last_sent: HashMap<AlertKind, Instant>,
    active: HashSet<AlertKind>,
}

impl AlertTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
            active: HashSet::new(),
        }
    }

    fn in_cooldown(&self, kind: AlertKind, now: Instant) -> bool {
        self.last_sent
            .get(&kind)
            .is_some_and(|sent| now.duration_since(*sent) < self.cooldown)
    }

    /// Evaluates one probe and returns the messages to post: at most one
    /// alert per kind per cooldown window, recoveries always.
    pub fn evaluate(&mut self, probe: &Probe, thresholds: &Thresholds, now: Instant) -> Vec<String> {
        let breached = breaches(probe, thresholds);
        let breached_kinds: HashSet<AlertKind> = breached.iter().map(|(k, _)| *k).collect();
        let mut messages = Vec::new();

        for (kind, detail) in &breached {
            self.active.insert(*kind);
            if !self.in_cooldown(*kind, now) {
                self.last_sent.insert(*kind, now);
                messages.push(format!("🚨 [{}] {}", kind.label(), detail));
            }
        }

        // When the target is unreachable, other metrics are unknown; only the
        // Down alert resolves or raises.
        let resolvable: Vec<AlertKind> = if matches!(probe, Probe::Unreachable(_)) {
            self.active
                .iter()
                .copied()
                .filter(|k| *k == AlertKind::Down && !breached_kinds.contains(k))
                .collect()
        } else {
            self.active
                .iter()
                .copied()
                .filter(|k| !breached_kinds.contains(k))
                .collect()
        };
        for kind in resolvable {
            self.active.remove(&kind);
            // Recovery bypasses the cooldown unconditionally.
            messages.push(format!("✅ [{}] recovered", kind.label()));
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> Probe {
        Probe::Reachable {
            report: HealthReport {
                status: "ok".into(),
                cpu_percent: 10.0,
                memory_percent: 40.0,
                db_latency_ms: 5,
            },
            response_ms: 100,
        }
    }

    fn hot_cpu() -> Probe {
        Probe::Reachable {
            report: HealthReport {
                status: "ok".into(),
                cpu_percent: 97.5,
                memory_percent: 40.0,
                db_latency_ms: 5,
            },
            response_ms: 100,
        }
    }

    #[test]
    fn breach_alerts_once_per_cooldown() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let now = Instant::now();

        let first = tracker.evaluate(&hot_cpu(), &t, now);
        assert_eq!(first.len(), 1);
        assert!(first[0].contains("CPU"));

        // Still breached inside the window: silence.
        let second = tracker.evaluate(&hot_cpu(), &t, now + Duration::from_secs(30));
        assert!(second.is_empty());
    }

    #[test]
    fn recovery_bypasses_cooldown() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let now = Instant::now();

        tracker.evaluate(&hot_cpu(), &t, now);
        // Recovers one second later, well inside the cooldown window.
        let msgs = tracker.evaluate(&healthy(), &t, now + Duration::from_secs(1));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("recovered"));
    }

    #[test]
    fn rebreak_inside_cooldown_stays_silent() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let now = Instant::now();

        tracker.evaluate(&hot_cpu(), &t, now);
        tracker.evaluate(&healthy(), &t, now + Duration::from_secs(1));
        // Breaks again while the cooldown from the first alert still holds.
        let msgs = tracker.evaluate(&hot_cpu(), &t, now + Duration::from_secs(2));
        assert!(msgs.is_empty());
        // After the window expires it alerts again.
        tracker.evaluate(&healthy(), &t, now + Duration::from_secs(3));
        let msgs = tracker.evaluate(&hot_cpu(), &t, now + Duration::from_secs(301));
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn unreachable_raises_down() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let now = Instant::now();

        let msgs = tracker.evaluate(&Probe::Unreachable("connection refused".into()), &t, now);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("DOWN"));

        let msgs = tracker.evaluate(&healthy(), &t, now + Duration::from_secs(31));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("recovered"));
    }

    #[test]
    fn unreachable_does_not_resolve_metric_alerts() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let now = Instant::now();

        tracker.evaluate(&hot_cpu(), &t, now);
        let msgs = tracker.evaluate(
            &Probe::Unreachable("timeout".into()),
            &t,
            now + Duration::from_secs(30),
        );
        // Down raised, but no bogus CPU recovery while the target is dark.
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("DOWN"));
    }

    #[test]
    fn multiple_breaches_alert_independently() {
        let mut tracker = AlertTracker::new(Duration::from_secs(300));
        let t = Thresholds::default();
        let probe = Probe::Reachable {
            report: HealthReport {
                status: "degraded".into(),
                cpu_percent: 95.0,
                memory_percent: 95.0,
                db_latency_ms: 2_000,
            },
            response_ms: 5_000,
        };
        let msgs = tracker.evaluate(&probe, &t, Instant::now());
        assert_eq!(msgs.len(), 5);
    }
}
