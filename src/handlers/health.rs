//! Health endpoint consumed by the uptime monitor.

use std::time::{Duration, Instant};

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::state::AppState;

const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub uptime_secs: u64,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub db_latency_ms: u64,
}

pub async fn health(State(s): State<AppState>) -> Json<HealthReport> {
    let ping_started = Instant::now();
    let db_ok = sqlx::query("SELECT 1").execute(&s.db).await.is_ok();
    let db_latency_ms = ping_started.elapsed().as_millis() as u64;

    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu();
    // Two samples are needed for a meaningful CPU reading.
    tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
    sys.refresh_cpu();
    let cpu_percent = sys.global_cpu_info().cpu_usage();
    let memory_percent = if sys.total_memory() > 0 {
        (sys.used_memory() as f32 / sys.total_memory() as f32) * 100.0
    } else {
        0.0
    };

    Json(HealthReport {
        status: if db_ok { "ok" } else { "degraded" }.to_string(),
        service: "qris-storefront".to_string(),
        uptime_secs: s.started_at.elapsed().as_secs(),
        cpu_percent,
        memory_percent,
        db_latency_ms,
    })
}
