//! Uptime monitor for the storefront.
//!
//! Polls the storefront's health endpoint on a fixed interval, applies the
//! static thresholds, and posts alerts to a Discord-compatible webhook.
//! Runs as a single instance; the cooldown map lives in memory.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qris_storefront::monitor::{
    AlertTracker, HealthReport, Probe, Thresholds, DEFAULT_COOLDOWN, DEFAULT_INTERVAL,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

async fn probe(client: &reqwest::Client, url: &str) -> Probe {
    let started = Instant::now();
    let response = match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(r) => r,
        Err(err) => return Probe::Unreachable(err.to_string()),
    };
    let response_ms = started.elapsed().as_millis() as u64;
    if !response.status().is_success() {
        return Probe::Unreachable(format!("health endpoint returned {}", response.status()));
    }
    match response.json::<HealthReport>().await {
        Ok(report) => Probe::Reachable {
            report,
            response_ms,
        },
        Err(err) => Probe::Unreachable(format!("unreadable health payload: {err}")),
    }
}

async fn post_alert(client: &reqwest::Client, webhook_url: &str, message: &str) {
    let result = client
        .post(webhook_url)
        .timeout(PROBE_TIMEOUT)
        .json(&json!({ "content": message }))
        .send()
        .await;
    match result {
        Ok(resp) if resp.status().is_success() => {}
        Ok(resp) => tracing::warn!(status = %resp.status(), "alert webhook rejected message"),
        Err(err) => tracing::warn!("alert webhook unreachable: {err}"),
    }
}

fn env_duration(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let target_url =
        std::env::var("MONITOR_TARGET_URL").context("MONITOR_TARGET_URL must be set")?;
    let webhook_url =
        std::env::var("MONITOR_WEBHOOK_URL").context("MONITOR_WEBHOOK_URL must be set")?;
    let interval = env_duration("MONITOR_INTERVAL_SECS", DEFAULT_INTERVAL);
    let cooldown = env_duration("MONITOR_COOLDOWN_SECS", DEFAULT_COOLDOWN);

    let client = reqwest::Client::new();
    let thresholds = Thresholds::default();
    let mut tracker = AlertTracker::new(cooldown);
    let mut ticker = tokio::time::interval(interval);

    tracing::info!(%target_url, ?interval, "uptime monitor started");
    loop {
        ticker.tick().await;
        let result = probe(&client, &target_url).await;
        if let Probe::Unreachable(reason) = &result {
            tracing::warn!("probe failed: {reason}");
        }
        for message in tracker.evaluate(&result, &thresholds, Instant::now()) {
            tracing::info!("posting alert: {message}");
            post_alert(&client, &webhook_url, &message).await;
        }
    }
}
