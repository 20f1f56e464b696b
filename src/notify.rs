//! Notification bridge to the ticketing bot.
//!
//! Every call is fire-and-forget: the HTTP POST runs on a spawned task with a
//! short timeout and a failure is logged, never propagated. An unreachable
//! bot must not fail the primary request; the underlying record is already
//! persisted.

use std::time::Duration;

use serde_json::json;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    base_url: Option<String>,
    token: Option<String>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, base_url: Option<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    /// A bridge with no configured bot; every call becomes a no-op.
    pub fn disabled() -> Self {
        Self::new(reqwest::Client::new(), None, None)
    }

    pub fn ticket_created(&self, order_id: &str, product_slug: &str, total: i64) {
        self.post(
            "/tickets",
            json!({
                "order_id": order_id,
                "product_slug": product_slug,
                "total": total,
            }),
        );
    }

    pub fn chat_relay(&self, order_id: &str, sender: &str, body: &str) {
        self.post(
            "/tickets/relay",
            json!({
                "order_id": order_id,
                "sender": sender,
                "body": body,
            }),
        );
    }

    pub fn order_rejected(&self, order_id: &str, reason: &str) {
        self.post(
            "/tickets/rejected",
            json!({
                "order_id": order_id,
                "reason": reason,
            }),
        );
    }

    fn post(&self, path: &str, payload: serde_json::Value) {
        let Some(base) = self.base_url.clone() else {
            tracing::debug!(path, "notification bridge not configured, skipping");
            return;
        };
        let url = format!("{}{}", base.trim_end_matches('/'), path);
        let mut request = self.client.post(&url).timeout(NOTIFY_TIMEOUT).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tokio::spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    tracing::warn!(%url, status = %resp.status(), "bot notification rejected");
                }
                Err(err) => {
                    tracing::warn!(%url, "bot notification failed: {err}");
                }
            }
        });
    }
}
