//! iPaymu direct-payment QRIS adapter.
//!
//! Wire format (v2 API): every request is a JSON POST carrying `va`,
//! `timestamp` (YYYYMMDDHHMMSS) and `signature` headers, where the signature
//! is HMAC-SHA256 over `POST:{va}:{sha256_hex(body)}:{api_key}` keyed with
//! the api key. Responses arrive as a PascalCase envelope with a numeric
//! transaction status: 1 = paid, -2 = expired, anything else pending.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::domain::order::Provider;
use crate::error::{AppError, AppResult};

use super::{ChargeRequest, PaymentDescriptor, PaymentGateway, StatusProbe, StatusQuery};

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://my.ipaymu.com/api/v2";
const STATUS_PAID: i64 = 1;
const STATUS_EXPIRED: i64 = -2;

pub struct IpaymuGateway {
    client: reqwest::Client,
    va: String,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Status")]
    status: i64,
    #[serde(rename = "Success", default)]
    success: bool,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    #[serde(rename = "TransactionId")]
    transaction_id: Option<i64>,
    #[serde(rename = "QrString")]
    qr_string: Option<String>,
    #[serde(rename = "Url")]
    url: Option<String>,
    #[serde(rename = "Expired")]
    expired: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    #[serde(rename = "Status")]
    status: Option<i64>,
    #[serde(rename = "Amount")]
    amount: Option<i64>,
}

impl IpaymuGateway {
    pub fn new(
        client: reqwest::Client,
        va: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            va,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// `POST:{va}:{sha256_hex(body)}:{api_key}`, HMAC-SHA256 keyed by the api
    /// key, hex-encoded lowercase. Must match the provider byte-for-byte.
    fn signature(&self, body: &str) -> String {
        let body_hash = hex::encode(Sha256::digest(body.as_bytes()));
        let string_to_sign = format!("POST:{}:{}:{}", self.va, body_hash, self.api_key);
        let mut mac = HmacSha256::new_from_slice(self.api_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn signed_post(&self, path: &str, body: serde_json::Value) -> reqwest::Result<reqwest::Response> {
        let rendered = body.to_string();
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("signature", self.signature(&rendered))
            .header("va", &self.va)
            .header("timestamp", Utc::now().format("%Y%m%d%H%M%S").to_string())
            .body(rendered)
            .send()
            .await
    }
}

fn map_status(code: i64, amount: i64) -> StatusProbe {
    match code {
        STATUS_PAID => StatusProbe::paid(amount),
        STATUS_EXPIRED => StatusProbe::expired(),
        _ => StatusProbe::unpaid(),
    }
}

fn parse_expiry(raw: &str) -> Option<chrono::DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl PaymentGateway for IpaymuGateway {
    fn provider(&self) -> Provider {
        Provider::Ipaymu
    }

    async fn create_payment(&self, req: &ChargeRequest) -> AppResult<PaymentDescriptor> {
        let body = json!({
            "name": req.customer_name,
            "email": req.customer_email,
            "phone": req.customer_phone.as_deref().unwrap_or("0"),
            "amount": req.amount,
            "referenceId": req.order_id,
            "paymentMethod": "qris",
            "paymentChannel": "qris",
        });
        let response = self
            .signed_post("/payment/direct", body)
            .await
            .map_err(|err| AppError::Gateway {
                provider: "ipaymu",
                message: err.to_string(),
            })?;
        let raw: serde_json::Value = response.json().await.map_err(|err| AppError::Gateway {
            provider: "ipaymu",
            message: format!("malformed response: {err}"),
        })?;
        let envelope: Envelope<CreateData> =
            serde_json::from_value(raw.clone()).map_err(|err| AppError::Gateway {
                provider: "ipaymu",
                message: format!("malformed response: {err}"),
            })?;
        if !envelope.success || envelope.status != 200 {
            return Err(AppError::Gateway {
                provider: "ipaymu",
                message: envelope.message,
            });
        }
        let data = envelope.data.ok_or_else(|| AppError::Gateway {
            provider: "ipaymu",
            message: "response missing Data".to_string(),
        })?;
        Ok(PaymentDescriptor {
            reference: data.transaction_id.map(|id| id.to_string()),
            qr_string: data.qr_string,
            pay_url: data.url,
            expires_at: data.expired.as_deref().and_then(parse_expiry),
            raw: Some(raw),
        })
    }

    async fn check_status(&self, query: &StatusQuery) -> AppResult<StatusProbe> {
        let Some(reference) = &query.reference else {
            return Ok(StatusProbe::unpaid());
        };
        let body = json!({ "transactionId": reference, "account": self.va });
        let response = match self.signed_post("/transaction", body).await {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "ipaymu status probe failed: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        let envelope: Envelope<TransactionData> = match response.json().await {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "ipaymu status unreadable: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        match envelope.data {
            Some(data) => Ok(map_status(
                data.status.unwrap_or(0),
                data.amount.unwrap_or(0),
            )),
            // Unknown transaction is indistinguishable from not-yet-paid.
            None => Ok(StatusProbe::unpaid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::PaymentStatus;

    fn gateway() -> IpaymuGateway {
        IpaymuGateway::new(
            reqwest::Client::new(),
            "0000001234".into(),
            "SANDBOX-KEY".into(),
            None,
        )
    }

    #[test]
    fn signature_is_stable_and_hex() {
        let g = gateway();
        let sig = g.signature(r#"{"amount":1000}"#);
        assert_eq!(sig, g.signature(r#"{"amount":1000}"#));
        assert_eq!(sig.len(), 64);
        assert!(sig.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(sig, g.signature(r#"{"amount":2000}"#));
    }

    #[test]
    fn paid_status_maps_with_amount() {
        let probe = map_status(STATUS_PAID, 150_000);
        assert_eq!(probe.status, PaymentStatus::Paid);
        assert_eq!(probe.amount_received, 150_000);
    }

    #[test]
    fn pending_and_unknown_map_to_unpaid_zero() {
        for code in [0, 2, 5, 99] {
            let probe = map_status(code, 150_000);
            assert_eq!(probe.status, PaymentStatus::Unpaid);
            assert_eq!(probe.amount_received, 0);
        }
    }

    #[test]
    fn expired_maps_to_expired() {
        assert_eq!(map_status(STATUS_EXPIRED, 0).status, PaymentStatus::Expired);
    }

    #[test]
    fn expiry_parses_provider_format() {
        let dt = parse_expiry("2026-03-14 10:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-14T10:30:00+00:00");
        assert!(parse_expiry("not-a-date").is_none());
    }
}
