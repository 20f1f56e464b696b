//! Tokopay QRIS adapter.
//!
//! Wire format: GET `/v1/order` with the merchant id, channel code, local
//! reference and amount as query parameters, authenticated by
//! `md5(merchant_id:secret:ref_id)`. The same endpoint reports the current
//! transaction state, so a status probe repeats the call and reads
//! `data.status`.

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Deserialize;

use crate::domain::order::Provider;
use crate::error::{AppError, AppResult};

use super::{ChargeRequest, PaymentDescriptor, PaymentGateway, StatusProbe, StatusQuery};

const DEFAULT_BASE_URL: &str = "https://api.tokopay.id/v1";
const QRIS_CHANNEL: &str = "QRIS";

pub struct TokopayGateway {
    client: reqwest::Client,
    merchant_id: String,
    secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    error_msg: Option<String>,
    data: Option<OrderData>,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    #[serde(default)]
    trx_id: Option<String>,
    #[serde(default)]
    qr_string: Option<String>,
    #[serde(default)]
    pay_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    total_diterima: Option<i64>,
}

impl TokopayGateway {
    pub fn new(
        client: reqwest::Client,
        merchant_id: String,
        secret: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            merchant_id,
            secret,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// `md5(merchant_id:secret:ref_id)`, hex lowercase.
    fn signature(&self, ref_id: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(format!("{}:{}:{}", self.merchant_id, self.secret, ref_id));
        hex::encode(hasher.finalize())
    }

    async fn order_call(&self, ref_id: &str, amount: i64) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}/order", self.base_url))
            .query(&[
                ("merchant", self.merchant_id.as_str()),
                ("kode_channel", QRIS_CHANNEL),
                ("ref_id", ref_id),
                ("nominal", &amount.to_string()),
                ("signature", &self.signature(ref_id)),
            ])
            .send()
            .await
    }
}

fn map_status(data: &OrderData) -> StatusProbe {
    let status = data.status.as_deref().unwrap_or("");
    if status.eq_ignore_ascii_case("success") || status.eq_ignore_ascii_case("paid") {
        StatusProbe::paid(data.total_diterima.unwrap_or(0))
    } else if status.eq_ignore_ascii_case("expired") {
        StatusProbe::expired()
    } else {
        StatusProbe::unpaid()
    }
}

#[async_trait]
impl PaymentGateway for TokopayGateway {
    fn provider(&self) -> Provider {
        Provider::Tokopay
    }

    async fn create_payment(&self, req: &ChargeRequest) -> AppResult<PaymentDescriptor> {
        let response = self
            .order_call(&req.order_id, req.amount)
            .await
            .map_err(|err| AppError::Gateway {
                provider: "tokopay",
                message: err.to_string(),
            })?;
        let raw: serde_json::Value = response.json().await.map_err(|err| AppError::Gateway {
            provider: "tokopay",
            message: format!("malformed response: {err}"),
        })?;
        let envelope: Envelope =
            serde_json::from_value(raw.clone()).map_err(|err| AppError::Gateway {
                provider: "tokopay",
                message: format!("malformed response: {err}"),
            })?;
        if !envelope.status.eq_ignore_ascii_case("success") {
            return Err(AppError::Gateway {
                provider: "tokopay",
                message: envelope
                    .error_msg
                    .unwrap_or_else(|| format!("order rejected with status {}", envelope.status)),
            });
        }
        let data = envelope.data.ok_or_else(|| AppError::Gateway {
            provider: "tokopay",
            message: "response missing data".to_string(),
        })?;
        Ok(PaymentDescriptor {
            reference: data.trx_id,
            qr_string: data.qr_string,
            pay_url: data.pay_url,
            expires_at: None,
            raw: Some(raw),
        })
    }

    async fn check_status(&self, query: &StatusQuery) -> AppResult<StatusProbe> {
        let response = match self.order_call(&query.order_id, query.amount).await {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "tokopay status probe failed: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        let envelope: Envelope = match response.json().await {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "tokopay status unreadable: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        match envelope.data {
            Some(data) => Ok(map_status(&data)),
            None => Ok(StatusProbe::unpaid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::PaymentStatus;

    fn gateway() -> TokopayGateway {
        TokopayGateway::new(
            reqwest::Client::new(),
            "M00123".into(),
            "rahasia".into(),
            None,
        )
    }

    #[test]
    fn signature_is_md5_of_colon_joined_parts() {
        let g = gateway();
        let mut hasher = Md5::new();
        hasher.update("M00123:rahasia:JMB20260101ABCDEFGHIJ");
        let expected = hex::encode(hasher.finalize());
        assert_eq!(g.signature("JMB20260101ABCDEFGHIJ"), expected);
        assert_eq!(expected.len(), 32);
    }

    #[test]
    fn paid_statuses_carry_received_amount() {
        for status in ["Success", "success", "Paid"] {
            let probe = map_status(&OrderData {
                trx_id: None,
                qr_string: None,
                pay_url: None,
                status: Some(status.into()),
                total_diterima: Some(148_500),
            });
            assert_eq!(probe.status, PaymentStatus::Paid);
            assert_eq!(probe.amount_received, 148_500);
        }
    }

    #[test]
    fn pending_and_unknown_statuses_map_to_unpaid() {
        for status in [Some("Unpaid"), Some("Pending"), Some("weird"), None] {
            let probe = map_status(&OrderData {
                trx_id: None,
                qr_string: None,
                pay_url: None,
                status: status.map(String::from),
                total_diterima: Some(10_000),
            });
            assert_eq!(probe.status, PaymentStatus::Unpaid);
            assert_eq!(probe.amount_received, 0);
        }
    }

    #[test]
    fn expired_status_maps_to_expired() {
        let probe = map_status(&OrderData {
            trx_id: None,
            qr_string: None,
            pay_url: None,
            status: Some("Expired".into()),
            total_diterima: None,
        });
        assert_eq!(probe.status, PaymentStatus::Expired);
    }
}
