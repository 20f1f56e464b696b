//! Pakasir QRIS adapter.
//!
//! The simplest of the three vendors: no signed create call at all. The pay
//! URL encodes the project slug, amount and local order id, and the customer
//! completes payment on Pakasir's hosted page. Status is read from
//! `/api/transactiondetail` with a plain api key query parameter.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::order::Provider;
use crate::error::AppResult;

use super::{ChargeRequest, PaymentDescriptor, PaymentGateway, StatusProbe, StatusQuery};

const DEFAULT_BASE_URL: &str = "https://pakasir.zone.id";

pub struct PakasirGateway {
    client: reqwest::Client,
    project: String,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    transaction: Option<TransactionDetail>,
}

#[derive(Debug, Deserialize)]
struct TransactionDetail {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
}

impl PakasirGateway {
    pub fn new(
        client: reqwest::Client,
        project: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            project,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn pay_url(&self, order_id: &str, amount: i64) -> String {
        format!(
            "{}/pay/{}/{}?order_id={}&qris_only=1",
            self.base_url, self.project, amount, order_id
        )
    }
}

fn map_status(detail: &TransactionDetail) -> StatusProbe {
    let status = detail.status.as_deref().unwrap_or("");
    if status.eq_ignore_ascii_case("completed") {
        StatusProbe::paid(detail.amount.unwrap_or(0))
    } else if status.eq_ignore_ascii_case("expired") {
        StatusProbe::expired()
    } else {
        StatusProbe::unpaid()
    }
}

#[async_trait]
impl PaymentGateway for PakasirGateway {
    fn provider(&self) -> Provider {
        Provider::Pakasir
    }

    async fn create_payment(&self, req: &ChargeRequest) -> AppResult<PaymentDescriptor> {
        Ok(PaymentDescriptor {
            reference: Some(req.order_id.clone()),
            qr_string: None,
            pay_url: Some(self.pay_url(&req.order_id, req.amount)),
            expires_at: None,
            raw: None,
        })
    }

    async fn check_status(&self, query: &StatusQuery) -> AppResult<StatusProbe> {
        let response = match self
            .client
            .get(format!("{}/api/transactiondetail", self.base_url))
            .query(&[
                ("project", self.project.as_str()),
                ("amount", &query.amount.to_string()),
                ("order_id", &query.order_id),
                ("api_key", &self.api_key),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "pakasir status probe failed: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(StatusProbe::unpaid());
        }
        let detail: DetailResponse = match response.json().await {
            Ok(d) => d,
            Err(err) => {
                tracing::warn!(order_id = %query.order_id, "pakasir status unreadable: {err}");
                return Ok(StatusProbe::unpaid());
            }
        };
        match detail.transaction {
            Some(tx) => Ok(map_status(&tx)),
            None => Ok(StatusProbe::unpaid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::PaymentStatus;

    #[test]
    fn pay_url_encodes_project_amount_and_order() {
        let g = PakasirGateway::new(
            reqwest::Client::new(),
            "tokoku".into(),
            "pk-key".into(),
            None,
        );
        assert_eq!(
            g.pay_url("JMB20260101ABCDEFGHIJ", 25_000),
            "https://pakasir.zone.id/pay/tokoku/25000?order_id=JMB20260101ABCDEFGHIJ&qris_only=1"
        );
    }

    #[test]
    fn completed_maps_to_paid_with_amount() {
        let probe = map_status(&TransactionDetail {
            status: Some("completed".into()),
            amount: Some(25_000),
        });
        assert_eq!(probe.status, PaymentStatus::Paid);
        assert_eq!(probe.amount_received, 25_000);
    }

    #[test]
    fn pending_and_missing_map_to_unpaid() {
        for status in [Some("pending"), Some("process"), None] {
            let probe = map_status(&TransactionDetail {
                status: status.map(String::from),
                amount: Some(25_000),
            });
            assert_eq!(probe.status, PaymentStatus::Unpaid);
            assert_eq!(probe.amount_received, 0);
        }
    }
}
