//! Manual QRIS "adapter".
//!
//! Serves the merchant's static QRIS image from the `manual_qris` settings
//! document. There is no provider to poll, so a status probe always reports
//! unpaid; an admin settles the order through the confirm endpoint after
//! checking the bank mutation by hand.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::order::Provider;
use crate::error::AppResult;

use super::{ChargeRequest, PaymentDescriptor, PaymentGateway, StatusProbe, StatusQuery};

#[derive(Clone, Debug, Deserialize)]
pub struct ManualQris {
    pub qr_string: Option<String>,
    pub qr_image_url: Option<String>,
}

pub struct ManualGateway {
    qris: ManualQris,
}

impl ManualGateway {
    pub fn new(qris: ManualQris) -> Self {
        Self { qris }
    }
}

#[async_trait]
impl PaymentGateway for ManualGateway {
    fn provider(&self) -> Provider {
        Provider::Manual
    }

    async fn create_payment(&self, req: &ChargeRequest) -> AppResult<PaymentDescriptor> {
        Ok(PaymentDescriptor {
            reference: Some(req.order_id.clone()),
            qr_string: self.qris.qr_string.clone(),
            pay_url: self.qris.qr_image_url.clone(),
            expires_at: None,
            raw: None,
        })
    }

    async fn check_status(&self, _query: &StatusQuery) -> AppResult<StatusProbe> {
        Ok(StatusProbe::unpaid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::PaymentStatus;

    #[tokio::test]
    async fn manual_probe_is_always_unpaid() {
        let gateway = ManualGateway::new(ManualQris {
            qr_string: Some("000201010212...".into()),
            qr_image_url: None,
        });
        let probe = gateway
            .check_status(&StatusQuery {
                order_id: "JMB20260101ABCDEFGHIJ".into(),
                reference: None,
                amount: 10_000,
            })
            .await
            .unwrap();
        assert_eq!(probe.status, PaymentStatus::Unpaid);
        assert_eq!(probe.amount_received, 0);
    }
}
