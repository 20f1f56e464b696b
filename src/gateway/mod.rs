//! Payment gateway adapters.
//!
//! Each adapter translates the local create/check abstraction into one
//! vendor's wire format and normalizes the result back to
//! [`PaymentStatus`]. Status probes never fail on "not found" or "pending"
//! responses; both normalize to `Unpaid` with a zero received amount, the
//! same way the providers' own dashboards treat an unsettled transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::config::Config;
use crate::domain::order::{PaymentStatus, Provider};
use crate::error::{AppError, AppResult};
use crate::settings;

pub mod ipaymu;
pub mod manual;
pub mod pakasir;
pub mod tokopay;

pub use ipaymu::IpaymuGateway;
pub use manual::ManualGateway;
pub use pakasir::PakasirGateway;
pub use tokopay::TokopayGateway;

#[derive(Clone, Debug)]
pub struct ChargeRequest {
    pub order_id: String,
    pub amount: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

/// Normalized result of a successful `create_payment`.
#[derive(Clone, Debug, Default)]
pub struct PaymentDescriptor {
    pub reference: Option<String>,
    pub qr_string: Option<String>,
    pub pay_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub raw: Option<serde_json::Value>,
}

/// Everything an adapter may need to locate a transaction on its side.
#[derive(Clone, Debug)]
pub struct StatusQuery {
    pub order_id: String,
    pub reference: Option<String>,
    pub amount: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusProbe {
    pub status: PaymentStatus,
    pub amount_received: i64,
}

impl StatusProbe {
    pub fn unpaid() -> Self {
        Self {
            status: PaymentStatus::Unpaid,
            amount_received: 0,
        }
    }

    pub fn paid(amount_received: i64) -> Self {
        Self {
            status: PaymentStatus::Paid,
            amount_received,
        }
    }

    pub fn expired() -> Self {
        Self {
            status: PaymentStatus::Expired,
            amount_received: 0,
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> Provider;

    async fn create_payment(&self, req: &ChargeRequest) -> AppResult<PaymentDescriptor>;

    async fn check_status(&self, query: &StatusQuery) -> AppResult<StatusProbe>;
}

// =============================================================================
// Credential resolution (settings override -> env fallback, per call)
// =============================================================================

#[derive(Clone, Debug, Deserialize)]
struct IpaymuOverride {
    va: String,
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct PakasirOverride {
    project: String,
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct TokopayOverride {
    merchant_id: String,
    secret: String,
    #[serde(default)]
    base_url: Option<String>,
}

fn missing(provider: &'static str, what: &str) -> AppError {
    AppError::Config(format!("{provider} credentials missing: {what}"))
}

/// Builds the adapter for `provider`, resolving credentials fresh on every
/// call: a merchant override in the `settings` table wins over process env.
pub async fn build(
    provider: Provider,
    db: &PgPool,
    config: &Config,
    client: &reqwest::Client,
) -> AppResult<Box<dyn PaymentGateway>> {
    match provider {
        Provider::Ipaymu => {
            let (va, api_key, base_url) =
                match settings::get::<IpaymuOverride>(db, "ipaymu").await? {
                    Some(o) => (o.va, o.api_key, o.base_url),
                    None => (
                        config
                            .ipaymu
                            .va
                            .clone()
                            .ok_or_else(|| missing("ipaymu", "IPAYMU_VA"))?,
                        config
                            .ipaymu
                            .api_key
                            .clone()
                            .ok_or_else(|| missing("ipaymu", "IPAYMU_API_KEY"))?,
                        config.ipaymu.base_url.clone(),
                    ),
                };
            Ok(Box::new(IpaymuGateway::new(
                client.clone(),
                va,
                api_key,
                base_url,
            )))
        }
        Provider::Pakasir => {
            let (project, api_key, base_url) =
                match settings::get::<PakasirOverride>(db, "pakasir").await? {
                    Some(o) => (o.project, o.api_key, o.base_url),
                    None => (
                        config
                            .pakasir
                            .project
                            .clone()
                            .ok_or_else(|| missing("pakasir", "PAKASIR_PROJECT"))?,
                        config
                            .pakasir
                            .api_key
                            .clone()
                            .ok_or_else(|| missing("pakasir", "PAKASIR_API_KEY"))?,
                        config.pakasir.base_url.clone(),
                    ),
                };
            Ok(Box::new(PakasirGateway::new(
                client.clone(),
                project,
                api_key,
                base_url,
            )))
        }
        Provider::Tokopay => {
            let (merchant_id, secret, base_url) =
                match settings::get::<TokopayOverride>(db, "tokopay").await? {
                    Some(o) => (o.merchant_id, o.secret, o.base_url),
                    None => (
                        config
                            .tokopay
                            .merchant_id
                            .clone()
                            .ok_or_else(|| missing("tokopay", "TOKOPAY_MERCHANT_ID"))?,
                        config
                            .tokopay
                            .secret
                            .clone()
                            .ok_or_else(|| missing("tokopay", "TOKOPAY_SECRET"))?,
                        config.tokopay.base_url.clone(),
                    ),
                };
            Ok(Box::new(TokopayGateway::new(
                client.clone(),
                merchant_id,
                secret,
                base_url,
            )))
        }
        Provider::Manual => {
            let qris = settings::get::<manual::ManualQris>(db, "manual_qris")
                .await?
                .ok_or_else(|| missing("manual", "manual_qris settings document"))?;
            Ok(Box::new(ManualGateway::new(qris)))
        }
    }
}
