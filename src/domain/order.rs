//! Order Aggregate
//!
//! Orders are keyed by a human-readable id: the `JMB` prefix, the creation
//! date as `YYYYMMDD`, and 10 random uppercase alphanumerics. The date half
//! is recoverable with [`extract_order_date`].

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

pub const ORDER_ID_PREFIX: &str = "JMB";
const ORDER_ID_DATE_LEN: usize = 8;
const ORDER_ID_SUFFIX_LEN: usize = 10;
const ORDER_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
        .map(|_| ORDER_ID_CHARSET[rng.gen_range(0..ORDER_ID_CHARSET.len())] as char)
        .collect();
    format!("{}{}{}", ORDER_ID_PREFIX, now.format("%Y%m%d"), suffix)
}

/// Left inverse of the date half of [`generate_order_id`]. Returns `None`
/// when the id does not have the expected shape.
pub fn extract_order_date(id: &str) -> Option<NaiveDate> {
    let rest = id.strip_prefix(ORDER_ID_PREFIX)?;
    if rest.len() != ORDER_ID_DATE_LEN + ORDER_ID_SUFFIX_LEN {
        return None;
    }
    let (date, suffix) = rest.split_at(ORDER_ID_DATE_LEN);
    if !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y%m%d").ok()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Rejected,
}

/// Normalized payment status shared by every gateway adapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ipaymu,
    Pakasir,
    Tokopay,
    Manual,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ipaymu => "ipaymu",
            Provider::Pakasir => "pakasir",
            Provider::Tokopay => "tokopay",
            Provider::Manual => "manual",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Manual,
    Auto,
}

/// Nested payment document. `provider_response` holds the raw vendor JSON and
/// must never leave the admin surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub provider: Provider,
    pub reference: Option<String>,
    pub status: PaymentStatus,
    pub qr_string: Option<String>,
    pub pay_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider_response: Option<serde_json::Value>,
}

impl PaymentInfo {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            reference: None,
            status: PaymentStatus::Unpaid,
            qr_string: None,
            pay_url: None,
            expires_at: None,
            provider_response: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub status: DeliveryStatus,
    pub method: DeliveryMethod,
    pub payload: Option<String>,
    pub note: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub user_id: Option<String>,
    pub product_slug: String,
    pub plan_name: String,
    pub total: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment: Json<PaymentInfo>,
    pub delivery: Json<DeliveryInfo>,
    pub reject_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status != OrderStatus::Pending
    }
}

// =============================================================================
// Public projection
// =============================================================================

/// Customer-facing view of an order. Built as an explicit allow-list so new
/// internal fields stay internal by default.
#[derive(Clone, Debug, Serialize)]
pub struct PublicOrder {
    pub id: String,
    pub customer_name: String,
    pub product_slug: String,
    pub plan_name: String,
    pub total: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment: PublicPayment,
    pub delivery: PublicDelivery,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicPayment {
    pub provider: Provider,
    pub status: PaymentStatus,
    pub qr_string: Option<String>,
    pub pay_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicDelivery {
    pub status: DeliveryStatus,
    pub method: DeliveryMethod,
    pub payload: Option<String>,
}

impl From<&Order> for PublicOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            customer_name: order.customer_name.clone(),
            product_slug: order.product_slug.clone(),
            plan_name: order.plan_name.clone(),
            total: order.total,
            currency: order.currency.clone(),
            status: order.status,
            payment: PublicPayment {
                provider: order.payment.provider,
                status: order.payment.status,
                qr_string: order.payment.qr_string.clone(),
                pay_url: order.payment.pay_url.clone(),
                expires_at: order.payment.expires_at,
            },
            delivery: PublicDelivery {
                status: order.delivery.status,
                method: order.delivery.method,
                payload: order.delivery.payload.clone(),
            },
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn sample_order() -> Order {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let mut payment = PaymentInfo::new(Provider::Ipaymu);
        payment.reference = Some("82211".into());
        payment.provider_response = Some(serde_json::json!({
            "Data": { "SessionID": "secret-session", "Va": "0000001234" }
        }));
        Order {
            id: generate_order_id(now),
            customer_name: "Budi".into(),
            customer_email: "budi@example.com".into(),
            customer_phone: None,
            user_id: Some("user-1".into()),
            product_slug: "aim-pro".into(),
            plan_name: "30 days".into(),
            total: 150_000,
            currency: "IDR".into(),
            status: OrderStatus::Pending,
            payment: Json(payment),
            delivery: Json(DeliveryInfo::default()),
            reject_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn order_id_has_expected_shape() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let id = generate_order_id(now);
        assert_eq!(id.len(), 3 + 8 + 10);
        assert!(id.starts_with("JMB"));
        assert_eq!(&id[3..11], "20260314");
        assert!(id[11..]
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn extract_is_left_inverse_of_generate() {
        for (y, m, d) in [(2024, 1, 1), (2025, 12, 31), (2026, 2, 28)] {
            let now = Utc.with_ymd_and_hms(y, m, d, 23, 59, 59).unwrap();
            let date = extract_order_date(&generate_order_id(now)).unwrap();
            assert_eq!((date.year(), date.month(), date.day()), (y, m, d));
        }
    }

    #[test]
    fn extract_rejects_malformed_ids() {
        assert!(extract_order_date("ORD20260101ABCDEFGHIJ").is_none());
        assert!(extract_order_date("JMB2026011ABCDEFGHIJ").is_none());
        assert!(extract_order_date("JMB20261341ABCDEFGHIJ").is_none());
        assert!(extract_order_date("JMB20260101abcdefghij").is_none());
        assert!(extract_order_date("JMB20260101ABCDE").is_none());
    }

    #[test]
    fn public_projection_omits_provider_response() {
        let order = sample_order();
        let full = serde_json::to_value(&order).unwrap();
        assert!(full["payment"]["provider_response"]["Data"]["SessionID"].is_string());

        let public = serde_json::to_value(PublicOrder::from(&order)).unwrap();
        let rendered = public.to_string();
        assert!(!rendered.contains("provider_response"));
        assert!(!rendered.contains("secret-session"));
        assert!(!rendered.contains("customer_email"));
        assert_eq!(public["payment"]["provider"], "ipaymu");
        assert_eq!(public["payment"]["status"], "UNPAID");
    }

    #[test]
    fn status_transitions_one_way() {
        let mut order = sample_order();
        assert!(!order.is_terminal());
        order.status = OrderStatus::Completed;
        assert!(order.is_terminal());
        order.status = OrderStatus::Rejected;
        assert!(order.is_terminal());
    }
}
