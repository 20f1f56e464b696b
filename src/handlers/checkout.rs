//! Checkout: order creation plus the gateway charge.
//!
//! The order row is inserted first so the generated id can serve as the
//! provider reference; a failed charge deletes the row again rather than
//! leaving an unpayable PENDING order behind.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as Jsonb;
use validator::Validate;

use crate::domain::order::{
    generate_order_id, DeliveryInfo, DeliveryMethod, Order, PaymentInfo, Provider, PublicOrder,
};
use crate::domain::product::Product;
use crate::error::{AppError, AppResult};
use crate::gateway::{self, ChargeRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "customer_name must not be empty"))]
    pub customer_name: String,
    #[validate(email(message = "customer_email must be a valid email"))]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub user_id: Option<String>,
    pub product_slug: String,
    pub plan_name: String,
    pub provider: Provider,
}

pub async fn checkout(
    State(s): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<PublicOrder>)> {
    req.validate()?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(&req.product_slug)
        .fetch_optional(&s.db)
        .await?
        .filter(Product::is_visible)
        .ok_or(AppError::NotFound("product"))?;
    let plan = product
        .find_plan(&req.plan_name)
        .ok_or_else(|| AppError::Validation(format!("unknown plan: {}", req.plan_name)))?
        .clone();

    let now = Utc::now();
    let order_id = generate_order_id(now);
    let delivery = DeliveryInfo {
        method: if product.auto_delivery {
            DeliveryMethod::Auto
        } else {
            DeliveryMethod::Manual
        },
        ..DeliveryInfo::default()
    };

    sqlx::query(
        "INSERT INTO orders (id, customer_name, customer_email, customer_phone, user_id,
                             product_slug, plan_name, total, currency, status,
                             payment, delivery, version, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING', $10, $11, 0, NOW(), NOW())",
    )
    .bind(&order_id)
    .bind(req.customer_name.trim())
    .bind(req.customer_email.trim())
    .bind(&req.customer_phone)
    .bind(&req.user_id)
    .bind(&product.slug)
    .bind(&plan.name)
    .bind(plan.price)
    .bind(&plan.currency)
    .bind(Jsonb(PaymentInfo::new(req.provider)))
    .bind(Jsonb(delivery))
    .execute(&s.db)
    .await?;

    let gateway = gateway::build(req.provider, &s.db, &s.config, &s.http).await;
    let descriptor = match gateway {
        Ok(gateway) => {
            gateway
                .create_payment(&ChargeRequest {
                    order_id: order_id.clone(),
                    amount: plan.price,
                    customer_name: req.customer_name.trim().to_string(),
                    customer_email: req.customer_email.trim().to_string(),
                    customer_phone: req.customer_phone.clone(),
                })
                .await
        }
        Err(err) => Err(err),
    };
    let descriptor = match descriptor {
        Ok(d) => d,
        Err(err) => {
            // Roll the order back by delete; there is nothing to pay.
            if let Err(cleanup) = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(&order_id)
                .execute(&s.db)
                .await
            {
                tracing::error!(order_id = %order_id, "failed to clean up order after charge failure: {cleanup}");
            }
            return Err(err);
        }
    };

    let mut payment = PaymentInfo::new(req.provider);
    payment.reference = descriptor.reference;
    payment.qr_string = descriptor.qr_string;
    payment.pay_url = descriptor.pay_url;
    payment.expires_at = descriptor.expires_at;
    payment.provider_response = descriptor.raw;

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET payment = $2, version = version + 1, updated_at = NOW()
         WHERE id = $1 RETURNING *",
    )
    .bind(&order_id)
    .bind(Jsonb(payment))
    .fetch_one(&s.db)
    .await?;

    s.notifier
        .ticket_created(&order.id, &order.product_slug, order.total);
    tracing::info!(order_id = %order.id, provider = req.provider.as_str(), "order created");
    Ok((StatusCode::CREATED, Json(PublicOrder::from(&order))))
}
