//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub price: i64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub is_public: bool,
    pub auto_delivery: bool,
    pub category_id: Option<Uuid>,
    pub plans: Json<Vec<Plan>>,
    pub legacy_price: Option<i64>,
    pub legacy_currency: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_visible(&self) -> bool {
        self.status == ProductStatus::Active && self.is_public
    }

    pub fn find_plan(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }
}

/// Builds a stand-in plan for catalog entries created before plans existed.
/// Returns `None` when there is no legacy price to migrate from.
pub fn synthesize_default_plan(legacy_price: Option<i64>, legacy_currency: Option<&str>) -> Option<Plan> {
    let price = legacy_price?;
    Some(Plan {
        name: "Default".to_string(),
        price,
        currency: legacy_currency.unwrap_or("IDR").to_string(),
    })
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_synthesized_from_legacy_fields() {
        let plan = synthesize_default_plan(Some(50_000), Some("IDR")).unwrap();
        assert_eq!(plan.name, "Default");
        assert_eq!(plan.price, 50_000);
        assert_eq!(plan.currency, "IDR");

        let plan = synthesize_default_plan(Some(9_000), None).unwrap();
        assert_eq!(plan.currency, "IDR");

        assert!(synthesize_default_plan(None, Some("IDR")).is_none());
    }

    #[test]
    fn visibility_requires_active_and_public() {
        let mut product = Product {
            id: Uuid::new_v4(),
            slug: "aim-pro".into(),
            name: "Aim Pro".into(),
            description: None,
            status: ProductStatus::Active,
            is_public: true,
            auto_delivery: false,
            category_id: None,
            plans: Json(vec![]),
            legacy_price: None,
            legacy_currency: None,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(product.is_visible());
        product.is_public = false;
        assert!(!product.is_visible());
        product.is_public = true;
        product.status = ProductStatus::Draft;
        assert!(!product.is_visible());
    }
}
