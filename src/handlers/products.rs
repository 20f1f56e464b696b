//! Product catalog handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::domain::product::{synthesize_default_plan, Plan, Product};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::orders::PaginatedResponse;

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Db(err),
    }
}

pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ProductListParams>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).min(100);
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status = 'ACTIVE' AND is_public = TRUE
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(per_page as i64)
    .bind(((page - 1) * per_page) as i64)
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE status = 'ACTIVE' AND is_public = TRUE",
    )
    .fetch_one(&s.db)
    .await?;
    Ok(Json(PaginatedResponse {
        data: products,
        total: total.0,
        page,
    }))
}

pub async fn get_product(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .filter(Product::is_visible)
        .map(Json)
        .ok_or(AppError::NotFound("product"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProductRequest {
    #[validate(length(min = 1, message = "slug must not be empty"))]
    pub slug: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub auto_delivery: bool,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

pub async fn create_product(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<UpsertProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    req.validate()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, slug, name, description, status, is_public, auto_delivery,
                               category_id, plans, average_rating, total_reviews, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'DRAFT', $5, $6, $7, $8, 0, 0, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.slug)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.is_public)
    .bind(req.auto_delivery)
    .bind(req.category_id)
    .bind(Jsonb(req.plans))
    .fetch_one(&s.db)
    .await
    .map_err(|err| unique_violation(err, "product slug already exists"))?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<crate::domain::product::ProductStatus>,
    pub is_public: Option<bool>,
    pub auto_delivery: Option<bool>,
    pub category_id: Option<Uuid>,
    pub plans: Option<Vec<Plan>>,
}

pub async fn update_product(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            is_public = COALESCE($5, is_public),
            auto_delivery = COALESCE($6, auto_delivery),
            category_id = COALESCE($7, category_id),
            plans = COALESCE($8, plans),
            updated_at = NOW()
         WHERE slug = $1 RETURNING *",
    )
    .bind(&slug)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.status)
    .bind(req.is_public)
    .bind(req.auto_delivery)
    .bind(req.category_id)
    .bind(req.plans.map(Jsonb))
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("product"))?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("UPDATE products SET status = 'ARCHIVED', updated_at = NOW() WHERE slug = $1")
        .bind(&slug)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct RepairReport {
    pub repaired: u64,
}

/// One-off repair: entries created before plans existed get a default plan
/// synthesized from their legacy price columns.
pub async fn repair_plans(
    State(s): State<AppState>,
    _admin: RequireAdmin,
) -> AppResult<Json<RepairReport>> {
    let candidates = sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE jsonb_array_length(plans) = 0 AND legacy_price IS NOT NULL",
    )
    .fetch_all(&s.db)
    .await?;

    let mut repaired = 0u64;
    for product in candidates {
        let Some(plan) =
            synthesize_default_plan(product.legacy_price, product.legacy_currency.as_deref())
        else {
            continue;
        };
        sqlx::query("UPDATE products SET plans = $2, updated_at = NOW() WHERE id = $1")
            .bind(product.id)
            .bind(Jsonb(vec![plan]))
            .execute(&s.db)
            .await?;
        repaired += 1;
    }
    tracing::info!(repaired, "synthesized default plans from legacy prices");
    Ok(Json(RepairReport { repaired }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_ignores_unknown_filters() {
        // The public listing has no status filter; a stray ?status= value must
        // not reject the request, only page and per_page are read.
        let uri = "/api/v1/products?status=ACTIVE&page=2&per_page=5"
            .parse()
            .unwrap();
        let Query(p) = Query::<ProductListParams>::try_from_uri(&uri).unwrap();
        assert_eq!(p.page, Some(2));
        assert_eq!(p.per_page, Some(5));
    }
}
