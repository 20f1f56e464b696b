//! Review handlers.
//!
//! The product aggregate is recomputed over all remaining reviews on every
//! change; see `domain::review::recompute_rating`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::domain::order::OrderStatus;
use crate::domain::review::{recompute_rating, Review};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::orders::fetch_order;

async fn recount_product_rating(db: &PgPool, product_slug: &str) -> AppResult<()> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT rating FROM reviews WHERE product_slug = $1")
        .bind(product_slug)
        .fetch_all(db)
        .await?;
    let ratings: Vec<i32> = rows.into_iter().map(|r| r.0).collect();
    let (average, total) = recompute_rating(&ratings);
    sqlx::query(
        "UPDATE products SET average_rating = $2, total_reviews = $3, updated_at = NOW()
         WHERE slug = $1",
    )
    .bind(product_slug)
    .bind(average)
    .bind(total)
    .execute(db)
    .await?;
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub order_id: String,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

pub async fn create_review(
    State(s): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    req.validate()?;
    let order = fetch_order(&s.db, &req.order_id).await?;
    if order.status != OrderStatus::Completed {
        return Err(AppError::Conflict(
            "only completed orders can be reviewed".to_string(),
        ));
    }
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_slug, order_id, rating, comment, created_at)
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&order.product_slug)
    .bind(&order.id)
    .bind(req.rating)
    .bind(&req.comment)
    .fetch_one(&s.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict("order already has a review".to_string())
        }
        _ => AppError::Db(err),
    })?;
    recount_product_rating(&s.db, &order.product_slug).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted: Option<(String,)> =
        sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING product_slug")
            .bind(id)
            .fetch_optional(&s.db)
            .await?;
    let Some((product_slug,)) = deleted else {
        return Err(AppError::NotFound("review"));
    };
    recount_product_rating(&s.db, &product_slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
