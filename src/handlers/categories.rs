//! Category handlers. Deletion is refused while products still reference the
//! category.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::domain::product::Category;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn list_categories(State(s): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY display_order, name")
            .fetch_all(&s.db)
            .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertCategoryRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
}

pub async fn create_category(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<UpsertCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    req.validate()?;
    let slug = req.name.to_lowercase().replace(' ', "-");
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, slug, name, display_order, created_at)
         VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&slug)
    .bind(&req.name)
    .bind(req.display_order)
    .fetch_one(&s.db)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict("category slug already exists".to_string())
        }
        _ => AppError::Db(err),
    })?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(req): Json<UpsertCategoryRequest>,
) -> AppResult<Json<Category>> {
    req.validate()?;
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, display_order = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&req.name)
    .bind(req.display_order)
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("category"))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(s): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let references: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&s.db)
            .await?;
    if references.0 > 0 {
        return Err(AppError::Conflict(format!(
            "category is referenced by {} product(s)",
            references.0
        )));
    }
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}
