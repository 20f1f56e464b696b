//! Router assembly.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{categories, checkout, health, orders, products, reviews};
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Public storefront surface
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/:slug", get(products::get_product))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/checkout", post(checkout::checkout))
        .route("/api/v1/orders/:id/public", get(orders::get_public_order))
        .route("/api/v1/orders/:id/status", post(orders::reconcile_order))
        .route(
            "/api/v1/orders/:id/messages",
            post(orders::send_message).get(orders::list_messages),
        )
        .route("/api/v1/reviews", post(reviews::create_review))
        // Admin surface
        .route("/api/v1/admin/orders", get(orders::list_orders))
        .route("/api/v1/admin/orders/:id", get(orders::get_order))
        .route("/api/v1/admin/orders/:id/reject", post(orders::reject_order))
        .route("/api/v1/admin/orders/:id/confirm", post(orders::confirm_order))
        .route("/api/v1/admin/orders/:id/deliver", post(orders::deliver_order))
        .route("/api/v1/admin/products", post(products::create_product))
        .route(
            "/api/v1/admin/products/repair-plans",
            post(products::repair_plans),
        )
        .route(
            "/api/v1/admin/products/:slug",
            axum::routing::put(products::update_product).delete(products::delete_product),
        )
        .route("/api/v1/admin/categories", post(categories::create_category))
        .route(
            "/api/v1/admin/categories/:id",
            axum::routing::put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/v1/admin/reviews/:id", delete(reviews::delete_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
