//! QRIS Storefront - Self-hosted Digital Goods Storefront
//!
//! Order lifecycle with QRIS payment reconciliation across three gateway
//! vendors (iPaymu, Tokopay, Pakasir) plus a manual QRIS fallback.
//!
//! ## Features
//! - Product catalog with plans, categories and review aggregates
//! - Checkout and order lifecycle (PENDING -> COMPLETED | REJECTED)
//! - Gateway adapters normalizing vendor statuses to PAID/UNPAID/EXPIRED
//! - Best-effort notification bridge to the ticketing bot
//! - Companion uptime monitor binary with alert cooldowns

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod monitor;
pub mod notify;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::{AppError, AppResult};
