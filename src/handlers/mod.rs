//! HTTP route handlers.

pub mod categories;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;
