//! Domain Aggregates

pub mod order;
pub mod product;
pub mod review;

pub use order::{Order, OrderStatus, PaymentStatus, Provider};
pub use product::{Category, Plan, Product, ProductStatus};
pub use review::Review;
