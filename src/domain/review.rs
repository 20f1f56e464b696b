//! Review Aggregate
//!
//! Product rating aggregates are recomputed over all remaining reviews on
//! every deletion; a full recount, not an incremental adjustment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_slug: String,
    pub order_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mean of the given ratings rounded to one decimal place, plus the count.
/// An empty slice resets both aggregates to zero.
pub fn recompute_rating(ratings: &[i32]) -> (f64, i64) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    ((mean * 10.0).round() / 10.0, ratings.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ratings_reset_aggregates() {
        assert_eq!(recompute_rating(&[]), (0.0, 0));
    }

    #[test]
    fn mean_rounds_to_one_decimal() {
        assert_eq!(recompute_rating(&[5]), (5.0, 1));
        assert_eq!(recompute_rating(&[4, 5]), (4.5, 2));
        // 4+4+5 = 13 / 3 = 4.333... -> 4.3
        assert_eq!(recompute_rating(&[4, 4, 5]), (4.3, 3));
        // 1+2+2 = 5 / 3 = 1.666... -> 1.7
        assert_eq!(recompute_rating(&[1, 2, 2]), (1.7, 3));
    }

    #[test]
    fn deleting_one_of_n_matches_recount_over_remainder() {
        let all = [5, 3, 4, 4];
        let remaining = [5, 3, 4];
        let (avg_before, n_before) = recompute_rating(&all);
        assert_eq!((avg_before, n_before), (4.0, 4));
        let (avg_after, n_after) = recompute_rating(&remaining);
        assert_eq!((avg_after, n_after), (4.0, 3));
    }
}
