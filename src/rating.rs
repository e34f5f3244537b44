//! On-demand rating aggregation.
//!
//! A title's rating is the mean of its review scores rounded half-to-even,
//! recomputed from the store on every request. Nothing is cached or stored
//! back on the title row.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::review;

/// Compute the current rating for a title.
///
/// Returns `None` when the title has no reviews (a title without reviews has
/// no rating, not a rating of zero).
///
/// # Errors
///
/// Returns a [`DbErr`] if the score query fails.
pub async fn title_rating(db: &DatabaseConnection, title_id: Uuid) -> Result<Option<i64>, DbErr> {
    let scores: Vec<i16> = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.score)
        .collect();

    Ok(mean_rating(&scores))
}

/// Mean of the scores rounded half-to-even, or `None` for an empty slice.
#[must_use]
pub fn mean_rating(scores: &[i16]) -> Option<i64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / scores.len() as f64;
    Some(round_half_even(mean))
}

/// Round to the nearest integer, breaking exact .5 ties towards the even
/// neighbor (4.5 → 4, 7.5 → 8).
#[allow(clippy::cast_possible_truncation)]
fn round_half_even(x: f64) -> i64 {
    let floor = x.floor();
    let diff = x - floor;
    let floor = floor as i64;
    if (diff - 0.5).abs() < f64::EPSILON {
        if floor % 2 == 0 { floor } else { floor + 1 }
    } else if diff > 0.5 {
        floor + 1
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reviews_means_no_rating() {
        assert_eq!(mean_rating(&[]), None);
    }

    #[test]
    fn single_score_is_its_own_rating() {
        assert_eq!(mean_rating(&[3]), Some(3));
        assert_eq!(mean_rating(&[10]), Some(10));
    }

    #[test]
    fn mean_rounds_half_to_even() {
        // 4.5 rounds down to the even neighbor
        assert_eq!(mean_rating(&[4, 5]), Some(4));
        // 7.5 rounds up to the even neighbor
        assert_eq!(mean_rating(&[7, 8]), Some(8));
    }

    #[test]
    fn non_tie_means_round_normally() {
        // 13/3 = 4.33.. → 4
        assert_eq!(mean_rating(&[3, 4, 6]), Some(4));
        // 14/3 = 4.66.. → 5
        assert_eq!(mean_rating(&[4, 4, 6]), Some(5));
    }
}
