use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The creator's reply to a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnswer {
    pub id: i64,
    pub review_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A fan's review of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub collection_id: i64,
    pub author_id: i64,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub answer: Option<ReviewAnswer>,
}

impl Review {
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stars = "*".repeat(self.rating.min(5) as usize);
        writeln!(
            f,
            "#{} {:<5} by user {} on {}",
            self.id,
            stars,
            self.author_id,
            self.created_at.format("%Y-%m-%d")
        )?;
        if !self.comment.is_empty() {
            writeln!(f, "  {}", self.comment)?;
        }
        if let Some(answer) = &self.answer {
            writeln!(f, "  > {}", answer.text)?;
        }
        Ok(())
    }
}

/// Body for posting a new review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

/// One page of reviews as returned by the backend. Pages are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub page: u32,
    pub total_pages: u32,
}
