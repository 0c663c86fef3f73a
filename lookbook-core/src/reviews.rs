//! Paginated review threads.
//!
//! A [`ReviewThread`] accumulates the pages of a collection's reviews and
//! keeps the local list in step with what was posted, so callers do not
//! have to reload every page after answering a review.

use crate::api::{ApiError, CommunityApi};
use crate::models::{NewReview, Review, ReviewAnswer, ReviewPage};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Loaded reviews of one collection.
#[derive(Debug, Clone)]
pub struct ReviewThread {
    collection_id: i64,
    page_size: u32,
    reviews: Vec<Review>,
    loaded_page: u32,
    total_pages: Option<u32>,
}

impl ReviewThread {
    pub fn new(collection_id: i64) -> Self {
        Self::with_page_size(collection_id, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(collection_id: i64, page_size: u32) -> Self {
        Self {
            collection_id,
            page_size: page_size.max(1),
            reviews: Vec::new(),
            loaded_page: 0,
            total_pages: None,
        }
    }

    pub fn collection_id(&self) -> i64 {
        self.collection_id
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn loaded_page(&self) -> u32 {
        self.loaded_page
    }

    /// True until a page at or past the last one has been merged.
    pub fn has_more(&self) -> bool {
        match self.total_pages {
            Some(total) => self.loaded_page < total,
            None => true,
        }
    }

    /// Merges a fetched page. Reviews already present are replaced in place,
    /// unknown ones are appended, so overlapping pages never duplicate.
    pub fn merge_page(&mut self, page: ReviewPage) {
        for review in page.reviews {
            match self.reviews.iter_mut().find(|r| r.id == review.id) {
                Some(existing) => *existing = review,
                None => self.reviews.push(review),
            }
        }
        self.loaded_page = self.loaded_page.max(page.page);
        self.total_pages = Some(page.total_pages);
    }

    /// Fetches and merges the next page. Returns how many reviews it held.
    pub async fn load_next<A: CommunityApi>(&mut self, api: &A) -> Result<usize, ApiError> {
        if !self.has_more() {
            return Ok(0);
        }
        let page = api
            .list_reviews(self.collection_id, self.loaded_page + 1, self.page_size)
            .await?;
        let count = page.reviews.len();
        self.merge_page(page);
        Ok(count)
    }

    /// Inserts a review the server just accepted at the top of the thread.
    pub fn insert_review(&mut self, review: Review) {
        self.reviews.retain(|r| r.id != review.id);
        self.reviews.insert(0, review);
    }

    /// Attaches an accepted answer to its review. Returns false if the
    /// review is not loaded.
    pub fn attach_answer(&mut self, answer: ReviewAnswer) -> bool {
        match self.reviews.iter_mut().find(|r| r.id == answer.review_id) {
            Some(review) => {
                review.answer = Some(answer);
                true
            }
            None => false,
        }
    }

    pub async fn post<A: CommunityApi>(
        &mut self,
        api: &A,
        review: &NewReview,
    ) -> Result<Review, ApiError> {
        let created = api.post_review(self.collection_id, review).await?;
        tracing::info!("Posted review #{} on collection #{}", created.id, self.collection_id);
        self.insert_review(created.clone());
        Ok(created)
    }

    pub async fn answer<A: CommunityApi>(
        &mut self,
        api: &A,
        review_id: i64,
        text: &str,
    ) -> Result<ReviewAnswer, ApiError> {
        let answer = api.post_answer(review_id, text).await?;
        if !self.attach_answer(answer.clone()) {
            tracing::debug!("Answered review #{} which is not loaded", review_id);
        }
        Ok(answer)
    }
}
