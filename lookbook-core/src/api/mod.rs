//! REST API seams for the Lookbook backend.
//!
//! The backend is a black box. Three traits split it by concern:
//!
//! - [`CollectionApi`]: collection detail plus the CRUD calls the
//!   reconciliation engine issues for outfits and outfit items
//! - [`ProfileApi`]: the `/me` endpoint used to refresh a session
//! - [`CommunityApi`]: reviews and the follow/subscribe relationships
//!
//! [`HttpApi`] implements all three over `reqwest`. Tests substitute
//! in-memory implementations.

#![allow(async_fn_in_trait)]

mod error;
mod http;

pub use error::ApiError;
pub use http::HttpApi;

use crate::models::{
    Collection, NewReview, Outfit, OutfitItem, Profile, Review, ReviewAnswer, ReviewPage,
};
use crate::reconcile::CollectionProjection;

/// Collection and nested outfit CRUD.
pub trait CollectionApi {
    /// Fetches a fully materialized collection as seen by `actor_id`.
    async fn fetch_collection_detail(
        &self,
        collection_id: i64,
        actor_id: i64,
    ) -> Result<Collection, ApiError>;

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn update_collection(
        &self,
        collection_id: i64,
        projection: &CollectionProjection,
    ) -> Result<(), ApiError>;

    async fn delete_collection(&self, collection_id: i64) -> Result<(), ApiError>;

    async fn create_outfit(&self, collection_id: i64, outfit: &Outfit) -> Result<Outfit, ApiError>;

    async fn update_outfit(&self, outfit: &Outfit) -> Result<(), ApiError>;

    async fn delete_outfit(&self, outfit_id: i64) -> Result<(), ApiError>;

    async fn create_outfit_item(
        &self,
        outfit_id: i64,
        item: &OutfitItem,
    ) -> Result<OutfitItem, ApiError>;

    async fn update_outfit_item(&self, item: &OutfitItem) -> Result<(), ApiError>;

    async fn delete_outfit_item(&self, item_id: i64) -> Result<(), ApiError>;
}

/// Profile of the authenticated caller.
pub trait ProfileApi {
    async fn me(&self) -> Result<Profile, ApiError>;
}

/// Reviews and creator relationships.
pub trait CommunityApi {
    async fn list_reviews(
        &self,
        collection_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ReviewPage, ApiError>;

    async fn post_review(&self, collection_id: i64, review: &NewReview) -> Result<Review, ApiError>;

    async fn post_answer(&self, review_id: i64, text: &str) -> Result<ReviewAnswer, ApiError>;

    async fn follow(&self, creator_id: i64) -> Result<(), ApiError>;

    async fn unfollow(&self, creator_id: i64) -> Result<(), ApiError>;

    async fn subscribe(&self, creator_id: i64) -> Result<(), ApiError>;

    async fn unsubscribe(&self, creator_id: i64) -> Result<(), ApiError>;
}
