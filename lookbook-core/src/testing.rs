//! In-memory backend used by unit tests.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, CollectionApi, CommunityApi, ProfileApi};
use crate::models::{
    Collection, Genre, NewReview, Outfit, OutfitItem, Profile, Review, ReviewAnswer, ReviewPage,
};
use crate::reconcile::CollectionProjection;

#[derive(Debug)]
struct State {
    collections: BTreeMap<i64, Collection>,
    reviews: Vec<Review>,
    profile: Option<Profile>,
    follows: BTreeSet<i64>,
    subscriptions: BTreeSet<i64>,
    failing: HashSet<String>,
    calls: Vec<String>,
    next_id: i64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
            reviews: Vec::new(),
            profile: None,
            follows: BTreeSet::new(),
            subscriptions: BTreeSet::new(),
            failing: HashSet::new(),
            calls: Vec::new(),
            next_id: 1000,
        }
    }
}

impl State {
    /// Records the call and fails it if it was marked with `fail_on`.
    fn call(&mut self, call: String) -> Result<(), ApiError> {
        let fails = self.failing.contains(&call);
        self.calls.push(call);
        if fails {
            return Err(ApiError::Status {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn outfit_mut(&mut self, outfit_id: i64) -> Option<&mut Outfit> {
        self.collections
            .values_mut()
            .flat_map(|c| c.outfits.iter_mut())
            .find(|o| o.id == Some(outfit_id))
    }

    fn item_mut(&mut self, item_id: i64) -> Option<&mut OutfitItem> {
        self.collections
            .values_mut()
            .flat_map(|c| c.outfits.iter_mut())
            .flat_map(|o| o.outfit_items.iter_mut())
            .find(|i| i.id == Some(item_id))
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        message: "not found".to_string(),
    }
}

/// Cloneable in-memory implementation of every API trait.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryApi {
    state: Arc<Mutex<State>>,
}

impl MemoryApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_collection(collection: Collection) -> Self {
        let api = Self::new();
        api.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.id, collection);
        api
    }

    pub(crate) fn set_profile(&self, profile: Profile) {
        self.state.lock().unwrap().profile = Some(profile);
    }

    pub(crate) fn add_review(&self, review: Review) {
        self.state.lock().unwrap().reviews.push(review);
    }

    /// Makes every future call with this label (e.g. `PUT /outfits/10`) fail.
    pub(crate) fn fail_on(&self, call: &str) {
        self.state.lock().unwrap().failing.insert(call.to_string());
    }

    pub(crate) fn clear_failures(&self) {
        self.state.lock().unwrap().failing.clear();
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn collection(&self, id: i64) -> Option<Collection> {
        self.state.lock().unwrap().collections.get(&id).cloned()
    }

    pub(crate) fn follows(&self) -> BTreeSet<i64> {
        self.state.lock().unwrap().follows.clone()
    }

    pub(crate) fn subscriptions(&self) -> BTreeSet<i64> {
        self.state.lock().unwrap().subscriptions.clone()
    }
}

impl CollectionApi for MemoryApi {
    async fn fetch_collection_detail(
        &self,
        collection_id: i64,
        _actor_id: i64,
    ) -> Result<Collection, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("GET /collections/{}", collection_id))?;
        state
            .collections
            .get(&collection_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("GET /collections".to_string())?;
        Ok(state.collections.values().cloned().collect())
    }

    async fn update_collection(
        &self,
        collection_id: i64,
        projection: &CollectionProjection,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("PUT /collections/{}", collection_id))?;
        let collection = state
            .collections
            .get_mut(&collection_id)
            .ok_or_else(not_found)?;
        collection.title = projection.title.clone();
        collection.description = projection.description.clone();
        collection.image = projection.image.clone();
        collection.is_paid = projection.is_paid;
        collection.seasons = projection.seasons.clone();
        collection.genres = projection
            .genres
            .iter()
            .map(|id| Genre::new(*id, format!("genre-{}", id)))
            .collect();
        Ok(())
    }

    async fn delete_collection(&self, collection_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("DELETE /collections/{}", collection_id))?;
        state
            .collections
            .remove(&collection_id)
            .map(|_| ())
            .ok_or_else(not_found)
    }

    async fn create_outfit(&self, collection_id: i64, outfit: &Outfit) -> Result<Outfit, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("POST /collections/{}/outfits", collection_id))?;
        let id = state.allocate_id();
        let created = Outfit::new(outfit.description.clone(), outfit.image_url.clone()).with_id(id);
        state
            .collections
            .get_mut(&collection_id)
            .ok_or_else(not_found)?
            .outfits
            .push(created.clone());
        Ok(created)
    }

    async fn update_outfit(&self, outfit: &Outfit) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let id = outfit.id.ok_or(ApiError::MissingId("update outfit"))?;
        state.call(format!("PUT /outfits/{}", id))?;
        let stored = state.outfit_mut(id).ok_or_else(not_found)?;
        stored.description = outfit.description.clone();
        stored.image_url = outfit.image_url.clone();
        Ok(())
    }

    async fn delete_outfit(&self, outfit_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("DELETE /outfits/{}", outfit_id))?;
        for collection in state.collections.values_mut() {
            collection.outfits.retain(|o| o.id != Some(outfit_id));
        }
        Ok(())
    }

    async fn create_outfit_item(
        &self,
        outfit_id: i64,
        item: &OutfitItem,
    ) -> Result<OutfitItem, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("POST /outfits/{}/items", outfit_id))?;
        let id = state.allocate_id();
        let created = OutfitItem {
            id: Some(id),
            outfit_id: Some(outfit_id),
            ..item.clone()
        };
        state
            .outfit_mut(outfit_id)
            .ok_or_else(not_found)?
            .outfit_items
            .push(created.clone());
        Ok(created)
    }

    async fn update_outfit_item(&self, item: &OutfitItem) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let id = item.id.ok_or(ApiError::MissingId("update outfit item"))?;
        state.call(format!("PUT /outfit-items/{}", id))?;
        let stored = state.item_mut(id).ok_or_else(not_found)?;
        stored.image_url = item.image_url.clone();
        stored.store_name = item.store_name.clone();
        stored.product_link = item.product_link.clone();
        Ok(())
    }

    async fn delete_outfit_item(&self, item_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("DELETE /outfit-items/{}", item_id))?;
        for outfit in state
            .collections
            .values_mut()
            .flat_map(|c| c.outfits.iter_mut())
        {
            outfit.outfit_items.retain(|i| i.id != Some(item_id));
        }
        Ok(())
    }
}

impl ProfileApi for MemoryApi {
    async fn me(&self) -> Result<Profile, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("GET /me".to_string())?;
        state.profile.clone().ok_or(ApiError::Status {
            status: 401,
            message: "unauthenticated".to_string(),
        })
    }
}

impl CommunityApi for MemoryApi {
    async fn list_reviews(
        &self,
        collection_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ReviewPage, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!(
            "GET /collections/{}/reviews?page={}",
            collection_id, page
        ))?;
        let matching: Vec<&Review> = state
            .reviews
            .iter()
            .filter(|r| r.collection_id == collection_id)
            .collect();
        let limit = limit.max(1) as usize;
        let total_pages = matching.len().div_ceil(limit) as u32;
        let start = (page.saturating_sub(1) as usize) * limit;
        let reviews = matching
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();
        Ok(ReviewPage {
            reviews,
            page,
            total_pages,
        })
    }

    async fn post_review(&self, collection_id: i64, review: &NewReview) -> Result<Review, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("POST /collections/{}/reviews", collection_id))?;
        let author_id = state.profile.as_ref().map(|p| p.actor_id()).unwrap_or(0);
        let created = Review {
            id: state.allocate_id(),
            collection_id,
            author_id,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: Utc::now(),
            answer: None,
        };
        state.reviews.push(created.clone());
        Ok(created)
    }

    async fn post_answer(&self, review_id: i64, text: &str) -> Result<ReviewAnswer, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("POST /reviews/{}/answer", review_id))?;
        let answer = ReviewAnswer {
            id: state.allocate_id(),
            review_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(not_found)?;
        review.answer = Some(answer.clone());
        Ok(answer)
    }

    async fn follow(&self, creator_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("PUT /creators/{}/follow", creator_id))?;
        state.follows.insert(creator_id);
        Ok(())
    }

    async fn unfollow(&self, creator_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("DELETE /creators/{}/follow", creator_id))?;
        state.follows.remove(&creator_id);
        Ok(())
    }

    async fn subscribe(&self, creator_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("PUT /creators/{}/subscription", creator_id))?;
        state.subscriptions.insert(creator_id);
        Ok(())
    }

    async fn unsubscribe(&self, creator_id: i64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call(format!("DELETE /creators/{}/subscription", creator_id))?;
        state.subscriptions.remove(&creator_id);
        Ok(())
    }
}
