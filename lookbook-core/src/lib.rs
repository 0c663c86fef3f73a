//! Lookbook Core Library
//!
//! Shared types and logic for Lookbook clients: collection models, the
//! reconciliation engine that saves edited collections, the REST client and
//! the authentication session.

pub mod api;
pub mod editor;
pub mod models;
pub mod reconcile;
pub mod reviews;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiError, CollectionApi, CommunityApi, HttpApi, ProfileApi};
pub use editor::{EditError, EditSession, SubmitLock, SubmitLocks};
pub use models::{
    Collection, CreatorProfile, Genre, NewReview, Outfit, OutfitItem, Profile, Review,
    ReviewAnswer, ReviewPage, UserProfile,
};
pub use reconcile::{
    apply, reconcile, ApplyReport, CollectionProjection, DeleteIntents, Operation,
    OperationOutcome, OperationSet, WriteKind,
};
pub use reviews::ReviewThread;
pub use session::{Session, SessionError, SessionStore, TokenClaims};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
