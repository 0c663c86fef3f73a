mod collection;
mod outfit;
mod profile;
mod review;

pub use collection::{Collection, Genre};
pub use outfit::{Outfit, OutfitItem};
pub use profile::{CreatorProfile, Profile, UserProfile};
pub use review::{NewReview, Review, ReviewAnswer, ReviewPage};
