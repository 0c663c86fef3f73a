use serde::{Deserialize, Serialize};
use std::fmt;

use super::outfit::Outfit;

/// A genre reference attached to a collection.
///
/// The backend occasionally returns genre stubs without an id (for example
/// genres created inline by an older client), so the id is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
}

impl Genre {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Only positive numeric ids refer to a persisted genre.
    pub fn valid_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }
}

/// A creator-published set of curated outfits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub seasons: Vec<String>,
    #[serde(default)]
    pub outfits: Vec<Outfit>,
}

impl Collection {
    pub fn new(id: i64, creator_id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            creator_id,
            title: title.into(),
            description: String::new(),
            image: None,
            is_paid: false,
            genres: Vec::new(),
            seasons: Vec::new(),
            outfits: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    pub fn with_genres(mut self, genres: Vec<Genre>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_seasons(mut self, seasons: Vec<String>) -> Self {
        self.seasons = seasons;
        self
    }

    pub fn with_outfits(mut self, outfits: Vec<Outfit>) -> Self {
        self.outfits = outfits;
        self
    }

    /// Whether `actor_id` may edit or delete this collection.
    pub fn is_owned_by(&self, actor_id: i64) -> bool {
        self.creator_id == actor_id
    }

    pub fn item_count(&self) -> usize {
        self.outfits.iter().map(|o| o.outfit_items.len()).sum()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (#{})", self.title, self.id)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;

        writeln!(f, "Access: {}", if self.is_paid { "paid" } else { "free" })?;

        if !self.genres.is_empty() {
            let names: Vec<&str> = self.genres.iter().map(|g| g.name.as_str()).collect();
            writeln!(f, "Genres: {}", names.join(", "))?;
        }

        if !self.seasons.is_empty() {
            writeln!(f, "Seasons: {}", self.seasons.join(", "))?;
        }

        if let Some(image) = &self.image {
            writeln!(f, "Image: {}", image)?;
        }

        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        if !self.outfits.is_empty() {
            writeln!(f, "\nOutfits:")?;
            for outfit in &self.outfits {
                write!(f, "{}", outfit)?;
            }
        }

        Ok(())
    }
}
