use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::{Collection, Outfit, OutfitItem};

/// The scalar and relationship fields of a collection as sent on update.
///
/// Two projections are equal exactly when no top-level update is needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionProjection {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    /// Ids of the attached genres, stubs without a valid id dropped.
    pub genres: Vec<i64>,
    pub is_paid: bool,
    pub seasons: Vec<String>,
}

impl CollectionProjection {
    pub fn of(collection: &Collection) -> Self {
        Self {
            title: collection.title.clone(),
            description: collection.description.clone(),
            image: collection.image.clone(),
            genres: collection
                .genres
                .iter()
                .filter_map(|g| g.valid_id())
                .collect(),
            is_paid: collection.is_paid,
            seasons: collection.seasons.clone(),
        }
    }
}

/// Ids the user explicitly removed from the working copy.
///
/// Removed entities vanish from positional diffing, so deletions are only
/// ever driven from these sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteIntents {
    pub outfits: BTreeSet<i64>,
    pub outfit_items: BTreeSet<i64>,
}

impl DeleteIntents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_outfit(&mut self, id: i64) {
        self.outfits.insert(id);
    }

    pub fn remove_outfit_item(&mut self, id: i64) {
        self.outfit_items.insert(id);
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty() && self.outfit_items.is_empty()
    }

    pub fn clear(&mut self) {
        self.outfits.clear();
        self.outfit_items.clear();
    }
}

/// Whether an operation creates, updates or deletes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKind::Create => write!(f, "create"),
            WriteKind::Update => write!(f, "update"),
            WriteKind::Delete => write!(f, "delete"),
        }
    }
}

/// A single remote mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    DeleteOutfit(i64),
    DeleteOutfitItem(i64),
    UpdateCollection {
        collection_id: i64,
        projection: CollectionProjection,
    },
    /// Created when `outfit.id` is `None`, updated otherwise.
    UpsertOutfit { collection_id: i64, outfit: Outfit },
    /// Created when `item.id` is `None`, updated otherwise. Creation needs
    /// `outfit_id`, which is `None` for items of a not yet persisted outfit.
    UpsertOutfitItem {
        outfit_id: Option<i64>,
        item: OutfitItem,
    },
}

impl Operation {
    pub fn kind(&self) -> WriteKind {
        match self {
            Operation::DeleteOutfit(_) | Operation::DeleteOutfitItem(_) => WriteKind::Delete,
            Operation::UpdateCollection { .. } => WriteKind::Update,
            Operation::UpsertOutfit { outfit, .. } => {
                if outfit.is_persisted() {
                    WriteKind::Update
                } else {
                    WriteKind::Create
                }
            }
            Operation::UpsertOutfitItem { item, .. } => {
                if item.is_persisted() {
                    WriteKind::Update
                } else {
                    WriteKind::Create
                }
            }
        }
    }
}

fn fmt_id(id: Option<i64>) -> String {
    id.map(|id| format!("#{}", id))
        .unwrap_or_else(|| "(new)".to_string())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::DeleteOutfit(id) => write!(f, "delete outfit #{}", id),
            Operation::DeleteOutfitItem(id) => write!(f, "delete outfit item #{}", id),
            Operation::UpdateCollection { collection_id, .. } => {
                write!(f, "update collection #{}", collection_id)
            }
            Operation::UpsertOutfit { outfit, .. } => {
                write!(f, "{} outfit {}", self.kind(), fmt_id(outfit.id))
            }
            Operation::UpsertOutfitItem { item, .. } => {
                write!(f, "{} outfit item {}", self.kind(), fmt_id(item.id))
            }
        }
    }
}

/// Ordered output of [`reconcile`](super::reconcile): deletions, then the
/// collection update, then outfit upserts, then item upserts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSet {
    operations: Vec<Operation>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn count(&self, kind: WriteKind) -> usize {
        self.operations.iter().filter(|op| op.kind() == kind).count()
    }

    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }
}

impl IntoIterator for OperationSet {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
