//! Positional diff of a working copy against its snapshot.

use super::operation::{CollectionProjection, DeleteIntents, Operation, OperationSet};
use crate::models::{Collection, Outfit};

/// Computes the remote mutations that bring the server in line with
/// `current`.
///
/// Outfits and items are matched by position, not by id: `current.outfits[i]`
/// is compared with `snapshot.outfits[i]`. Deletions come only from
/// `intents`. Without a snapshot everything in `current` is written.
pub fn reconcile(
    snapshot: Option<&Collection>,
    current: &Collection,
    intents: &DeleteIntents,
) -> OperationSet {
    let mut operations = OperationSet::new();

    for id in &intents.outfits {
        operations.push(Operation::DeleteOutfit(*id));
    }
    for id in &intents.outfit_items {
        operations.push(Operation::DeleteOutfitItem(*id));
    }

    let projection = CollectionProjection::of(current);
    let unchanged = snapshot.is_some_and(|s| CollectionProjection::of(s) == projection);
    if !unchanged {
        operations.push(Operation::UpdateCollection {
            collection_id: current.id,
            projection,
        });
    }

    let original_outfits: &[Outfit] = snapshot.map(|s| s.outfits.as_slice()).unwrap_or(&[]);

    for (i, outfit) in current.outfits.iter().enumerate() {
        let needs_write = match original_outfits.get(i) {
            Some(original) => !original.same_fields(outfit),
            None => true,
        };
        if needs_write {
            operations.push(Operation::UpsertOutfit {
                collection_id: current.id,
                outfit: outfit.clone(),
            });
        }
    }

    for (i, outfit) in current.outfits.iter().enumerate() {
        let original_items = original_outfits
            .get(i)
            .map(|o| o.outfit_items.as_slice())
            .unwrap_or(&[]);

        for (j, item) in outfit.outfit_items.iter().enumerate() {
            let needs_write = match original_items.get(j) {
                Some(original) => !original.same_fields(item),
                None => true,
            };
            if needs_write {
                operations.push(Operation::UpsertOutfitItem {
                    outfit_id: item.outfit_id.or(outfit.id),
                    item: item.clone(),
                });
            }
        }
    }

    operations
}
