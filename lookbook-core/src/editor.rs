//! Edit sessions for published collections.
//!
//! An [`EditSession`] loads a collection once, freezes that copy as the
//! snapshot and lets the caller mutate a working copy. Removals go through
//! the session so the removed ids land in the delete-intent sets. `submit`
//! reconciles, applies and reloads.
//!
//! # States
//!
//! 1. **Open** - snapshot == working copy, no intents
//! 2. **Dirty** - working copy or intents differ, `plan()` is non-empty
//! 3. **Submitting** - the collection's [`SubmitLock`] is held
//! 4. Back to **Open** with a fresh snapshot, or consumed by
//!    `delete_collection`

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::api::{ApiError, CollectionApi};
use crate::models::{Collection, Genre, Outfit, OutfitItem};
use crate::reconcile::{apply, reconcile, ApplyReport, DeleteIntents, Operation, OperationSet};
use crate::session::{Session, SessionError};

/// Errors that can occur while editing a collection.
#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Collection #{collection_id} is not owned by user #{actor_id}")]
    NotOwner { collection_id: i64, actor_id: i64 },

    #[error("A save for collection #{0} is already in progress")]
    SubmitInFlight(i64),

    #[error("No outfit at position {0}")]
    NoSuchOutfit(usize),

    #[error("No item at position {1} of outfit {0}")]
    NoSuchItem(usize, usize),

    #[error("Changes were sent but reloading the collection failed: {0}")]
    Refresh(#[source] ApiError),
}

/// Registry of collections with a save or delete in flight.
///
/// Clones share the registry. Sessions opened with the same registry cannot
/// submit or delete the same collection concurrently.
#[derive(Debug, Clone, Default)]
pub struct SubmitLocks {
    held: Arc<Mutex<HashSet<i64>>>,
}

impl SubmitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock for `collection_id`, `None` if it is already held.
    pub fn try_acquire(&self, collection_id: i64) -> Option<SubmitLock> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(collection_id) {
            return None;
        }
        Some(SubmitLock {
            held: Arc::clone(&self.held),
            collection_id,
        })
    }

    pub fn is_held(&self, collection_id: i64) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&collection_id)
    }
}

/// Held for the duration of one submit or delete; released on drop.
#[derive(Debug)]
pub struct SubmitLock {
    held: Arc<Mutex<HashSet<i64>>>,
    collection_id: i64,
}

impl Drop for SubmitLock {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.collection_id);
    }
}

/// An edit session over one collection owned by the acting user.
#[derive(Debug)]
pub struct EditSession<A: CollectionApi> {
    api: A,
    locks: SubmitLocks,
    actor_id: i64,
    snapshot: Collection,
    working: Collection,
    intents: DeleteIntents,
}

impl<A: CollectionApi> EditSession<A> {
    /// Loads the collection and checks that the session's actor owns it.
    pub async fn open(
        api: A,
        locks: SubmitLocks,
        session: &Session,
        collection_id: i64,
    ) -> Result<Self, EditError> {
        let actor_id = session.actor_id()?;
        let snapshot = api.fetch_collection_detail(collection_id, actor_id).await?;

        if !snapshot.is_owned_by(actor_id) {
            return Err(EditError::NotOwner {
                collection_id,
                actor_id,
            });
        }

        tracing::info!(
            "Opened collection #{} ({} outfit(s), {} item(s))",
            collection_id,
            snapshot.outfits.len(),
            snapshot.item_count()
        );

        Ok(Self {
            api,
            locks,
            actor_id,
            working: snapshot.clone(),
            snapshot,
            intents: DeleteIntents::new(),
        })
    }

    pub fn collection_id(&self) -> i64 {
        self.snapshot.id
    }

    pub fn snapshot(&self) -> &Collection {
        &self.snapshot
    }

    pub fn working_copy(&self) -> &Collection {
        &self.working
    }

    pub fn intents(&self) -> &DeleteIntents {
        &self.intents
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.working.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.working.description = description.into();
    }

    pub fn set_image(&mut self, image: Option<String>) {
        self.working.image = image;
    }

    pub fn set_paid(&mut self, is_paid: bool) {
        self.working.is_paid = is_paid;
    }

    pub fn set_genres(&mut self, genres: Vec<Genre>) {
        self.working.genres = genres;
    }

    pub fn set_seasons(&mut self, seasons: Vec<String>) {
        self.working.seasons = seasons;
    }

    /// Appends an outfit and returns its position.
    pub fn add_outfit(&mut self, outfit: Outfit) -> usize {
        self.working.outfits.push(outfit);
        self.working.outfits.len() - 1
    }

    /// Edits the outfit at `index` in place. Items must be removed with
    /// [`remove_item`](Self::remove_item), not through this closure.
    pub fn update_outfit(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Outfit),
    ) -> Result<(), EditError> {
        let outfit = self
            .working
            .outfits
            .get_mut(index)
            .ok_or(EditError::NoSuchOutfit(index))?;
        edit(outfit);
        Ok(())
    }

    /// Removes the outfit at `index`, recording a delete intent if it was
    /// persisted. Its items go with it; the server cascades.
    pub fn remove_outfit(&mut self, index: usize) -> Result<Outfit, EditError> {
        if index >= self.working.outfits.len() {
            return Err(EditError::NoSuchOutfit(index));
        }
        let outfit = self.working.outfits.remove(index);
        if let Some(id) = outfit.id {
            self.intents.remove_outfit(id);
        }
        Ok(outfit)
    }

    /// Appends an item to the outfit at `outfit_index` and returns its
    /// position.
    pub fn add_item(
        &mut self,
        outfit_index: usize,
        mut item: OutfitItem,
    ) -> Result<usize, EditError> {
        let outfit = self
            .working
            .outfits
            .get_mut(outfit_index)
            .ok_or(EditError::NoSuchOutfit(outfit_index))?;
        item.outfit_id = outfit.id;
        outfit.outfit_items.push(item);
        Ok(outfit.outfit_items.len() - 1)
    }

    pub fn update_item(
        &mut self,
        outfit_index: usize,
        item_index: usize,
        edit: impl FnOnce(&mut OutfitItem),
    ) -> Result<(), EditError> {
        let item = self
            .working
            .outfits
            .get_mut(outfit_index)
            .ok_or(EditError::NoSuchOutfit(outfit_index))?
            .outfit_items
            .get_mut(item_index)
            .ok_or(EditError::NoSuchItem(outfit_index, item_index))?;
        edit(item);
        Ok(())
    }

    /// Removes an item, recording a delete intent if it was persisted.
    pub fn remove_item(
        &mut self,
        outfit_index: usize,
        item_index: usize,
    ) -> Result<OutfitItem, EditError> {
        let outfit = self
            .working
            .outfits
            .get_mut(outfit_index)
            .ok_or(EditError::NoSuchOutfit(outfit_index))?;
        if item_index >= outfit.outfit_items.len() {
            return Err(EditError::NoSuchItem(outfit_index, item_index));
        }
        let item = outfit.outfit_items.remove(item_index);
        if let Some(id) = item.id {
            self.intents.remove_outfit_item(id);
        }
        Ok(item)
    }

    /// Position of the outfit with the given id in the working copy.
    pub fn find_outfit(&self, outfit_id: i64) -> Option<usize> {
        self.working
            .outfits
            .iter()
            .position(|o| o.id == Some(outfit_id))
    }

    /// Position (outfit, item) of the item with the given id.
    pub fn find_item(&self, item_id: i64) -> Option<(usize, usize)> {
        self.working
            .outfits
            .iter()
            .enumerate()
            .find_map(|(i, outfit)| {
                outfit
                    .outfit_items
                    .iter()
                    .position(|item| item.id == Some(item_id))
                    .map(|j| (i, j))
            })
    }

    /// Replaces the whole working copy, e.g. with an edited export. The
    /// collection's identity and owner are kept from the snapshot. Outfits
    /// and items already marked for deletion are dropped from the new copy.
    pub fn replace_working_copy(&mut self, mut collection: Collection) {
        collection.id = self.snapshot.id;
        collection.creator_id = self.snapshot.creator_id;

        let intents = &self.intents;
        collection
            .outfits
            .retain(|o| !o.id.is_some_and(|id| intents.outfits.contains(&id)));
        for outfit in &mut collection.outfits {
            outfit
                .outfit_items
                .retain(|i| !i.id.is_some_and(|id| intents.outfit_items.contains(&id)));
        }

        self.working = collection;
    }

    /// Drops all local edits and delete intents.
    pub fn discard_changes(&mut self) {
        self.working = self.snapshot.clone();
        self.intents.clear();
    }

    /// The operations `submit` would issue right now.
    pub fn plan(&self) -> OperationSet {
        reconcile(Some(&self.snapshot), &self.working, &self.intents)
    }

    pub fn is_dirty(&self) -> bool {
        !self.plan().is_empty()
    }

    /// Reconciles, applies every operation and reloads the collection.
    ///
    /// Individual operation failures are in the returned report and do not
    /// fail the call. Delete intents are consumed either way. Ids of created
    /// outfits and items are written into the working copy; if the reload
    /// then fails the working copy is otherwise left as it was, so a retry
    /// updates those entities rather than creating them twice.
    pub async fn submit(&mut self) -> Result<ApplyReport, EditError> {
        let collection_id = self.collection_id();
        let _lock = self
            .locks
            .try_acquire(collection_id)
            .ok_or(EditError::SubmitInFlight(collection_id))?;

        let operations = self.plan();
        if operations.is_empty() {
            tracing::info!("Collection #{} has no changes to save", collection_id);
            return Ok(ApplyReport::default());
        }

        let report = apply(&self.api, operations).await;
        self.intents.clear();
        self.adopt_created_ids(&report);

        let fresh = self
            .api
            .fetch_collection_detail(collection_id, self.actor_id)
            .await
            .map_err(EditError::Refresh)?;

        self.working = fresh.clone();
        self.snapshot = fresh;

        Ok(report)
    }

    /// Writes server-assigned ids into the working copy so a resubmit after a
    /// failed reload updates the new entities instead of creating them again.
    fn adopt_created_ids(&mut self, report: &ApplyReport) {
        for outcome in report.outcomes() {
            let Some(id) = outcome.created_id else {
                continue;
            };
            match &outcome.operation {
                Operation::UpsertOutfit { outfit, .. } => {
                    if let Some(local) = self
                        .working
                        .outfits
                        .iter_mut()
                        .find(|o| !o.is_persisted() && **o == *outfit)
                    {
                        local.id = Some(id);
                    }
                }
                Operation::UpsertOutfitItem { outfit_id, item } => {
                    if let Some(local) = self
                        .working
                        .outfits
                        .iter_mut()
                        .flat_map(|o| o.outfit_items.iter_mut())
                        .find(|i| !i.is_persisted() && **i == *item)
                    {
                        local.id = Some(id);
                        local.outfit_id = *outfit_id;
                    }
                }
                _ => {}
            }
        }
    }

    /// Deletes the whole collection. The server removes its outfits and
    /// items. Consumes the session.
    pub async fn delete_collection(self) -> Result<(), EditError> {
        let collection_id = self.collection_id();
        let _lock = self
            .locks
            .try_acquire(collection_id)
            .ok_or(EditError::SubmitInFlight(collection_id))?;

        self.api.delete_collection(collection_id).await?;
        tracing::info!("Deleted collection #{}", collection_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatorProfile, Profile};
    use crate::reconcile::WriteKind;
    use crate::session::make_token;
    use crate::testing::MemoryApi;

    fn owner_session() -> Session {
        Session::from_token(make_token("3", None))
            .unwrap()
            .with_profile(Profile::Creator(CreatorProfile {
                id: 9,
                user_id: 3,
                display_name: "Ana Styles".to_string(),
                bio: String::new(),
                subscription_price: None,
            }))
    }

    fn seeded_api() -> MemoryApi {
        MemoryApi::with_collection(
            Collection::new(1, 9, "A").with_outfits(vec![
                Outfit::new("X", "u1").with_id(10).with_items(vec![
                    OutfitItem::new("i1", "S1", "l1").with_id(100).with_outfit_id(10),
                    OutfitItem::new("i2", "S2", "l2").with_id(101).with_outfit_id(10),
                ]),
                Outfit::new("Y", "u2").with_id(11),
            ]),
        )
    }

    async fn open(api: &MemoryApi, locks: &SubmitLocks) -> EditSession<MemoryApi> {
        EditSession::open(api.clone(), locks.clone(), &owner_session(), 1)
            .await
            .unwrap()
    }

    #[test]
    fn test_submit_locks_release_on_drop() {
        let locks = SubmitLocks::new();
        let lock = locks.try_acquire(1).unwrap();
        assert!(locks.is_held(1));
        assert!(locks.try_acquire(1).is_none());
        assert!(locks.try_acquire(2).is_some());

        drop(lock);
        assert!(!locks.is_held(1));
        assert!(locks.try_acquire(1).is_some());
    }

    #[tokio::test]
    async fn test_open_rejects_non_owner() {
        let api = seeded_api();
        let fan = Session::from_token(make_token("4", None)).unwrap();

        let err = EditSession::open(api.clone(), SubmitLocks::new(), &fan, 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EditError::NotOwner {
                collection_id: 1,
                actor_id: 4
            }
        ));
        assert_eq!(api.calls(), vec!["GET /collections/1"]);
    }

    #[tokio::test]
    async fn test_fresh_session_is_clean() {
        let api = seeded_api();
        let session = open(&api, &SubmitLocks::new()).await;
        assert!(!session.is_dirty());
        assert_eq!(session.snapshot(), session.working_copy());
    }

    #[tokio::test]
    async fn test_remove_records_intents_and_submit_consumes_them() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        session.remove_item(0, 1).unwrap();
        let removed = session.remove_outfit(1).unwrap();
        assert_eq!(removed.id, Some(11));
        assert!(session.intents().outfits.contains(&11));
        assert!(session.intents().outfit_items.contains(&101));

        let report = session.submit().await.unwrap();

        assert_eq!(report.success_count(), 2);
        assert!(session.intents().is_empty());
        assert_eq!(session.snapshot().outfits.len(), 1);
        assert_eq!(session.snapshot().outfits[0].outfit_items.len(), 1);
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_removing_unsaved_outfit_records_nothing() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        let index = session.add_outfit(Outfit::new("Draft", "u"));
        session.remove_outfit(index).unwrap();

        assert!(session.intents().is_empty());
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_added_item_is_created_under_existing_outfit() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        let outfit_index = session.find_outfit(11).unwrap();
        session
            .add_item(outfit_index, OutfitItem::new("i3", "S3", "l3"))
            .unwrap();

        let plan = session.plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.count(WriteKind::Create), 1);

        let report = session.submit().await.unwrap();
        assert!(report.is_clean());

        let items = &session.snapshot().outfits[outfit_index].outfit_items;
        assert_eq!(items.len(), 1);
        assert!(items[0].id.is_some());
        assert_eq!(items[0].outfit_id, Some(11));
    }

    #[tokio::test]
    async fn test_submit_while_in_flight_is_rejected() {
        let api = seeded_api();
        let locks = SubmitLocks::new();
        let mut session = open(&api, &locks).await;
        session.set_title("B");

        let _other = locks.try_acquire(1).unwrap();
        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, EditError::SubmitInFlight(1)));
        assert_eq!(session.working_copy().title, "B");
        assert_eq!(api.collection(1).unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_working_copy() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;
        session.set_title("B");
        session
            .update_item(0, 0, |item| item.store_name = "S1b".to_string())
            .unwrap();
        api.fail_on("GET /collections/1");

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, EditError::Refresh(_)));
        assert_eq!(session.working_copy().title, "B");
        assert_eq!(session.snapshot().title, "A");
        assert_eq!(api.collection(1).unwrap().title, "B");
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_and_reloaded() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;
        session.set_title("B");
        session
            .update_item(0, 0, |item| item.store_name = "S1b".to_string())
            .unwrap();
        api.fail_on("PUT /outfit-items/100");

        let report = session.submit().await.unwrap();

        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            report.failures().next().unwrap().operation,
            Operation::UpsertOutfitItem { .. }
        ));
        // The reload reflects what the server actually stored.
        assert_eq!(session.snapshot().title, "B");
        assert_eq!(session.snapshot().outfits[0].outfit_items[0].store_name, "S1");
    }

    #[tokio::test]
    async fn test_replace_working_copy_keeps_identity() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        let mut edited = session.working_copy().clone();
        edited.id = 99;
        edited.creator_id = 4;
        edited.description = "New words".to_string();
        session.replace_working_copy(edited);

        assert_eq!(session.working_copy().id, 1);
        assert_eq!(session.working_copy().creator_id, 9);
        assert_eq!(session.plan().len(), 1);

        session.discard_changes();
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_replace_working_copy_drops_removed_entities() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        let mut exported = session.working_copy().clone();
        exported.outfits[0].outfit_items[1].store_name = "S2b".to_string();

        session.remove_item(0, 1).unwrap();
        session.remove_outfit(1).unwrap();
        session.replace_working_copy(exported);

        assert_eq!(session.working_copy().outfits.len(), 1);
        assert_eq!(session.working_copy().outfits[0].outfit_items.len(), 1);

        assert_eq!(session.plan().len(), 2);
        assert!(session
            .plan()
            .iter()
            .all(|op| op.kind() == WriteKind::Delete));

        session.submit().await.unwrap();
        assert!(!api.calls().contains(&"PUT /outfit-items/101".to_string()));
        assert_eq!(api.collection(1).unwrap().outfits[0].outfit_items.len(), 1);
    }

    #[tokio::test]
    async fn test_resubmit_after_failed_reload_does_not_duplicate_creates() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        session.add_item(0, OutfitItem::new("i3", "S3", "l3")).unwrap();
        let index = session.add_outfit(Outfit::new("New", "u9"));
        session
            .add_item(index, OutfitItem::new("i4", "S4", "l4"))
            .unwrap();
        api.fail_on("GET /collections/1");

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, EditError::Refresh(_)));
        assert!(session.working_copy().outfits[index].id.is_some());
        assert!(session.working_copy().outfits[0].outfit_items[2].id.is_some());

        api.clear_failures();
        let report = session.submit().await.unwrap();
        assert!(report.is_clean());

        let stored = api.collection(1).unwrap();
        let named_new: Vec<&Outfit> = stored
            .outfits
            .iter()
            .filter(|o| o.description == "New")
            .collect();
        assert_eq!(named_new.len(), 1);
        assert_eq!(named_new[0].outfit_items.len(), 1);
        assert_eq!(stored.outfits[0].outfit_items.len(), 3);

        let creates = api
            .calls()
            .iter()
            .filter(|c| c.starts_with("POST /collections/1/outfits"))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(session.snapshot(), &stored);
    }

    #[tokio::test]
    async fn test_find_item_and_index_errors() {
        let api = seeded_api();
        let mut session = open(&api, &SubmitLocks::new()).await;

        assert_eq!(session.find_item(101), Some((0, 1)));
        assert_eq!(session.find_item(999), None);
        assert!(matches!(
            session.remove_outfit(5),
            Err(EditError::NoSuchOutfit(5))
        ));
        assert!(matches!(
            session.remove_item(0, 7),
            Err(EditError::NoSuchItem(0, 7))
        ));
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let api = seeded_api();
        let locks = SubmitLocks::new();

        let session = open(&api, &locks).await;
        let guard = locks.try_acquire(1).unwrap();
        assert!(matches!(
            session.delete_collection().await,
            Err(EditError::SubmitInFlight(1))
        ));
        drop(guard);

        let session = open(&api, &locks).await;
        session.delete_collection().await.unwrap();
        assert!(api.collection(1).is_none());
        assert!(!locks.is_held(1));
    }
}
