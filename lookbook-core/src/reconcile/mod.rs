//! Collection reconciliation.
//!
//! Turns an edited working copy of a collection into the remote mutations
//! needed to persist it, and applies them.
//!
//! ## Protocol
//!
//! 1. Delete every outfit and outfit item recorded in [`DeleteIntents`]
//! 2. Update the collection when its [`CollectionProjection`] changed
//! 3. Create or update outfits that differ from the snapshot at the same
//!    position
//! 4. Create or update outfit items the same way, per outfit
//!
//! [`apply`] issues the whole set concurrently with best-effort semantics.
//! The caller re-fetches afterwards; the local copy is never trusted as the
//! post-submit state.

mod apply;
mod diff;
mod operation;

pub use apply::{apply, ApplyReport, OperationOutcome};
pub use diff::reconcile;
pub use operation::{CollectionProjection, DeleteIntents, Operation, OperationSet, WriteKind};
