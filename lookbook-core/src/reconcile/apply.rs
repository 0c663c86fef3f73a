//! Best-effort concurrent application of an [`OperationSet`].

use futures::future::join_all;

use super::operation::{Operation, OperationSet};
use crate::api::{ApiError, CollectionApi};

/// Outcome of one dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub result: Result<(), ApiError>,
    /// Id the server assigned, for successful creates only.
    pub created_id: Option<i64>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-operation results of one batch, in the order of the operation set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    outcomes: Vec<OperationOutcome>,
}

impl ApplyReport {
    pub fn outcomes(&self) -> &[OperationOutcome] {
        &self.outcomes
    }

    pub fn successes(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every operation succeeded (vacuously true for no operations).
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Dispatches every operation concurrently and waits for all of them.
///
/// A failure never cancels or rolls back a sibling. No operation waits for
/// another, so items of a freshly created outfit fail with
/// [`ApiError::MissingParent`] and are picked up on the next submit after
/// the refresh assigns the outfit its id.
pub async fn apply<A: CollectionApi>(api: &A, operations: OperationSet) -> ApplyReport {
    let pending = operations.into_iter().map(|operation| async move {
        let (result, created_id) = match dispatch(api, &operation).await {
            Ok(created_id) => {
                tracing::debug!("{}: ok", operation);
                (Ok(()), created_id)
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", operation, e);
                (Err(e), None)
            }
        };
        OperationOutcome {
            operation,
            result,
            created_id,
        }
    });

    let outcomes = join_all(pending).await;
    let report = ApplyReport { outcomes };

    if !report.is_empty() {
        tracing::info!(
            "Applied {} operation(s): {} succeeded, {} failed",
            report.outcomes.len(),
            report.success_count(),
            report.failure_count()
        );
    }

    report
}

/// Runs one operation. Creates return the new id.
async fn dispatch<A: CollectionApi>(
    api: &A,
    operation: &Operation,
) -> Result<Option<i64>, ApiError> {
    match operation {
        Operation::DeleteOutfit(id) => api.delete_outfit(*id).await.map(|_| None),
        Operation::DeleteOutfitItem(id) => api.delete_outfit_item(*id).await.map(|_| None),
        Operation::UpdateCollection {
            collection_id,
            projection,
        } => api
            .update_collection(*collection_id, projection)
            .await
            .map(|_| None),
        Operation::UpsertOutfit {
            collection_id,
            outfit,
        } => {
            if outfit.is_persisted() {
                api.update_outfit(outfit).await.map(|_| None)
            } else {
                let created = api.create_outfit(*collection_id, outfit).await?;
                tracing::debug!("Created outfit {:?}", created.id);
                Ok(created.id)
            }
        }
        Operation::UpsertOutfitItem { outfit_id, item } => {
            if item.is_persisted() {
                api.update_outfit_item(item).await.map(|_| None)
            } else {
                let outfit_id = outfit_id.ok_or(ApiError::MissingParent)?;
                let created = api.create_outfit_item(outfit_id, item).await?;
                tracing::debug!("Created outfit item {:?}", created.id);
                Ok(created.id)
            }
        }
    }
}
