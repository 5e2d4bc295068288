//! Sync orchestrator.
//!
//! Applies a snapshot diff to the store: deletes first, then one bulk insert,
//! then updates. Each step is awaited in sequence and the first failure aborts
//! the run; steps already applied stay applied.

use refdata_types::{
    Entity, EntityWriter, NaturalKey, Persisted, RecordId, Snapshot, SyncError, SyncPhase,
    SyncSummary, diff,
};

/// Knobs for a reconciliation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Refuse to delete every stored record when the source comes back empty.
    pub guard_full_wipe: bool,
}

/// Reconciles the store with the source snapshot of one entity type.
#[tracing::instrument(skip_all, fields(entity = T::NAME))]
pub async fn reconcile<T, W>(
    source: Snapshot<T>,
    store: Snapshot<Persisted<T>>,
    writer: &W,
    options: ReconcileOptions,
) -> Result<SyncSummary, SyncError>
where
    T: Entity,
    W: EntityWriter<T> + ?Sized,
{
    if options.guard_full_wipe && source.is_empty() && !store.is_empty() {
        return Err(SyncError::ImplausibleWipe {
            entity: T::NAME,
            stored: store.len(),
        });
    }

    let result = diff(&source, &store, |s: &T, p: &Persisted<T>| {
        s.same_values(&p.fields)
    });
    let mut summary = SyncSummary {
        entity: T::NAME.to_string(),
        unchanged: result.unchanged as u64,
        ..SyncSummary::default()
    };

    // ─── deletes ───
    let mut to_delete = result.to_delete;
    to_delete.sort_by_key(|record| record.id);
    for record in &to_delete {
        writer
            .delete(record.id)
            .await
            .map_err(|source| SyncError::Persistence {
                entity: T::NAME,
                phase: SyncPhase::Delete,
                target: format!("ID {} ({})", record.id, record.natural_key()),
                source,
            })?;
        tracing::debug!(id = %record.id, key = %record.natural_key(), "deleted");
    }
    if !to_delete.is_empty() {
        summary.deleted = to_delete.len() as u64;
        tracing::info!(deleted = summary.deleted, "deleted {}", T::NAME);
    }

    // ─── inserts ───
    if !result.to_insert.is_empty() {
        summary.inserted = writer.bulk_insert(&result.to_insert).await.map_err(|source| {
            SyncError::Persistence {
                entity: T::NAME,
                phase: SyncPhase::Insert,
                target: format!("{} new records", result.to_insert.len()),
                source,
            }
        })?;
        tracing::info!(inserted = summary.inserted, "inserted {}", T::NAME);
    }

    // ─── updates ───
    let mut to_update: Vec<(RecordId, T)> = result.to_update.into_iter().collect();
    to_update.sort_by_key(|(id, _)| *id);
    for (id, record) in &to_update {
        writer
            .update(*id, record)
            .await
            .map_err(|source| SyncError::Persistence {
                entity: T::NAME,
                phase: SyncPhase::Update,
                target: format!("ID {} ({})", id, record.natural_key()),
                source,
            })?;
        tracing::debug!(id = %id, key = %record.natural_key(), "updated");
    }
    if !to_update.is_empty() {
        summary.updated = to_update.len() as u64;
        tracing::info!(updated = summary.updated, "updated {}", T::NAME);
    }

    tracing::info!(
        deleted = summary.deleted,
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        "sync of {} finished",
        T::NAME
    );
    Ok(summary)
}
