// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use uuid::Uuid;

use lifecycle_types::{Disk, DiskDraft, DiskState};

use crate::LifecycleError;

/// Persistence surface over disk records.
///
/// The datastore is the single source of truth for disk state: the
/// controller re-reads the current record through this trait immediately
/// before validating a precondition, and writes resulting state back through
/// it. Assigning `id` and `created_at` is the datastore's job.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Insert a new record in the given initial state.
    ///
    /// Fails with [`LifecycleError::Conflict`] when a live record with the
    /// same `name` exists.
    async fn create(&self, draft: DiskDraft, state: DiskState) -> Result<Disk, LifecycleError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Disk>, LifecycleError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Disk>, LifecycleError>;

    /// Overwrite the stored record matching `disk.id` with `disk`.
    ///
    /// Fails with [`LifecycleError::NotFound`] when no such record exists.
    async fn update(&self, disk: &Disk) -> Result<(), LifecycleError>;

    /// Delete the record with the given id.
    ///
    /// Fails with [`LifecycleError::NotFound`] when no such record exists.
    async fn delete(&self, id: Uuid) -> Result<(), LifecycleError>;

    async fn list_all(&self) -> Result<Vec<Disk>, LifecycleError>;
}
