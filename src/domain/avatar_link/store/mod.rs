//! Link store implementations.

#[cfg(test)]
mod mock;
mod postgres;

#[cfg(test)]
pub use mock::MockStore;
pub use postgres::PgLinkStore;

use async_trait::async_trait;

use crate::domain::{
    models::{ProfileFieldId, StorageId, StorageTask, TaskId, UserId},
    AvatarLinkError,
};

/// Entry point to the persistence layer for avatar linking.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Opens a transaction. The returned handle must be resolved with
    /// exactly one of [`LinkTransaction::commit`] or
    /// [`LinkTransaction::rollback`]; dropping it unresolved aborts the
    /// transaction at the backend.
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AvatarLinkError>;
}

/// A scoped transaction handle over the avatar-link mutations.
///
/// All reads and writes issued through one handle belong to a single atomic
/// batch. `find_task` takes a row-level lock on the task so that concurrent
/// requests for the same task serialize from lookup to delete.
#[async_trait]
pub trait LinkTransaction: Send {
    /// Looks up a pending task together with its storage reference.
    /// Succeeds with `storage: None` when the task row exists but its
    /// object is gone.
    async fn find_task(&mut self, id: &TaskId) -> Result<Option<StorageTask>, AvatarLinkError>;

    /// Resolves a system profile field by name. When more than one row
    /// matches, the lowest id wins and a configuration warning is logged.
    async fn find_profile_field(
        &mut self,
        field_name: &str,
    ) -> Result<Option<ProfileFieldId>, AvatarLinkError>;

    /// Adds the storage object to the user's collection. Additive union:
    /// existing associations stay, duplicates are not re-inserted.
    async fn attach_storage(
        &mut self,
        user: UserId,
        storage: StorageId,
    ) -> Result<(), AvatarLinkError>;

    /// Consumes a pending task.
    async fn delete_task(&mut self, id: &TaskId) -> Result<(), AvatarLinkError>;

    /// Merges `{field: value}` into the user's profile data, leaving
    /// unrelated fields untouched.
    async fn write_profile_field(
        &mut self,
        user: UserId,
        field: ProfileFieldId,
        value: &str,
    ) -> Result<(), AvatarLinkError>;

    async fn commit(self: Box<Self>) -> Result<(), AvatarLinkError>;

    async fn rollback(self: Box<Self>) -> Result<(), AvatarLinkError>;
}
