use crate::domain::{
    models::{StorageId, TaskId, UserId, AVATAR_FIELD},
    AvatarLinkError,
};

use super::store::LinkTransaction;

/// Resolves the pending storage task, links its object to the user's storage
/// collection, consumes the task, and records the avatar field assignment.
///
/// Runs entirely on the caller's transaction; the caller decides whether the
/// batch commits or rolls back. Fails before staging any mutation:
///
/// - [`AvatarLinkError::TaskNotFound`] when no task row exists,
/// - [`AvatarLinkError::ProfileFieldMissing`] when the system has no
///   "avatar" profile field,
/// - [`AvatarLinkError::StorageMissing`] when the task exists but its
///   storage object is gone (the task is left in place so the upload can be
///   retried).
pub async fn link_avatar(
    tx: &mut dyn LinkTransaction,
    user: UserId,
    task_id: &TaskId,
) -> Result<StorageId, AvatarLinkError> {
    let task = tx
        .find_task(task_id)
        .await?
        .ok_or_else(|| AvatarLinkError::TaskNotFound(task_id.clone()))?;

    let field = tx
        .find_profile_field(AVATAR_FIELD)
        .await?
        .ok_or(AvatarLinkError::ProfileFieldMissing)?;

    let storage = task
        .storage
        .ok_or_else(|| AvatarLinkError::StorageMissing(task.id.clone()))?;

    tx.attach_storage(user, storage).await?;
    tx.delete_task(&task.id).await?;

    tx.write_profile_field(user, field, &storage.to_string())
        .await?;

    Ok(storage)
}
