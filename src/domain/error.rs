use thiserror::Error;

use crate::domain::models::TaskId;

/// Errors that can occur while linking an uploaded storage object to a user.
#[derive(Debug, Error)]
pub enum AvatarLinkError {
    #[error("storage task {0} not found")]
    TaskNotFound(TaskId),
    #[error("no \"avatar\" profile field is configured")]
    ProfileFieldMissing,
    #[error("storage task {0} has no storage object attached")]
    StorageMissing(TaskId),
    #[error("store error: {0}")]
    Store(String),
}

impl AvatarLinkError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}
