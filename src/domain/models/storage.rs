use super::{StorageId, TaskId};

/// Name of the system profile field that holds a user's avatar.
pub const AVATAR_FIELD: &str = "avatar";

/// A provisional record for an uploaded-but-unlinked storage object.
///
/// Created by the upload flow, consumed exactly once when the object is
/// linked to a user. A task whose storage reference is gone is still a valid
/// row; the missing object is surfaced by the link step, not by lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTask {
    pub id: TaskId,
    pub storage: Option<StorageId>,
}
