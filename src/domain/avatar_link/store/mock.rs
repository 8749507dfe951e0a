//! Mock link store for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::{
    models::{ProfileFieldId, StorageId, StorageTask, TaskId, User, UserId},
    AvatarLinkError,
};
use crate::repositories::{RepositoryError, UserRepository};

use super::{LinkStore, LinkTransaction};

#[derive(Clone, Default)]
struct MockDb {
    /// Task id -> storage id (None models a task whose object is gone).
    tasks: HashMap<String, Option<i32>>,
    /// Field id -> field name, ordered so the lowest id wins on duplicates.
    profile_settings: BTreeMap<i32, String>,
    user_storages: HashMap<i32, BTreeSet<i32>>,
    profile_data: HashMap<i32, BTreeMap<i32, String>>,
    /// Access token -> user.
    users: HashMap<String, User>,
}

/// Mock store backed by in-memory state with staged-transaction semantics:
/// a transaction works on a copy of the committed state, which replaces it
/// on commit and is discarded on rollback.
///
/// Also serves as the [`UserRepository`] so tests observe auth lookups and
/// link mutations against one shared state.
#[derive(Clone, Default)]
pub struct MockStore {
    committed: Arc<RwLock<MockDb>>,
    begun: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(self, id: &str, storage: Option<i32>) -> Self {
        self.committed
            .write()
            .unwrap()
            .tasks
            .insert(id.to_string(), storage);
        self
    }

    pub fn with_profile_setting(self, id: i32, field_name: &str) -> Self {
        self.committed
            .write()
            .unwrap()
            .profile_settings
            .insert(id, field_name.to_string());
        self
    }

    pub fn with_user_storage(self, user: i32, storage: i32) -> Self {
        self.committed
            .write()
            .unwrap()
            .user_storages
            .entry(user)
            .or_default()
            .insert(storage);
        self
    }

    pub fn with_profile_value(self, user: i32, field: i32, value: &str) -> Self {
        self.committed
            .write()
            .unwrap()
            .profile_data
            .entry(user)
            .or_default()
            .insert(field, value.to_string());
        self
    }

    pub fn with_user(self, token: &str, id: i32, name: &str) -> Self {
        self.committed.write().unwrap().users.insert(
            token.to_string(),
            User {
                id: UserId::new(id),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn task_exists(&self, id: &str) -> bool {
        self.committed.read().unwrap().tasks.contains_key(id)
    }

    pub fn user_storages(&self, user: i32) -> BTreeSet<i32> {
        self.committed
            .read()
            .unwrap()
            .user_storages
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn profile_value(&self, user: i32, field: i32) -> Option<String> {
        self.committed
            .read()
            .unwrap()
            .profile_data
            .get(&user)
            .and_then(|fields| fields.get(&field))
            .cloned()
    }

    pub fn transactions_begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn transactions_committed(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn transactions_rolled_back(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkStore for MockStore {
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AvatarLinkError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        let staged = self.committed.read().unwrap().clone();

        Ok(Box::new(MockTransaction {
            staged,
            committed: Arc::clone(&self.committed),
            commits: Arc::clone(&self.commits),
            rollbacks: Arc::clone(&self.rollbacks),
        }))
    }
}

#[async_trait]
impl UserRepository for MockStore {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.committed.read().unwrap().users.get(token).cloned())
    }

    async fn profile_data(&self, id: UserId) -> Result<BTreeMap<String, String>, RepositoryError> {
        let db = self.committed.read().unwrap();
        let fields = db.profile_data.get(&id.as_i32()).cloned().unwrap_or_default();

        Ok(fields
            .into_iter()
            .filter_map(|(field_id, value)| {
                db.profile_settings
                    .get(&field_id)
                    .map(|name| (name.clone(), value))
            })
            .collect())
    }
}

struct MockTransaction {
    staged: MockDb,
    committed: Arc<RwLock<MockDb>>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

#[async_trait]
impl LinkTransaction for MockTransaction {
    async fn find_task(&mut self, id: &TaskId) -> Result<Option<StorageTask>, AvatarLinkError> {
        Ok(self.staged.tasks.get(id.as_str()).map(|storage| StorageTask {
            id: id.clone(),
            storage: storage.map(StorageId::from),
        }))
    }

    async fn find_profile_field(
        &mut self,
        field_name: &str,
    ) -> Result<Option<ProfileFieldId>, AvatarLinkError> {
        Ok(self
            .staged
            .profile_settings
            .iter()
            .find(|(_, name)| name.as_str() == field_name)
            .map(|(id, _)| ProfileFieldId::new(*id)))
    }

    async fn attach_storage(
        &mut self,
        user: UserId,
        storage: StorageId,
    ) -> Result<(), AvatarLinkError> {
        self.staged
            .user_storages
            .entry(user.as_i32())
            .or_default()
            .insert(storage.as_i32());
        Ok(())
    }

    async fn delete_task(&mut self, id: &TaskId) -> Result<(), AvatarLinkError> {
        self.staged.tasks.remove(id.as_str());
        Ok(())
    }

    async fn write_profile_field(
        &mut self,
        user: UserId,
        field: ProfileFieldId,
        value: &str,
    ) -> Result<(), AvatarLinkError> {
        self.staged
            .profile_data
            .entry(user.as_i32())
            .or_default()
            .insert(field.as_i32(), value.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AvatarLinkError> {
        *self.committed.write().unwrap() = self.staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AvatarLinkError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_applies_staged_changes() {
        let store = MockStore::new().with_task("42", Some(7));

        let mut tx = store.begin().await.unwrap();
        tx.attach_storage(UserId::new(1), StorageId::new(7))
            .await
            .unwrap();
        tx.delete_task(&TaskId::from("42")).await.unwrap();
        tx.commit().await.unwrap();

        assert!(!store.task_exists("42"));
        assert_eq!(store.user_storages(1), BTreeSet::from([7]));
        assert_eq!(store.transactions_committed(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_changes() {
        let store = MockStore::new().with_task("42", Some(7));

        let mut tx = store.begin().await.unwrap();
        tx.attach_storage(UserId::new(1), StorageId::new(7))
            .await
            .unwrap();
        tx.delete_task(&TaskId::from("42")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.task_exists("42"));
        assert!(store.user_storages(1).is_empty());
        assert_eq!(store.transactions_rolled_back(), 1);
    }

    #[tokio::test]
    async fn attach_storage_is_additive_union() {
        let store = MockStore::new()
            .with_user_storage(1, 1)
            .with_user_storage(1, 2);

        let mut tx = store.begin().await.unwrap();
        tx.attach_storage(UserId::new(1), StorageId::new(2))
            .await
            .unwrap();
        tx.attach_storage(UserId::new(1), StorageId::new(9))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.user_storages(1), BTreeSet::from([1, 2, 9]));
    }
}
