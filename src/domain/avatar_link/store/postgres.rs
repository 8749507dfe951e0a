use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::{
    models::{ProfileFieldId, StorageId, StorageTask, TaskId, UserId},
    AvatarLinkError,
};

use super::{LinkStore, LinkTransaction};

pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkStore for PgLinkStore {
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AvatarLinkError> {
        let tx = self.pool.begin().await.map_err(AvatarLinkError::store)?;

        Ok(Box::new(PgLinkTransaction { tx }))
    }
}

pub struct PgLinkTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LinkTransaction for PgLinkTransaction {
    async fn find_task(&mut self, id: &TaskId) -> Result<Option<StorageTask>, AvatarLinkError> {
        // The task id arrives unvalidated, so it is matched as text; garbage
        // input finds no row instead of failing to parse. FOR UPDATE holds
        // the row lock until commit or rollback.
        let row = sqlx::query(
            r#"
            SELECT storage_tasks.id AS task_id, storages.id AS storage_id
            FROM storage_tasks
            LEFT JOIN storages ON storages.id = storage_tasks.storage_id
            WHERE storage_tasks.id::text = $1
            FOR UPDATE OF storage_tasks
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AvatarLinkError::store)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let task_id: i32 = row.try_get("task_id").map_err(AvatarLinkError::store)?;
        let storage_id: Option<i32> = row.try_get("storage_id").map_err(AvatarLinkError::store)?;

        Ok(Some(StorageTask {
            id: TaskId::new(task_id.to_string()),
            storage: storage_id.map(StorageId::from),
        }))
    }

    async fn find_profile_field(
        &mut self,
        field_name: &str,
    ) -> Result<Option<ProfileFieldId>, AvatarLinkError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM user_profile_settings
            WHERE field_name = $1
            ORDER BY id
            "#,
        )
        .bind(field_name)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(AvatarLinkError::store)?;

        if ids.len() > 1 {
            tracing::warn!(
                field_name,
                count = ids.len(),
                "multiple profile settings share one field name, using the lowest id"
            );
        }

        Ok(ids.first().copied().map(ProfileFieldId::from))
    }

    async fn attach_storage(
        &mut self,
        user: UserId,
        storage: StorageId,
    ) -> Result<(), AvatarLinkError> {
        sqlx::query(
            r#"
            INSERT INTO user_has_storages (user_id, storage_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.as_i32())
        .bind(storage.as_i32())
        .execute(&mut *self.tx)
        .await
        .map_err(AvatarLinkError::store)?;

        Ok(())
    }

    async fn delete_task(&mut self, id: &TaskId) -> Result<(), AvatarLinkError> {
        sqlx::query(
            r#"
            DELETE FROM storage_tasks
            WHERE id::text = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(AvatarLinkError::store)?;

        Ok(())
    }

    async fn write_profile_field(
        &mut self,
        user: UserId,
        field: ProfileFieldId,
        value: &str,
    ) -> Result<(), AvatarLinkError> {
        sqlx::query(
            r#"
            INSERT INTO user_profile_data (user_id, field_id, field_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, field_id) DO UPDATE
            SET field_value = EXCLUDED.field_value
            "#,
        )
        .bind(user.as_i32())
        .bind(field.as_i32())
        .bind(value)
        .execute(&mut *self.tx)
        .await
        .map_err(AvatarLinkError::store)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AvatarLinkError> {
        self.tx.commit().await.map_err(AvatarLinkError::store)
    }

    async fn rollback(self: Box<Self>) -> Result<(), AvatarLinkError> {
        self.tx.rollback().await.map_err(AvatarLinkError::store)
    }
}
