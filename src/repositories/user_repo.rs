use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::models::{User, UserId};

use super::repo_error::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    /// The user's profile data as a field-name to value map.
    async fn profile_data(&self, id: UserId) -> Result<BTreeMap<String, String>, RepositoryError>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_access_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name
            FROM users
            WHERE access_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(User {
                id: UserId::new(row.try_get("id")?),
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn profile_data(&self, id: UserId) -> Result<BTreeMap<String, String>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT user_profile_settings.field_name, user_profile_data.field_value
            FROM user_profile_data
            JOIN user_profile_settings ON user_profile_settings.id = user_profile_data.field_id
            WHERE user_profile_data.user_id = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.try_get("field_name")?, row.try_get("field_value")?)))
            .collect()
    }
}
