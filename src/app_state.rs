use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    domain::avatar_link::store::{LinkStore, PgLinkStore},
    repositories::{PgUserRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub link_store: Arc<dyn LinkStore>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(link_store: Arc<dyn LinkStore>, users: Arc<dyn UserRepository>) -> Self {
        Self { link_store, users }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgLinkStore::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
        )
    }
}
