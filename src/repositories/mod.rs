mod repo_error;
mod user_repo;

pub use repo_error::RepositoryError;
pub use user_repo::{PgUserRepository, UserRepository};
