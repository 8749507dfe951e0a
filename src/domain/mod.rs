pub mod avatar_link;
mod error;
pub mod models;

pub use error::AvatarLinkError;
