mod error;
mod responses;
pub mod users;

pub use error::ApiError;
pub use responses::{MessageResponse, MessageStatus, ProfileResponse};
