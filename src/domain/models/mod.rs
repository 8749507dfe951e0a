mod ids;
mod storage;
mod user;

pub use ids::*;
pub use storage::*;
pub use user::*;
