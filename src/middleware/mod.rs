mod change_avatar;

pub use change_avatar::{change_user_avatar, TxSlot};
