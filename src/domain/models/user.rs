use super::UserId;

/// The acting principal, as resolved by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}
