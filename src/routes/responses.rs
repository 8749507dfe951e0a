//! HTTP response types shared across the profile endpoints.

use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::models::UserId;

/// Marker attached to [`MessageResponse`] responses so upstream middleware
/// can read the outcome without parsing the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStatus(pub bool);

/// The message envelope returned by mutation endpoints:
/// `{status, code, message}`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub status: bool,
    pub code: u32,
    pub message: String,
}

impl MessageResponse {
    /// Code for a storage task that does not exist.
    pub const CODE_TASK_NOT_FOUND: u32 = 2000;
    /// Code for a system misconfiguration (avatar profile field missing).
    pub const CODE_SYSTEM_MISCONFIGURED: u32 = 1017;
    /// Code for a task whose storage object is gone.
    pub const CODE_STORAGE_MISSING: u32 = 2004;

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            code: 0,
            message: message.into(),
        }
    }

    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self {
            status: false,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        let status = MessageStatus(self.status);
        let mut response = Json(self).into_response();
        response.extensions_mut().insert(status);
        response
    }
}

/// Response for the get-profile endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: UserId,
    pub name: String,
    pub profile: BTreeMap<String, String>,
}
