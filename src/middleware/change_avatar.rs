//! Avatar-change middleware: when a request carries a `storage_task_id`,
//! links the uploaded storage object to the user inside a transaction that
//! also spans the downstream handler, then commits or rolls back based on
//! the downstream outcome.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{
        avatar_link::{service, store::LinkTransaction},
        models::TaskId,
        AvatarLinkError,
    },
    routes::{ApiError, MessageResponse, MessageStatus},
};

/// The open avatar-link transaction, shared with the downstream handler via
/// request extensions so its writes join the same atomic batch.
///
/// The middleware keeps ownership of the handle: handlers borrow it through
/// [`TxSlot::lock`] and must leave it in place; commit and rollback happen
/// here once the downstream outcome is known.
#[derive(Clone)]
pub struct TxSlot {
    inner: Arc<Mutex<Option<Box<dyn LinkTransaction>>>>,
}

impl TxSlot {
    fn new(tx: Box<dyn LinkTransaction>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Option<Box<dyn LinkTransaction>>> {
        self.inner.lock().await
    }

    async fn take(&self) -> Option<Box<dyn LinkTransaction>> {
        self.inner.lock().await.take()
    }
}

/// How the downstream response reports its outcome. Responses that do not
/// carry the message envelope are opaque: they cannot confirm success, so
/// the mutation batch is not committed on their behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownstreamOutcome {
    Success,
    Failure,
    Opaque,
}

impl DownstreamOutcome {
    fn of(response: &Response) -> Self {
        match response.extensions().get::<MessageStatus>() {
            Some(MessageStatus(true)) => Self::Success,
            Some(MessageStatus(false)) => Self::Failure,
            None => Self::Opaque,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvatarLinkParams {
    storage_task_id: Option<String>,
}

pub async fn change_user_avatar(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // No task id: plain pass-through, no transaction.
    let Some(task_id) = task_id_from(req.uri()) else {
        return next.run(req).await;
    };

    let Some(user) = req.extensions().get::<AuthUser>().map(|user| user.id) else {
        return ApiError::unauthorized("Not authenticated").into_response();
    };

    // The transaction opens before the lookup so the task row stays locked
    // from lookup to delete.
    let mut tx = match state.link_store.begin().await {
        Ok(tx) => tx,
        Err(err) => return error_response(&err),
    };

    if let Err(err) = service::link_avatar(tx.as_mut(), user, &task_id).await {
        rollback(tx).await;
        return error_response(&err);
    }

    let slot = TxSlot::new(tx);
    req.extensions_mut().insert(slot.clone());

    let response = next.run(req).await;

    let Some(tx) = slot.take().await else {
        tracing::error!(%task_id, "avatar-link transaction handle was consumed downstream");
        return ApiError::internal("avatar link transaction lost").into_response();
    };

    match DownstreamOutcome::of(&response) {
        DownstreamOutcome::Success => {
            if let Err(err) = tx.commit().await {
                tracing::error!(%task_id, "failed to commit avatar link: {}", err);
                return ApiError::internal("store operation failed").into_response();
            }
            tracing::info!(%task_id, %user, "avatar link committed");
            response
        }
        outcome => {
            tracing::debug!(%task_id, ?outcome, "rolling back avatar link");
            rollback(tx).await;
            response
        }
    }
}

fn task_id_from(uri: &Uri) -> Option<TaskId> {
    let Ok(Query(params)) = Query::<AvatarLinkParams>::try_from_uri(uri) else {
        return None;
    };

    params
        .storage_task_id
        .filter(|id| !id.is_empty())
        .map(TaskId::from)
}

async fn rollback(tx: Box<dyn LinkTransaction>) {
    if let Err(err) = tx.rollback().await {
        tracing::error!("failed to roll back avatar link: {}", err);
    }
}

fn error_response(err: &AvatarLinkError) -> Response {
    let message = err.to_string();
    match err {
        AvatarLinkError::TaskNotFound(_) => (
            StatusCode::NOT_FOUND,
            MessageResponse::error(MessageResponse::CODE_TASK_NOT_FOUND, message),
        )
            .into_response(),
        AvatarLinkError::ProfileFieldMissing => (
            StatusCode::INTERNAL_SERVER_ERROR,
            MessageResponse::error(MessageResponse::CODE_SYSTEM_MISCONFIGURED, message),
        )
            .into_response(),
        AvatarLinkError::StorageMissing(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            MessageResponse::error(MessageResponse::CODE_STORAGE_MISSING, message),
        )
            .into_response(),
        AvatarLinkError::Store(inner) => {
            tracing::error!("Link store error: {}", inner);
            ApiError::internal("store operation failed").into_response()
        }
    }
}
