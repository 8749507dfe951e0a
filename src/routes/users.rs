use std::collections::BTreeMap;

use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{avatar_link::store::LinkTransaction, models::UserId},
    middleware::TxSlot,
    routes::{ApiError, MessageResponse, ProfileResponse},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(my_profile).patch(update_profile))
}

async fn my_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.users.profile_data(user.id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name.clone(),
        profile,
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    /// Profile field values keyed by field name.
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    slot: Option<Extension<TxSlot>>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<MessageResponse, ApiError> {
    match slot {
        // An avatar link is in flight: these writes join its transaction
        // and commit or roll back with it.
        Some(Extension(slot)) => {
            let mut guard = slot.lock().await;
            let tx = guard
                .as_mut()
                .ok_or_else(|| ApiError::internal("transaction handle unavailable"))?;
            write_fields(tx.as_mut(), user.id, &body.fields).await?;
        }
        None => {
            if !body.fields.is_empty() {
                let mut tx = state.link_store.begin().await.map_err(ApiError::from)?;
                match write_fields(tx.as_mut(), user.id, &body.fields).await {
                    Ok(()) => tx.commit().await.map_err(ApiError::from)?,
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback().await {
                            tracing::error!("failed to roll back profile update: {}", rollback_err);
                        }
                        return Err(err);
                    }
                }
            }
        }
    }

    Ok(MessageResponse::ok("profile updated"))
}

async fn write_fields(
    tx: &mut dyn LinkTransaction,
    user: UserId,
    fields: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
    for (name, value) in fields {
        let field = tx
            .find_profile_field(name)
            .await?
            .ok_or_else(|| ApiError::bad_request(format!("unknown profile field: {name}")))?;
        tx.write_profile_field(user, field, value).await?;
    }

    Ok(())
}
