use axum::{http::header, http::Method, middleware::from_fn_with_state, routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    auth,
    config::Settings,
    middleware::change_user_avatar,
    routes,
};

pub fn create(connection_pool: PgPool, config: &Settings) -> Router<()> {
    let app_state = AppState::postgres(connection_pool);

    // Layer order matters: authentication runs first so the avatar-link
    // middleware sees the resolved principal.
    let users = routes::users::router()
        .layer(from_fn_with_state(app_state.clone(), change_user_avatar))
        .layer(from_fn_with_state(app_state.clone(), auth::authenticate));

    let app_url = config.application.app_url.clone();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().map(|o| o == app_url).unwrap_or(false)
        }));

    Router::new()
        .route("/", get(|| async { "plus-api" }))
        .nest("/users", users)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
