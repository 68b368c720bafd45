use super::error::ApiError;
use super::ServerState;
use crate::config::AuthConfig;
use crate::remote::{IconList, IconValue};
use axum::{extract::State, http::HeaderMap, Json};
use tracing::info;

pub(super) async fn health() -> &'static str {
    "OK"
}

pub(super) async fn auth_config(State(state): State<ServerState>) -> Json<AuthConfig> {
    Json(state.auth_config.as_ref().clone())
}

pub(super) async fn get_list(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<IconList>, ApiError> {
    let user_id = state.tokens.authenticate(&headers)?;
    let icon_list = state.lists.read(&user_id)?;
    Ok(Json(IconList { icon_list }))
}

pub(super) async fn append_item(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<IconValue>,
) -> Result<Json<IconList>, ApiError> {
    let user_id = state.tokens.authenticate(&headers)?;
    let icon_list = state.lists.append(&user_id, &body.icon_value)?;
    info!("Saved {:?} for {}", body.icon_value, user_id);
    Ok(Json(IconList { icon_list }))
}

pub(super) async fn remove_item(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<IconValue>,
) -> Result<Json<IconList>, ApiError> {
    let user_id = state.tokens.authenticate(&headers)?;
    let icon_list = state.lists.remove(&user_id, &body.icon_value)?;
    info!("Removed {:?} for {}", body.icon_value, user_id);
    Ok(Json(IconList { icon_list }))
}

pub(super) async fn replace_list(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<IconList>,
) -> Result<Json<IconList>, ApiError> {
    let user_id = state.tokens.authenticate(&headers)?;
    let icon_list = state.lists.replace(&user_id, body.icon_list)?;
    info!("Replaced list for {} ({} items)", user_id, icon_list.len());
    Ok(Json(IconList { icon_list }))
}
