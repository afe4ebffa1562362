//! GET /api/me — session token introspection.
//!
//! Lets the frontend recover the logged-in identity from a stored token
//! without touching the record files.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth;
use crate::rest::{reject, ApiError};
use crate::AppContext;

pub async fn me(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token = auth::bearer_token(&headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid or missing token"))?;

    let claims = auth::verify_token(&ctx.config.auth.jwt_secret, token)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid or missing token"))?;

    Ok(Json(json!({
        "scoutName": claims.scout_name,
        "realName": claims.real_name,
        "scoutGroup": claims.scout_group,
        "userType": claims.user_type,
    })))
}
