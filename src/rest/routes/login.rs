//! POST /api/login — exchange credentials for a session token.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::auth;
use crate::rest::{reject, store_error, ApiError};
use crate::AppContext;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    scout_name: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.scout_name.is_empty() || body.password.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "scoutName and password are required",
        ));
    }

    let user = auth::find_user(
        &ctx.admins(),
        &ctx.scorers(),
        &body.scout_name,
        &body.password,
    )
    .await
    .map_err(|e| store_error(e, "User not found"))?
    .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = auth::issue_token(&ctx.config.auth.jwt_secret, &user).map_err(|e| {
        error!(err = %e, "token issuance failed");
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    info!(scout_name = %user.scout_name, user_type = user.user_type.as_str(), "login");
    Ok(Json(json!({ "token": token, "user": user })))
}
