//! First-run password setup.
//!
//! GET reports whether any record is still waiting for a password; POST sets
//! one, once. A record whose password is already set can only be changed out
//! of band — there is deliberately no reset endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::auth;
use crate::rest::{reject, store_error, ApiError};
use crate::AppContext;

/// GET /api/setup — `{"needsSetup": bool}` across both lists.
pub async fn needs_setup(State(ctx): State<Arc<AppContext>>) -> Result<Json<Value>, ApiError> {
    let admins = ctx
        .admins()
        .needs_setup()
        .await
        .map_err(|e| store_error(e, "User not found"))?;
    let scorers = ctx
        .scorers()
        .needs_setup()
        .await
        .map_err(|e| store_error(e, "User not found"))?;
    Ok(Json(json!({ "needsSetup": admins || scorers })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    scout_name: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    user_type: String,
}

/// POST /api/setup — set the password for one record.
pub async fn set_password(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<SetupRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.scout_name.is_empty() || body.password.is_empty() || body.user_type.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "scoutName, password, and userType are required",
        ));
    }

    let store = match body.user_type.as_str() {
        "admin" => ctx.admins(),
        "scorer" => ctx.scorers(),
        _ => {
            return Err(reject(
                StatusCode::BAD_REQUEST,
                "userType must be \"admin\" or \"scorer\"",
            ))
        }
    };

    let hash = auth::hash_password(body.password.trim()).map_err(|e| {
        error!(err = %e, "password hashing failed");
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    store
        .set_password(&body.scout_name, &hash)
        .await
        .map_err(|e| store_error(e, "User not found"))?;

    info!(scout_name = %body.scout_name, user_type = %body.user_type, "password set");
    Ok(Json(json!({
        "success": true,
        "message": "Password set successfully",
    })))
}
