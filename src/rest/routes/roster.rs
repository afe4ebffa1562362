//! CRUD routes shared by the admin and scorer lists.
//!
//! The two lists have identical wire behavior, so one handler set serves
//! both; the roster marker attached to each route picks the backing list.
//! Every response body is the full updated list, and password hashes are
//! never serialized.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, MethodRouter},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::codec::Record;
use crate::records::{RecordFields, RecordStore};
use crate::rest::{reject, store_error, ApiError};
use crate::AppContext;

#[derive(Debug, Clone, Copy)]
pub enum Roster {
    Admins,
    Scorers,
}

impl Roster {
    fn store(self, ctx: &AppContext) -> RecordStore {
        match self {
            Roster::Admins => ctx.admins(),
            Roster::Scorers => ctx.scorers(),
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            Roster::Admins => "Admin not found",
            Roster::Scorers => "Scorer not found",
        }
    }
}

pub fn method_router() -> MethodRouter<Arc<AppContext>> {
    get(list).post(add).put(update).delete(remove)
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn list(
    State(ctx): State<Arc<AppContext>>,
    Extension(roster): Extension<Roster>,
) -> Result<Json<Value>, ApiError> {
    let records = roster
        .store(&ctx)
        .list()
        .await
        .map_err(|e| store_error(e, roster.not_found()))?;
    Ok(list_json(&records))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    /// Present on updates. Accepted as a number or a numeric string.
    id: Option<Value>,
    #[serde(default)]
    scout_name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    scout_group: String,
}

impl UpsertRequest {
    fn fields(&self) -> RecordFields {
        RecordFields {
            scout_name: self.scout_name.clone(),
            real_name: self.real_name.clone(),
            scout_group: self.scout_group.clone(),
        }
    }
}

async fn add(
    State(ctx): State<Arc<AppContext>>,
    Extension(roster): Extension<Roster>,
    Json(body): Json<UpsertRequest>,
) -> Result<Json<Value>, ApiError> {
    let records = roster
        .store(&ctx)
        .add(body.fields())
        .await
        .map_err(|e| store_error(e, roster.not_found()))?;
    Ok(list_json(&records))
}

async fn update(
    State(ctx): State<Arc<AppContext>>,
    Extension(roster): Extension<Roster>,
    Json(body): Json<UpsertRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = body
        .id
        .as_ref()
        .and_then(coerce_id)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Valid id is required"))?;
    let records = roster
        .store(&ctx)
        .update(id, body.fields())
        .await
        .map_err(|e| store_error(e, roster.not_found()))?;
    Ok(list_json(&records))
}

#[derive(Deserialize)]
pub struct RemoveParams {
    id: Option<String>,
}

async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Extension(roster): Extension<Roster>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<Value>, ApiError> {
    let id = params
        .id
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&v| v >= 0)
        .map(|v| v as usize)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Valid id query is required"))?;
    let records = roster
        .store(&ctx)
        .remove(id)
        .await
        .map_err(|e| store_error(e, roster.not_found()))?;
    Ok(list_json(&records))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Transient id as a number or numeric string, rejecting negatives.
fn coerce_id(raw: &Value) -> Option<usize> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .filter(|&v| v >= 0)
    .map(|v| v as usize)
}

fn record_json(record: &Record) -> Value {
    json!({
        "id": record.id,
        "scoutName": record.scout_name,
        "realName": record.real_name,
        "scoutGroup": record.scout_group,
    })
}

fn list_json(records: &[Record]) -> Json<Value> {
    Json(Value::Array(records.iter().map(record_json).collect()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_id(&json!(3)), Some(3));
        assert_eq!(coerce_id(&json!("3")), Some(3));
        assert_eq!(coerce_id(&json!(" 3 ")), Some(3));
    }

    #[test]
    fn coerce_id_rejects_negatives_and_garbage() {
        assert_eq!(coerce_id(&json!(-1)), None);
        assert_eq!(coerce_id(&json!("-1")), None);
        assert_eq!(coerce_id(&json!("abc")), None);
        assert_eq!(coerce_id(&json!(null)), None);
        assert_eq!(coerce_id(&json!(1.5)), None);
    }

    #[test]
    fn record_json_never_carries_the_hash() {
        let record = Record {
            id: 0,
            scout_name: "Chip".to_string(),
            real_name: "James Robinson".to_string(),
            scout_group: "1st Blackheath".to_string(),
            password_hash: "$2a$10$secret".to_string(),
        };
        let value = record_json(&record);
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["scoutName"], "Chip");
    }
}
