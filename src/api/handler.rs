//! Identity mutation handler
//!
//! The mutation flow:
//!
//! 1. The subject must be a valid account key, else 400.
//! 2. Fetch the account record; an unknown account starts from a fresh
//!    record rather than failing.
//! 3. Resolve the per-service key, minting and persisting a new one on
//!    first contact with a service.
//! 4. Echo the payload back with the issued key under `extra["userID"]`.
//!
//! Storage and encoding failures map to 500; the handler never interprets
//! the rest of the payload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::account::{AccountKey, AccountRecord};
use crate::http_server::AppState;

use super::request::MutatorPayload;

/// Key under which the issued service user ID is returned.
const USER_ID_EXTRA_KEY: &str = "userID";

/// The service a request is resolved against.
const SERVICE_NAME: &str = "user-service";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// `POST /`: resolves the caller's account key to a per-service user ID.
pub async fn mutate_identity(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<MutatorPayload>,
) -> Response {
    let account_key = match AccountKey::parse(&payload.subject) {
        Ok(key) => key,
        Err(err) => {
            state
                .logger
                .error("invalid_account_key", &[("error", &err.to_string())]);
            return (
                StatusCode::BAD_REQUEST,
                "subject must be a valid account key",
            )
                .into_response();
        }
    };

    let mut record = match state.store.fetch(&account_key) {
        Ok(record) => record,
        // The account key has not been seen before: issue keys on the fly.
        Err(err) if err.is_not_found() => AccountRecord::new(),
        Err(err) => {
            state.logger.error(
                "account_fetch_failed",
                &[("key", account_key.as_str()), ("error", &err.to_string())],
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let service = resolve_service_name(&state, &payload);
    let service_user_id = match record.service_keys.get(service) {
        Some(existing) => existing.clone(),
        None => {
            let minted = Uuid::new_v4().to_string();
            record
                .service_keys
                .insert(service.to_string(), minted.clone());
            if let Err(err) = state.store.put(&account_key, &record) {
                state.logger.error(
                    "account_store_failed",
                    &[("key", account_key.as_str()), ("error", &err.to_string())],
                );
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            minted
        }
    };

    payload
        .extra
        .insert(USER_ID_EXTRA_KEY.to_string(), Value::String(service_user_id));

    (StatusCode::OK, Json(payload)).into_response()
}

/// Names the downstream service a payload belongs to.
// TODO: derive the service from the matched gateway rule once the gateway
// forwards it; every request currently resolves to the same service.
fn resolve_service_name(state: &AppState, _payload: &MutatorPayload) -> &'static str {
    state
        .logger
        .warn("service_name_hardwired", &[("service", SERVICE_NAME)]);
    SERVICE_NAME
}
