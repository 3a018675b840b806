// --------------------------------------------------
// Handles API endpoints for the editable configuration
// (start time, total minutes, segment list).
//
// Responsibilities:
// - Serve the persisted state, falling back to the built-in defaults
// - Mirror every edit to disk (best-effort) and revalidate
// - Reset everything back to the defaults
// --------------------------------------------------

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::countdown::Session;
use crate::logic::{self, Validation};
use crate::models::{default_state, EditableState};
use crate::store;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: EditableState,
    pub validation: Validation,
}

fn with_validation(state: EditableState) -> StateResponse {
    let validation = logic::validate(&state.segments, state.total_minutes);
    StateResponse { state, validation }
}

// -----------------------------
// GET /api/state
// Persisted state, or the built-in default script when nothing
// (or nothing readable) is stored.
// -----------------------------
pub async fn get_state() -> impl IntoResponse {
    let state = store::load_state().unwrap_or_else(default_state);
    Json(with_validation(state))
}

// -----------------------------
// PUT /api/state
// Mirrors an edit. Persistence is best-effort; the response always
// carries the fresh validation status.
// -----------------------------
pub async fn put_state(Json(state): Json<EditableState>) -> impl IntoResponse {
    store::save_state(&state);
    Json(with_validation(state))
}

// -----------------------------
// POST /api/state/reset
// Drops the stored file, clears the generated timeline and stops the
// countdown, then returns the defaults.
// -----------------------------
pub async fn reset_state(State(session): State<Arc<Session>>) -> impl IntoResponse {
    store::clear_state();
    session.stop();
    session.replace_timeline(None);
    log::info!("state reset to defaults");
    Json(with_validation(default_state()))
}
