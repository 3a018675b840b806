// --------------------------------------------------
// Handles API endpoints for timeline generation, the countdown and the
// plain-text export.
//
// Responsibilities:
// - Validate-then-generate (never a partial timeline)
// - Serve the current generation and its countdown view
// - Move the start instant without regenerating
// - Start / stop the countdown poll
// --------------------------------------------------

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::countdown::{CountdownView, Session};
use crate::export;
use crate::logic;
use crate::models::{EditableState, GeneratedTimeline};
use crate::store;

// -----------------------------
// POST /api/timeline/generate
// Validates the submitted configuration and, on success, replaces the
// current generation wholesale and persists the state that produced it.
// A validation problem aborts with 422 and the first message.
// -----------------------------
pub async fn generate(
    State(session): State<Arc<Session>>,
    Json(state): Json<EditableState>,
) -> impl IntoResponse {
    let validation = logic::validate(&state.segments, state.total_minutes);
    if let Some(problem) = validation.problems.first() {
        return (StatusCode::UNPROCESSABLE_ENTITY, problem.clone()).into_response();
    }

    let start_at_ms = logic::parse_start_at_ms(&state.start_at);
    let timeline = GeneratedTimeline {
        id: Uuid::new_v4(),
        nodes: logic::build_timeline(&state.segments, start_at_ms),
        start_at_ms,
        total_minutes: logic::clamp_minutes(state.total_minutes),
        generated_at: logic::now_fixed_offset(),
    };

    session.replace_timeline(Some(timeline.clone()));
    store::save_state(&state);

    log::info!(
        "generated timeline {} ({} nodes, start {:?})",
        timeline.id,
        timeline.nodes.len(),
        timeline.start_at_ms
    );
    Json(timeline).into_response()
}

// -----------------------------
// GET /api/timeline
// The current generation, if any.
// -----------------------------
pub async fn get_timeline(State(session): State<Arc<Session>>) -> impl IntoResponse {
    match session.timeline() {
        Some(timeline) => Json(timeline).into_response(),
        None => (StatusCode::NOT_FOUND, "no timeline generated").into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAtInput {
    pub start_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAtResponse {
    pub start_at_ms: Option<i64>,
    pub updated_timeline: bool,
}

// -----------------------------
// PUT /api/timeline/start-at
// Moves the start instant of the current generation in place (nodes are
// immutable; only the instant changes) and mirrors the new value to disk.
// Unparseable input means "start instant unknown", not an error.
// -----------------------------
pub async fn put_start_at(
    State(session): State<Arc<Session>>,
    Json(input): Json<StartAtInput>,
) -> impl IntoResponse {
    let start_at_ms = logic::parse_start_at_ms(&input.start_at);
    let updated_timeline = session.set_start_at(start_at_ms);

    if let Some(mut state) = store::load_state() {
        state.start_at = input.start_at;
        store::save_state(&state);
    }

    Json(StartAtResponse {
        start_at_ms,
        updated_timeline,
    })
}

// -----------------------------
// GET /api/timeline/export
// The plain-text artifact as a download.
// -----------------------------
pub async fn export_txt(State(session): State<Arc<Session>>) -> impl IntoResponse {
    let Some(timeline) = session.timeline() else {
        return (StatusCode::NOT_FOUND, "no timeline generated").into_response();
    };

    let filename = format!("script_timeline_{}.txt", Local::now().format("%Y-%m-%d"));
    (
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        export::build_txt(&timeline),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct CountdownResponse {
    pub running: bool,
    pub view: CountdownView,
}

// -----------------------------
// POST /api/countdown/start
// Starts the recurring poll (cancelling any prior schedule). Requires a
// generated timeline with a known start instant.
// -----------------------------
pub async fn start_countdown(State(session): State<Arc<Session>>) -> impl IntoResponse {
    let Some(timeline) = session.timeline() else {
        return (StatusCode::NOT_FOUND, "no timeline generated").into_response();
    };
    if timeline.start_at_ms.is_none() {
        return (StatusCode::BAD_REQUEST, "start time not set").into_response();
    }

    session.start();
    Json(CountdownResponse {
        running: true,
        view: session.view(),
    })
    .into_response()
}

// -----------------------------
// POST /api/countdown/stop
// Cancels polling; the generated timeline and last view stay put.
// -----------------------------
pub async fn stop_countdown(State(session): State<Arc<Session>>) -> impl IntoResponse {
    session.stop();
    Json(CountdownResponse {
        running: false,
        view: session.view(),
    })
}

// -----------------------------
// GET /api/countdown
// The latest published view. The poller keeps it fresh while running;
// a stopped countdown stays frozen at its last tick.
// -----------------------------
pub async fn get_countdown(State(session): State<Arc<Session>>) -> impl IntoResponse {
    Json(CountdownResponse {
        running: session.is_running(),
        view: session.view(),
    })
}
