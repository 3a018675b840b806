// Define data modules
mod models; // Data structures (Segment, EditableState, TimelineNode, etc.)
mod store; // Persistent storage (load/save data/state.json)
mod logic; // Core timeline derivation, validation and countdown math
mod countdown; // Shared session + recurring countdown poll worker
mod export; // Plain-text export of a generated timeline
mod routes_state; // HTTP handlers for the editable configuration
mod routes_timeline; // HTTP handlers for generation, countdown and export

use std::sync::Arc;

// Import axum routing utilities and Router
use axum::{
    routing::{get, post, put}, // HTTP method helpers
    Router,                    // Main router type
};
use std::net::SocketAddr;
use tower_http::services::ServeDir; // Used to serve static files (HTML/CSS/JS)

use crate::countdown::Session;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let session = Arc::new(Session::new());

    let api = Router::new()
        // editable state
        .route("/state", get(routes_state::get_state).put(routes_state::put_state))
        .route("/state/reset", post(routes_state::reset_state))
        // timeline
        .route("/timeline/generate", post(routes_timeline::generate))
        .route("/timeline", get(routes_timeline::get_timeline))
        .route("/timeline/start-at", put(routes_timeline::put_start_at))
        .route("/timeline/export", get(routes_timeline::export_txt))
        // countdown
        .route("/countdown", get(routes_timeline::get_countdown))
        .route("/countdown/start", post(routes_timeline::start_countdown))
        .route("/countdown/stop", post(routes_timeline::stop_countdown))
        .with_state(session);

    let app = Router::new()
        .nest("/api", api)
        .nest_service("/", ServeDir::new("static"));

    let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();

    // Print the link to the server
    println!("  Server running at http://{}", addr);
    println!("  Static files: http://{}/", addr);
    println!("  API base:     http://{}/api", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind failed");

    axum::serve(listener, app).await.expect("server error");
}
