//! In-memory stand-in for the traffic-violation backend.
//!
//! Serves the police, admin and citizen REST surfaces under `/api` with
//! bearer-token auth. Any route can be told to fail with a given status a
//! number of times (`AppState::inject_fault`, or `POST /__mock/faults`),
//! which is how retry and fallback paths are driven over real HTTP.

mod admin;
mod auth;
mod fines;
mod state;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

pub use axum::http::StatusCode;
pub use state::{AppState, Caller, FineRecord, PoliceRecord, UserRecord};

#[derive(Deserialize)]
struct FaultSpec {
    route: String,
    status: u16,
    #[serde(default = "one")]
    times: u32,
}

fn one() -> u32 {
    1
}

/// Router over seeded state.
pub fn app() -> Router {
    app_with_state(AppState::seeded())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        // police portal
        .route("/api/police/auth/register", post(auth::police_register_handler))
        .route("/api/police/auth/login", post(auth::police_login_handler))
        .route("/api/police/auth/me", get(auth::me))
        .route("/api/police/fines/test/find-license/{dl_number}", get(fines::find_license))
        .route("/api/police/fines/public-search/{dl_number}", get(fines::public_search))
        .route("/api/police/fines/test/create-fine", post(fines::create_fine))
        .route("/api/police/public-issue", post(fines::public_issue))
        .route("/api/police/fines/officer-activity", get(fines::officer_activity))
        .route("/api/police/fines/test/all-users", get(fines::all_users))
        .route("/api/police/fines/debug/auth-status", get(fines::auth_status))
        .route("/api/police/fines/user/{id}", get(fines::user_fines))
        .route("/api/police/fines/{id}", get(fines::fine_details))
        .route("/api/police/fines/{id}/status", put(fines::update_fine_status))
        // admin console
        .route("/api/admin/auth/register", post(auth::admin_register_handler))
        .route("/api/admin/auth/login", post(auth::admin_login_handler))
        .route("/api/admin/auth/me", get(auth::me))
        .route("/api/admin/police", get(admin::list_police).post(admin::create_police))
        .route("/api/admin/police/search", get(admin::search_police))
        .route(
            "/api/admin/police/{id}",
            get(admin::get_police).put(admin::update_police).delete(admin::delete_police),
        )
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/api/admin/users/search", get(admin::search_users))
        .route(
            "/api/admin/users/{id}",
            get(admin::get_user).put(admin::update_user).delete(admin::delete_user),
        )
        // citizen portal
        .route("/api/auth/register", post(auth::citizen_register_handler))
        .route("/api/auth/login", post(auth::citizen_login_handler))
        .route("/api/auth/me", get(auth::me))
        .route("/api/fines", get(fines::my_fines))
        .route("/api/fines/outstanding", get(fines::outstanding_fines))
        .route("/api/fines/public/search-fines/{dl_number}", get(fines::public_fine_search))
        .route("/api/fines/{id}", get(fines::citizen_fine))
        .route("/api/fines/{id}/status", put(fines::dispute_fine))
        .route_layer(middleware::from_fn_with_state(state.clone(), inject_faults))
        .route("/__mock/faults", post(set_fault))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn inject_faults(State(state): State<AppState>, matched: MatchedPath, request: Request, next: Next) -> Response {
    if let Some(status) = state.take_fault(matched.as_str()).await {
        tracing::info!(route = matched.as_str(), %status, "injected fault");
        let body = json!({ "success": false, "message": format!("Injected fault ({status})") });
        return (status, Json(body)).into_response();
    }
    next.run(request).await
}

async fn set_fault(State(state): State<AppState>, Json(spec): Json<FaultSpec>) -> Response {
    match StatusCode::from_u16(spec.status) {
        Ok(status) => {
            state.inject_fault(&spec.route, status, spec.times).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": format!("Invalid status {}", spec.status) })),
        )
            .into_response(),
    }
}
