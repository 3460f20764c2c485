use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::{blank_fields, AppState, Caller, Failure, FineRecord, FINE_STATUSES};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFine {
    pub id_number: Option<String>,
    pub dl_number: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub location: Option<String>,
    pub officer_id: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub timeframe: Option<String>,
}

pub async fn find_license(State(state): State<AppState>, Path(dl_number): Path<String>) -> Result<Json<Value>, Failure> {
    let db = state.db.read().await;
    let user = db
        .user_by_license(dl_number.trim())
        .ok_or_else(|| Failure::not_found(format!("No user found with license number {dl_number}")))?;
    Ok(Json(json!({ "success": true, "data": user })))
}

pub async fn public_search(State(state): State<AppState>, Path(dl_number): Path<String>) -> Result<Json<Value>, Failure> {
    find_license(State(state), Path(dl_number)).await
}

/// Every fine recorded against a licence, without auth.
pub async fn public_fine_search(
    State(state): State<AppState>,
    Path(dl_number): Path<String>,
) -> Result<Json<Value>, Failure> {
    let dl_number = dl_number.trim();
    let db = state.db.read().await;
    if db.user_by_license(dl_number).is_none() {
        return Err(Failure::not_found(format!("No user found with license number {dl_number}")));
    }
    let fines: Vec<&FineRecord> = db.fines.iter().filter(|f| f.dl_number.eq_ignore_ascii_case(dl_number)).collect();
    Ok(Json(json!({ "success": true, "count": fines.len(), "data": fines })))
}

async fn create(state: &AppState, input: NewFine, officer: Option<&Caller>) -> Result<(StatusCode, Json<Value>), Failure> {
    let mut missing = blank_fields(&[
        ("idNumber", input.id_number.as_deref()),
        ("dlNumber", input.dl_number.as_deref()),
        ("description", input.description.as_deref()),
    ]);
    if !input.amount.is_some_and(|a| a.is_finite() && a > 0.0) {
        missing.push("amount");
    }
    if input.location.as_deref().map_or(true, |l| l.trim().is_empty()) {
        missing.push("location");
    }
    if !missing.is_empty() {
        return Err(Failure::bad_request(format!("Missing required fields: {}", missing.join(", "))));
    }
    let fine = FineRecord {
        record_id: Uuid::new_v4().to_string(),
        id_number: input.id_number.unwrap_or_default(),
        dl_number: input.dl_number.unwrap_or_default(),
        description: input.description.unwrap_or_default(),
        amount: input.amount.unwrap_or_default(),
        location: input.location.unwrap_or_default(),
        officer_id: officer.map(|c| c.id.clone()).or(input.officer_id),
        status: "Pending".to_string(),
        issued_at: Utc::now(),
    };
    tracing::info!(fine = %fine.record_id, dl_number = %fine.dl_number, "fine issued");
    let body = json!({ "success": true, "data": fine });
    state.db.write().await.fines.push(fine);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn create_fine(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<NewFine>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    create(&state, input, Some(&caller)).await
}

/// Unauthenticated issue path; trusts the body's `officerId`.
pub async fn public_issue(
    State(state): State<AppState>,
    Json(input): Json<NewFine>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    create(&state, input, None).await
}

pub async fn officer_activity(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Value>, Failure> {
    let timeframe = query.timeframe.unwrap_or_else(|| "daily".to_string());
    let window = match timeframe.as_str() {
        "daily" => Duration::days(1),
        "weekly" => Duration::days(7),
        "monthly" => Duration::days(30),
        other => return Err(Failure::bad_request(format!("Invalid timeframe: {other}"))),
    };
    let db = state.db.read().await;
    if db.mock_activity {
        return Ok(Json(json!({
            "success": true,
            "timeframe": timeframe,
            "summary": { "totalFines": 12, "totalAmount": 1450, "uniqueLicenses": 9 },
            "isMockData": true,
        })));
    }
    let since = Utc::now() - window;
    let fines: Vec<&FineRecord> = db
        .fines
        .iter()
        .filter(|f| f.officer_id.as_deref() == Some(caller.id.as_str()) && f.issued_at >= since)
        .collect();
    let mut licenses: Vec<&str> = fines.iter().map(|f| f.dl_number.as_str()).collect();
    licenses.sort_unstable();
    licenses.dedup();
    Ok(Json(json!({
        "success": true,
        "timeframe": timeframe,
        "summary": {
            "totalFines": fines.len(),
            "totalAmount": fines.iter().map(|f| f.amount).sum::<f64>(),
            "uniqueLicenses": licenses.len(),
        },
        "isMockData": false,
    })))
}

pub async fn all_users(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.read().await;
    Json(json!({ "success": true, "count": db.users.len(), "data": db.users }))
}

/// Reports how the server sees the request's token; never rejects.
pub async fn auth_status(caller: Result<Caller, Failure>) -> Json<Value> {
    match caller {
        Ok(caller) => Json(json!({
            "success": true,
            "authenticated": true,
            "user": { "id": caller.id, "name": caller.name, "accountType": caller.account_type },
        })),
        Err(failure) => Json(json!({
            "success": true,
            "authenticated": false,
            "message": failure.message,
        })),
    }
}

pub async fn user_fines(State(state): State<AppState>, _caller: Caller, Path(id): Path<String>) -> Json<Value> {
    let db = state.db.read().await;
    let fines: Vec<&FineRecord> = db.fines.iter().filter(|f| f.id_number == id).collect();
    Json(json!({ "success": true, "count": fines.len(), "data": fines }))
}

pub async fn fine_details(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let db = state.db.read().await;
    let fine = db
        .fines
        .iter()
        .find(|f| f.record_id == id)
        .ok_or_else(|| Failure::not_found("Fine not found"))?;
    Ok(Json(json!({ "success": true, "data": fine })))
}

fn set_status(fine: &mut FineRecord, status: &str) -> Result<(), Failure> {
    if !FINE_STATUSES.contains(&status) {
        return Err(Failure::bad_request(format!("Invalid status: {status}")));
    }
    fine.status = status.to_string();
    Ok(())
}

pub async fn update_fine_status(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let fine = db
        .fines
        .iter_mut()
        .find(|f| f.record_id == id)
        .ok_or_else(|| Failure::not_found("Fine not found"))?;
    set_status(fine, &change.status)?;
    Ok(Json(json!({ "success": true, "data": fine })))
}

// -- citizen portal ----------------------------------------------------------

pub async fn my_fines(State(state): State<AppState>, caller: Caller) -> Json<Value> {
    user_fines(State(state), caller.clone(), Path(caller.id)).await
}

pub async fn outstanding_fines(State(state): State<AppState>, caller: Caller) -> Json<Value> {
    let db = state.db.read().await;
    let fines: Vec<&FineRecord> = db
        .fines
        .iter()
        .filter(|f| f.id_number == caller.id && f.status == "Pending")
        .collect();
    Json(json!({ "success": true, "count": fines.len(), "data": fines }))
}

pub async fn citizen_fine(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let db = state.db.read().await;
    let fine = db
        .fines
        .iter()
        .find(|f| f.record_id == id && f.id_number == caller.id)
        .ok_or_else(|| Failure::not_found("Fine not found"))?;
    Ok(Json(json!({ "success": true, "data": fine })))
}

/// Citizens may only move their own fines to `Disputed`.
pub async fn dispute_fine(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Value>, Failure> {
    if change.status != "Disputed" {
        return Err(Failure::new(StatusCode::FORBIDDEN, "Citizens may only dispute fines"));
    }
    let mut db = state.db.write().await;
    let fine = db
        .fines
        .iter_mut()
        .find(|f| f.record_id == id && f.id_number == caller.id)
        .ok_or_else(|| Failure::not_found("Fine not found"))?;
    set_status(fine, &change.status)?;
    Ok(Json(json!({ "success": true, "data": fine })))
}
