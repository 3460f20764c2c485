use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AdminCaller;
use crate::state::{require, AppState, Failure, PoliceRecord, UserRecord};

#[derive(Deserialize)]
pub struct Search {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub account_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub id_number: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dl_number: Option<String>,
    pub dl_expire_date: Option<String>,
    pub password: Option<String>,
}

fn listing<T: Serialize>(items: &[T]) -> Json<Value> {
    Json(json!({ "success": true, "count": items.len(), "data": items }))
}

fn contains_query(query: &str, fields: &[&str]) -> bool {
    let query = query.trim().to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&query))
}

fn check_account_type(account_type: &str) -> Result<(), Failure> {
    match account_type {
        "officer" | "admin" => Ok(()),
        other => Err(Failure::bad_request(format!("Invalid account type: {other}"))),
    }
}

// -- police accounts ---------------------------------------------------------

pub async fn list_police(State(state): State<AppState>, _admin: AdminCaller) -> Json<Value> {
    listing(&state.db.read().await.police)
}

pub async fn search_police(State(state): State<AppState>, _admin: AdminCaller, Query(search): Query<Search>) -> Json<Value> {
    let db = state.db.read().await;
    let found: Vec<&PoliceRecord> = db
        .police
        .iter()
        .filter(|p| contains_query(&search.q, &[p.id.as_str(), p.name.as_str()]))
        .collect();
    listing(&found)
}

pub async fn get_police(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let db = state.db.read().await;
    let account = db
        .police
        .iter()
        .find(|p| p.record_id == id)
        .ok_or_else(|| Failure::not_found("Police account not found"))?;
    Ok(Json(json!({ "success": true, "data": account })))
}

pub async fn create_police(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Json(input): Json<PoliceInput>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    require(&[
        ("id", input.id.as_deref()),
        ("name", input.name.as_deref()),
        ("password", input.password.as_deref()),
        ("accountType", input.account_type.as_deref()),
    ])?;
    let account = PoliceRecord {
        record_id: Uuid::new_v4().to_string(),
        id: input.id.unwrap_or_default(),
        name: input.name.unwrap_or_default(),
        password: input.password.unwrap_or_default(),
        account_type: input.account_type.unwrap_or_default(),
    };
    check_account_type(&account.account_type)?;
    let mut db = state.db.write().await;
    if db.police.iter().any(|p| p.id == account.id) {
        return Err(Failure::bad_request("Account already exists"));
    }
    let body = json!({ "success": true, "data": account });
    db.police.push(account);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn update_police(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
    Json(input): Json<PoliceInput>,
) -> Result<Json<Value>, Failure> {
    if let Some(account_type) = input.account_type.as_deref() {
        check_account_type(account_type)?;
    }
    let mut db = state.db.write().await;
    let account = db
        .police
        .iter_mut()
        .find(|p| p.record_id == id)
        .ok_or_else(|| Failure::not_found("Police account not found"))?;
    if let Some(name) = input.name {
        account.name = name;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    if let Some(account_type) = input.account_type {
        account.account_type = account_type;
    }
    Ok(Json(json!({ "success": true, "data": account })))
}

pub async fn delete_police(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let before = db.police.len();
    db.police.retain(|p| p.record_id != id);
    if db.police.len() == before {
        return Err(Failure::not_found("Police account not found"));
    }
    Ok(Json(json!({ "success": true, "message": "Police account deleted" })))
}

// -- citizen users -----------------------------------------------------------

pub async fn list_users(State(state): State<AppState>, _admin: AdminCaller) -> Json<Value> {
    listing(&state.db.read().await.users)
}

pub async fn search_users(State(state): State<AppState>, _admin: AdminCaller, Query(search): Query<Search>) -> Json<Value> {
    let db = state.db.read().await;
    let found: Vec<&UserRecord> = db
        .users
        .iter()
        .filter(|u| contains_query(&search.q, &[u.id_number.as_str(), u.name.as_str(), u.dl_number.as_str()]))
        .collect();
    listing(&found)
}

pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let db = state.db.read().await;
    let user = db
        .users
        .iter()
        .find(|u| u.record_id == id)
        .ok_or_else(|| Failure::not_found("User not found"))?;
    Ok(Json(json!({ "success": true, "data": user })))
}

pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Json(input): Json<UserInput>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    require(&[
        ("idNumber", input.id_number.as_deref()),
        ("name", input.name.as_deref()),
        ("dlNumber", input.dl_number.as_deref()),
        ("dlExpireDate", input.dl_expire_date.as_deref()),
    ])?;
    let user = UserRecord {
        record_id: Uuid::new_v4().to_string(),
        id_number: input.id_number.unwrap_or_default(),
        name: input.name.unwrap_or_default(),
        email: input.email,
        phone: input.phone,
        dl_number: input.dl_number.unwrap_or_default(),
        dl_expire_date: input.dl_expire_date.unwrap_or_default(),
        password: input.password,
    };
    let mut db = state.db.write().await;
    if db.users.iter().any(|u| u.id_number == user.id_number) {
        return Err(Failure::bad_request("User already exists"));
    }
    let body = json!({ "success": true, "data": user });
    db.users.push(user);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let user = db
        .users
        .iter_mut()
        .find(|u| u.record_id == id)
        .ok_or_else(|| Failure::not_found("User not found"))?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if input.email.is_some() {
        user.email = input.email;
    }
    if input.phone.is_some() {
        user.phone = input.phone;
    }
    if let Some(dl_number) = input.dl_number {
        user.dl_number = dl_number;
    }
    if let Some(dl_expire_date) = input.dl_expire_date {
        user.dl_expire_date = dl_expire_date;
    }
    if input.password.is_some() {
        user.password = input.password;
    }
    Ok(Json(json!({ "success": true, "data": user })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let before = db.users.len();
    db.users.retain(|u| u.record_id != id);
    if db.users.len() == before {
        return Err(Failure::not_found("User not found"));
    }
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
