use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::{require, AppState, Caller, Failure, PoliceRecord, UserRecord};

/// Mobile login body.
#[derive(Deserialize)]
pub struct Login {
    pub id: Option<String>,
    pub password: Option<String>,
}

/// Web login body, used by the admin console and the citizen portal.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLogin {
    pub id_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub id: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub account_type: Option<String>,
}

/// Admin console registration. Contact fields are accepted and ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegister {
    pub id_number: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenRegister {
    pub name: Option<String>,
    pub id_number: Option<String>,
    pub phone: Option<String>,
    pub dl_number: Option<String>,
    pub dl_expire_date: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "No token provided"))?;
        state
            .db
            .read()
            .await
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}

/// Guard for routes that need the `admin` account type.
pub struct AdminCaller;

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if caller.account_type != "admin" {
            return Err(Failure::new(StatusCode::FORBIDDEN, "Admin access required"));
        }
        Ok(AdminCaller)
    }
}

fn auth_body(token: String, caller: &Caller) -> Json<Value> {
    Json(json!({
        "success": true,
        "token": token,
        "accountType": caller.account_type,
        "id": caller.id,
        "name": caller.name,
    }))
}

fn invalid_credentials() -> Failure {
    Failure::new(StatusCode::UNAUTHORIZED, "Invalid credentials")
}

// -- police and admin portals ----------------------------------------------

/// `id_key` names the identifier field in error messages.
async fn police_login(state: &AppState, id_key: &str, input: Login, admin_only: bool) -> Result<Json<Value>, Failure> {
    require(&[(id_key, input.id.as_deref()), ("password", input.password.as_deref())])?;
    let mut db = state.db.write().await;
    let caller = db
        .police
        .iter()
        .find(|p| Some(p.id.as_str()) == input.id.as_deref() && Some(p.password.as_str()) == input.password.as_deref())
        .map(|p| Caller {
            id: p.id.clone(),
            name: p.name.clone(),
            account_type: p.account_type.clone(),
        })
        .ok_or_else(invalid_credentials)?;
    if admin_only && caller.account_type != "admin" {
        return Err(Failure::new(StatusCode::FORBIDDEN, "Admin access required"));
    }
    let token = db.issue_token(caller.clone());
    tracing::info!(id = %caller.id, "police login");
    Ok(auth_body(token, &caller))
}

async fn police_register(
    state: &AppState,
    id_key: &str,
    input: Register,
    forced_type: Option<&str>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    require(&[
        (id_key, input.id.as_deref()),
        ("name", input.name.as_deref()),
        ("password", input.password.as_deref()),
    ])?;
    let account_type = forced_type
        .map(str::to_string)
        .or(input.account_type)
        .unwrap_or_else(|| "officer".to_string());
    if account_type != "officer" && account_type != "admin" {
        return Err(Failure::bad_request(format!("Invalid account type: {account_type}")));
    }
    let record = PoliceRecord {
        record_id: Uuid::new_v4().to_string(),
        id: input.id.unwrap_or_default(),
        name: input.name.unwrap_or_default(),
        password: input.password.unwrap_or_default(),
        account_type,
    };
    let mut db = state.db.write().await;
    if db.police.iter().any(|p| p.id == record.id) {
        return Err(Failure::bad_request("Account already exists"));
    }
    let caller = Caller {
        id: record.id.clone(),
        name: record.name.clone(),
        account_type: record.account_type.clone(),
    };
    db.police.push(record);
    let token = db.issue_token(caller.clone());
    Ok((StatusCode::CREATED, auth_body(token, &caller)))
}

pub async fn police_login_handler(State(state): State<AppState>, Json(input): Json<Login>) -> Result<Json<Value>, Failure> {
    police_login(&state, "id", input, false).await
}

pub async fn police_register_handler(
    State(state): State<AppState>,
    Json(input): Json<Register>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    police_register(&state, "id", input, None).await
}

pub async fn admin_login_handler(State(state): State<AppState>, Json(input): Json<WebLogin>) -> Result<Json<Value>, Failure> {
    let login = Login {
        id: input.id_number,
        password: input.password,
    };
    police_login(&state, "idNumber", login, true).await
}

pub async fn admin_register_handler(
    State(state): State<AppState>,
    Json(input): Json<AdminRegister>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let register = Register {
        id: input.id_number,
        name: input.name,
        password: input.password,
        account_type: None,
    };
    police_register(&state, "idNumber", register, Some("admin")).await
}

// -- citizen portal ----------------------------------------------------------

pub async fn citizen_login_handler(
    State(state): State<AppState>,
    Json(input): Json<WebLogin>,
) -> Result<Json<Value>, Failure> {
    require(&[("idNumber", input.id_number.as_deref()), ("password", input.password.as_deref())])?;
    let mut db = state.db.write().await;
    let caller = db
        .users
        .iter()
        .find(|u| {
            Some(u.id_number.as_str()) == input.id_number.as_deref() && u.password.as_deref() == input.password.as_deref()
        })
        .map(|u| Caller {
            id: u.id_number.clone(),
            name: u.name.clone(),
            account_type: "user".to_string(),
        })
        .ok_or_else(invalid_credentials)?;
    let token = db.issue_token(caller.clone());
    Ok(auth_body(token, &caller))
}

pub async fn citizen_register_handler(
    State(state): State<AppState>,
    Json(input): Json<CitizenRegister>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    require(&[
        ("name", input.name.as_deref()),
        ("idNumber", input.id_number.as_deref()),
        ("phone", input.phone.as_deref()),
        ("dlNumber", input.dl_number.as_deref()),
        ("dlExpireDate", input.dl_expire_date.as_deref()),
        ("email", input.email.as_deref()),
        ("password", input.password.as_deref()),
    ])?;
    let record = UserRecord {
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
    if db.users.iter().any(|u| u.id_number == record.id_number) {
        return Err(Failure::bad_request("Account already exists"));
    }
    if db.user_by_license(&record.dl_number).is_some() {
        return Err(Failure::bad_request("License number already registered"));
    }
    let caller = Caller {
        id: record.id_number.clone(),
        name: record.name.clone(),
        account_type: "user".to_string(),
    };
    db.users.push(record);
    let token = db.issue_token(caller.clone());
    Ok((StatusCode::CREATED, auth_body(token, &caller)))
}

/// Profile of the token's owner, on any portal.
pub async fn me(caller: Caller) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": caller.id,
            "name": caller.name,
            "accountType": caller.account_type,
        }
    }))
}
