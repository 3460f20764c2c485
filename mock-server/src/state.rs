use std::{collections::HashMap, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Officer or admin account, managed under `/admin/police`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceRecord {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub account_type: String,
}

/// Citizen account. Its `idNumber` doubles as the login id on the citizen
/// portal.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub dl_number: String,
    pub dl_expire_date: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineRecord {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id_number: String,
    pub dl_number: String,
    pub description: String,
    pub amount: f64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<String>,
    pub status: String,
    pub issued_at: DateTime<Utc>,
}

pub const FINE_STATUSES: [&str; 4] = ["Pending", "Paid", "Disputed", "Cancelled"];

/// Who a bearer token belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub name: String,
    pub account_type: String,
}

#[derive(Clone, Copy, Debug)]
struct Fault {
    status: StatusCode,
    remaining: u32,
}

#[derive(Debug, Default)]
pub struct Store {
    pub police: Vec<PoliceRecord>,
    pub users: Vec<UserRecord>,
    pub fines: Vec<FineRecord>,
    pub tokens: HashMap<String, Caller>,
    pub mock_activity: bool,
    faults: HashMap<String, Fault>,
}

impl Store {
    pub fn issue_token(&mut self, caller: Caller) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), caller);
        token
    }

    pub fn user_by_license(&self, dl_number: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.dl_number.eq_ignore_ascii_case(dl_number))
    }
}

/// Shared in-memory backend state.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub(crate) db: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One officer, one admin, one citizen with a pending fine.
    pub fn seeded() -> Self {
        let store = Store {
            police: vec![
                PoliceRecord {
                    record_id: "police-1".to_string(),
                    id: "OFF001".to_string(),
                    name: "John Smith".to_string(),
                    password: "password123".to_string(),
                    account_type: "officer".to_string(),
                },
                PoliceRecord {
                    record_id: "police-2".to_string(),
                    id: "ADM001".to_string(),
                    name: "Ann Admin".to_string(),
                    password: "admin123".to_string(),
                    account_type: "admin".to_string(),
                },
            ],
            users: vec![UserRecord {
                record_id: "user-1".to_string(),
                id_number: "ID123".to_string(),
                name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: None,
                dl_number: "B1234567".to_string(),
                dl_expire_date: "2030-05-01".to_string(),
                password: Some("citizen123".to_string()),
            }],
            fines: vec![FineRecord {
                record_id: "fine-1".to_string(),
                id_number: "ID123".to_string(),
                dl_number: "B1234567".to_string(),
                description: "Parking on a crossing".to_string(),
                amount: 80.0,
                location: "Harbour Rd".to_string(),
                officer_id: Some("OFF001".to_string()),
                status: "Pending".to_string(),
                issued_at: Utc::now(),
            }],
            ..Store::default()
        };
        Self {
            db: Arc::new(RwLock::new(store)),
        }
    }

    /// Answer the next `times` requests to `route` (the route template,
    /// e.g. `/api/police/public-issue`) with `status`.
    pub async fn inject_fault(&self, route: &str, status: StatusCode, times: u32) {
        let mut db = self.db.write().await;
        if times == 0 {
            db.faults.remove(route);
            return;
        }
        let fault = Fault {
            status,
            remaining: times,
        };
        db.faults.insert(route.to_string(), fault);
    }

    pub(crate) async fn take_fault(&self, route: &str) -> Option<StatusCode> {
        let mut db = self.db.write().await;
        let fault = db.faults.get_mut(route)?;
        fault.remaining = fault.remaining.saturating_sub(1);
        let status = fault.status;
        if fault.remaining == 0 {
            db.faults.remove(route);
        }
        Some(status)
    }

    /// Make officer activity answer with placeholder figures.
    pub async fn set_mock_activity(&self, enabled: bool) {
        self.db.write().await.mock_activity = enabled;
    }

    pub async fn fines(&self) -> Vec<FineRecord> {
        self.db.read().await.fines.clone()
    }
}

/// `{success: false, message}` with a status code.
#[derive(Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
}

impl Failure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Names of the blank entries among `fields`, in order.
pub fn blank_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

pub fn require(fields: &[(&str, Option<&str>)]) -> Result<(), Failure> {
    let missing = blank_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Failure::bad_request(format!("Missing required fields: {}", missing.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fault_expires_after_count() {
        let state = AppState::new();
        state.inject_fault("/api/x", StatusCode::BAD_GATEWAY, 2).await;
        assert_eq!(state.take_fault("/api/x").await, Some(StatusCode::BAD_GATEWAY));
        assert_eq!(state.take_fault("/api/x").await, Some(StatusCode::BAD_GATEWAY));
        assert_eq!(state.take_fault("/api/x").await, None);
        assert_eq!(state.take_fault("/api/y").await, None);
    }

    #[test]
    fn blank_fields_in_order() {
        let fields = [("a", Some("x")), ("b", Some("  ")), ("c", None)];
        assert_eq!(blank_fields(&fields), vec!["b", "c"]);
        assert!(require(&fields[..1]).is_ok());
    }

    #[test]
    fn password_is_not_serialized() {
        let state = AppState::seeded();
        let db = state.db.try_read().unwrap();
        let value = serde_json::to_value(&db.police[0]).unwrap();
        assert_eq!(value["_id"], "police-1");
        assert_eq!(value["accountType"], "officer");
        assert!(value.get("password").is_none());
    }
}
