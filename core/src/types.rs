//! Domain DTOs for the traffic API.
//!
//! # Design
//! Wire names are camelCase and record ids arrive as `_id`. These types are
//! defined independently from the mock-server crate; the end-to-end tests
//! catch schema drift between the two.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Role attached to an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Officer,
    Admin,
    /// Citizen account on the web portal.
    User,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Officer => "officer",
            AccountType::Admin => "admin",
            AccountType::User => "user",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated session. Written and cleared as one unit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub account_type: AccountType,
    pub user_id: String,
    pub user_name: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &token_prefix(&self.token))
            .field("account_type", &self.account_type)
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .finish()
    }
}

/// First few characters of a token, safe to log.
pub(crate) fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

/// Login payload. The mobile app sends `id`; the web portals send the same
/// value as `idNumber` (see `TrafficClient::build_login`).
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub id: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"***")
            .finish()
    }
}

/// Registration payload for an officer or admin account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfile {
    pub id: String,
    pub name: String,
    pub password: String,
    pub account_type: AccountType,
}

impl fmt::Debug for RegisterProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password", &"***")
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// Self-registration payload for a citizen on the web portal.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenProfile {
    pub name: String,
    pub id_number: String,
    pub phone: String,
    pub dl_number: String,
    pub dl_expire_date: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CitizenProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitizenProfile")
            .field("name", &self.name)
            .field("id_number", &self.id_number)
            .field("phone", &self.phone)
            .field("dl_number", &self.dl_number)
            .field("dl_expire_date", &self.dl_expire_date)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl CitizenProfile {
    /// Wire names of blank fields. Empty when the profile may be sent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("idNumber", &self.id_number),
            ("phone", &self.phone),
            ("dlNumber", &self.dl_number),
            ("dlExpireDate", &self.dl_expire_date),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Body returned by login and register. Every field is optional on the
/// wire; `to_session` decides whether the payload is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthResponse {
    /// Build the session this response grants. A missing or blank token is
    /// `MissingToken`; any other missing field is a shape error.
    pub fn to_session(&self) -> Result<Session, ApiError> {
        let token = match self.token.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => return Err(ApiError::MissingToken),
        };
        let account_type = self
            .account_type
            .ok_or_else(|| ApiError::Shape("accountType".to_string()))?;
        let user_id = self.id.clone().ok_or_else(|| ApiError::Shape("id".to_string()))?;
        let user_name = self.name.clone().ok_or_else(|| ApiError::Shape("name".to_string()))?;
        Ok(Session {
            token,
            account_type,
            user_id,
            user_name,
        })
    }
}

/// A driver found by licence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub name: String,
    pub id_number: String,
    pub dl_number: String,
    pub dl_expire_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields a driver record must carry, in the order they are checked.
pub const DRIVER_REQUIRED_FIELDS: [&str; 5] = ["_id", "name", "idNumber", "dlNumber", "dlExpireDate"];

/// A fine about to be issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineRequest {
    pub id_number: String,
    pub dl_number: String,
    pub description: String,
    pub amount: f64,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<String>,
}

impl FineRequest {
    /// Names of required fields that are blank, or `amount` when it is not a
    /// positive number. Empty when the request may be sent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.id_number.trim().is_empty() {
            missing.push("idNumber");
        }
        if self.dl_number.trim().is_empty() {
            missing.push("dlNumber");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            missing.push("amount");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation { missing })
        }
    }
}

/// Lifecycle state of a fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FineStatus {
    #[default]
    Pending,
    Paid,
    Disputed,
    Cancelled,
}

/// A fine as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id_number: String,
    pub dl_number: String,
    pub description: String,
    pub amount: f64,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<String>,
    #[serde(default)]
    pub status: FineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

/// Window over which officer activity is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            _ => Err(ApiError::Validation {
                missing: vec!["timeframe"],
            }),
        }
    }
}

/// Officer activity figures for one timeframe.
///
/// `is_mock_data` is set when the server could not aggregate live data and
/// substituted placeholder figures; these must never be shown as real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_fines: u64,
    pub total_amount: f64,
    pub unique_licenses: u64,
    #[serde(default)]
    pub is_mock_data: bool,
}

/// Police or admin account as managed from the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceAccount {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoliceAccount {
    pub id: String,
    pub name: String,
    pub password: String,
    pub account_type: AccountType,
}

impl fmt::Debug for NewPoliceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPoliceAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password", &"***")
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// Partial update. Omitted fields remain unchanged on the server.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceAccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
}

impl fmt::Debug for PoliceAccountUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoliceAccountUpdate")
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// Citizen account as managed from the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(rename = "_id")]
    pub record_id: String,
    pub id_number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub dl_number: String,
    pub dl_expire_date: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserAccount {
    pub id_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub dl_number: String,
    pub dl_expire_date: String,
    pub password: String,
}

impl fmt::Debug for NewUserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserAccount")
            .field("id_number", &self.id_number)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("dl_number", &self.dl_number)
            .field("dl_expire_date", &self.dl_expire_date)
            .field("password", &"***")
            .finish()
    }
}

/// Partial update. Omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dl_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dl_expire_date: Option<String>,
}

/// A list payload: `{success, data: [...], count}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fine_request() -> FineRequest {
        FineRequest {
            id_number: "ID1".to_string(),
            dl_number: "DL1".to_string(),
            description: "Speeding".to_string(),
            amount: 50.0,
            location: "Main St".to_string(),
            officer_id: Some("OFF001".to_string()),
        }
    }

    #[test]
    fn complete_fine_request_validates() {
        assert!(fine_request().validate().is_ok());
    }

    #[test]
    fn blank_fields_and_non_positive_amount_are_missing() {
        let mut req = fine_request();
        req.description = "  ".to_string();
        req.amount = 0.0;
        assert_eq!(req.missing_fields(), vec!["description", "amount"]);

        req.amount = f64::NAN;
        assert!(req.missing_fields().contains(&"amount"));
    }

    #[test]
    fn officer_id_is_not_required() {
        let mut req = fine_request();
        req.officer_id = None;
        assert!(req.validate().is_ok());
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("officerId").is_none());
    }

    #[test]
    fn fine_request_uses_camel_case() {
        let json = serde_json::to_value(fine_request()).unwrap();
        assert_eq!(json["idNumber"], "ID1");
        assert_eq!(json["dlNumber"], "DL1");
        assert_eq!(json["officerId"], "OFF001");
    }

    #[test]
    fn session_serializes_under_fixed_keys() {
        let session = Session {
            token: "abc.def.ghi".to_string(),
            account_type: AccountType::Officer,
            user_id: "OFF001".to_string(),
            user_name: "John Smith".to_string(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["accountType"], "officer");
        assert_eq!(json["userId"], "OFF001");
        assert_eq!(json["userName"], "John Smith");
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session {
            token: "abc.def.ghi.jkl".to_string(),
            account_type: AccountType::Admin,
            user_id: "ADM1".to_string(),
            user_name: "Ann".to_string(),
        };
        let shown = format!("{session:?}");
        assert!(!shown.contains("abc.def.ghi.jkl"));
        assert!(shown.contains("abc.de..."));
    }

    #[test]
    fn account_payload_debug_hides_passwords() {
        let police = NewPoliceAccount {
            id: "OFF002".to_string(),
            name: "Sam".to_string(),
            password: "hunter22".to_string(),
            account_type: AccountType::Officer,
        };
        let update = PoliceAccountUpdate {
            password: Some("hunter22".to_string()),
            ..PoliceAccountUpdate::default()
        };
        let user = NewUserAccount {
            id_number: "ID9".to_string(),
            name: "Kim".to_string(),
            email: None,
            phone: None,
            dl_number: "DL9".to_string(),
            dl_expire_date: "2031-01-01".to_string(),
            password: "hunter22".to_string(),
        };
        for shown in [format!("{police:?}"), format!("{update:?}"), format!("{user:?}"), format!("{:?}", citizen_profile())] {
            assert!(!shown.contains("hunter22"), "{shown}");
            assert!(shown.contains("***"), "{shown}");
        }
        assert!(format!("{:?}", PoliceAccountUpdate::default()).contains("password: None"));
    }

    fn citizen_profile() -> CitizenProfile {
        CitizenProfile {
            name: "Jane Doe".to_string(),
            id_number: "ID123".to_string(),
            phone: "555-0100".to_string(),
            dl_number: "B1234567".to_string(),
            dl_expire_date: "2030-05-01".to_string(),
            email: "jane@example.com".to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[test]
    fn citizen_profile_uses_web_wire_names() {
        let json = serde_json::to_value(citizen_profile()).unwrap();
        assert_eq!(json["idNumber"], "ID123");
        assert_eq!(json["dlNumber"], "B1234567");
        assert_eq!(json["dlExpireDate"], "2030-05-01");
        assert!(citizen_profile().missing_fields().is_empty());

        let mut profile = citizen_profile();
        profile.dl_number = " ".to_string();
        profile.email.clear();
        assert_eq!(profile.missing_fields(), vec!["dlNumber", "email"]);
    }

    #[test]
    fn auth_response_without_token_is_missing_token() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"accountType":"officer","id":"OFF001","name":"John"}"#).unwrap();
        assert!(matches!(resp.to_session(), Err(ApiError::MissingToken)));

        let resp: AuthResponse = serde_json::from_str(r#"{"token":"  "}"#).unwrap();
        assert!(matches!(resp.to_session(), Err(ApiError::MissingToken)));
    }

    #[test]
    fn auth_response_with_token_but_no_role_is_shape_error() {
        let resp: AuthResponse = serde_json::from_str(r#"{"token":"t","id":"1","name":"n"}"#).unwrap();
        match resp.to_session() {
            Err(ApiError::Shape(field)) => assert_eq!(field, "accountType"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeframe_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<Timeframe>().unwrap(), Timeframe::Weekly);
        assert_eq!(" monthly ".parse::<Timeframe>().unwrap(), Timeframe::Monthly);
        assert!("yearly".parse::<Timeframe>().is_err());
        assert_eq!(Timeframe::default(), Timeframe::Daily);
    }

    #[test]
    fn fine_status_defaults_to_pending() {
        let fine: Fine = serde_json::from_str(
            r#"{"_id":"f1","idNumber":"ID1","dlNumber":"DL1","description":"d","amount":10,"location":"x"}"#,
        )
        .unwrap();
        assert_eq!(fine.status, FineStatus::Pending);
        assert!(fine.issued_at.is_none());
    }

    #[test]
    fn driver_record_keeps_extra_fields() {
        let driver: DriverRecord = serde_json::from_str(
            r#"{"_id":"u1","name":"Jane","idNumber":"ID9","dlNumber":"DL9","dlExpireDate":"2030-01-01","email":"j@x.io"}"#,
        )
        .unwrap();
        assert_eq!(driver.record_id, "u1");
        assert_eq!(driver.extra["email"], "j@x.io");
    }
}
