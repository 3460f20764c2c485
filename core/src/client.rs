//! Stateless HTTP request builder and response parser for the traffic API.
//!
//! # Design
//! `TrafficClient` holds only the API root and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Services execute the round-trip through `HttpClient`
//! in between, so everything here is deterministic and tested without a
//! network.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ActivitySummary, AuthResponse, CitizenProfile, Credentials, DriverRecord, Fine, FineRequest, FineStatus, Listing,
    NewPoliceAccount, NewUserAccount, PoliceAccount, PoliceAccountUpdate, RegisterProfile, Timeframe,
    UserAccount, UserAccountUpdate, DRIVER_REQUIRED_FIELDS,
};

/// Which web or mobile surface an auth call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Portal {
    /// Mobile app for officers and admins, under `/police`.
    Police,
    /// Web admin console, under `/admin`.
    Admin,
    /// Web portal for citizens, at the API root.
    Citizen,
}

impl Portal {
    fn segments(self) -> &'static [&'static str] {
        match self {
            Portal::Police => &["police"],
            Portal::Admin => &["admin"],
            Portal::Citizen => &[],
        }
    }

    /// JSON key carrying the account identifier on login and register.
    fn id_key(self) -> &'static str {
        match self {
            Portal::Police => "id",
            Portal::Admin | Portal::Citizen => "idNumber",
        }
    }
}

/// Collections managed from the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Police,
    Users,
}

impl AccountKind {
    fn segment(self) -> &'static str {
        match self {
            AccountKind::Police => "police",
            AccountKind::Users => "users",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrafficClient {
    base: Url,
}

impl TrafficClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Config(format!("base url {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Config(format!("base url {base_url:?} cannot carry a path")));
        }
        Ok(Self { base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Absolute URL for `segments` under `portal`. Each segment is
    /// percent-encoded on its own, so user input cannot add path levels.
    fn url(&self, portal: Portal, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(portal.segments());
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.into()
    }

    fn get(&self, portal: Portal, segments: &[&str]) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url(portal, segments, &[]))
    }

    fn with_json<T: Serialize>(
        &self,
        method: HttpMethod,
        portal: Portal,
        segments: &[&str],
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::new(method, self.url(portal, segments, &[])).with_body(body))
    }

    // -- auth --------------------------------------------------------------

    /// Officer or admin registration. Citizens register with a full
    /// profile through `build_citizen_register`.
    pub fn build_register(&self, portal: Portal, profile: &RegisterProfile) -> Result<HttpRequest, ApiError> {
        if portal == Portal::Citizen {
            return Err(ApiError::Config(
                "citizen accounts register with a CitizenProfile".to_string(),
            ));
        }
        let mut body = to_object(profile)?;
        if let Some(id) = body.remove("id") {
            body.insert(portal.id_key().to_string(), id);
        }
        self.with_json(HttpMethod::Post, portal, &["auth", "register"], &body)
    }

    pub fn build_citizen_register(&self, profile: &CitizenProfile) -> Result<HttpRequest, ApiError> {
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::Validation { missing });
        }
        self.with_json(HttpMethod::Post, Portal::Citizen, &["auth", "register"], profile)
    }

    /// `{id, password}` on the mobile portal, `{idNumber, password}` on the
    /// web portals.
    pub fn build_login(&self, portal: Portal, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        let mut body = Map::new();
        body.insert(portal.id_key().to_string(), Value::String(credentials.id.clone()));
        body.insert("password".to_string(), Value::String(credentials.password.clone()));
        self.with_json(HttpMethod::Post, portal, &["auth", "login"], &body)
    }

    pub fn build_current_user(&self, portal: Portal) -> HttpRequest {
        self.get(portal, &["auth", "me"])
    }

    /// Parse a login or register response. The token is not checked here;
    /// `AuthResponse::to_session` does that.
    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        check_success(&response)?;
        decode(&response.body)
    }

    // -- licence search ----------------------------------------------------

    pub fn build_find_license(&self, license: &str) -> Result<HttpRequest, ApiError> {
        let license = normalize_license(license)?;
        Ok(self.get(Portal::Police, &["fines", "test", "find-license", license]))
    }

    pub fn build_public_search(&self, license: &str) -> Result<HttpRequest, ApiError> {
        let license = normalize_license(license)?;
        Ok(self.get(Portal::Police, &["fines", "public-search", license]))
    }

    /// Expects `{success: true, data: {...driver}}` with every field of
    /// `DRIVER_REQUIRED_FIELDS` present and non-empty.
    pub fn parse_driver_search(&self, response: HttpResponse) -> Result<DriverRecord, ApiError> {
        let envelope = envelope(&response)?;
        let data = match envelope.get("data") {
            Some(Value::Object(data)) => data,
            _ => return Err(ApiError::Shape("data".to_string())),
        };
        if let Some(field) = DRIVER_REQUIRED_FIELDS.iter().find(|f| !is_present(data.get(**f))) {
            return Err(ApiError::Shape((*field).to_string()));
        }
        serde_json::from_value(Value::Object(data.clone()))
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    // -- fines -------------------------------------------------------------

    pub fn build_create_fine(&self, fine: &FineRequest) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, Portal::Police, &["fines", "test", "create-fine"], fine)
    }

    pub fn build_public_issue(&self, fine: &FineRequest) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, Portal::Police, &["public-issue"], fine)
    }

    /// Parse `{success, data: fine}` as returned by every single-fine call.
    pub fn parse_fine(&self, response: HttpResponse) -> Result<Fine, ApiError> {
        data(&envelope(&response)?)
    }

    /// Parse `{success, data: [fine...]}`.
    pub fn parse_fines(&self, response: HttpResponse) -> Result<Vec<Fine>, ApiError> {
        data(&envelope(&response)?)
    }

    pub fn build_officer_activity(&self, timeframe: Timeframe) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            self.url(
                Portal::Police,
                &["fines", "officer-activity"],
                &[("timeframe", timeframe.as_str())],
            ),
        )
    }

    /// Expects `{success: true, summary: {...}, isMockData?}`. A missing
    /// `isMockData` means live data.
    pub fn parse_officer_activity(&self, response: HttpResponse) -> Result<ActivitySummary, ApiError> {
        let envelope = envelope(&response)?;
        let mut summary = match envelope.get("summary") {
            Some(Value::Object(summary)) => summary.clone(),
            _ => return Err(ApiError::Shape("summary".to_string())),
        };
        let is_mock = envelope.get("isMockData").and_then(Value::as_bool).unwrap_or(false);
        summary.insert("isMockData".to_string(), Value::Bool(is_mock));
        serde_json::from_value(Value::Object(summary)).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn build_user_fines(&self, user_id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.get(Portal::Police, &["fines", "user", path_id(user_id)?]))
    }

    pub fn build_fine_details(&self, fine_id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.get(Portal::Police, &["fines", path_id(fine_id)?]))
    }

    pub fn build_update_fine_status(&self, fine_id: &str, status: FineStatus) -> Result<HttpRequest, ApiError> {
        self.with_json(
            HttpMethod::Put,
            Portal::Police,
            &["fines", path_id(fine_id)?, "status"],
            &serde_json::json!({ "status": status }),
        )
    }

    // -- diagnostics -------------------------------------------------------

    pub fn build_all_users(&self) -> HttpRequest {
        self.get(Portal::Police, &["fines", "test", "all-users"])
    }

    pub fn build_auth_status(&self) -> HttpRequest {
        self.get(Portal::Police, &["fines", "debug", "auth-status"])
    }

    /// Any 2xx JSON body, unvalidated.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_success(&response)?;
        decode(&response.body)
    }

    /// `{data: [...], count?}`. `count` falls back to the length of `data`.
    pub fn parse_listing<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Listing<T>, ApiError> {
        let envelope = envelope(&response)?;
        let data: Vec<T> = data(&envelope)?;
        let count = envelope
            .get("count")
            .and_then(Value::as_u64)
            .map(|c| c as usize)
            .unwrap_or(data.len());
        Ok(Listing { data, count })
    }

    // -- admin console -----------------------------------------------------

    pub fn build_list_accounts(&self, kind: AccountKind) -> HttpRequest {
        self.get(Portal::Admin, &[kind.segment()])
    }

    pub fn build_search_accounts(&self, kind: AccountKind, query: &str) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            self.url(Portal::Admin, &[kind.segment(), "search"], &[("q", query)]),
        )
    }

    pub fn build_get_account(&self, kind: AccountKind, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.get(Portal::Admin, &[kind.segment(), path_id(id)?]))
    }

    pub fn build_create_police_account(&self, account: &NewPoliceAccount) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, Portal::Admin, &[AccountKind::Police.segment()], account)
    }

    pub fn build_update_police_account(
        &self,
        id: &str,
        update: &PoliceAccountUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, Portal::Admin, &[AccountKind::Police.segment(), path_id(id)?], update)
    }

    pub fn build_create_user_account(&self, account: &NewUserAccount) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, Portal::Admin, &[AccountKind::Users.segment()], account)
    }

    pub fn build_update_user_account(&self, id: &str, update: &UserAccountUpdate) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, Portal::Admin, &[AccountKind::Users.segment(), path_id(id)?], update)
    }

    pub fn build_delete_account(&self, kind: AccountKind, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.url(Portal::Admin, &[kind.segment(), path_id(id)?], &[]);
        Ok(HttpRequest::new(HttpMethod::Delete, url))
    }

    pub fn parse_police_account(&self, response: HttpResponse) -> Result<PoliceAccount, ApiError> {
        data(&envelope(&response)?)
    }

    pub fn parse_user_account(&self, response: HttpResponse) -> Result<UserAccount, ApiError> {
        data(&envelope(&response)?)
    }

    pub fn parse_deleted(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)?;
        if response.body.trim().is_empty() {
            return Ok(());
        }
        envelope(&response).map(|_| ())
    }

    // -- citizen portal ----------------------------------------------------

    pub fn build_my_fines(&self) -> HttpRequest {
        self.get(Portal::Citizen, &["fines"])
    }

    pub fn build_outstanding_fines(&self) -> HttpRequest {
        self.get(Portal::Citizen, &["fines", "outstanding"])
    }

    pub fn build_citizen_fine(&self, fine_id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.get(Portal::Citizen, &["fines", path_id(fine_id)?]))
    }

    pub fn build_dispute_fine(&self, fine_id: &str) -> Result<HttpRequest, ApiError> {
        self.with_json(
            HttpMethod::Put,
            Portal::Citizen,
            &["fines", path_id(fine_id)?, "status"],
            &serde_json::json!({ "status": FineStatus::Disputed }),
        )
    }

    /// Unauthenticated listing of every fine recorded against a licence.
    /// Parse with `parse_fines`.
    pub fn build_public_fine_search(&self, license: &str) -> Result<HttpRequest, ApiError> {
        let license = normalize_license(license)?;
        Ok(self.get(Portal::Citizen, &["fines", "public", "search-fines", license]))
    }
}

/// Trim a licence number, rejecting blank input and dot segments.
pub fn normalize_license(license: &str) -> Result<&str, ApiError> {
    let trimmed = license.trim();
    if trimmed.is_empty() || is_dot_segment(trimmed) {
        return Err(ApiError::Validation { missing: vec!["dlNumber"] });
    }
    Ok(trimmed)
}

/// A record id placed in a path segment. `.` and `..` would be dropped
/// by URL normalisation and change the route, so they are refused along
/// with blank ids.
fn path_id(id: &str) -> Result<&str, ApiError> {
    if id.trim().is_empty() || is_dot_segment(id) {
        return Err(ApiError::Validation { missing: vec!["id"] });
    }
    Ok(id)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::Serialization("expected a JSON object".to_string())),
        Err(e) => Err(ApiError::Serialization(e.to_string())),
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, response.body.clone()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// A 2xx JSON object carrying `success: true`. `success: false` becomes
/// `Rejected` with the server's message.
fn envelope(response: &HttpResponse) -> Result<Map<String, Value>, ApiError> {
    check_success(response)?;
    let body: Value = decode(&response.body)?;
    let Value::Object(map) = body else {
        return Err(ApiError::Shape("response object".to_string()));
    };
    match map.get("success") {
        Some(Value::Bool(true)) => Ok(map),
        Some(Value::Bool(false)) => Err(ApiError::Rejected {
            message: map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Server reported an error")
                .to_string(),
        }),
        _ => Err(ApiError::Shape("success".to_string())),
    }
}

fn data<T: DeserializeOwned>(envelope: &Map<String, Value>) -> Result<T, ApiError> {
    let value = envelope
        .get("data")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::Shape("data".to_string()))?;
    T::deserialize(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::AccountType;

    fn client() -> TrafficClient {
        TrafficClient::new("http://localhost:5002/api").unwrap()
    }

    fn ok(body: Value) -> HttpResponse {
        HttpResponse::new(200, body.to_string())
    }

    fn driver() -> Value {
        json!({
            "_id": "u1",
            "name": "Jane Doe",
            "idNumber": "ID123",
            "dlNumber": "B1234567",
            "dlExpireDate": "2030-05-01"
        })
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(TrafficClient::new("nope"), Err(ApiError::Config(_))));
        assert!(matches!(TrafficClient::new("mailto:a@b.c"), Err(ApiError::Config(_))));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TrafficClient::new("http://localhost:5002/api/").unwrap();
        let req = client.build_all_users();
        assert_eq!(req.url, "http://localhost:5002/api/police/fines/test/all-users");
        assert_eq!(client.base_url(), "http://localhost:5002/api");
    }

    #[test]
    fn build_login_produces_correct_request() {
        let creds = Credentials {
            id: "OFF001".to_string(),
            password: "secret1".to_string(),
        };
        let req = client().build_login(Portal::Police, &creds).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5002/api/police/auth/login");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"id": "OFF001", "password": "secret1"}));
    }

    #[test]
    fn auth_paths_follow_portal() {
        let creds = Credentials {
            id: "a".to_string(),
            password: "b".to_string(),
        };
        let c = client();
        assert_eq!(
            c.build_login(Portal::Admin, &creds).unwrap().url,
            "http://localhost:5002/api/admin/auth/login"
        );
        assert_eq!(
            c.build_login(Portal::Citizen, &creds).unwrap().url,
            "http://localhost:5002/api/auth/login"
        );
        assert_eq!(c.build_current_user(Portal::Police).url, "http://localhost:5002/api/police/auth/me");
    }

    #[test]
    fn build_register_sends_account_type() {
        let profile = RegisterProfile {
            id: "ADM1".to_string(),
            name: "Ann".to_string(),
            password: "pw".to_string(),
            account_type: AccountType::Admin,
        };
        let req = client().build_register(Portal::Police, &profile).unwrap();
        assert_eq!(req.url, "http://localhost:5002/api/police/auth/register");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["accountType"], "admin");
        assert_eq!(body["id"], "ADM1");
    }

    fn body_of(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn web_portals_send_id_number() {
        let creds = Credentials {
            id: "ID123".to_string(),
            password: "citizen123".to_string(),
        };
        let c = client();
        let citizen = c.build_login(Portal::Citizen, &creds).unwrap();
        assert_eq!(body_of(&citizen), json!({"idNumber": "ID123", "password": "citizen123"}));
        let admin = c.build_login(Portal::Admin, &creds).unwrap();
        assert_eq!(body_of(&admin), json!({"idNumber": "ID123", "password": "citizen123"}));

        let profile = RegisterProfile {
            id: "ADM2".to_string(),
            name: "Ann".to_string(),
            password: "pw".to_string(),
            account_type: AccountType::Admin,
        };
        let register = c.build_register(Portal::Admin, &profile).unwrap();
        let body = body_of(&register);
        assert_eq!(body["idNumber"], "ADM2");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn citizen_register_sends_full_profile() {
        let profile = CitizenProfile {
            name: "Jane Doe".to_string(),
            id_number: "ID123".to_string(),
            phone: "555-0100".to_string(),
            dl_number: "B1234567".to_string(),
            dl_expire_date: "2030-05-01".to_string(),
            email: "jane@example.com".to_string(),
            password: "citizen123".to_string(),
        };
        let c = client();
        let req = c.build_citizen_register(&profile).unwrap();
        assert_eq!(req.url, "http://localhost:5002/api/auth/register");
        assert_eq!(
            body_of(&req),
            json!({
                "name": "Jane Doe",
                "idNumber": "ID123",
                "phone": "555-0100",
                "dlNumber": "B1234567",
                "dlExpireDate": "2030-05-01",
                "email": "jane@example.com",
                "password": "citizen123"
            })
        );

        let mut incomplete = profile.clone();
        incomplete.dl_expire_date.clear();
        assert!(matches!(
            c.build_citizen_register(&incomplete),
            Err(ApiError::Validation { missing }) if missing == vec!["dlExpireDate"]
        ));

        let short = RegisterProfile {
            id: "ID123".to_string(),
            name: "Jane".to_string(),
            password: "pw".to_string(),
            account_type: AccountType::User,
        };
        assert!(matches!(c.build_register(Portal::Citizen, &short), Err(ApiError::Config(_))));
    }

    #[test]
    fn public_fine_search_route() {
        let c = client();
        let req = c.build_public_fine_search(" AB 12/3 ").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:5002/api/fines/public/search-fines/AB%2012%2F3");
        assert!(req.body.is_none());
        assert!(matches!(c.build_public_fine_search("  "), Err(ApiError::Validation { .. })));
    }

    #[test]
    fn dot_segments_are_refused() {
        let c = client();
        for bad in [".", ".."] {
            assert!(matches!(c.build_find_license(bad), Err(ApiError::Validation { .. })));
            assert!(matches!(c.build_public_fine_search(bad), Err(ApiError::Validation { .. })));
            assert!(matches!(c.build_fine_details(bad), Err(ApiError::Validation { .. })));
            assert!(matches!(c.build_dispute_fine(bad), Err(ApiError::Validation { .. })));
            assert!(matches!(
                c.build_delete_account(AccountKind::Users, bad),
                Err(ApiError::Validation { .. })
            ));
        }
        assert!(c.build_user_fines("").is_err());
        // dots inside an id are ordinary characters
        assert_eq!(
            c.build_fine_details("a..b").unwrap().url,
            "http://localhost:5002/api/police/fines/a..b"
        );
    }

    #[test]
    fn license_is_trimmed_and_encoded() {
        let c = client();
        let padded = c.build_find_license("  AB 12/3  ").unwrap();
        let trimmed = c.build_find_license("AB 12/3").unwrap();
        assert_eq!(padded, trimmed);
        assert_eq!(padded.url, "http://localhost:5002/api/police/fines/test/find-license/AB%2012%2F3");
        assert_eq!(
            c.build_public_search(" B1234567 ").unwrap().url,
            "http://localhost:5002/api/police/fines/public-search/B1234567"
        );
    }

    #[test]
    fn blank_license_is_rejected_before_building() {
        assert!(matches!(
            client().build_find_license("   "),
            Err(ApiError::Validation { .. })
        ));
        assert!(client().build_public_search("").is_err());
    }

    #[test]
    fn parse_driver_search_success() {
        let driver = client()
            .parse_driver_search(ok(json!({"success": true, "data": driver()})))
            .unwrap();
        assert_eq!(driver.name, "Jane Doe");
        assert_eq!(driver.dl_number, "B1234567");
    }

    #[test]
    fn parse_driver_search_names_first_missing_field() {
        let mut record = driver();
        record.as_object_mut().unwrap().remove("idNumber");
        record["dlExpireDate"] = json!("");
        let err = client()
            .parse_driver_search(ok(json!({"success": true, "data": record})))
            .unwrap_err();
        match err {
            ApiError::Shape(field) => assert_eq!(field, "idNumber"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_driver_search_requires_success_and_data() {
        let c = client();
        assert!(matches!(
            c.parse_driver_search(ok(json!({"data": driver()}))),
            Err(ApiError::Shape(f)) if f == "success"
        ));
        assert!(matches!(
            c.parse_driver_search(ok(json!({"success": true}))),
            Err(ApiError::Shape(f)) if f == "data"
        ));
        assert!(matches!(
            c.parse_driver_search(ok(json!({"success": false, "message": "No user"}))),
            Err(ApiError::Rejected { message }) if message == "No user"
        ));
    }

    #[test]
    fn parse_driver_search_not_found() {
        let err = client()
            .parse_driver_search(HttpResponse::new(404, r#"{"message":"not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn build_fine_requests() {
        let fine = FineRequest {
            id_number: "ID123".to_string(),
            dl_number: "B1234567".to_string(),
            description: "Speeding".to_string(),
            amount: 150.0,
            location: "Main St".to_string(),
            officer_id: Some("OFF001".to_string()),
        };
        let c = client();
        let direct = c.build_create_fine(&fine).unwrap();
        assert_eq!(direct.method, HttpMethod::Post);
        assert_eq!(direct.url, "http://localhost:5002/api/police/fines/test/create-fine");
        let public = c.build_public_issue(&fine).unwrap();
        assert_eq!(public.url, "http://localhost:5002/api/police/public-issue");
        assert_eq!(direct.body, public.body);
    }

    #[test]
    fn build_officer_activity_sets_query() {
        let req = client().build_officer_activity(Timeframe::Weekly);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:5002/api/police/fines/officer-activity?timeframe=weekly"
        );
    }

    #[test]
    fn parse_officer_activity_success() {
        let summary = client()
            .parse_officer_activity(ok(json!({
                "success": true,
                "summary": {"totalFines": 5, "totalAmount": 250, "uniqueLicenses": 3},
                "isMockData": false
            })))
            .unwrap();
        assert_eq!(
            summary,
            ActivitySummary {
                total_fines: 5,
                total_amount: 250.0,
                unique_licenses: 3,
                is_mock_data: false,
            }
        );
    }

    #[test]
    fn parse_officer_activity_mock_flag() {
        let c = client();
        let mock = c
            .parse_officer_activity(ok(json!({
                "success": true,
                "summary": {"totalFines": 1, "totalAmount": 10.5, "uniqueLicenses": 1},
                "isMockData": true
            })))
            .unwrap();
        assert!(mock.is_mock_data);

        let absent = c
            .parse_officer_activity(ok(json!({
                "success": true,
                "summary": {"totalFines": 0, "totalAmount": 0, "uniqueLicenses": 0}
            })))
            .unwrap();
        assert!(!absent.is_mock_data);
    }

    #[test]
    fn parse_officer_activity_requires_summary() {
        let err = client()
            .parse_officer_activity(ok(json!({"success": true})))
            .unwrap_err();
        assert!(matches!(err, ApiError::Shape(f) if f == "summary"));
    }

    #[test]
    fn parse_auth_keeps_missing_token_for_caller() {
        let resp = client()
            .parse_auth(ok(json!({"accountType": "officer", "id": "OFF001", "name": "John"})))
            .unwrap();
        assert!(resp.token.is_none());
        assert!(matches!(resp.to_session(), Err(ApiError::MissingToken)));
    }

    #[test]
    fn parse_auth_bad_json() {
        let err = client().parse_auth(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_auth_unauthorized() {
        let err = client().parse_auth(HttpResponse::new(401, "bad credentials")).unwrap_err();
        assert!(matches!(err, ApiError::AuthExpired { status: 401 }));
    }

    #[test]
    fn admin_routes() {
        let c = client();
        assert_eq!(c.build_list_accounts(AccountKind::Police).url, "http://localhost:5002/api/admin/police");
        assert_eq!(
            c.build_search_accounts(AccountKind::Users, "jane doe").url,
            "http://localhost:5002/api/admin/users/search?q=jane+doe"
        );
        let del = c.build_delete_account(AccountKind::Police, "p1").unwrap();
        assert_eq!(del.method, HttpMethod::Delete);
        assert_eq!(del.url, "http://localhost:5002/api/admin/police/p1");

        let update = PoliceAccountUpdate {
            name: Some("New".to_string()),
            ..Default::default()
        };
        let req = c.build_update_police_account("p1", &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "New"}));
    }

    #[test]
    fn parse_listing_counts() {
        let listing: Listing<Value> = client()
            .parse_listing(ok(json!({"success": true, "data": [{"a": 1}, {"a": 2}]})))
            .unwrap();
        assert_eq!(listing.count, 2);

        let listing: Listing<Value> = client()
            .parse_listing(ok(json!({"success": true, "data": [], "count": 0})))
            .unwrap();
        assert!(listing.data.is_empty());
    }

    #[test]
    fn parse_deleted_accepts_empty_body() {
        assert!(client().parse_deleted(HttpResponse::new(204, "")).is_ok());
        assert!(client()
            .parse_deleted(ok(json!({"success": true, "message": "deleted"})))
            .is_ok());
        assert!(matches!(
            client().parse_deleted(HttpResponse::new(404, "")),
            Err(ApiError::NotFound { .. })
        ));
    }

    #[test]
    fn citizen_routes() {
        let c = client();
        assert_eq!(c.build_outstanding_fines().url, "http://localhost:5002/api/fines/outstanding");
        let dispute = c.build_dispute_fine("f1").unwrap();
        assert_eq!(dispute.method, HttpMethod::Put);
        assert_eq!(dispute.url, "http://localhost:5002/api/fines/f1/status");
        let body: Value = serde_json::from_str(dispute.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"status": "Disputed"}));
    }

    #[test]
    fn parse_fine_server_error() {
        let err = client()
            .parse_fine(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }
}
