use std::sync::Arc;

use crate::client::TrafficClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::http_client::HttpClient;
use crate::types::Fine;

/// Fines of the logged-in citizen.
///
/// Every call except `fines_by_license` needs a stored session; without one
/// it fails with `AuthExpired` and sends nothing.
#[derive(Debug, Clone)]
pub struct CitizenService {
    http: Arc<HttpClient>,
    routes: TrafficClient,
}

impl CitizenService {
    pub fn new(http: Arc<HttpClient>, routes: TrafficClient) -> Self {
        Self { http, routes }
    }

    async fn send_authenticated(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if self.http.session().await?.is_none() {
            return Err(ApiError::AuthExpired { status: 401 });
        }
        self.http.send(request).await
    }

    pub async fn my_fines(&self) -> Result<Vec<Fine>, ApiError> {
        let response = self.send_authenticated(self.routes.build_my_fines()).await?;
        self.routes.parse_fines(response)
    }

    pub async fn outstanding_fines(&self) -> Result<Vec<Fine>, ApiError> {
        let response = self.send_authenticated(self.routes.build_outstanding_fines()).await?;
        self.routes.parse_fines(response)
    }

    pub async fn fine(&self, fine_id: &str) -> Result<Fine, ApiError> {
        let response = self.send_authenticated(self.routes.build_citizen_fine(fine_id)?).await?;
        self.routes.parse_fine(response)
    }

    pub async fn dispute_fine(&self, fine_id: &str) -> Result<Fine, ApiError> {
        let response = self.send_authenticated(self.routes.build_dispute_fine(fine_id)?).await?;
        self.routes.parse_fine(response)
    }

    /// Every fine recorded against `license`, through the public search.
    /// Works without a session.
    pub async fn fines_by_license(&self, license: &str) -> Result<Vec<Fine>, ApiError> {
        let request = self.routes.build_public_fine_search(license)?;
        self.routes.parse_fines(self.http.send(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{AccountType, FineStatus, Session};

    fn citizen() -> Session {
        Session {
            token: "user-token".to_string(),
            account_type: AccountType::User,
            user_id: "ID123".to_string(),
            user_name: "Jane Doe".to_string(),
        }
    }

    fn service(transport: Arc<ScriptedTransport>, store: MemorySessionStore) -> CitizenService {
        let http = HttpClient::new(transport, Arc::new(store));
        CitizenService::new(Arc::new(http), TrafficClient::new("http://api.test/api").unwrap())
    }

    #[tokio::test]
    async fn without_session_nothing_is_sent() {
        let transport = Arc::new(ScriptedTransport::new());
        let err = service(transport.clone(), MemorySessionStore::new())
            .outstanding_fines()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthExpired { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn dispute_marks_fine_disputed() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            &json!({"success": true, "data": {
                "_id": "f1", "idNumber": "ID123", "dlNumber": "B1234567",
                "description": "Speeding", "amount": 150, "location": "Main St",
                "status": "Disputed"
            }}),
        );
        let fine = service(transport.clone(), MemorySessionStore::with_session(citizen()))
            .dispute_fine("f1")
            .await
            .unwrap();
        assert_eq!(fine.status, FineStatus::Disputed);
        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/fines/f1/status");
        assert_eq!(sent.header("authorization"), Some("Bearer user-token"));
    }

    #[tokio::test]
    async fn licence_search_needs_no_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            &json!({"success": true, "count": 1, "data": [{
                "_id": "f1", "idNumber": "ID123", "dlNumber": "B1234567",
                "description": "Speeding", "amount": 80, "location": "Main St"
            }]}),
        );
        let fines = service(transport.clone(), MemorySessionStore::new())
            .fines_by_license(" B1234567 ")
            .await
            .unwrap();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].status, FineStatus::Pending);
        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/fines/public/search-fines/B1234567");
        assert_eq!(sent.header("authorization"), None);
    }

    #[tokio::test]
    async fn blank_licence_is_not_sent() {
        let transport = Arc::new(ScriptedTransport::new());
        let err = service(transport.clone(), MemorySessionStore::new())
            .fines_by_license("  ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(transport.request_count(), 0);
    }
}
