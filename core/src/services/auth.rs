use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::client::{Portal, TrafficClient};
use crate::error::ApiError;
use crate::http_client::HttpClient;
use crate::services::ListingCache;
use crate::types::{AccountType, AuthResponse, CitizenProfile, Credentials, RegisterProfile, Session};

/// Login, registration and session reads for one portal.
///
/// When built with a listing cache, every session change (login, register,
/// logout) empties it, so one account never sees listings fetched by
/// another.
#[derive(Debug, Clone)]
pub struct AuthService {
    http: Arc<HttpClient>,
    routes: TrafficClient,
    portal: Portal,
    listings: Option<Arc<ListingCache>>,
}

impl AuthService {
    pub fn new(http: Arc<HttpClient>, routes: TrafficClient, portal: Portal) -> Self {
        Self {
            http,
            routes,
            portal,
            listings: None,
        }
    }

    pub fn with_listing_cache(mut self, listings: Arc<ListingCache>) -> Self {
        self.listings = Some(listings);
        self
    }

    fn forget_listings(&self) {
        if let Some(listings) = &self.listings {
            listings.clear();
        }
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    /// Create an account and store the session it grants. Returns the
    /// server payload.
    pub async fn register(&self, profile: &RegisterProfile) -> Result<AuthResponse, ApiError> {
        let request = self.routes.build_register(self.portal, profile)?;
        let response = self.routes.parse_auth(self.http.send(request).await?)?;
        self.persist(&response).await?;
        Ok(response)
    }

    /// Self-registration on the citizen portal. Blank profile fields fail
    /// locally with `Validation`.
    pub async fn register_citizen(&self, profile: &CitizenProfile) -> Result<AuthResponse, ApiError> {
        let request = self.routes.build_citizen_register(profile)?;
        let response = self.routes.parse_auth(self.http.send(request).await?)?;
        self.persist(&response).await?;
        Ok(response)
    }

    /// Authenticate and store the session. A 2xx response without a token
    /// fails with `MissingToken` and leaves the store untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let request = self.routes.build_login(self.portal, credentials)?;
        let response = self.routes.parse_auth(self.http.send(request).await?)?;
        self.persist(&response).await?;
        Ok(response)
    }

    async fn persist(&self, response: &AuthResponse) -> Result<(), ApiError> {
        let session = response.to_session()?;
        self.http.sessions().save(&session).await?;
        self.forget_listings();
        info!(user_id = %session.user_id, account_type = %session.account_type, "logged in");
        Ok(())
    }

    /// Drop the stored session. No server call.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.http.sessions().clear().await?;
        self.forget_listings();
        info!("logged out");
        Ok(())
    }

    /// Profile of the logged-in account.
    pub async fn current_user(&self) -> Result<Value, ApiError> {
        let request = self.routes.build_current_user(self.portal);
        self.routes.parse_json(self.http.send(request).await?)
    }

    pub async fn session(&self) -> Result<Option<Session>, ApiError> {
        self.http.session().await
    }

    pub async fn is_logged_in(&self) -> Result<bool, ApiError> {
        Ok(self.session().await?.is_some())
    }

    pub async fn account_type(&self) -> Result<Option<AccountType>, ApiError> {
        Ok(self.session().await?.map(|s| s.account_type))
    }

    pub async fn user_id(&self) -> Result<Option<String>, ApiError> {
        Ok(self.session().await?.map(|s| s.user_id))
    }

    pub async fn user_name(&self) -> Result<Option<String>, ApiError> {
        Ok(self.session().await?.map(|s| s.user_name))
    }
}
