use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::TtlCache;
use crate::client::{AccountKind, TrafficClient};
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::http_client::HttpClient;
use crate::types::{
    Listing, NewPoliceAccount, NewUserAccount, PoliceAccount, PoliceAccountUpdate, UserAccount,
    UserAccountUpdate,
};

/// Raw listing responses per collection.
pub type ListingCache = TtlCache<AccountKind, HttpResponse>;

/// Account management for the admin console.
///
/// Full listings are cached per collection for the configured TTL, so
/// repeated renders inside the window do not hit the server. Any mutation
/// of a collection drops its cached listing, and a listing fetched while a
/// mutation completed is not stored.
#[derive(Debug, Clone)]
pub struct AdminService {
    http: Arc<HttpClient>,
    routes: TrafficClient,
    listings: Arc<ListingCache>,
}

impl AdminService {
    pub fn new(http: Arc<HttpClient>, routes: TrafficClient, listings: Arc<ListingCache>) -> Self {
        Self { http, routes, listings }
    }

    async fn list<T: DeserializeOwned>(&self, kind: AccountKind) -> Result<Listing<T>, ApiError> {
        if let Some(cached) = self.listings.get(&kind) {
            debug!(?kind, "serving account listing from cache");
            return self.routes.parse_listing(cached);
        }
        let generation = self.listings.generation();
        let response = self.http.send(self.routes.build_list_accounts(kind)).await?;
        let listing = self.routes.parse_listing(response.clone())?;
        if !self.listings.insert_if_current(generation, kind, response) {
            debug!(?kind, "listing raced an invalidation, not cached");
        }
        Ok(listing)
    }

    async fn search<T: DeserializeOwned>(&self, kind: AccountKind, query: &str) -> Result<Listing<T>, ApiError> {
        let request = self.routes.build_search_accounts(kind, query.trim());
        self.routes.parse_listing(self.http.send(request).await?)
    }

    async fn delete(&self, kind: AccountKind, id: &str) -> Result<(), ApiError> {
        let response = self.http.send(self.routes.build_delete_account(kind, id)?).await?;
        self.routes.parse_deleted(response)?;
        self.listings.invalidate(&kind);
        Ok(())
    }

    // -- police accounts ---------------------------------------------------

    pub async fn police_accounts(&self) -> Result<Listing<PoliceAccount>, ApiError> {
        self.list(AccountKind::Police).await
    }

    pub async fn search_police_accounts(&self, query: &str) -> Result<Listing<PoliceAccount>, ApiError> {
        self.search(AccountKind::Police, query).await
    }

    pub async fn police_account(&self, id: &str) -> Result<PoliceAccount, ApiError> {
        let request = self.routes.build_get_account(AccountKind::Police, id)?;
        self.routes.parse_police_account(self.http.send(request).await?)
    }

    pub async fn create_police_account(&self, account: &NewPoliceAccount) -> Result<PoliceAccount, ApiError> {
        let request = self.routes.build_create_police_account(account)?;
        let created = self.routes.parse_police_account(self.http.send(request).await?)?;
        self.listings.invalidate(&AccountKind::Police);
        Ok(created)
    }

    pub async fn update_police_account(
        &self,
        id: &str,
        update: &PoliceAccountUpdate,
    ) -> Result<PoliceAccount, ApiError> {
        let request = self.routes.build_update_police_account(id, update)?;
        let updated = self.routes.parse_police_account(self.http.send(request).await?)?;
        self.listings.invalidate(&AccountKind::Police);
        Ok(updated)
    }

    pub async fn delete_police_account(&self, id: &str) -> Result<(), ApiError> {
        self.delete(AccountKind::Police, id).await
    }

    // -- citizen users -----------------------------------------------------

    pub async fn users(&self) -> Result<Listing<UserAccount>, ApiError> {
        self.list(AccountKind::Users).await
    }

    pub async fn search_users(&self, query: &str) -> Result<Listing<UserAccount>, ApiError> {
        self.search(AccountKind::Users, query).await
    }

    pub async fn user(&self, id: &str) -> Result<UserAccount, ApiError> {
        let request = self.routes.build_get_account(AccountKind::Users, id)?;
        self.routes.parse_user_account(self.http.send(request).await?)
    }

    pub async fn create_user(&self, account: &NewUserAccount) -> Result<UserAccount, ApiError> {
        let request = self.routes.build_create_user_account(account)?;
        let created = self.routes.parse_user_account(self.http.send(request).await?)?;
        self.listings.invalidate(&AccountKind::Users);
        Ok(created)
    }

    pub async fn update_user(&self, id: &str, update: &UserAccountUpdate) -> Result<UserAccount, ApiError> {
        let request = self.routes.build_update_user_account(id, update)?;
        let updated = self.routes.parse_user_account(self.http.send(request).await?)?;
        self.listings.invalidate(&AccountKind::Users);
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.delete(AccountKind::Users, id).await
    }
}
