//! One client per process: a shared `HttpClient`, session store and route
//! builder, with a service handle per surface.

use std::sync::Arc;

use crate::cache::TtlCache;
use crate::client::{Portal, TrafficClient};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http_client::HttpClient;
use crate::services::{AdminService, AuthService, CitizenService, FineService, ListingCache};
use crate::session::SessionStore;

#[derive(Debug, Clone)]
pub struct TrafficApi {
    http: Arc<HttpClient>,
    routes: TrafficClient,
    listings: Arc<ListingCache>,
    fines: FineService,
    admin: AdminService,
    citizen: CitizenService,
}

impl TrafficApi {
    /// Build the reqwest-backed client described by `config`.
    pub fn new(config: &ClientConfig, sessions: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let http = HttpClient::from_config(config, sessions)?;
        Self::with_http(config, Arc::new(http))
    }

    /// Wire services around an existing client, e.g. one with a scripted
    /// transport.
    pub fn with_http(config: &ClientConfig, http: Arc<HttpClient>) -> Result<Self, ApiError> {
        let routes = TrafficClient::new(&config.base_url)?;
        let listings = Arc::new(TtlCache::new(config.cache_ttl));
        Ok(Self {
            fines: FineService::new(http.clone(), routes.clone(), config.fallback_delay),
            admin: AdminService::new(http.clone(), routes.clone(), listings.clone()),
            citizen: CitizenService::new(http.clone(), routes.clone()),
            http,
            routes,
            listings,
        })
    }

    /// Auth for the mobile app.
    pub fn auth(&self) -> AuthService {
        self.auth_for(Portal::Police)
    }

    /// Auth for `portal`. Session changes made through it drop the admin
    /// console's cached listings.
    pub fn auth_for(&self, portal: Portal) -> AuthService {
        AuthService::new(self.http.clone(), self.routes.clone(), portal).with_listing_cache(self.listings.clone())
    }

    pub fn fines(&self) -> &FineService {
        &self.fines
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn citizen(&self) -> &CitizenService {
        &self.citizen
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    pub fn routes(&self) -> &TrafficClient {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::Credentials;

    fn police_listing(name: &str) -> serde_json::Value {
        json!({
            "success": true,
            "count": 1,
            "data": [{"_id": "p1", "id": "OFF001", "name": name, "accountType": "officer"}]
        })
    }

    #[tokio::test(start_paused = true)]
    async fn listings_do_not_outlive_the_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, &json!({"token": "t1", "accountType": "admin", "id": "ADM1", "name": "Ann"}));
        transport.push_json(200, &police_listing("John Smith"));
        transport.push_json(200, &json!({"token": "t2", "accountType": "admin", "id": "ADM2", "name": "Bo"}));
        transport.push_json(200, &police_listing("Johnny Smith"));
        let http = Arc::new(HttpClient::new(transport.clone(), Arc::new(MemorySessionStore::new())));
        let config = ClientConfig::admin_console("http://api.test/api");
        let api = TrafficApi::with_http(&config, http).unwrap();
        let auth = api.auth_for(Portal::Admin);
        let login = |id: &str| Credentials {
            id: id.to_string(),
            password: "admin123".to_string(),
        };

        auth.login(&login("ADM1")).await.unwrap();
        api.admin().police_accounts().await.unwrap();
        auth.logout().await.unwrap();
        auth.login(&login("ADM2")).await.unwrap();

        let listing = api.admin().police_accounts().await.unwrap();
        assert_eq!(listing.data[0].name, "Johnny Smith");
        assert_eq!(transport.request_count(), 4);
    }
}
