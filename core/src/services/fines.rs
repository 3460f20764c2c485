use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::client::TrafficClient;
use crate::error::ApiError;
use crate::fallback::attempt_with_fallback;
use crate::http_client::HttpClient;
use crate::types::{ActivitySummary, DriverRecord, Fine, FineRequest, FineStatus, Listing, Timeframe};

/// Officer-facing operations: driver lookup, issuing fines, activity.
#[derive(Debug, Clone)]
pub struct FineService {
    http: Arc<HttpClient>,
    routes: TrafficClient,
    fallback_delay: Duration,
}

impl FineService {
    pub fn new(http: Arc<HttpClient>, routes: TrafficClient, fallback_delay: Duration) -> Self {
        Self {
            http,
            routes,
            fallback_delay,
        }
    }

    /// Look a driver up by licence number. Whitespace around the number is
    /// ignored. Tries the direct lookup, then the public search.
    pub async fn search_user_by_license(&self, license: &str) -> Result<DriverRecord, ApiError> {
        let primary = self.routes.build_find_license(license)?;
        let fallback = self.routes.build_public_search(license)?;
        let served = attempt_with_fallback(
            "license search",
            self.http.send(primary),
            self.http.send(fallback),
            |resp| self.routes.parse_driver_search(resp),
        )
        .await?;
        debug!(tier = ?served.tier, dl_number = %served.value.dl_number, "driver found");
        Ok(served.value)
    }

    /// Direct lookup only, returning the raw payload.
    pub async fn test_find_by_license(&self, license: &str) -> Result<Value, ApiError> {
        let request = self.routes.build_find_license(license)?;
        self.routes.parse_json(self.http.send(request).await?)
    }

    /// Issue a fine. Required fields are checked before anything is sent.
    /// The public endpoint is only tried, after `fallback_delay`, when the
    /// direct one fails.
    pub async fn issue_fine(&self, fine: &FineRequest) -> Result<Fine, ApiError> {
        fine.validate()?;
        let primary = self.routes.build_create_fine(fine)?;
        let fallback = self.routes.build_public_issue(fine)?;
        let served = attempt_with_fallback(
            "issue fine",
            self.http.send(primary),
            async {
                tokio::time::sleep(self.fallback_delay).await;
                self.http.send(fallback).await
            },
            |resp| self.routes.parse_fine(resp),
        )
        .await?;
        info!(tier = ?served.tier, fine_id = %served.value.record_id, "fine issued");
        Ok(served.value)
    }

    /// Direct creation only.
    pub async fn test_create_fine(&self, fine: &FineRequest) -> Result<Fine, ApiError> {
        fine.validate()?;
        let request = self.routes.build_create_fine(fine)?;
        self.routes.parse_fine(self.http.send(request).await?)
    }

    /// Activity of the logged-in officer. Check `is_mock_data` before
    /// presenting the figures.
    pub async fn officer_activity(&self, timeframe: Timeframe) -> Result<ActivitySummary, ApiError> {
        let request = self.routes.build_officer_activity(timeframe);
        let summary = self.routes.parse_officer_activity(self.http.send(request).await?)?;
        if summary.is_mock_data {
            info!(%timeframe, "server returned placeholder activity figures");
        }
        Ok(summary)
    }

    pub async fn user_fines(&self, user_id: &str) -> Result<Vec<Fine>, ApiError> {
        let request = self.routes.build_user_fines(user_id)?;
        self.routes.parse_fines(self.http.send(request).await?)
    }

    pub async fn fine_details(&self, fine_id: &str) -> Result<Fine, ApiError> {
        let request = self.routes.build_fine_details(fine_id)?;
        self.routes.parse_fine(self.http.send(request).await?)
    }

    pub async fn update_fine_status(&self, fine_id: &str, status: FineStatus) -> Result<Fine, ApiError> {
        let request = self.routes.build_update_fine_status(fine_id, status)?;
        self.routes.parse_fine(self.http.send(request).await?)
    }

    /// Debug listing of every registered driver.
    pub async fn all_users(&self) -> Result<Listing<Value>, ApiError> {
        let request = self.routes.build_all_users();
        self.routes.parse_listing(self.http.send(request).await?)
    }

    /// Debug check of how the server sees the current token.
    pub async fn auth_status(&self) -> Result<Value, ApiError> {
        let request = self.routes.build_auth_status();
        self.routes.parse_json(self.http.send(request).await?)
    }
}
