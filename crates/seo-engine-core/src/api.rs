//! Backend abstraction and the JSON shapes exchanged with it.

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::issue::Issue;
use crate::metrics::{SearchPageResponse, SessionPageResponse};
use crate::query::RetrievalQuery;
use crate::site::{NewSite, Site, SiteId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub database: Option<String>,
    pub oauth: Option<String>,
    pub ai: Option<String>,
    pub serper: Option<String>,
}

/// Body of `GET /health`.
///
/// Accepts both `{status, services: {...}}` and the flat
/// `{status, database, oauth}` form; flat fields fill gaps in `services`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHealth")]
pub struct HealthStatus {
    pub status: String,
    pub services: ServiceStatus,
}

#[derive(Deserialize)]
struct RawHealth {
    #[serde(default)]
    status: String,
    #[serde(default)]
    services: Option<ServiceStatus>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    oauth: Option<String>,
    #[serde(default)]
    ai: Option<String>,
    #[serde(default)]
    serper: Option<String>,
}

impl From<RawHealth> for HealthStatus {
    fn from(raw: RawHealth) -> Self {
        let mut services = raw.services.unwrap_or_default();
        services.database = services.database.or(raw.database);
        services.oauth = services.oauth.or(raw.oauth);
        services.ai = services.ai.or(raw.ai);
        services.serper = services.serper.or(raw.serper);
        Self {
            status: raw.status,
            services,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitesResponse {
    #[serde(default)]
    pub sites: Vec<Site>,
}

/// The `{success, error, solution?, tried_url?}` envelope shared by every
/// mutating endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub tried_url: Option<String>,
}

impl Ack {
    pub fn into_result(self) -> Result<(), DashboardError> {
        if self.success {
            return Ok(());
        }
        Err(DashboardError::Application {
            message: self.error.unwrap_or_else(|| "Unknown error".to_string()),
            solution: self.solution,
            tried_url: self.tried_url,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectResponse {
    #[serde(default, alias = "auth_url")]
    pub oauth_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConnectResponse {
    pub fn into_result(self) -> Result<String, DashboardError> {
        match (self.oauth_url, self.error) {
            (Some(url), _) if !url.is_empty() => Ok(url),
            (_, Some(error)) => Err(DashboardError::application(error)),
            _ => Err(DashboardError::Decode(
                "connect response carried no oauth_url".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCollectionRequest {
    pub site_id: SiteId,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsCollectionRequest {
    pub site_id: SiteId,
    pub property_id: String,
    pub days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    #[serde(flatten)]
    pub ack: Ack,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub date_range: Option<serde_json::Value>,
}

/// What a successful ingestion reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReceipt {
    pub message: String,
    pub date_range: Option<serde_json::Value>,
}

impl CollectionResponse {
    pub fn into_result(self) -> Result<CollectionReceipt, DashboardError> {
        self.ack.into_result()?;
        Ok(CollectionReceipt {
            message: self
                .message
                .unwrap_or_else(|| "Data collection complete".to_string()),
            date_range: self.date_range,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepAnalysisRequest {
    pub site_id: SiteId,
    pub page_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportResponse {
    #[serde(flatten)]
    pub ack: Ack,
    #[serde(default)]
    pub csv_data: Option<String>,
    #[serde(default)]
    pub rows_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub csv_data: String,
    pub rows_count: Option<u64>,
}

impl ExportResponse {
    pub fn into_result(self) -> Result<CsvExport, DashboardError> {
        self.ack.into_result()?;
        Ok(CsvExport {
            csv_data: self.csv_data.unwrap_or_default(),
            rows_count: self.rows_count,
        })
    }
}

/// The backend as the dashboard sees it.
///
/// The HTTP client implements this against the live service; tests swap in
/// scripted implementations so coordinator behaviour can be driven without a
/// network.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync + 'static {
    async fn health(&self) -> Result<HealthStatus, DashboardError>;

    async fn list_sites(&self) -> Result<Vec<Site>, DashboardError>;

    async fn add_site(&self, site: &NewSite) -> Result<(), DashboardError>;

    async fn delete_site(&self, site_id: &SiteId) -> Result<(), DashboardError>;

    async fn oauth_url(&self) -> Result<String, DashboardError>;

    async fn collect_search_data(
        &self,
        request: &SearchCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError>;

    async fn search_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SearchPageResponse, DashboardError>;

    async fn collect_analytics_data(
        &self,
        request: &AnalyticsCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError>;

    async fn session_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SessionPageResponse, DashboardError>;

    async fn list_issues(&self, site_id: &SiteId) -> Result<Vec<Issue>, DashboardError>;

    async fn analyze_page(&self, request: &DeepAnalysisRequest) -> Result<(), DashboardError>;

    async fn export_search_data(&self, site_id: &SiteId) -> Result<CsvExport, DashboardError>;
}
