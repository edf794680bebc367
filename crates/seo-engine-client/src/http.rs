use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use seo_engine_core::{
    api::{
        Ack, AnalyticsCollectionRequest, CollectionReceipt, CollectionResponse, ConnectResponse,
        CsvExport, DashboardApi, DeepAnalysisRequest, ExportResponse, HealthStatus,
        SearchCollectionRequest, SitesResponse,
    },
    error::DashboardError,
    issue::{Issue, IssuesResponse},
    metrics::{SearchPageResponse, SessionPageResponse},
    query::RetrievalQuery,
    site::{NewSite, Site, SiteId},
};

use crate::config::Config;

/// `reqwest` client for the dashboard backend.
///
/// Every endpoint exchanges JSON. Paths are assembled from URL segments so
/// site ids are escaped rather than spliced into the string.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self, DashboardError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| DashboardError::validation(format!("invalid API URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DashboardError::validation("API URL must be an http(s) origin"));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout())
            .build()
            .map_err(DashboardError::transport)?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DashboardError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::validation("API URL must be an http(s) origin"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DashboardError> {
        let response = request.send().await.map_err(DashboardError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(DashboardError::transport)?;

        if !status.is_success() {
            // A `{success: false, error}` payload carries a message worth
            // showing even on an error status.
            if let Ok(ack) = serde_json::from_str::<Ack>(&body) {
                if ack.error.is_some() {
                    ack.into_result()?;
                }
            }
            return Err(DashboardError::Transport(format!(
                "backend responded with status {status}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| DashboardError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, DashboardError> {
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &RetrievalQuery,
    ) -> Result<T, DashboardError> {
        debug!(%url, page = query.page, "GET");
        self.send(self.client.get(url).query(&query.to_pairs())).await
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, DashboardError> {
        debug!(%url, "POST");
        self.send(self.client.post(url).json(body)).await
    }
}

#[async_trait::async_trait]
impl DashboardApi for HttpApi {
    async fn health(&self) -> Result<HealthStatus, DashboardError> {
        self.get(self.endpoint(&["health"])?).await
    }

    async fn list_sites(&self) -> Result<Vec<Site>, DashboardError> {
        let body: SitesResponse = self.get(self.endpoint(&["api", "sites"])?).await?;
        Ok(body.sites)
    }

    async fn add_site(&self, site: &NewSite) -> Result<(), DashboardError> {
        let ack: Ack = self.post(self.endpoint(&["api", "sites"])?, site).await?;
        ack.into_result()
    }

    async fn delete_site(&self, site_id: &SiteId) -> Result<(), DashboardError> {
        let url = self.endpoint(&["api", "sites", site_id.as_str()])?;
        debug!(%url, "DELETE");
        let ack: Ack = self.send(self.client.delete(url)).await?;
        ack.into_result()
    }

    async fn oauth_url(&self) -> Result<String, DashboardError> {
        let body: ConnectResponse = self.get(self.endpoint(&["api", "connect"])?).await?;
        body.into_result()
    }

    async fn collect_search_data(
        &self,
        request: &SearchCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError> {
        let body: CollectionResponse = self
            .post(self.endpoint(&["api", "fetch-gsc-data"])?, request)
            .await?;
        body.into_result()
    }

    async fn search_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SearchPageResponse, DashboardError> {
        let url = self.endpoint(&["api", "gsc-data", site_id.as_str()])?;
        self.get_with_query(url, query).await
    }

    async fn collect_analytics_data(
        &self,
        request: &AnalyticsCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError> {
        let body: CollectionResponse = self
            .post(self.endpoint(&["api", "fetch-ga4-data"])?, request)
            .await?;
        body.into_result()
    }

    async fn session_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SessionPageResponse, DashboardError> {
        let url = self.endpoint(&["api", "ga4-data", site_id.as_str()])?;
        self.get_with_query(url, query).await
    }

    async fn list_issues(&self, site_id: &SiteId) -> Result<Vec<Issue>, DashboardError> {
        let body: IssuesResponse = self
            .get(self.endpoint(&["api", "issues", site_id.as_str()])?)
            .await?;
        Ok(body.issues)
    }

    async fn analyze_page(&self, request: &DeepAnalysisRequest) -> Result<(), DashboardError> {
        let ack: Ack = self
            .post(self.endpoint(&["api", "analyze-page-deep"])?, request)
            .await?;
        ack.into_result()
    }

    async fn export_search_data(&self, site_id: &SiteId) -> Result<CsvExport, DashboardError> {
        let body: ExportResponse = self
            .get(self.endpoint(&["api", "export-gsc-data", site_id.as_str()])?)
            .await?;
        body.into_result()
    }
}
