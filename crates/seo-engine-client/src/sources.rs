//! Adapters for the two metric providers.
//!
//! Each adapter knows how to ask the backend to ingest a window of data and
//! how to read back a page of already-collected rows. Where a page lands in
//! the view state is part of the adapter too, so the coordinator can drive
//! both through one generic path.

use std::sync::Arc;

use tracing::{info, warn};

use seo_engine_core::{
    api::{AnalyticsCollectionRequest, CollectionReceipt, DashboardApi, SearchCollectionRequest},
    error::DashboardError,
    metrics::{ResultPage, SearchRow, SessionRow},
    query::{RetrievalQuery, Source},
    site::SiteId,
};

use crate::state::ViewState;

/// Caller-supplied collection parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionOptions {
    pub days: u32,
    /// Required by the analytics source, ignored by search performance.
    pub property_id: Option<String>,
}

#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    type Row: Clone + Send + Sync + 'static;
    type Request: Send + Sync;

    const SOURCE: Source;

    /// Build the ingestion request, failing before any network call when a
    /// precondition is missing.
    fn collection_request(
        &self,
        site_id: &SiteId,
        options: &CollectionOptions,
    ) -> Result<Self::Request, DashboardError>;

    async fn trigger_collection(
        &self,
        request: &Self::Request,
    ) -> Result<CollectionReceipt, DashboardError>;

    async fn retrieve(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<ResultPage<Self::Row>, DashboardError>;

    fn slot(state: &mut ViewState) -> &mut Option<ResultPage<Self::Row>>;
}

pub struct SearchPerformance {
    api: Arc<dyn DashboardApi>,
}

impl SearchPerformance {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl DataSource for SearchPerformance {
    type Row = SearchRow;
    type Request = SearchCollectionRequest;

    const SOURCE: Source = Source::SearchPerformance;

    fn collection_request(
        &self,
        site_id: &SiteId,
        options: &CollectionOptions,
    ) -> Result<Self::Request, DashboardError> {
        Ok(SearchCollectionRequest {
            site_id: site_id.clone(),
            days: options.days,
        })
    }

    async fn trigger_collection(
        &self,
        request: &Self::Request,
    ) -> Result<CollectionReceipt, DashboardError> {
        info!(site_id = %request.site_id, days = request.days, "Search Console collection started");
        let result = self.api.collect_search_data(request).await;
        match &result {
            Ok(receipt) => info!(site_id = %request.site_id, message = %receipt.message, "Search Console collection finished"),
            Err(DashboardError::Application { tried_url, .. }) => warn!(
                site_id = %request.site_id,
                tried_url = tried_url.as_deref().unwrap_or("-"),
                "Search Console collection rejected"
            ),
            Err(e) => warn!(site_id = %request.site_id, error = %e, "Search Console collection failed"),
        }
        result
    }

    async fn retrieve(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<ResultPage<SearchRow>, DashboardError> {
        let body = self.api.search_page(site_id, query).await?;
        Ok(ResultPage::from_search(body, query.page, query.per_page))
    }

    fn slot(state: &mut ViewState) -> &mut Option<ResultPage<SearchRow>> {
        &mut state.search_results
    }
}

pub struct AnalyticsSessions {
    api: Arc<dyn DashboardApi>,
}

impl AnalyticsSessions {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl DataSource for AnalyticsSessions {
    type Row = SessionRow;
    type Request = AnalyticsCollectionRequest;

    const SOURCE: Source = Source::AnalyticsSessions;

    fn collection_request(
        &self,
        site_id: &SiteId,
        options: &CollectionOptions,
    ) -> Result<Self::Request, DashboardError> {
        let property_id = options
            .property_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DashboardError::validation("Please enter your GA4 Property ID"))?;
        Ok(AnalyticsCollectionRequest {
            site_id: site_id.clone(),
            property_id: property_id.to_string(),
            days: options.days,
        })
    }

    async fn trigger_collection(
        &self,
        request: &Self::Request,
    ) -> Result<CollectionReceipt, DashboardError> {
        info!(
            site_id = %request.site_id,
            property_id = %request.property_id,
            days = request.days,
            "GA4 collection started"
        );
        let result = self.api.collect_analytics_data(request).await;
        match &result {
            Ok(receipt) => info!(site_id = %request.site_id, message = %receipt.message, "GA4 collection finished"),
            Err(e) => warn!(site_id = %request.site_id, error = %e, "GA4 collection failed"),
        }
        result
    }

    async fn retrieve(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<ResultPage<SessionRow>, DashboardError> {
        let body = self.api.session_page(site_id, query).await?;
        Ok(ResultPage::from_sessions(body, query.page, query.per_page))
    }

    fn slot(state: &mut ViewState) -> &mut Option<ResultPage<SessionRow>> {
        &mut state.session_results
    }
}
