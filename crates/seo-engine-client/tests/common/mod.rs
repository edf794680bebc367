#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use seo_engine_client::coordinator::ViewCoordinator;
use seo_engine_core::{
    api::{
        AnalyticsCollectionRequest, CollectionReceipt, CsvExport, DashboardApi,
        DeepAnalysisRequest, HealthStatus, SearchCollectionRequest, ServiceStatus,
    },
    config::Config,
    error::DashboardError,
    issue::{Issue, Severity},
    metrics::{SearchPageResponse, SearchRow, SessionPageResponse, SessionRow},
    query::RetrievalQuery,
    site::{NewSite, Site, SiteId},
};

/// In-memory backend with call recording, one-shot gates and scripted
/// failures.
///
/// Every call is recorded under a label such as `gsc:1:2` (search rows for
/// site 1, page 2) or `collect_ga4:1`. A gate registered for a label holds the
/// next call with that label until the test releases it.
#[derive(Default)]
pub struct FakeApi {
    sites: Mutex<Vec<Site>>,
    issues: Mutex<HashMap<SiteId, Vec<Issue>>>,
    search_total: Mutex<u64>,
    session_total: Mutex<u64>,
    calls: Mutex<Vec<String>>,
    queries: Mutex<Vec<RetrievalQuery>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failures: Mutex<HashMap<String, DashboardError>>,
}

pub fn site(id: &str, domain: &str) -> Site {
    Site {
        id: SiteId::from(id),
        domain: domain.to_string(),
        sitemap_url: format!("https://{domain}/sitemap.xml"),
        last_scan_at: None,
    }
}

pub fn issue(id: i64, severity: Severity, kind: &str) -> Issue {
    Issue {
        id: serde_json::json!(id),
        issue_type: kind.to_string(),
        severity,
        description: format!("{kind} detected"),
        suggestion: "Fix it".to_string(),
        created_at: None,
    }
}

impl FakeApi {
    pub fn with_sites(sites: Vec<Site>) -> Arc<Self> {
        let api = Self::default();
        *api.sites.lock().expect("lock") = sites;
        *api.search_total.lock().expect("lock") = 120;
        *api.session_total.lock().expect("lock") = 10;
        Arc::new(api)
    }

    pub fn set_sites(&self, sites: Vec<Site>) {
        *self.sites.lock().expect("lock") = sites;
    }

    pub fn set_issues(&self, site_id: &str, issues: Vec<Issue>) {
        self.issues
            .lock()
            .expect("lock")
            .insert(SiteId::from(site_id), issues);
    }

    pub fn set_search_total(&self, total: u64) {
        *self.search_total.lock().expect("lock") = total;
    }

    /// Hold the next call labelled `label` until the returned gate is
    /// notified. `notify_one` before the call arrives lets it straight through.
    pub fn gate(&self, label: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("lock")
            .insert(label.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn fail(&self, label: &str, err: DashboardError) {
        self.failures
            .lock()
            .expect("lock")
            .insert(label.to_string(), err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn last_query(&self) -> Option<RetrievalQuery> {
        self.queries.lock().expect("lock").last().cloned()
    }

    async fn enter(&self, label: String) -> Result<(), DashboardError> {
        self.calls.lock().expect("lock").push(label.clone());
        let gate = self.gates.lock().expect("lock").remove(&label);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().expect("lock").get(&label) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DashboardApi for FakeApi {
    async fn health(&self) -> Result<HealthStatus, DashboardError> {
        self.enter("health".to_string()).await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            services: ServiceStatus {
                database: Some("connected".to_string()),
                ..ServiceStatus::default()
            },
        })
    }

    async fn list_sites(&self) -> Result<Vec<Site>, DashboardError> {
        self.enter("list_sites".to_string()).await?;
        Ok(self.sites.lock().expect("lock").clone())
    }

    async fn add_site(&self, new_site: &NewSite) -> Result<(), DashboardError> {
        self.enter(format!("add_site:{}", new_site.domain())).await?;
        let mut sites = self.sites.lock().expect("lock");
        let id = (sites.len() + 1).to_string();
        sites.push(site(&id, new_site.domain()));
        Ok(())
    }

    async fn delete_site(&self, site_id: &SiteId) -> Result<(), DashboardError> {
        self.enter(format!("delete_site:{site_id}")).await?;
        self.sites.lock().expect("lock").retain(|s| &s.id != site_id);
        Ok(())
    }

    async fn oauth_url(&self) -> Result<String, DashboardError> {
        self.enter("oauth".to_string()).await?;
        Ok("https://accounts.example.com/auth".to_string())
    }

    async fn collect_search_data(
        &self,
        request: &SearchCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError> {
        self.enter(format!("collect_gsc:{}", request.site_id)).await?;
        Ok(CollectionReceipt {
            message: format!("Collected {} days of Search Console data", request.days),
            date_range: None,
        })
    }

    async fn search_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SearchPageResponse, DashboardError> {
        self.queries.lock().expect("lock").push(query.clone());
        self.enter(format!("gsc:{site_id}:{}", query.page)).await?;
        let total = *self.search_total.lock().expect("lock");
        Ok(SearchPageResponse {
            pages: vec![SearchRow {
                url: format!("/{site_id}/page-{}", query.page),
                impressions: 100,
                clicks: 5,
                ctr: 0.05,
                position: 2.0,
                ..SearchRow::default()
            }],
            total: Some(total),
            total_pages: None,
        })
    }

    async fn collect_analytics_data(
        &self,
        request: &AnalyticsCollectionRequest,
    ) -> Result<CollectionReceipt, DashboardError> {
        self.enter(format!("collect_ga4:{}", request.site_id)).await?;
        Ok(CollectionReceipt {
            message: format!("Collected GA4 property {}", request.property_id),
            date_range: None,
        })
    }

    async fn session_page(
        &self,
        site_id: &SiteId,
        query: &RetrievalQuery,
    ) -> Result<SessionPageResponse, DashboardError> {
        self.queries.lock().expect("lock").push(query.clone());
        self.enter(format!("ga4:{site_id}:{}", query.page)).await?;
        let total = *self.session_total.lock().expect("lock");
        Ok(SessionPageResponse {
            pages: vec![SessionRow {
                page_path: format!("/{site_id}/landing"),
                sessions: 10,
                ..SessionRow::default()
            }],
            count: Some(total),
        })
    }

    async fn list_issues(&self, site_id: &SiteId) -> Result<Vec<Issue>, DashboardError> {
        self.enter(format!("issues:{site_id}")).await?;
        Ok(self
            .issues
            .lock()
            .expect("lock")
            .get(site_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn analyze_page(&self, request: &DeepAnalysisRequest) -> Result<(), DashboardError> {
        self.enter(format!("analyze:{}", request.page_url)).await
    }

    async fn export_search_data(&self, site_id: &SiteId) -> Result<CsvExport, DashboardError> {
        self.enter(format!("export:{site_id}")).await?;
        Ok(CsvExport {
            csv_data: "url,clicks\n/a,1\n/b,2\n".to_string(),
            rows_count: Some(2),
        })
    }
}

pub fn test_config() -> Config {
    Config {
        api_url: "http://127.0.0.1:9".to_string(),
        page_size: 50,
        ..Config::default()
    }
}

/// A coordinator over `api` with the site list already loaded.
pub async fn coordinator(api: &Arc<FakeApi>) -> ViewCoordinator {
    let shared: Arc<dyn DashboardApi> = Arc::clone(api) as Arc<dyn DashboardApi>;
    let coordinator = ViewCoordinator::new(shared, &test_config());
    coordinator.reload_sites().await.expect("load sites");
    coordinator
}
