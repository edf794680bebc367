//! The dashboard's single state owner.
//!
//! Every user action is a method here. Methods take `&self` and lock the view
//! state only between backend calls, never across one, so several actions can
//! be in flight at once (ingestion for one site while another site's rows
//! load) the way a UI event loop would interleave them.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use seo_engine_core::{
    api::{CollectionReceipt, DashboardApi, HealthStatus},
    config::Config,
    error::DashboardError,
    fetch_state::{FetchKey, FetchTracker},
    query::{Device, Preset, Source},
    site::SiteId,
};

use crate::export::{self, ExportError, ExportedFile};
use crate::issues::{self, AnalysisOutcome};
use crate::registry;
use crate::sources::{AnalyticsSessions, CollectionOptions, DataSource, SearchPerformance};
use crate::state::{NoticeLevel, SiteActivity, ViewSlot, ViewSnapshot, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    Collected(CollectionReceipt),
    /// A collection for the same site and source is still running.
    AlreadyInFlight,
}

/// Whether a retrieval response made it onto the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    Applied,
    /// A newer request for the same view was issued, or the site is no
    /// longer selected.
    Superseded,
    /// Nothing to retrieve (no site selected, or the page did not move).
    Skipped,
}

pub struct ViewCoordinator {
    api: Arc<dyn DashboardApi>,
    search: SearchPerformance,
    analytics: AnalyticsSessions,
    tracker: FetchTracker,
    state: Mutex<ViewState>,
}

impl ViewCoordinator {
    pub fn new(api: Arc<dyn DashboardApi>, config: &Config) -> Self {
        Self {
            search: SearchPerformance::new(Arc::clone(&api)),
            analytics: AnalyticsSessions::new(Arc::clone(&api)),
            api,
            tracker: FetchTracker::new(),
            state: Mutex::new(ViewState::new(config)),
        }
    }

    pub fn tracker(&self) -> &FetchTracker {
        &self.tracker
    }

    pub fn is_fetching(&self, key: &FetchKey) -> bool {
        self.tracker.is_fetching(key)
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        let state = self.state.lock().await;
        state.snapshot(|site_id| SiteActivity {
            search_collecting: self
                .tracker
                .is_fetching(&FetchKey::SearchCollection(site_id.clone())),
            analytics_collecting: self
                .tracker
                .is_fetching(&FetchKey::AnalyticsCollection(site_id.clone())),
        })
    }

    // ---------------------------------------------------------------------
    // Startup and registry
    // ---------------------------------------------------------------------

    /// Check backend health, then load the site list.
    pub async fn start(&self) -> Result<HealthStatus, DashboardError> {
        match self.api.health().await {
            Ok(health) => {
                info!(status = %health.status, "Backend reachable");
                {
                    let mut state = self.state.lock().await;
                    state.health = Some(health.clone());
                    state.backend_error = None;
                }
                self.reload_sites_in_background().await;
                Ok(health)
            }
            Err(e) => {
                warn!(error = %e, "Backend health check failed");
                let mut state = self.state.lock().await;
                state.health = None;
                state.backend_error = Some(e.to_string());
                state.notify(NoticeLevel::Error, "Cannot connect to backend");
                Err(e)
            }
        }
    }

    /// Replace the site list with the backend's. If the selected site is gone
    /// the per-site views go with it.
    pub async fn reload_sites(&self) -> Result<usize, DashboardError> {
        let sites = registry::fetch_sites(self.api.as_ref()).await?;
        let count = sites.len();
        let refresh_issues = {
            let mut state = self.state.lock().await;
            state.registry.replace(sites);
            let selected = state.selected_site.clone();
            match selected {
                Some(id) if !state.registry.contains(&id) => {
                    info!(site_id = %id, "Selected site no longer listed; clearing view");
                    state.clear_selection();
                    None
                }
                Some(id) if state.issues.is_visible() => Some(id),
                _ => None,
            }
        };
        if let Some(site_id) = refresh_issues {
            self.refresh_issues_in_background(&site_id).await;
        }
        Ok(count)
    }

    async fn reload_sites_in_background(&self) {
        if let Err(e) = self.reload_sites().await {
            warn!(error = %e, "Site list reload failed");
        }
    }

    pub async fn toggle_add_site_form(&self) {
        let mut state = self.state.lock().await;
        state.add_form.open = !state.add_form.open;
    }

    pub async fn edit_add_site_form(&self, domain: &str, sitemap_url: &str) {
        let mut state = self.state.lock().await;
        state.add_form.domain = domain.to_string();
        state.add_form.sitemap_url = sitemap_url.to_string();
    }

    /// Submit whatever the add-site form currently holds.
    pub async fn submit_add_site_form(&self) -> Result<(), DashboardError> {
        let (domain, sitemap_url) = {
            let state = self.state.lock().await;
            (state.add_form.domain.clone(), state.add_form.sitemap_url.clone())
        };
        self.add_site(&domain, &sitemap_url).await
    }

    pub async fn add_site(&self, domain: &str, sitemap_url: &str) -> Result<(), DashboardError> {
        match registry::submit_site(self.api.as_ref(), domain, sitemap_url).await {
            Ok(_) => {
                {
                    let mut state = self.state.lock().await;
                    state.add_form = Default::default();
                    state.notify(NoticeLevel::Success, "Site added successfully!");
                }
                self.reload_sites_in_background().await;
                Ok(())
            }
            Err(e) => {
                self.state.lock().await.notify_error(&e);
                Err(e)
            }
        }
    }

    /// First half of the destructive-action guard: remember what to delete
    /// and return the confirmation prompt.
    pub async fn request_delete_site(&self, site_id: &SiteId) -> Result<String, DashboardError> {
        let mut state = self.state.lock().await;
        let domain = match state.registry.require(site_id).map(|site| site.domain.clone()) {
            Ok(domain) => domain,
            Err(e) => {
                state.notify_error(&e);
                return Err(e);
            }
        };
        state.pending_deletion = Some(site_id.clone());
        Ok(format!(
            "Delete {domain}? All collected data for this site will be removed."
        ))
    }

    pub async fn cancel_delete_site(&self) {
        self.state.lock().await.pending_deletion = None;
    }

    pub async fn confirm_delete_site(&self) -> Result<SiteId, DashboardError> {
        let site_id = {
            let mut state = self.state.lock().await;
            match state.pending_deletion.take() {
                Some(id) => id,
                None => {
                    let e = DashboardError::validation("No site deletion is awaiting confirmation");
                    state.notify_error(&e);
                    return Err(e);
                }
            }
        };

        if let Err(e) = registry::remove_site(self.api.as_ref(), &site_id).await {
            self.state.lock().await.notify_error(&e);
            return Err(e);
        }

        {
            let mut state = self.state.lock().await;
            if state.is_selected(&site_id) {
                state.clear_selection();
            }
            state.notify(NoticeLevel::Success, "Site deleted");
        }
        self.reload_sites_in_background().await;
        Ok(site_id)
    }

    pub async fn connect_google(&self) -> Result<String, DashboardError> {
        match self.api.oauth_url().await {
            Ok(url) => {
                info!("OAuth hand-off URL issued");
                self.state
                    .lock()
                    .await
                    .notify(NoticeLevel::Info, "Continue in the browser to connect Google");
                Ok(url)
            }
            Err(e) => {
                warn!(error = %e, "OAuth start failed");
                self.state.lock().await.notify_error(&e);
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Selection, tabs and retrieval
    // ---------------------------------------------------------------------

    async fn require_site(&self, site_id: &SiteId) -> Result<(), DashboardError> {
        let mut state = self.state.lock().await;
        let known = state.registry.require(site_id).map(|_| ());
        if let Err(e) = &known {
            state.notify_error(e);
        }
        known
    }

    pub async fn select_site(&self, site_id: &SiteId) -> Result<(), DashboardError> {
        self.require_site(site_id).await?;
        self.state.lock().await.select(site_id);
        Ok(())
    }

    /// Close the result table. Selection and filters stay.
    pub async fn close_results(&self) {
        let mut state = self.state.lock().await;
        state.search_results = None;
        state.session_results = None;
    }

    pub async fn view_search_data(&self, site_id: &SiteId) -> Result<Retrieval, DashboardError> {
        self.show(&self.search, site_id).await
    }

    pub async fn view_analytics_data(&self, site_id: &SiteId) -> Result<Retrieval, DashboardError> {
        self.show(&self.analytics, site_id).await
    }

    async fn show<S: DataSource>(
        &self,
        source: &S,
        site_id: &SiteId,
    ) -> Result<Retrieval, DashboardError> {
        self.require_site(site_id).await?;
        {
            let mut state = self.state.lock().await;
            state.select(site_id);
            state.active_tab = S::SOURCE;
        }
        self.retrieve_into(source, site_id).await
    }

    pub async fn set_active_tab(&self, tab: Source) -> Result<Retrieval, DashboardError> {
        {
            let mut state = self.state.lock().await;
            state.active_tab = tab;
        }
        self.refresh_active().await
    }

    /// Re-run the retrieval behind the visible table.
    pub async fn refresh_active(&self) -> Result<Retrieval, DashboardError> {
        let (site_id, tab) = {
            let state = self.state.lock().await;
            match &state.selected_site {
                Some(id) => (id.clone(), state.active_tab),
                None => return Ok(Retrieval::Skipped),
            }
        };
        match tab {
            Source::SearchPerformance => self.retrieve_into(&self.search, &site_id).await,
            Source::AnalyticsSessions => self.retrieve_into(&self.analytics, &site_id).await,
        }
    }

    /// Issue one retrieval and apply it only if it is still the newest for
    /// its (site, source) and the site is still selected.
    async fn retrieve_into<S: DataSource>(
        &self,
        source: &S,
        site_id: &SiteId,
    ) -> Result<Retrieval, DashboardError> {
        let slot = ViewSlot::Results(S::SOURCE);
        let (query, token) = {
            let mut state = self.state.lock().await;
            let query = state.query.compose(S::SOURCE);
            (query, state.tokens.issue(site_id, slot))
        };

        let result = source.retrieve(site_id, &query).await;

        let mut state = self.state.lock().await;
        if !state.tokens.is_latest(site_id, slot, token) || !state.is_selected(site_id) {
            debug!(site_id = %site_id, source = ?S::SOURCE, token, "Discarding superseded retrieval");
            return Ok(Retrieval::Superseded);
        }
        match result {
            Ok(page) => {
                debug!(
                    site_id = %site_id,
                    source = ?S::SOURCE,
                    rows = page.rows.len(),
                    page = page.current_page,
                    "Retrieval applied"
                );
                *S::slot(&mut state) = Some(page);
                Ok(Retrieval::Applied)
            }
            Err(e) => {
                warn!(site_id = %site_id, source = ?S::SOURCE, error = %e, "Retrieval failed");
                state.notify_error(&e);
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Filters and pagination
    // ---------------------------------------------------------------------

    pub async fn set_device_filter(&self, device: Option<Device>) -> Result<Retrieval, DashboardError> {
        self.state.lock().await.query.set_device(device);
        self.refresh_active().await
    }

    pub async fn set_country_filter(&self, country: Option<&str>) -> Result<Retrieval, DashboardError> {
        self.state.lock().await.query.set_country(country);
        self.refresh_active().await
    }

    pub async fn set_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Retrieval, DashboardError> {
        {
            let mut state = self.state.lock().await;
            if let Err(e) = state.query.set_date_range(start, end) {
                state.notify_error(&e);
                return Err(e);
            }
        }
        self.refresh_active().await
    }

    pub async fn clear_filters(&self) -> Result<Retrieval, DashboardError> {
        self.state.lock().await.query.clear_filters();
        self.refresh_active().await
    }

    /// Pick the ingestion window. Does not touch the visible rows.
    pub async fn set_preset(&self, preset: Preset) {
        self.state.lock().await.query.set_preset(preset);
    }

    pub async fn next_page(&self) -> Result<Retrieval, DashboardError> {
        self.step_page(1).await
    }

    pub async fn previous_page(&self) -> Result<Retrieval, DashboardError> {
        self.step_page(-1).await
    }

    async fn step_page(&self, delta: i64) -> Result<Retrieval, DashboardError> {
        let target = {
            let state = self.state.lock().await;
            let tab = state.active_tab;
            let pager = match tab {
                Source::SearchPerformance => state.search_results.as_ref().map(|p| p.pagination()),
                Source::AnalyticsSessions => state.session_results.as_ref().map(|p| p.pagination()),
            };
            match pager {
                Some(p) if delta > 0 && p.next_enabled => p.current_page + 1,
                Some(p) if delta < 0 && p.previous_enabled => p.current_page - 1,
                _ => return Ok(Retrieval::Skipped),
            }
        };
        self.go_to_page(target).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<Retrieval, DashboardError> {
        {
            let mut state = self.state.lock().await;
            if state.selected_site.is_none() {
                return Ok(Retrieval::Skipped);
            }
            let tab = state.active_tab;
            state.query.set_page(tab, page);
        }
        self.refresh_active().await
    }

    // ---------------------------------------------------------------------
    // Ingestion
    // ---------------------------------------------------------------------

    async fn collection_options(&self, property_id: Option<&str>) -> CollectionOptions {
        CollectionOptions {
            days: self.state.lock().await.query.collection_days(),
            property_id: property_id.map(str::to_string),
        }
    }

    pub async fn fetch_search_data(&self, site_id: &SiteId) -> Result<CollectionOutcome, DashboardError> {
        let options = self.collection_options(None).await;
        self.collect(&self.search, site_id, options).await
    }

    pub async fn fetch_analytics_data(
        &self,
        site_id: &SiteId,
        property_id: Option<&str>,
    ) -> Result<CollectionOutcome, DashboardError> {
        let options = self.collection_options(property_id).await;
        self.collect(&self.analytics, site_id, options).await
    }

    async fn collect<S: DataSource>(
        &self,
        source: &S,
        site_id: &SiteId,
        options: CollectionOptions,
    ) -> Result<CollectionOutcome, DashboardError> {
        self.require_site(site_id).await?;
        let request = match source.collection_request(site_id, &options) {
            Ok(request) => request,
            Err(e) => {
                self.state.lock().await.notify_error(&e);
                return Err(e);
            }
        };

        let key = FetchKey::collection(S::SOURCE, site_id);
        let result = {
            let Some(guard) = self.tracker.try_begin(key) else {
                debug!(site_id = %site_id, source = ?S::SOURCE, "Collection already in flight");
                return Ok(CollectionOutcome::AlreadyInFlight);
            };
            debug!(key = ?guard.key(), "Collection started");
            source.trigger_collection(&request).await
        };

        match result {
            Ok(receipt) => {
                self.state
                    .lock()
                    .await
                    .notify(NoticeLevel::Success, receipt.message.clone());
                if let Err(e) = self.show(source, site_id).await {
                    warn!(site_id = %site_id, error = %e, "Refresh after collection failed");
                }
                Ok(CollectionOutcome::Collected(receipt))
            }
            Err(e) => {
                self.state.lock().await.notify_error(&e);
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Issues
    // ---------------------------------------------------------------------

    /// Select `site_id`, load its issues and open the panel.
    pub async fn load_issues(&self, site_id: &SiteId) -> Result<Retrieval, DashboardError> {
        self.require_site(site_id).await?;
        self.state.lock().await.select(site_id);
        let result = self.fetch_issues(site_id, true).await;
        if let Err(e) = &result {
            self.state.lock().await.notify_error(e);
        }
        result
    }

    pub async fn toggle_issues(&self) {
        self.state.lock().await.issues.toggle();
    }

    pub async fn close_issues(&self) {
        self.state.lock().await.issues.close();
    }

    async fn fetch_issues(&self, site_id: &SiteId, open: bool) -> Result<Retrieval, DashboardError> {
        let token = self.state.lock().await.tokens.issue(site_id, ViewSlot::Issues);
        let result = self.api.list_issues(site_id).await;

        let mut state = self.state.lock().await;
        if !state.tokens.is_latest(site_id, ViewSlot::Issues, token) || !state.is_selected(site_id) {
            debug!(site_id = %site_id, token, "Discarding superseded issue list");
            return Ok(Retrieval::Superseded);
        }
        let issues = result?;
        info!(site_id = %site_id, count = issues.len(), "Issues loaded");
        if open {
            state.issues.show(site_id, issues);
        } else {
            state.issues.refresh(site_id, issues);
        }
        Ok(Retrieval::Applied)
    }

    async fn refresh_issues_in_background(&self, site_id: &SiteId) {
        if let Err(e) = self.fetch_issues(site_id, false).await {
            warn!(site_id = %site_id, error = %e, "Background issue refresh failed");
        }
    }

    /// Run the per-page analysis; on success the site's issue list is
    /// refreshed if that site is on screen.
    pub async fn request_deep_analysis(
        &self,
        site_id: &SiteId,
        page_url: &str,
    ) -> Result<AnalysisOutcome, DashboardError> {
        self.require_site(site_id).await?;
        match issues::analyze_page(self.api.as_ref(), &self.tracker, site_id, page_url).await {
            Ok(AnalysisOutcome::Completed) => {
                let selected = {
                    let mut state = self.state.lock().await;
                    state.notify(NoticeLevel::Success, format!("Analysis complete for {}", page_url.trim()));
                    state.is_selected(site_id)
                };
                if selected {
                    if let Err(e) = self.fetch_issues(site_id, true).await {
                        warn!(site_id = %site_id, error = %e, "Issue refresh after analysis failed");
                        self.state.lock().await.notify_error(&e);
                    }
                }
                Ok(AnalysisOutcome::Completed)
            }
            Ok(AnalysisOutcome::AlreadyRunning) => Ok(AnalysisOutcome::AlreadyRunning),
            Err(e) => {
                self.state.lock().await.notify_error(&e);
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    pub async fn export_search_data(
        &self,
        site_id: &SiteId,
        dir: &Path,
    ) -> Result<ExportedFile, ExportError> {
        self.require_site(site_id).await?;
        let today = Utc::now().date_naive();
        match export::export_search_csv(self.api.as_ref(), site_id, dir, today).await {
            Ok(file) => {
                self.state.lock().await.notify(
                    NoticeLevel::Success,
                    format!("Exported {} rows to {}", file.rows, file.path.display()),
                );
                Ok(file)
            }
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "CSV export failed");
                self.state.lock().await.notify(NoticeLevel::Error, e.user_message());
                Err(e)
            }
        }
    }
}
