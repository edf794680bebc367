use std::collections::HashMap;

use seo_engine_core::{
    api::HealthStatus,
    config::Config,
    error::DashboardError,
    issue::Issue,
    metrics::{PaginationControl, ResultPage, SearchRow, SessionRow},
    query::{FilterState, QueryComposer, Source},
    site::{Site, SiteId},
};

use crate::issues::IssueViewer;
use crate::registry::SiteRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// The last user-facing message an action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSiteForm {
    pub open: bool,
    pub domain: String,
    pub sitemap_url: String,
}

/// Which view a retrieval feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewSlot {
    Results(Source),
    Issues,
}

/// Monotonic tokens per (site, slot). A response is applied only if it
/// carries the latest token issued for its key.
#[derive(Debug, Default)]
pub(crate) struct RequestTokens {
    next: u64,
    latest: HashMap<(SiteId, ViewSlot), u64>,
}

impl RequestTokens {
    pub(crate) fn issue(&mut self, site_id: &SiteId, slot: ViewSlot) -> u64 {
        self.next += 1;
        self.latest.insert((site_id.clone(), slot), self.next);
        self.next
    }

    pub(crate) fn is_latest(&self, site_id: &SiteId, slot: ViewSlot, token: u64) -> bool {
        self.latest.get(&(site_id.clone(), slot)) == Some(&token)
    }

    /// Drop every outstanding token of `site_id`; responses to requests
    /// issued before this call are no longer the latest.
    pub(crate) fn forget(&mut self, site_id: &SiteId) {
        self.latest.retain(|(id, _), _| id != site_id);
    }
}

/// Everything the dashboard shows, owned by the coordinator.
///
/// Only [`crate::coordinator::ViewCoordinator`] mutates this; readers get a
/// [`ViewSnapshot`].
#[derive(Debug)]
pub struct ViewState {
    pub health: Option<HealthStatus>,
    pub backend_error: Option<String>,
    pub registry: SiteRegistry,
    pub add_form: AddSiteForm,
    pub pending_deletion: Option<SiteId>,
    pub selected_site: Option<SiteId>,
    pub active_tab: Source,
    pub search_results: Option<ResultPage<SearchRow>>,
    pub session_results: Option<ResultPage<SessionRow>>,
    pub issues: IssueViewer,
    pub query: QueryComposer,
    pub notice: Option<Notice>,
    pub(crate) tokens: RequestTokens,
}

impl ViewState {
    pub fn new(config: &Config) -> Self {
        Self {
            health: None,
            backend_error: None,
            registry: SiteRegistry::default(),
            add_form: AddSiteForm::default(),
            pending_deletion: None,
            selected_site: None,
            active_tab: Source::SearchPerformance,
            search_results: None,
            session_results: None,
            issues: IssueViewer::default(),
            query: QueryComposer::new(config.page_size, config.default_preset),
            notice: None,
            tokens: RequestTokens::default(),
        }
    }

    pub fn is_selected(&self, site_id: &SiteId) -> bool {
        self.selected_site.as_ref() == Some(site_id)
    }

    /// Switch the selection. Per-site views of the previous site are dropped;
    /// filters are kept.
    pub(crate) fn select(&mut self, site_id: &SiteId) {
        if self.is_selected(site_id) {
            return;
        }
        if let Some(previous) = self.selected_site.take() {
            self.tokens.forget(&previous);
        }
        self.tokens.forget(site_id);
        self.selected_site = Some(site_id.clone());
        self.search_results = None;
        self.session_results = None;
        self.issues.clear();
        self.query.reset_pages();
    }

    pub(crate) fn clear_selection(&mut self) {
        if let Some(previous) = self.selected_site.take() {
            self.tokens.forget(&previous);
        }
        self.search_results = None;
        self.session_results = None;
        self.issues.clear();
        self.query.reset_pages();
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    pub(crate) fn notify_error(&mut self, err: &DashboardError) {
        self.notify(NoticeLevel::Error, err.user_message());
    }

    fn active_pagination(&self) -> Option<PaginationControl> {
        match self.active_tab {
            Source::SearchPerformance => self.search_results.as_ref().map(ResultPage::pagination),
            Source::AnalyticsSessions => self.session_results.as_ref().map(ResultPage::pagination),
        }
    }

    pub(crate) fn snapshot(&self, fetching: impl Fn(&SiteId) -> SiteActivity) -> ViewSnapshot {
        let results = match self.active_tab {
            Source::SearchPerformance => self.search_results.clone().map(ResultView::Search),
            Source::AnalyticsSessions => self.session_results.clone().map(ResultView::Sessions),
        };
        ViewSnapshot {
            health: self.health.clone(),
            backend_error: self.backend_error.clone(),
            sites: self
                .registry
                .sites()
                .iter()
                .map(|site| SiteEntry {
                    activity: fetching(&site.id),
                    selected: self.is_selected(&site.id),
                    site: site.clone(),
                })
                .collect(),
            add_form: self.add_form.clone(),
            pending_deletion: self.pending_deletion.clone(),
            selected_site: self
                .selected_site
                .as_ref()
                .and_then(|id| self.registry.get(id))
                .cloned(),
            active_tab: self.active_tab,
            filters: self.query.filters().clone(),
            pagination: self.active_pagination(),
            results,
            issues: self.issues.panel(),
            notice: self.notice.clone(),
        }
    }
}

/// In-flight flags relevant to one site row's buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteActivity {
    pub search_collecting: bool,
    pub analytics_collecting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteEntry {
    pub site: Site,
    pub selected: bool,
    pub activity: SiteActivity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Search(ResultPage<SearchRow>),
    Sessions(ResultPage<SessionRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuePanel {
    pub site_id: SiteId,
    pub issues: Vec<Issue>,
}

/// What is on screen right now.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub health: Option<HealthStatus>,
    pub backend_error: Option<String>,
    pub sites: Vec<SiteEntry>,
    pub add_form: AddSiteForm,
    pub pending_deletion: Option<SiteId>,
    pub selected_site: Option<Site>,
    pub active_tab: Source,
    pub filters: FilterState,
    pub pagination: Option<PaginationControl>,
    pub results: Option<ResultView>,
    /// `None` while the panel is hidden.
    pub issues: Option<IssuePanel>,
    pub notice: Option<Notice>,
}
