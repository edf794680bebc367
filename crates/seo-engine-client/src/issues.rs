use tracing::{info, warn};

use seo_engine_core::{
    api::{DashboardApi, DeepAnalysisRequest},
    error::DashboardError,
    fetch_state::{FetchKey, FetchTracker},
    issue::{Issue, SeveritySummary},
    site::SiteId,
};

use crate::state::IssuePanel;

/// The diagnostic issue list of one site and whether its panel is open.
#[derive(Debug, Clone, Default)]
pub struct IssueViewer {
    site_id: Option<SiteId>,
    issues: Vec<Issue>,
    visible: bool,
}

impl IssueViewer {
    /// Replace the list wholesale and open the panel.
    pub fn show(&mut self, site_id: &SiteId, issues: Vec<Issue>) {
        self.site_id = Some(site_id.clone());
        self.issues = issues;
        self.visible = true;
    }

    /// Replace the list without changing visibility.
    pub fn refresh(&mut self, site_id: &SiteId, issues: Vec<Issue>) {
        self.site_id = Some(site_id.clone());
        self.issues = issues;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible && self.site_id.is_some();
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary::of(&self.issues)
    }

    pub fn panel(&self) -> Option<IssuePanel> {
        match (&self.site_id, self.visible) {
            (Some(site_id), true) => Some(IssuePanel {
                site_id: site_id.clone(),
                issues: self.issues.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed,
    /// The same page is already being analyzed; nothing was sent.
    AlreadyRunning,
}

/// Run the per-page analysis under a flag keyed by the page URL.
pub async fn analyze_page(
    api: &dyn DashboardApi,
    tracker: &FetchTracker,
    site_id: &SiteId,
    page_url: &str,
) -> Result<AnalysisOutcome, DashboardError> {
    let page_url = page_url.trim();
    if page_url.is_empty() {
        return Err(DashboardError::validation("Please choose a page to analyze"));
    }
    let Some(guard) = tracker.try_begin(FetchKey::DeepAnalysis(page_url.to_string())) else {
        return Ok(AnalysisOutcome::AlreadyRunning);
    };

    info!(site_id = %site_id, key = ?guard.key(), "Deep analysis started");
    let request = DeepAnalysisRequest {
        site_id: site_id.clone(),
        page_url: page_url.to_string(),
    };
    match api.analyze_page(&request).await {
        Ok(()) => {
            info!(site_id = %site_id, page_url, "Deep analysis finished");
            Ok(AnalysisOutcome::Completed)
        }
        Err(e) => {
            warn!(site_id = %site_id, page_url, error = %e, "Deep analysis failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use seo_engine_core::issue::Severity;

    use super::*;

    fn issue(id: i64, severity: Severity) -> Issue {
        Issue {
            id: serde_json::json!(id),
            issue_type: "missing_meta".to_string(),
            severity,
            description: "Meta description missing".to_string(),
            suggestion: "Write a 150 character summary".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn show_replaces_and_opens() {
        let mut viewer = IssueViewer::default();
        let site = SiteId::from("1");
        viewer.show(&site, vec![issue(1, Severity::High), issue(2, Severity::High)]);
        assert!(viewer.is_visible());
        assert_eq!(viewer.summary().high, 2);

        viewer.show(&site, vec![issue(3, Severity::Low)]);
        assert_eq!(viewer.issues().len(), 1);
        assert_eq!(viewer.panel().expect("panel").issues[0].severity, Severity::Low);
    }

    #[test]
    fn toggle_needs_a_loaded_list() {
        let mut viewer = IssueViewer::default();
        viewer.toggle();
        assert!(!viewer.is_visible());

        viewer.refresh(&SiteId::from("1"), vec![]);
        assert!(!viewer.is_visible());
        viewer.toggle();
        assert!(viewer.is_visible());
        viewer.toggle();
        assert!(viewer.panel().is_none());
    }
}
