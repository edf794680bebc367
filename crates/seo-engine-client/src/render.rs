//! Plain-text rendering of a [`ViewSnapshot`] for the terminal.

use std::fmt::Write as _;

use seo_engine_core::{
    issue::{Severity, SeveritySummary},
    metrics::{ResultPage, SearchRow, SessionRow},
    query::{FilterState, Source},
};

use crate::state::{IssuePanel, NoticeLevel, ResultView, SiteEntry, ViewSnapshot};

pub fn snapshot(view: &ViewSnapshot) -> String {
    let mut out = String::new();
    if let Some(err) = &view.backend_error {
        let _ = writeln!(out, "Backend unavailable: {err}");
    }
    if !view.sites.is_empty() {
        out.push_str(&sites(&view.sites));
    }
    if let Some(results) = &view.results {
        out.push_str(&result_header(view.active_tab, &view.filters));
        out.push_str(&result_view(results));
    }
    if let Some(panel) = &view.issues {
        out.push_str(&issue_panel(panel));
    }
    if let Some(notice) = &view.notice {
        let prefix = if notice.level == NoticeLevel::Success { "✓ " } else { "" };
        let _ = writeln!(out, "{prefix}{}", notice.text);
    }
    out
}

pub fn sites(entries: &[SiteEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<8} {:<32} {:<20} STATUS", "ID", "DOMAIN", "LAST SCAN");
    for entry in entries {
        let last_scan = entry
            .site
            .last_scan_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        let mut status = Vec::new();
        if entry.selected {
            status.push("selected");
        }
        if entry.activity.search_collecting {
            status.push("fetching gsc");
        }
        if entry.activity.analytics_collecting {
            status.push("fetching ga4");
        }
        let _ = writeln!(
            out,
            "{:<8} {:<32} {:<20} {}",
            entry.site.id,
            entry.site.domain,
            last_scan,
            status.join(", ")
        );
    }
    out
}

/// Tab title, followed by the active filters when any narrow the rows.
pub fn result_header(tab: Source, filters: &FilterState) -> String {
    let mut out = format!("== {} ==\n", tab.label());
    if !filters.is_filtered() {
        return out;
    }
    let mut parts = Vec::new();
    if let Some(device) = filters.device {
        parts.push(format!("device={device}"));
    }
    if let Some(country) = &filters.country {
        parts.push(format!("country={country}"));
    }
    if let Some(start) = filters.start_date {
        parts.push(format!("from {start}"));
    }
    if let Some(end) = filters.end_date {
        parts.push(format!("to {end}"));
    }
    let _ = writeln!(out, "Filters: {}", parts.join(", "));
    out
}

pub fn result_view(view: &ResultView) -> String {
    match view {
        ResultView::Search(page) => search_table(page),
        ResultView::Sessions(page) => session_table(page),
    }
}

pub fn search_table(page: &ResultPage<SearchRow>) -> String {
    if page.is_empty() {
        return "No data yet. Fetch Search Console data first.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:<30} {:<8} {:<8} {:>11} {:>7} {:>8} {:>6}",
        "URL", "QUERY", "COUNTRY", "DEVICE", "IMPRESSIONS", "CLICKS", "CTR", "POS"
    );
    for row in &page.rows {
        let _ = writeln!(
            out,
            "{:<40} {:<30} {:<8} {:<8} {:>11} {:>7} {:>8} {:>6}",
            row.url,
            row.query,
            row.country,
            row.device,
            row.impressions,
            row.clicks,
            row.ctr_percent(),
            row.position_label()
        );
    }
    let _ = writeln!(
        out,
        "{} ({} rows)",
        page.pagination().label(),
        page.total_count
    );
    out
}

pub fn session_table(page: &ResultPage<SessionRow>) -> String {
    if page.is_empty() {
        return "No data yet. Fetch GA4 data first.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:>9} {:>7} {:>10} {:>9} {:>8} {:>12}",
        "PAGE", "SESSIONS", "USERS", "PAGEVIEWS", "AVG TIME", "BOUNCE", "CONVERSIONS"
    );
    for row in &page.rows {
        let _ = writeln!(
            out,
            "{:<40} {:>9} {:>7} {:>10} {:>9} {:>8} {:>12}",
            row.page_path,
            row.sessions,
            row.users,
            row.pageviews,
            row.duration_label(),
            row.bounce_rate_label(),
            row.conversions
        );
    }
    let _ = writeln!(
        out,
        "{} ({} rows)",
        page.pagination().label(),
        page.total_count
    );
    out
}

pub fn issue_panel(panel: &IssuePanel) -> String {
    let mut out = String::new();
    let summary = SeveritySummary::of(&panel.issues);
    let _ = writeln!(out, "Issues for site {}: {}", panel.site_id, summary_line(&summary));
    if panel.issues.is_empty() {
        out.push_str("No issues found.\n");
        return out;
    }
    for severity in Severity::ALL {
        for issue in panel.issues.iter().filter(|i| i.severity == severity) {
            let _ = writeln!(out, "[{severity}] {}: {}", issue.issue_type, issue.description);
            if !issue.suggestion.is_empty() {
                let _ = writeln!(out, "    → {}", issue.suggestion);
            }
        }
    }
    out
}

fn summary_line(summary: &SeveritySummary) -> String {
    format!(
        "{} total ({} critical, {} high, {} medium, {} low)",
        summary.total(),
        summary.critical,
        summary.high,
        summary.medium,
        summary.low
    )
}

#[cfg(test)]
mod tests {
    use seo_engine_core::issue::Issue;
    use seo_engine_core::site::SiteId;

    use super::*;

    #[test]
    fn search_table_shows_pager_label() {
        let row = SearchRow {
            url: "/pricing".to_string(),
            query: "seo tool".to_string(),
            impressions: 120,
            clicks: 6,
            ctr: 0.05,
            position: 3.14,
            ..SearchRow::default()
        };
        let page = ResultPage::new(vec![row], Some(120), Some(3), 1, 50);
        let text = search_table(&page);
        assert!(text.contains("5.00%"));
        assert!(text.contains("3.1"));
        assert!(text.contains("Page 1 of 3 (120 rows)"));
    }

    #[test]
    fn header_names_tab_and_lists_only_active_filters() {
        let plain = result_header(Source::AnalyticsSessions, &FilterState::default());
        assert_eq!(plain, "== GA4 ==\n");

        let filters = FilterState {
            device: Some(seo_engine_core::query::Device::Mobile),
            country: Some("usa".to_string()),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            ..FilterState::default()
        };
        let text = result_header(Source::SearchPerformance, &filters);
        assert!(text.starts_with("== Search Console ==\n"));
        assert!(text.contains("Filters: device=mobile, country=usa, from 2024-06-01\n"));
        assert!(!text.contains(" to "));
    }

    #[test]
    fn empty_session_page_prompts_for_collection() {
        let page: ResultPage<SessionRow> = ResultPage::new(vec![], Some(0), None, 1, 50);
        assert!(session_table(&page).starts_with("No data yet"));
    }

    #[test]
    fn issues_are_grouped_most_severe_first() {
        let issue = |severity, kind: &str| Issue {
            id: serde_json::json!(1),
            issue_type: kind.to_string(),
            severity,
            description: "d".to_string(),
            suggestion: String::new(),
            created_at: None,
        };
        let panel = IssuePanel {
            site_id: SiteId::from("4"),
            issues: vec![issue(Severity::Low, "alt_text"), issue(Severity::Critical, "noindex")],
        };
        let text = issue_panel(&panel);
        let critical = text.find("noindex").expect("critical listed");
        let low = text.find("alt_text").expect("low listed");
        assert!(critical < low);
        assert!(text.contains("2 total (1 critical, 0 high, 0 medium, 1 low)"));
    }
}
