//! Metric rows returned by the two retrieval endpoints and the page wrapper
//! the view holds them in.
//!
//! Rows are decoded leniently: a numeric field that is missing or `null`
//! decodes as zero, so partial rows still render.

use serde::{Deserialize, Deserializer, Serialize};

/// One search-performance row (`GET /api/gsc-data/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    #[serde(default, deserialize_with = "default_if_null")]
    pub url: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub query: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub country: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub device: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "default_if_null")]
    pub clicks: u64,
    /// Click-through ratio in `[0, 1]`.
    #[serde(default, deserialize_with = "default_if_null")]
    pub ctr: f64,
    #[serde(default, deserialize_with = "default_if_null")]
    pub position: f64,
}

impl SearchRow {
    /// CTR as a percentage with two decimals, e.g. `"4.25%"`.
    pub fn ctr_percent(&self) -> String {
        format!("{:.2}%", self.ctr * 100.0)
    }

    pub fn position_label(&self) -> String {
        format!("{:.1}", self.position)
    }
}

/// One analytics-session row (`GET /api/ga4-data/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    #[serde(default, deserialize_with = "default_if_null")]
    pub page_path: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub sessions: u64,
    #[serde(default, deserialize_with = "default_if_null")]
    pub users: u64,
    #[serde(default, deserialize_with = "default_if_null")]
    pub pageviews: u64,
    /// Mean engagement in seconds.
    #[serde(default, deserialize_with = "default_if_null")]
    pub avg_duration: f64,
    /// Percentage, 0–100.
    #[serde(default, deserialize_with = "default_if_null")]
    pub bounce_rate: f64,
    #[serde(default, deserialize_with = "default_if_null")]
    pub conversions: u64,
}

impl SessionRow {
    pub fn bounce_rate_label(&self) -> String {
        format!("{:.1}%", self.bounce_rate)
    }

    /// `m:ss` rendering of the average session duration.
    pub fn duration_label(&self) -> String {
        let total = self.avg_duration.max(0.0).round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

pub(crate) fn default_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw body of the search-performance retrieval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPageResponse {
    #[serde(default)]
    pub pages: Vec<SearchRow>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Raw body of the analytics-session retrieval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPageResponse {
    #[serde(default)]
    pub pages: Vec<SessionRow>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// One page of rows for the selected site. Replaced wholesale on every
/// retrieval, never merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

impl<T> ResultPage<T> {
    /// `total_pages` falls back to `ceil(total_count / per_page)` when the
    /// backend does not send it.
    pub fn new(
        rows: Vec<T>,
        total_count: Option<u64>,
        total_pages: Option<u32>,
        current_page: u32,
        per_page: u32,
    ) -> Self {
        let total_count = total_count.unwrap_or(rows.len() as u64);
        let total_pages = total_pages.unwrap_or_else(|| {
            u32::try_from(total_count.div_ceil(u64::from(per_page.max(1)))).unwrap_or(u32::MAX)
        });
        Self {
            rows,
            total_count,
            current_page: current_page.max(1),
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pagination(&self) -> PaginationControl {
        PaginationControl::new(self.current_page, self.total_pages)
    }
}

impl ResultPage<SearchRow> {
    pub fn from_search(body: SearchPageResponse, current_page: u32, per_page: u32) -> Self {
        Self::new(body.pages, body.total, body.total_pages, current_page, per_page)
    }
}

impl ResultPage<SessionRow> {
    pub fn from_sessions(body: SessionPageResponse, current_page: u32, per_page: u32) -> Self {
        Self::new(body.pages, body.count, None, current_page, per_page)
    }
}

/// What the pager under a result table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControl {
    pub current_page: u32,
    pub total_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl PaginationControl {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        let current_page = current_page.max(1);
        Self {
            current_page,
            total_pages,
            previous_enabled: current_page > 1,
            next_enabled: current_page < total_pages,
        }
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn derived_page_count_saturates_instead_of_wrapping() {
        let page: ResultPage<SearchRow> = ResultPage::new(vec![], Some(u64::MAX), None, 1, 1);
        assert_eq!(page.total_pages, u32::MAX);

        let page: ResultPage<SearchRow> = ResultPage::new(vec![], Some(101), None, 1, 50);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn missing_impressions_and_ctr_render_as_zero() {
        let row: SearchRow =
            serde_json::from_value(json!({"url": "/pricing", "clicks": 3, "position": 4.26}))
                .expect("partial row");
        assert_eq!(row.impressions, 0);
        assert_eq!(row.ctr, 0.0);
        assert_eq!(row.ctr_percent(), "0.00%");
        assert_eq!(row.position_label(), "4.3");
    }

    #[test]
    fn null_numeric_fields_render_as_zero() {
        let row: SearchRow = serde_json::from_value(json!({
            "url": "/", "impressions": null, "ctr": null, "device": null
        }))
        .expect("null fields");
        assert_eq!(row.impressions, 0);
        assert_eq!(row.ctr, 0.0);
        assert_eq!(row.device, "");

        let session: SessionRow =
            serde_json::from_value(json!({"page_path": "/blog", "bounce_rate": null}))
                .expect("session row");
        assert_eq!(session.bounce_rate_label(), "0.0%");
        assert_eq!(session.duration_label(), "0:00");
    }

    #[test]
    fn first_of_three_pages_enables_only_next() {
        let body: SearchPageResponse = serde_json::from_value(json!({
            "pages": [{"url": "/a", "impressions": 10, "clicks": 1, "ctr": 0.1, "position": 2.0}],
            "total": 120,
            "total_pages": 3
        }))
        .expect("body");
        let page = ResultPage::from_search(body, 1, 50);
        let pager = page.pagination();
        assert_eq!(pager.label(), "Page 1 of 3");
        assert!(pager.next_enabled);
        assert!(!pager.previous_enabled);
    }

    #[test]
    fn session_pages_derive_total_pages_from_count() {
        let body: SessionPageResponse =
            serde_json::from_value(json!({"pages": [], "count": 101})).expect("body");
        let page = ResultPage::from_sessions(body, 3, 50);
        assert_eq!(page.total_pages, 3);
        let pager = page.pagination();
        assert!(pager.previous_enabled);
        assert!(!pager.next_enabled);
    }

    #[test]
    fn empty_result_shows_single_page() {
        let page: ResultPage<SearchRow> = ResultPage::new(vec![], Some(0), None, 1, 50);
        assert_eq!(page.pagination().label(), "Page 1 of 1");
        assert!(!page.pagination().next_enabled);
    }

    #[test]
    fn duration_label_formats_minutes_and_seconds() {
        let row = SessionRow {
            avg_duration: 125.4,
            ..SessionRow::default()
        };
        assert_eq!(row.duration_label(), "2:05");
    }
}
