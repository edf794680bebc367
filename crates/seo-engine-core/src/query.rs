//! Retrieval query composition.
//!
//! The composer owns the filter state for the whole session (it survives site
//! switches) and a page number per source. Any change to a retrieval filter
//! resets the page to 1 so a stale page number from a larger result set is
//! never reused.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// The two independent metric providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    SearchPerformance,
    AnalyticsSessions,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SearchPerformance => "Search Console",
            Self::AnalyticsSessions => "GA4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            other => Err(DashboardError::validation(format!(
                "device must be one of: desktop, mobile, tablet (got {other})"
            ))),
        }
    }
}

/// Ingestion window presets. Only collection uses these; retrieval never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preset {
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
    Last180Days,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
        Self::Last180Days,
    ];

    pub fn days(&self) -> u32 {
        match self {
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::Last90Days => 90,
            Self::Last180Days => 180,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.days() == days)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub device: Option<Device>,
    pub country: Option<String>,
    pub preset: Preset,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterState {
    pub fn has_custom_range(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    pub fn is_filtered(&self) -> bool {
        self.device.is_some()
            || self.country.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }
}

/// Parameters of one retrieval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub page: u32,
    pub per_page: u32,
    pub device: Option<Device>,
    pub country: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RetrievalQuery {
    /// Query-string pairs in a stable order; unset filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(device) = self.device {
            pairs.push(("filter_device", device.as_str().to_string()));
        }
        if let Some(country) = &self.country {
            pairs.push(("filter_country", country.clone()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct QueryComposer {
    page_size: u32,
    filters: FilterState,
    search_page: u32,
    sessions_page: u32,
}

impl QueryComposer {
    pub fn new(page_size: u32, preset: Preset) -> Self {
        Self {
            page_size: page_size.max(1),
            filters: FilterState {
                preset,
                ..FilterState::default()
            },
            search_page: 1,
            sessions_page: 1,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn page(&self, source: Source) -> u32 {
        match source {
            Source::SearchPerformance => self.search_page,
            Source::AnalyticsSessions => self.sessions_page,
        }
    }

    pub fn set_page(&mut self, source: Source, page: u32) {
        let page = page.max(1);
        match source {
            Source::SearchPerformance => self.search_page = page,
            Source::AnalyticsSessions => self.sessions_page = page,
        }
    }

    pub fn reset_pages(&mut self) {
        self.search_page = 1;
        self.sessions_page = 1;
    }

    pub fn set_device(&mut self, device: Option<Device>) {
        self.filters.device = device;
        self.reset_pages();
    }

    /// Blank input clears the filter.
    pub fn set_country(&mut self, country: Option<&str>) {
        self.filters.country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self.reset_pages();
    }

    pub fn set_date_range(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), DashboardError> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(DashboardError::validation(
                    "End date must be on or after start date",
                ));
            }
        }
        self.filters.start_date = start;
        self.filters.end_date = end;
        self.reset_pages();
        Ok(())
    }

    /// Changes the ingestion window only; the retrieval page is untouched
    /// because presets never reach a retrieval request.
    pub fn set_preset(&mut self, preset: Preset) {
        self.filters.preset = preset;
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterState {
            preset: self.filters.preset,
            ..FilterState::default()
        };
        self.reset_pages();
    }

    pub fn collection_days(&self) -> u32 {
        self.filters.preset.days()
    }

    pub fn compose(&self, source: Source) -> RetrievalQuery {
        match source {
            Source::SearchPerformance => RetrievalQuery {
                page: self.search_page,
                per_page: self.page_size,
                device: self.filters.device,
                country: self.filters.country.clone(),
                start_date: self.filters.start_date,
                end_date: self.filters.end_date,
            },
            Source::AnalyticsSessions => RetrievalQuery {
                page: self.sessions_page,
                per_page: self.page_size,
                device: None,
                country: None,
                start_date: None,
                end_date: None,
            },
        }
    }
}
