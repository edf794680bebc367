//! Command-line grammar of the `seo-engine` binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use seo_engine_core::query::{Device, Preset};

#[derive(Parser, Debug)]
#[command(name = "seo-engine")]
#[command(about = "Sync and inspect SEO Engine dashboard data from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Check that the backend and its services are reachable.
    Health,

    /// Print the Google OAuth URL to open in a browser.
    Connect,

    /// List tracked sites.
    Sites,

    /// Track a new site.
    Add {
        /// Domain, with or without scheme (`https://example.com/` is accepted)
        domain: String,
        sitemap_url: String,
    },

    /// Delete a site and all its collected data.
    Delete {
        site_id: String,

        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Ask the backend to collect Search Console data.
    FetchGsc {
        site_id: String,

        /// Window in days: 7, 30, 90 or 180
        #[arg(value_parser = parse_preset)]
        days: Option<Preset>,
    },

    /// Ask the backend to collect GA4 data.
    FetchGa4 {
        site_id: String,

        /// Falls back to SEO_ENGINE_GA4_PROPERTY_ID
        property_id: Option<String>,

        /// Window in days: 7, 30, 90 or 180
        #[arg(value_parser = parse_preset)]
        days: Option<Preset>,
    },

    /// Show a page of collected Search Console rows.
    Gsc {
        site_id: String,

        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,

        #[arg(long, value_enum)]
        device: Option<DeviceArg>,

        #[arg(long)]
        country: Option<String>,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Show a page of collected GA4 rows.
    Ga4 {
        site_id: String,

        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,
    },

    /// Show the diagnostic issues of a site.
    Issues { site_id: String },

    /// Run the deep analysis of one page.
    Analyze { site_id: String, page_url: String },

    /// Write the Search Console rows of a site to a CSV file.
    Export { site_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Desktop,
    Mobile,
    Tablet,
}

impl From<DeviceArg> for Device {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Desktop => Device::Desktop,
            DeviceArg::Mobile => Device::Mobile,
            DeviceArg::Tablet => Device::Tablet,
        }
    }
}

fn parse_preset(raw: &str) -> Result<Preset, String> {
    let days: u32 = raw
        .parse()
        .map_err(|_| format!("invalid day count: {raw}"))?;
    Preset::from_days(days).ok_or_else(|| "days must be one of 7, 30, 90, 180".to_string())
}
