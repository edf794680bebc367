use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use seo_engine_client::{
    cli::{Cli, Command},
    coordinator::ViewCoordinator,
    http::HttpApi,
    render,
};
use seo_engine_core::{config::Config, site::SiteId};

async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Structured JSON logging on stderr. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seo_engine=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow!(e))?;
    let api = HttpApi::new(&cfg)?;
    info!(api_url = %api.base_url(), "seo-engine client starting");
    let coordinator = ViewCoordinator::new(Arc::new(api), &cfg);

    if cli.command == Command::Health {
        let health = coordinator.start().await?;
        println!("status: {}", health.status);
        let services = &health.services;
        for (name, value) in [
            ("database", &services.database),
            ("oauth", &services.oauth),
            ("ai", &services.ai),
            ("serper", &services.serper),
        ] {
            println!("  {name}: {}", value.as_deref().unwrap_or("unknown"));
        }
        return Ok(());
    }

    coordinator.reload_sites().await?;

    match cli.command {
        Command::Health | Command::Sites => {}
        Command::Connect => {
            let url = coordinator.connect_google().await?;
            println!("Open this URL to connect Google:\n{url}");
            return Ok(());
        }
        Command::Add {
            domain,
            sitemap_url,
        } => {
            coordinator.add_site(&domain, &sitemap_url).await?;
        }
        Command::Delete { site_id, yes } => {
            let site_id = SiteId::from(site_id.as_str());
            let prompt = coordinator.request_delete_site(&site_id).await?;
            if yes || confirm(&prompt).await? {
                coordinator.confirm_delete_site().await?;
            } else {
                coordinator.cancel_delete_site().await;
                println!("Cancelled.");
                return Ok(());
            }
        }
        Command::FetchGsc { site_id, days } => {
            if let Some(preset) = days {
                coordinator.set_preset(preset).await;
            }
            coordinator
                .fetch_search_data(&SiteId::from(site_id.as_str()))
                .await?;
        }
        Command::FetchGa4 {
            site_id,
            property_id,
            days,
        } => {
            if let Some(preset) = days {
                coordinator.set_preset(preset).await;
            }
            let property_id = property_id.or_else(|| cfg.ga4_property_id.clone());
            coordinator
                .fetch_analytics_data(&SiteId::from(site_id.as_str()), property_id.as_deref())
                .await?;
        }
        Command::Gsc {
            site_id,
            page,
            device,
            country,
            start,
            end,
        } => {
            // Filters are set before selection so only one retrieval is sent.
            coordinator.set_device_filter(device.map(Into::into)).await?;
            coordinator.set_country_filter(country.as_deref()).await?;
            coordinator.set_date_range(start, end).await?;
            coordinator
                .view_search_data(&SiteId::from(site_id.as_str()))
                .await?;
            if let Some(page) = page.filter(|p| *p > 1) {
                coordinator.go_to_page(page).await?;
            }
        }
        Command::Ga4 { site_id, page } => {
            coordinator
                .view_analytics_data(&SiteId::from(site_id.as_str()))
                .await?;
            if let Some(page) = page.filter(|p| *p > 1) {
                coordinator.go_to_page(page).await?;
            }
        }
        Command::Issues { site_id } => {
            coordinator
                .load_issues(&SiteId::from(site_id.as_str()))
                .await?;
        }
        Command::Analyze { site_id, page_url } => {
            let site_id = SiteId::from(site_id.as_str());
            coordinator.select_site(&site_id).await?;
            coordinator.request_deep_analysis(&site_id, &page_url).await?;
        }
        Command::Export { site_id } => {
            let dir = PathBuf::from(&cfg.export_dir);
            let file = coordinator
                .export_search_data(&SiteId::from(site_id.as_str()), &dir)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("{}", file.path.display());
            return Ok(());
        }
    }

    print!("{}", render::snapshot(&coordinator.snapshot().await));
    Ok(())
}
