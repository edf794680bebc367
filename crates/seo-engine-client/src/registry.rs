//! Tracked sites as last reported by `GET /api/sites`.

use tracing::{info, warn};

use seo_engine_core::{
    api::DashboardApi,
    error::DashboardError,
    site::{NewSite, Site, SiteId},
};

/// Local copy of the backend's site list. Always replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
    loaded: bool,
}

impl SiteRegistry {
    pub fn replace(&mut self, sites: Vec<Site>) {
        self.sites = sites;
        self.loaded = true;
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn get(&self, site_id: &SiteId) -> Option<&Site> {
        self.sites.iter().find(|s| &s.id == site_id)
    }

    pub fn contains(&self, site_id: &SiteId) -> bool {
        self.get(site_id).is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn require(&self, site_id: &SiteId) -> Result<&Site, DashboardError> {
        self.get(site_id)
            .ok_or_else(|| DashboardError::validation(format!("Unknown site: {site_id}")))
    }
}

pub async fn fetch_sites(api: &dyn DashboardApi) -> Result<Vec<Site>, DashboardError> {
    let sites = api.list_sites().await?;
    info!(count = sites.len(), "Site list loaded");
    Ok(sites)
}

/// Validate and submit a new site. Nothing is sent when validation fails.
pub async fn submit_site(
    api: &dyn DashboardApi,
    domain: &str,
    sitemap_url: &str,
) -> Result<NewSite, DashboardError> {
    let site = NewSite::validate(domain, sitemap_url)?;
    match api.add_site(&site).await {
        Ok(()) => {
            info!(domain = site.domain(), "Site added");
            Ok(site)
        }
        Err(e) => {
            warn!(domain = site.domain(), error = %e, "Add site failed");
            Err(e)
        }
    }
}

pub async fn remove_site(api: &dyn DashboardApi, site_id: &SiteId) -> Result<(), DashboardError> {
    match api.delete_site(site_id).await {
        Ok(()) => {
            info!(site_id = %site_id, "Site deleted");
            Ok(())
        }
        Err(e) => {
            warn!(site_id = %site_id, error = %e, "Delete site failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: &str, domain: &str) -> Site {
        Site {
            id: SiteId::from(id),
            domain: domain.to_string(),
            sitemap_url: format!("https://{domain}/sitemap.xml"),
            last_scan_at: None,
        }
    }

    #[test]
    fn replace_swaps_the_whole_list() {
        let mut registry = SiteRegistry::default();
        assert!(!registry.is_loaded());
        registry.replace(vec![site("1", "a.com"), site("2", "b.com")]);
        assert_eq!(registry.len(), 2);
        registry.replace(vec![site("3", "c.com")]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&SiteId::from("1")));
        assert_eq!(
            registry.require(&SiteId::from("3")).expect("site").domain,
            "c.com"
        );
        assert!(registry.require(&SiteId::from("9")).is_err());
    }
}
