use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DashboardError;

/// Opaque site identifier.
///
/// The backend may emit ids as JSON numbers or strings; both are accepted and
/// numeric ids are written back as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for SiteId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl Serialize for SiteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for SiteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// A tracked website as listed by `GET /api/sites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    #[serde(default, deserialize_with = "crate::metrics::default_if_null")]
    pub sitemap_url: String,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_optional")]
    pub last_scan_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/sites`, only constructible through [`NewSite::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSite {
    domain: String,
    sitemap_url: String,
}

impl NewSite {
    pub fn validate(domain: &str, sitemap_url: &str) -> Result<Self, DashboardError> {
        let domain = normalize_domain(domain)
            .ok_or_else(|| DashboardError::validation("Please enter a valid domain"))?;

        let sitemap_url = sitemap_url.trim();
        let parsed = url::Url::parse(sitemap_url)
            .map_err(|_| DashboardError::validation("Please enter a valid sitemap URL"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DashboardError::validation(
                "Sitemap URL must use http or https",
            ));
        }

        Ok(Self {
            domain,
            sitemap_url: sitemap_url.to_string(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn sitemap_url(&self) -> &str {
        &self.sitemap_url
    }
}

/// Strip the `http(s)://` scheme and trailing slashes from user input.
///
/// Returns `None` when nothing is left.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let without_scheme = if lower.starts_with("https://") {
        &trimmed["https://".len()..]
    } else if lower.starts_with("http://") {
        &trimmed["http://".len()..]
    } else {
        trimmed
    };
    let domain = without_scheme.trim_end_matches('/').trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_and_trailing_slash() {
        assert_eq!(
            normalize_domain("https://example.com/").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            normalize_domain("http://blog.example.com//").as_deref(),
            Some("blog.example.com")
        );
        assert_eq!(
            normalize_domain("  HTTPS://Example.com  ").as_deref(),
            Some("Example.com")
        );
        assert_eq!(normalize_domain("example.com").as_deref(), Some("example.com"));
    }

    #[test]
    fn normalize_rejects_empty_results() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("https://"), None);
        assert_eq!(normalize_domain("http:///"), None);
        assert_eq!(normalize_domain("   "), None);
    }

    #[test]
    fn normalized_domain_never_keeps_scheme_or_slash() {
        for input in [
            "https://a.com",
            "http://a.com/",
            "a.com///",
            "https://a.com/path/",
            "HTTP://A.COM/",
        ] {
            let out = normalize_domain(input).expect("non-empty");
            assert!(!out.to_ascii_lowercase().starts_with("http://"), "{out}");
            assert!(!out.to_ascii_lowercase().starts_with("https://"), "{out}");
            assert!(!out.ends_with('/'), "{out}");
        }
    }

    #[test]
    fn new_site_rejects_empty_domain_before_sitemap() {
        let err = NewSite::validate("https://", "https://example.com/sitemap.xml")
            .expect_err("empty domain");
        assert!(err.is_validation());
    }

    #[test]
    fn new_site_requires_http_sitemap() {
        assert!(NewSite::validate("example.com", "not a url").is_err());
        assert!(NewSite::validate("example.com", "ftp://example.com/sitemap.xml").is_err());
        let ok = NewSite::validate("https://example.com/", " https://example.com/sitemap.xml ")
            .expect("valid");
        assert_eq!(ok.domain(), "example.com");
        assert_eq!(ok.sitemap_url(), "https://example.com/sitemap.xml");
    }

    #[test]
    fn site_id_accepts_numbers_and_strings() {
        let numeric: Site = serde_json::from_str(
            r#"{"id": 7, "domain": "example.com", "sitemap_url": "https://example.com/sitemap.xml"}"#,
        )
        .expect("numeric id");
        assert_eq!(numeric.id.as_str(), "7");
        assert_eq!(serde_json::to_value(&numeric.id).expect("ser"), serde_json::json!(7));

        let text: Site = serde_json::from_str(
            r#"{"id": "site_abc", "domain": "example.com", "last_scan_at": null}"#,
        )
        .expect("string id");
        assert_eq!(text.id.as_str(), "site_abc");
        assert_eq!(
            serde_json::to_value(&text.id).expect("ser"),
            serde_json::json!("site_abc")
        );
        assert!(text.last_scan_at.is_none());
    }
}
