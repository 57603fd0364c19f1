//! HTTP access to the class search catalog.
//!
//! Pagination on the catalog is session-scoped: the page switcher returns the
//! next page of whatever the *same cookie session* last searched for. Every
//! query therefore runs on its own [`CatalogSession`], and all sessions share a
//! single request rate limiter.

use crate::catalog::errors::{HarvestError, TruncationWarning};
use crate::catalog::models::Listing;
use crate::catalog::pagination::{additional_pages, find_total_records};
use crate::config::Config;
use crate::utils::{fmt_duration, log_if_slow};
use anyhow::Context;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(5);

/// Source of catalog documents, one fresh session per query.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every page of the search results for `keyword`.
    async fn search(&self, keyword: &str) -> Result<FetchedDocument, HarvestError>;

    /// Fetch the detail document for one listing.
    async fn detail(&self, listing: &Listing) -> Result<FetchedDocument, HarvestError>;
}

/// All pages of one query's result set, concatenated in page order.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub body: String,
    pub total_records: u32,
    /// Pages fetched after the initial request.
    pub additional_pages: u32,
    pub truncation: Option<TruncationWarning>,
}

/// One cookie jar. Continuation pages must be requested on the session that ran the search.
pub struct CatalogSession {
    http: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl CatalogSession {
    async fn get_text(&self, url: &Url) -> Result<String, HarvestError> {
        self.limiter.until_ready().await;

        let start = Instant::now();
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HarvestError::fetch(url.as_str(), e))?;
        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::fetch(url.as_str(), e))?;

        debug!(url = %url, bytes = body.len(), duration = fmt_duration(start.elapsed()), "Fetched page");
        log_if_slow(start, SLOW_REQUEST_THRESHOLD, url.as_str());
        Ok(body)
    }
}

/// Client for the catalog's search, page-switch, and detail endpoints.
pub struct CatalogClient {
    base_url: Url,
    search_endpoint: Url,
    page_endpoint: Url,
    detail_endpoint: Url,
    page_size: u32,
    max_results: u32,
    timeout: Duration,
    user_agent: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl CatalogClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let per_second = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| anyhow::anyhow!("requests_per_second must be positive"))?;
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            search_endpoint: resolve_endpoint(&base_url, &config.search_path)?,
            page_endpoint: resolve_endpoint(&base_url, &config.page_path)?,
            detail_endpoint: resolve_endpoint(&base_url, &config.detail_path)?,
            base_url,
            page_size: config.page_size,
            max_results: config.max_results,
            timeout: config.request_timeout,
            user_agent: config.user_agent.clone(),
            limiter,
        })
    }

    /// Start a new cookie session for one query.
    pub fn session(&self) -> Result<CatalogSession, HarvestError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| HarvestError::fetch(self.base_url.as_str(), e))?;

        Ok(CatalogSession {
            http,
            limiter: self.limiter.clone(),
        })
    }

    fn endpoint(endpoint: &Url, params: &[(&str, &str)]) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut().extend_pairs(params);
        url
    }

    pub fn search_url(&self, keyword: &str) -> Url {
        Self::endpoint(&self.search_endpoint, &[("keywords", keyword)])
    }

    pub fn page_url(&self, page: u32) -> Url {
        let page = page.to_string();
        Self::endpoint(&self.page_endpoint, &[("pageNum", page.as_str())])
    }

    pub fn detail_url(&self, listing: &Listing) -> Url {
        Self::endpoint(
            &self.detail_endpoint,
            &[
                ("classNumber", listing.identifier.as_str()),
                ("termCode", listing.term_code.as_str()),
            ],
        )
    }

    /// Fetch `url` and, if its declared result count spans several pages, every
    /// continuation page on the same session.
    ///
    /// A failed continuation page fails the whole document; a partial result set
    /// would be indistinguishable from a complete one downstream.
    pub async fn fetch_document(
        &self,
        session: &CatalogSession,
        url: Url,
        query: &str,
    ) -> Result<FetchedDocument, HarvestError> {
        let mut body = session.get_text(&url).await?;

        let total_records = find_total_records(&body);
        let truncation = (self.max_results > 0 && total_records >= self.max_results).then(|| {
            let warning = TruncationWarning {
                query: query.to_owned(),
                total_records,
                cap: self.max_results,
            };
            warn!(query, total_records, cap = self.max_results, "Result count hit platform cap, results truncated");
            warning
        });

        // A declared count above the cap cannot be paged past it
        let mut extra = additional_pages(total_records, self.page_size);
        if self.max_results > 0 {
            extra = extra.min(additional_pages(self.max_results, self.page_size));
        }
        if extra > 0 {
            debug!(query, total_records, extra_pages = extra, "Fetching continuation pages");
        }
        for page in 1..=extra {
            let page_body = session.get_text(&self.page_url(page)).await?;
            body.push_str(&page_body);
        }

        Ok(FetchedDocument {
            url: url.to_string(),
            body,
            total_records,
            additional_pages: extra,
            truncation,
        })
    }
}

/// Join an endpoint path onto the catalog root.
pub fn resolve_endpoint(base_url: &Url, path: &str) -> anyhow::Result<Url> {
    base_url
        .join(path)
        .with_context(|| format!("endpoint path {path:?} does not resolve against {base_url}"))
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn search(&self, keyword: &str) -> Result<FetchedDocument, HarvestError> {
        let session = self.session()?;
        self.fetch_document(&session, self.search_url(keyword), keyword)
            .await
    }

    async fn detail(&self, listing: &Listing) -> Result<FetchedDocument, HarvestError> {
        let session = self.session()?;
        let query = format!("{}/{}", listing.identifier, listing.term_code);
        self.fetch_document(&session, self.detail_url(listing), &query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> CatalogClient {
        let config = Config {
            base_url: base_url.to_owned(),
            ..Config::default()
        };
        CatalogClient::new(&config).unwrap()
    }

    #[test]
    fn test_search_url_keeps_leading_zeros() {
        let url = client("https://catalog.example.edu/more/").search_url("042");
        assert_eq!(
            url.as_str(),
            "https://catalog.example.edu/more/SearchClassesExecute!search.action?keywords=042"
        );
    }

    #[test]
    fn test_page_url() {
        let url = client("https://catalog.example.edu/more/").page_url(3);
        assert_eq!(
            url.as_str(),
            "https://catalog.example.edu/more/SearchClassesExecute!switchPage.action?pageNum=3"
        );
    }

    #[test]
    fn test_detail_url() {
        let url = client("https://catalog.example.edu/more/").detail_url(&Listing::new("1234", "1040"));
        assert_eq!(
            url.as_str(),
            "https://catalog.example.edu/more/GetClassSectionDetail.action?classNumber=1234&termCode=1040"
        );
    }

    #[test]
    fn test_rejects_unresolvable_endpoint_path() {
        let config = Config {
            search_path: "http://[not-an-ip/search".to_owned(),
            ..Config::default()
        };
        assert!(CatalogClient::new(&config).is_err());
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = Config {
            base_url: "not a url".to_owned(),
            ..Config::default()
        };
        assert!(CatalogClient::new(&config).is_err());
    }
}
