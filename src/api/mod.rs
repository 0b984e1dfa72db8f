//! Client for the remote catalog service.
//!
//! [`CloudClient`] wraps a pooled `reqwest` client together with the auth
//! token and knows how to present that token under each of the service's
//! auth schemes:
//!
//! - bearer header (`Authorization: Bearer <token>`), used by the primary
//!   current-user endpoint
//! - legacy session cookie (`gp_access_token=<token>`), required by the
//!   catalog search and archive endpoints
//! - query parameter (`access_token=<token>`), added on archive downloads
//!
//! Direct variation URLs are pre-signed and are fetched with no auth at all.
//!
//! # Example
//!
//! ```no_run
//! use gopro_sync::api::{ClientConfig, CloudClient, PageLimit};
//! use gopro_sync::Credential;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CloudClient::new(Credential::new("token"), ClientConfig::default())?;
//! if client.validate().await {
//!     let items = client.list_all(PageLimit::Unbounded, 30).await;
//!     println!("{} items in the cloud", items.len());
//! }
//! # Ok(())
//! # }
//! ```

mod catalog;
mod error;
mod types;
mod validate;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE};
use tracing::debug;
use url::Url;

pub use catalog::{DEFAULT_PAGE_SIZE, MEDIA_FIELDS};
pub use error::ApiError;
pub use types::{CurrentUser, DEFAULT_FILE_EXTENSION, MediaItem, MediaPage, PageLimit, Variation};
pub use validate::ValidatedUser;

use crate::credential::Credential;
use crate::user_agent;

/// Production API host.
pub const DEFAULT_API_BASE: &str = "https://api.gopro.com";

/// Vendor media type the catalog service expects.
pub const MEDIA_ACCEPT: &str = "application/vnd.gopro.jk.media+json; version=2.0.0";

/// Cookie name of the legacy auth scheme.
const TOKEN_COOKIE: &str = "gp_access_token";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP per-read timeout (30 seconds between body chunks).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`CloudClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://api.gopro.com`.
    pub base_url: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle time between reads of a response body.
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Default settings pointed at a different API host.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Authenticated client for the catalog service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: Client,
    base_url: Url,
    credential: Credential,
}

impl CloudClient {
    /// Builds a client for the given token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if the base URL does not parse and
    /// [`ApiError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(credential: Credential, config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .gzip(true)
            .user_agent(user_agent::BROWSER_USER_AGENT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        debug!(
            base_url = %base_url,
            tool = %user_agent::tool_identifier(),
            "created catalog client"
        );

        Ok(Self {
            http,
            base_url,
            credential,
        })
    }

    /// Returns the token this client presents.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the normalized API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path relative to the API base.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::invalid_base_url(format!("{}{path}", self.base_url)))
    }

    /// GET with the bearer header scheme.
    pub(crate) fn bearer_get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(ACCEPT, MEDIA_ACCEPT)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credential.expose()),
            )
    }

    /// GET with the legacy cookie scheme.
    pub(crate) fn cookie_get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(ACCEPT, MEDIA_ACCEPT)
            .header(COOKIE, self.token_cookie())
    }

    /// Unauthenticated GET for pre-signed media URLs.
    pub(crate) fn plain_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url)
    }

    /// URL of the archive-wrapped source download for one item.
    pub(crate) fn zip_source_url(&self, media_id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint("media/x/zip/source")?;
        url.query_pairs_mut()
            .append_pair("ids", media_id)
            .append_pair("access_token", self.credential.expose());
        Ok(url)
    }

    fn token_cookie(&self) -> String {
        format!("{TOKEN_COOKIE}={}", self.credential.expose())
    }
}

/// Ensures the base ends with `/` so relative joins keep any path prefix.
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/")).map_err(|_| ApiError::invalid_base_url(raw))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::invalid_base_url(raw));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CloudClient {
        CloudClient::new(Credential::new("tok-123"), ClientConfig::with_base_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_onto_host() {
        let c = client("https://api.gopro.com");
        assert_eq!(
            c.endpoint("/media/search").unwrap().as_str(),
            "https://api.gopro.com/media/search"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let c = client("http://127.0.0.1:9000/proxy/");
        assert_eq!(
            c.endpoint("me").unwrap().as_str(),
            "http://127.0.0.1:9000/proxy/me"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = CloudClient::new(Credential::new("t"), ClientConfig::with_base_url("not a url"));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));

        let result = CloudClient::new(Credential::new("t"), ClientConfig::with_base_url("ftp://x"));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_zip_source_url_carries_id_and_token() {
        let c = client("https://api.gopro.com");
        let url = c.zip_source_url("media-7").unwrap();
        assert_eq!(url.path(), "/media/x/zip/source");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("ids".to_string(), "media-7".to_string())));
        assert!(pairs.contains(&("access_token".to_string(), "tok-123".to_string())));
    }

    #[test]
    fn test_token_cookie_format() {
        assert_eq!(client("https://api.gopro.com").token_cookie(), "gp_access_token=tok-123");
    }

    #[test]
    fn test_default_config_targets_production_host() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }
}
