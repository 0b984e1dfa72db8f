//! Paginated catalog enumeration.

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::types::{MediaItem, MediaPage, PageLimit};
use super::{ApiError, CloudClient};

/// Items requested per page unless the caller says otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Field projection requested from the search endpoint.
pub const MEDIA_FIELDS: &str =
    "id,created_at,content_title,filename,file_extension,file_size,variations,type";

impl CloudClient {
    /// Fetches the whole catalog, page by page.
    ///
    /// Enumeration stops when a page is empty, when the next page would
    /// exceed `max_pages`, or when it would exceed the server-declared page
    /// total. Without a declared total, a page shorter than `page_size` is
    /// taken as the last one. A response without a `_pages` block counts
    /// as an undeclared total, not as a single page. Any request failure
    /// ends enumeration early and returns what was fetched so far.
    #[instrument(skip(self))]
    pub async fn list_all(&self, max_pages: PageLimit, page_size: u32) -> Vec<MediaItem> {
        let page_size = page_size.max(1);
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            if max_pages.exceeded_by(page) {
                debug!(page, "page cap reached");
                break;
            }

            let media_page = match self.fetch_page(page, page_size).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(page, error = %e, "failed to fetch catalog page; returning partial catalog");
                    break;
                }
            };

            let raw_len = media_page.raw_len();
            let total_pages = media_page.total_pages();
            let (page_items, dropped) = media_page.into_items();
            if dropped > 0 {
                warn!(
                    page,
                    dropped, "skipped undecodable catalog entries or entries without an id"
                );
            }
            if raw_len == 0 {
                debug!(page, "empty page; catalog exhausted");
                break;
            }

            info!(page, found = page_items.len(), "fetched catalog page");
            items.extend(page_items);

            match total_pages {
                Some(total) if u64::from(page) >= total => {
                    debug!(page, total, "reached declared page total");
                    break;
                }
                Some(_) => {}
                None if raw_len < usize::try_from(page_size).unwrap_or(usize::MAX) => {
                    debug!(page, raw_len, page_size, "short page without declared total; catalog exhausted");
                    break;
                }
                None => {}
            }
            page = page.saturating_add(1);
        }

        info!(total = items.len(), "catalog enumeration finished");
        items
    }

    /// Requests a single catalog page with the cookie scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-200 status, or an
    /// undecodable body.
    pub async fn fetch_page(&self, page: u32, page_size: u32) -> Result<MediaPage, ApiError> {
        let url = self.search_url(page, page_size)?;
        let response = self
            .cookie_get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(url.as_str(), status, &body));
        }

        response
            .json::<MediaPage>()
            .await
            .map_err(|e| ApiError::decode(url.as_str(), e))
    }

    fn search_url(&self, page: u32, page_size: u32) -> Result<Url, ApiError> {
        let mut url = self.endpoint("media/search")?;
        url.query_pairs_mut()
            .append_pair("per_page", &page_size.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("fields", MEDIA_FIELDS);
        Ok(url)
    }
}
