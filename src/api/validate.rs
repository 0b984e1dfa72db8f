//! Pre-flight token validation.
//!
//! The service has historically accepted the same token under two schemes.
//! The bearer-header `/me` endpoint is tried first; on any failure the legacy
//! cookie-authenticated `/media/user` endpoint gets the final say. Each scheme
//! is tried exactly once.

use tracing::{debug, error, info, instrument, warn};

use super::types::CurrentUser;
use super::{ApiError, CloudClient};

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    /// User id reported by the primary endpoint, kept for diagnostics only.
    pub user_id: Option<String>,
    /// True when only the legacy cookie scheme accepted the token.
    pub via_legacy: bool,
}

impl CloudClient {
    /// Returns true if the token is accepted by either auth scheme.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> bool {
        match self.validate_session().await {
            Ok(user) => {
                info!(
                    user_id = user.user_id.as_deref().unwrap_or("unknown"),
                    legacy = user.via_legacy,
                    "auth token accepted"
                );
                true
            }
            Err(e) => {
                error!(error = %e, "auth token validation failed");
                false
            }
        }
    }

    /// Validates the token, primary scheme first, then the legacy cookie scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the legacy endpoint answers with a
    /// non-success status, or the transport error when it cannot be reached.
    pub async fn validate_session(&self) -> Result<ValidatedUser, ApiError> {
        match self.validate_primary().await {
            Ok(user_id) => {
                return Ok(ValidatedUser {
                    user_id,
                    via_legacy: false,
                });
            }
            Err(e) => debug!(error = %e, "primary validation failed, trying legacy cookie scheme"),
        }

        self.validate_legacy().await?;
        Ok(ValidatedUser {
            user_id: None,
            via_legacy: true,
        })
    }

    /// Bearer-header check against the current-user endpoint.
    async fn validate_primary(&self) -> Result<Option<String>, ApiError> {
        let url = self.endpoint("me")?;
        let response = self
            .bearer_get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(url.as_str(), status.as_u16(), &body));
        }

        // An unparseable body does not invalidate an accepted token.
        match response.json::<CurrentUser>().await {
            Ok(user) => Ok(user.into_id()),
            Err(e) => {
                warn!(error = %e, "current-user body not understood; continuing without user id");
                Ok(None)
            }
        }
    }

    /// Cookie check against the legacy media-user endpoint.
    async fn validate_legacy(&self) -> Result<(), ApiError> {
        let url = self.endpoint("media/user")?;
        let response = self
            .cookie_get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status, body = %body.chars().take(200).collect::<String>(), "legacy validation rejected");
        Err(ApiError::Rejected {
            url: url.to_string(),
            status,
        })
    }
}
