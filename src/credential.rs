//! Bearer token handling.
//!
//! The token is treated as an opaque capability: it is never parsed, only
//! forwarded to the remote service as a header, cookie or query parameter.
//! This module also resolves the token for the CLI from, in order, an
//! explicit value, the `GO_PRO_AUTH_TOKEN` environment variable and the
//! system keychain.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

/// Environment variable consulted for the auth token.
pub const TOKEN_ENV_VAR: &str = "GO_PRO_AUTH_TOKEN";

const KEYRING_SERVICE: &str = "gopro-cloud-sync";
const KEYRING_ACCOUNT: &str = "auth_token";

/// Opaque bearer token for the remote catalog service.
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token string. Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// Returns the raw token for placing on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the token is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Errors for keychain-backed token storage.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// The system keychain could not be reached.
    #[error("unable to access system keychain; pass --token or set {TOKEN_ENV_VAR} instead")]
    KeychainUnavailable,
}

/// Resolves the token from an explicit value, the environment, then the keychain.
///
/// Keychain failures are logged and treated as "no token".
#[must_use]
pub fn resolve_token(explicit: Option<&str>) -> Option<Credential> {
    if let Some(token) = explicit.map(Credential::new).filter(|t| !t.is_empty()) {
        debug!("using token from command line");
        return Some(token);
    }

    if let Some(token) = std::env::var(TOKEN_ENV_VAR)
        .ok()
        .map(Credential::new)
        .filter(|t| !t.is_empty())
    {
        debug!(var = TOKEN_ENV_VAR, "using token from environment");
        return Some(token);
    }

    match load_stored_token() {
        Ok(Some(token)) => {
            debug!("using token from system keychain");
            Some(token)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "keychain lookup failed");
            None
        }
    }
}

/// Loads the token previously saved with [`store_token`].
///
/// # Errors
///
/// Returns [`TokenStoreError::KeychainUnavailable`] if the keychain cannot be queried.
pub fn load_stored_token() -> Result<Option<Credential>, TokenStoreError> {
    let entry = keyring_entry()?;
    match catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .map_err(|_| TokenStoreError::KeychainUnavailable)?
    {
        Ok(token) => Ok(Some(Credential::new(token)).filter(|t| !t.is_empty())),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(_) => Err(TokenStoreError::KeychainUnavailable),
    }
}

/// Saves the token to the system keychain.
///
/// # Errors
///
/// Returns [`TokenStoreError::KeychainUnavailable`] if the keychain rejects the write.
pub fn store_token(token: &Credential) -> Result<(), TokenStoreError> {
    let entry = keyring_entry()?;
    catch_unwind(AssertUnwindSafe(|| entry.set_password(token.expose())))
        .map_err(|_| TokenStoreError::KeychainUnavailable)?
        .map_err(|_| TokenStoreError::KeychainUnavailable)
}

fn keyring_entry() -> Result<keyring::Entry, TokenStoreError> {
    catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT))
        .map_err(|_| TokenStoreError::KeychainUnavailable)?
        .map_err(|_| TokenStoreError::KeychainUnavailable)
}
