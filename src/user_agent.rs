//! Shared User-Agent strings for API and media download requests.

/// Browser User-Agent sent on every request.
///
/// The catalog service serves its web front-end from the same endpoints and
/// expects a browser identity.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Tool identifier appended to debug logs so traffic can be correlated.
#[must_use]
pub(crate) fn tool_identifier() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("gopro-sync/{version}")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_identifier_contains_crate_version() {
        let id = tool_identifier();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            id.strip_prefix("gopro-sync/").expect("identifier has version"),
        );
    }

    #[test]
    fn test_browser_user_agent_is_single_line() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(!BROWSER_USER_AGENT.contains('\n'));
    }
}
