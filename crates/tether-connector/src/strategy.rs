//! Demo/live execution strategy selection.
//!
//! Demo fallback is a deliberate usability decision, not an error: missing
//! provider credentials switch the connector into a simulated backend so the
//! rest of the system can be exercised without live provider access. The
//! classification happens exactly once per request, here, and yields a
//! strategy object; action handlers never re-inspect the credential.

/// Prefix tagging synthetic access tokens so simulated credentials stay
/// distinguishable from real ones at rest and in audit evidence.
pub const DEMO_TOKEN_PREFIX: &str = "demo-";

/// Classification of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A real provider token.
    Live,
    /// A synthetic token issued by the demo exchange path.
    Demo,
}

impl CredentialKind {
    /// Classify an access token by its tag.
    pub fn classify(access_token: &str) -> Self {
        if access_token.starts_with(DEMO_TOKEN_PREFIX) {
            CredentialKind::Demo
        } else {
            CredentialKind::Live
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, CredentialKind::Demo)
    }
}

/// The single demo-vs-live decision point.
///
/// A connector selects one of its two backends based on the credential,
/// then runs the whole request against that backend.
#[derive(Debug)]
pub enum Strategy<L, S> {
    Live(L),
    Simulated(S),
}

impl<L, S> Strategy<L, S> {
    /// Select a backend for the given access token.
    pub fn select(access_token: &str, live: L, simulated: S) -> Self {
        match CredentialKind::classify(access_token) {
            CredentialKind::Live => Strategy::Live(live),
            CredentialKind::Demo => Strategy::Simulated(simulated),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Strategy::Simulated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_prefix_selects_simulated_backend() {
        assert_eq!(
            CredentialKind::classify("demo-gh-123"),
            CredentialKind::Demo
        );
        assert_eq!(CredentialKind::classify("gho_abc123"), CredentialKind::Live);

        let strategy: Strategy<&str, &str> = Strategy::select("demo-gh-123", "live", "sim");
        assert!(strategy.is_simulated());
    }
}
