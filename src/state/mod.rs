//! Application state the adapters need while a transition runs.
//!
//! The state is handed to every routing operation explicitly, so adapters
//! never read from a global store mid-transition.

use url::Url;

/// The slice of authentication state relevant to routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationState {
    /// URL of the pending web authentication, if a login flow has started.
    pub oauth_url: Option<Url>,
}

impl AuthenticationState {
    pub fn pending(url: Url) -> Self {
        Self { oauth_url: Some(url) }
    }
}

/// Snapshot of external state passed alongside a route request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingState {
    pub authentication: AuthenticationState,
}

impl RoutingState {
    pub fn with_authentication(authentication: AuthenticationState) -> Self {
        Self { authentication }
    }
}
