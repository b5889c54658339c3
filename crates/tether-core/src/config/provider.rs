//! Provider credential configuration.

use serde::{Deserialize, Serialize};

/// One section per supported provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// GitHub OAuth app settings.
    #[serde(default)]
    pub github: ProviderConfig,
}

/// OAuth app settings for one provider.
///
/// All fields are optional: a missing client secret switches the connector
/// into demo mode rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    /// Never logged.
    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Override for the provider API base URL (tests, GitHub Enterprise).
    #[serde(default)]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether live credential exchange is possible.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}
