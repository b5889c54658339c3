//! GitHub OAuth flow with demo fallback.
//!
//! When the provider app is unconfigured (no client secret) or the sentinel
//! code `"demo"` is presented, the exchange issues a synthetic credential
//! instead of calling GitHub. Synthetic tokens are prefix-tagged and carry
//! a short expiry so they are distinguishable from real tokens everywhere
//! they appear.

use chrono::{Duration, Utc};
use uuid::Uuid;

use tether_core::ProviderConfig;
use tether_connector::{ConnectorError, IssuedCredential, DEMO_TOKEN_PREFIX};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// The sentinel authorization code that always takes the demo path.
pub const DEMO_CODE: &str = "demo";

/// Scopes requested during the consent flow.
const REQUESTED_SCOPES: &str = "repo read:org";

/// Build the consent-flow entry point. Pure; never fails.
///
/// Unconfigured apps get a best-effort demo URL so the flow stays
/// navigable end to end.
pub fn authorization_url(config: &ProviderConfig, state: &str) -> String {
    let client_id = config.client_id.as_deref().unwrap_or("demo-client");
    let redirect_uri = config
        .redirect_uri
        .as_deref()
        .unwrap_or("http://localhost:8080/connections/github/callback");

    let url = reqwest::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", REQUESTED_SCOPES),
            ("state", state),
        ],
    )
    .expect("static authorize URL with encoded params cannot fail to parse");
    url.to_string()
}

/// Issue the synthetic demo credential.
pub fn demo_credential() -> IssuedCredential {
    IssuedCredential {
        access_token: format!("{}gh-{}", DEMO_TOKEN_PREFIX, Uuid::new_v4().simple()),
        refresh_token: None,
        expires_at: Some(Utc::now() + Duration::hours(1)),
        demo_mode: true,
    }
}

/// Trade a one-time authorization code for credential material.
pub async fn exchange_code(
    config: &ProviderConfig,
    http: &reqwest::Client,
    code: &str,
) -> Result<IssuedCredential, ConnectorError> {
    if !config.is_configured() || code == DEMO_CODE {
        tracing::debug!(provider = "github", "issuing demo credential");
        return Ok(demo_credential());
    }

    let response = http
        .post(TOKEN_URL)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", config.client_id.as_deref().unwrap_or_default()),
            (
                "client_secret",
                config.client_secret.as_deref().unwrap_or_default(),
            ),
            ("code", code),
        ])
        .send()
        .await
        .map_err(|e| ConnectorError::AuthExchange(format!("token endpoint unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConnectorError::AuthExchange(format!(
            "token endpoint returned {status}"
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ConnectorError::AuthExchange(format!("invalid token response: {e}")))?;

    // GitHub reports rejection in-band with a 200.
    if let Some(error) = body["error"].as_str() {
        return Err(ConnectorError::AuthExchange(format!(
            "provider rejected the code: {error}"
        )));
    }

    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| {
            ConnectorError::AuthExchange("token response missing access_token".to_string())
        })?
        .to_string();

    let expires_at = body["expires_in"]
        .as_i64()
        .map(|seconds| Utc::now() + Duration::seconds(seconds));

    Ok(IssuedCredential {
        access_token,
        refresh_token: body["refresh_token"].as_str().map(str::to_string),
        expires_at,
        demo_mode: false,
    })
}
