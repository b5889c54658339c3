//! Live GitHub REST client.
//!
//! Thin wrapper over `reqwest` used by the live execution strategy. One
//! provider call per method, no retries; the shared client enforces a
//! per-call timeout.

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;

use tether_connector::ConnectorError;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "tether-github-connector";

pub struct GithubApi {
    http: Client,
    base: String,
}

/// Identity and granted scopes behind a token, from `GET /user`.
pub struct TokenIdentity {
    pub account_id: String,
    pub account_name: String,
    pub scopes: Vec<String>,
}

impl GithubApi {
    pub fn new(api_base: Option<&str>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            base: api_base.unwrap_or(DEFAULT_API_BASE).trim_end_matches('/').to_string(),
        }
    }

    async fn send(
        &self,
        method: Method,
        token: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ConnectorError> {
        let url = format!("{}{}", self.base, path);
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| ConnectorError::Provider(format!("request to {path} failed: {e}")))
    }

    async fn expect_json(
        &self,
        method: Method,
        token: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ConnectorError> {
        let response = self.send(method, token, path, body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Provider(format!(
                "{path} returned {status}"
            )));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        response
            .json()
            .await
            .map_err(|e| ConnectorError::Provider(format!("{path} returned invalid JSON: {e}")))
    }

    /// Resolve the identity and granted scopes behind a token.
    ///
    /// Scopes come from the `X-OAuth-Scopes` response header. A 401 means
    /// the credential is expired or revoked.
    pub async fn identity(&self, token: &str) -> Result<TokenIdentity, ConnectorError> {
        let response = self.send(Method::GET, token, "/user", None).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ConnectorError::Discovery(
                "credential rejected by provider (expired or revoked)".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ConnectorError::Provider(format!("/user returned {status}")));
        }

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let user: Value = response
            .json()
            .await
            .map_err(|e| ConnectorError::Provider(format!("/user returned invalid JSON: {e}")))?;

        Ok(TokenIdentity {
            account_id: user["id"].to_string(),
            account_name: user["login"].as_str().unwrap_or_default().to_string(),
            scopes,
        })
    }

    pub async fn get_repo(&self, token: &str, repo: &str) -> Result<Value, ConnectorError> {
        self.expect_json(Method::GET, token, &format!("/repos/{repo}"), None)
            .await
    }

    pub async fn list_repos(&self, token: &str) -> Result<Value, ConnectorError> {
        self.expect_json(Method::GET, token, "/user/repos?per_page=50", None)
            .await
    }

    pub async fn list_issues(&self, token: &str, repo: &str) -> Result<Value, ConnectorError> {
        self.expect_json(Method::GET, token, &format!("/repos/{repo}/issues"), None)
            .await
    }

    pub async fn get_issue(
        &self,
        token: &str,
        repo: &str,
        number: u64,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(
            Method::GET,
            token,
            &format!("/repos/{repo}/issues/{number}"),
            None,
        )
        .await
    }

    pub async fn create_issue(
        &self,
        token: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(
            Method::POST,
            token,
            &format!("/repos/{repo}/issues"),
            Some(&serde_json::json!({ "title": title, "body": body })),
        )
        .await
    }

    pub async fn set_issue_state(
        &self,
        token: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(
            Method::PATCH,
            token,
            &format!("/repos/{repo}/issues/{number}"),
            Some(&serde_json::json!({ "state": state })),
        )
        .await
    }

    pub async fn comment_issue(
        &self,
        token: &str,
        repo: &str,
        number: u64,
        comment: &str,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(
            Method::POST,
            token,
            &format!("/repos/{repo}/issues/{number}/comments"),
            Some(&serde_json::json!({ "body": comment })),
        )
        .await
    }

    /// Current protection for a branch; `None` when unprotected (404).
    pub async fn get_branch_protection(
        &self,
        token: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<Value>, ConnectorError> {
        let path = format!("/repos/{repo}/branches/{branch}/protection");
        let response = self.send(Method::GET, token, &path, None).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response.json().await.map_err(|e| {
                    ConnectorError::Provider(format!("{path} returned invalid JSON: {e}"))
                })?;
                Ok(Some(value))
            }
            status => Err(ConnectorError::Provider(format!("{path} returned {status}"))),
        }
    }

    pub async fn put_branch_protection(
        &self,
        token: &str,
        repo: &str,
        branch: &str,
        settings: &Value,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(
            Method::PUT,
            token,
            &format!("/repos/{repo}/branches/{branch}/protection"),
            Some(settings),
        )
        .await
    }

    pub async fn delete_branch_protection(
        &self,
        token: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ConnectorError> {
        let path = format!("/repos/{repo}/branches/{branch}/protection");
        let response = self.send(Method::DELETE, token, &path, None).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ConnectorError::Provider(format!("{path} returned {status}")))
        }
    }

    /// PATCH /repos/{repo} — used for default branch and archived flag.
    pub async fn update_repo(
        &self,
        token: &str,
        repo: &str,
        patch: &Value,
    ) -> Result<Value, ConnectorError> {
        self.expect_json(Method::PATCH, token, &format!("/repos/{repo}"), Some(patch))
            .await
    }
}
