//! Simulated GitHub backend for demo mode.
//!
//! Holds a small in-memory account with a couple of repositories so the
//! whole pipeline (discover, plan, dry-run, execute, rollback) can be
//! exercised without live provider access. State lives behind a `RwLock`;
//! mutations return the captured pre-state so handlers can build snapshots
//! and rollback plans from it.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::json;

use tether_connector::ConnectorError;

/// Scopes the demo grant carries. Full grant, so every declared action is
/// exercisable in demo mode.
pub const DEMO_SCOPES: &[&str] = &["read:org", "public_repo", "repo"];

pub const DEMO_ACCOUNT_ID: &str = "demo-1001";
pub const DEMO_ACCOUNT_NAME: &str = "demo-operator";

/// Branch protection settings for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchProtection {
    pub required_reviews: u32,
    pub enforce_admins: bool,
    #[serde(default)]
    pub required_status_checks: Vec<String>,
}

/// Issue state in the simulated backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimIssue {
    pub number: u64,
    pub title: String,
    pub body: String,
    /// "open" or "closed".
    pub state: String,
    pub comments: Vec<String>,
}

/// One simulated repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimRepo {
    pub full_name: String,
    pub default_branch: String,
    pub archived: bool,
    /// Branch name -> protection settings.
    pub protection: BTreeMap<String, BranchProtection>,
    pub issues: BTreeMap<u64, SimIssue>,
    next_issue_number: u64,
}

impl SimRepo {
    fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            default_branch: "main".to_string(),
            archived: false,
            protection: BTreeMap::new(),
            issues: BTreeMap::new(),
            next_issue_number: 1,
        }
    }

    /// Summary used as read output and archive/default-branch snapshots.
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "fullName": self.full_name,
            "defaultBranch": self.default_branch,
            "archived": self.archived,
            "openIssues": self.issues.values().filter(|i| i.state == "open").count(),
        })
    }
}

/// The demo account: a handful of repositories behind a lock.
pub struct SimulatedGithub {
    repos: RwLock<BTreeMap<String, SimRepo>>,
}

impl SimulatedGithub {
    /// Seed the demo account.
    pub fn new() -> Self {
        let mut repos = BTreeMap::new();

        // Give the demo something to look at.
        let mut website = SimRepo::new("acme/website");
        website.issues.insert(
            1,
            SimIssue {
                number: 1,
                title: "Landing page renders blank on Safari".to_string(),
                body: "Reported by support.".to_string(),
                state: "open".to_string(),
                comments: vec![],
            },
        );
        website.next_issue_number = 2;
        repos.insert(website.full_name.clone(), website);

        let api = SimRepo::new("acme/api");
        repos.insert(api.full_name.clone(), api);

        Self {
            repos: RwLock::new(repos),
        }
    }

    fn not_found(repo: &str) -> ConnectorError {
        ConnectorError::Provider(format!("repository not found: {repo}"))
    }

    fn with_repo<T>(
        &self,
        repo: &str,
        f: impl FnOnce(&SimRepo) -> T,
    ) -> Result<T, ConnectorError> {
        let repos = self.repos.read().expect("simulated state lock poisoned");
        repos.get(repo).map(f).ok_or_else(|| Self::not_found(repo))
    }

    fn with_repo_mut<T>(
        &self,
        repo: &str,
        f: impl FnOnce(&mut SimRepo) -> Result<T, ConnectorError>,
    ) -> Result<T, ConnectorError> {
        let mut repos = self.repos.write().expect("simulated state lock poisoned");
        let entry = repos.get_mut(repo).ok_or_else(|| Self::not_found(repo))?;
        f(entry)
    }

    pub fn list_repos(&self) -> Vec<serde_json::Value> {
        let repos = self.repos.read().expect("simulated state lock poisoned");
        repos.values().map(|r| r.summary()).collect()
    }

    pub fn get_repo(&self, repo: &str) -> Result<serde_json::Value, ConnectorError> {
        self.with_repo(repo, |r| r.summary())
    }

    pub fn list_issues(&self, repo: &str) -> Result<Vec<SimIssue>, ConnectorError> {
        self.with_repo(repo, |r| r.issues.values().cloned().collect())
    }

    pub fn get_issue(&self, repo: &str, number: u64) -> Result<SimIssue, ConnectorError> {
        self.with_repo(repo, |r| r.issues.get(&number).cloned())?
            .ok_or_else(|| ConnectorError::Provider(format!("issue not found: {repo}#{number}")))
    }

    pub fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<SimIssue, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let number = r.next_issue_number;
            r.next_issue_number += 1;
            let issue = SimIssue {
                number,
                title: title.to_string(),
                body: body.to_string(),
                state: "open".to_string(),
                comments: vec![],
            };
            r.issues.insert(number, issue.clone());
            Ok(issue)
        })
    }

    /// Set an issue's state, returning the pre-change issue.
    pub fn set_issue_state(
        &self,
        repo: &str,
        number: u64,
        state: &str,
    ) -> Result<SimIssue, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let issue = r.issues.get_mut(&number).ok_or_else(|| {
                ConnectorError::Provider(format!("issue not found: {repo}#{number}"))
            })?;
            let previous = issue.clone();
            issue.state = state.to_string();
            Ok(previous)
        })
    }

    pub fn comment_issue(
        &self,
        repo: &str,
        number: u64,
        comment: &str,
    ) -> Result<SimIssue, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let issue = r.issues.get_mut(&number).ok_or_else(|| {
                ConnectorError::Provider(format!("issue not found: {repo}#{number}"))
            })?;
            issue.comments.push(comment.to_string());
            Ok(issue.clone())
        })
    }

    pub fn get_protection(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<Option<BranchProtection>, ConnectorError> {
        self.with_repo(repo, |r| r.protection.get(branch).cloned())
    }

    /// Apply (or clear, with `None`) branch protection, returning the
    /// pre-change settings.
    pub fn set_protection(
        &self,
        repo: &str,
        branch: &str,
        protection: Option<BranchProtection>,
    ) -> Result<Option<BranchProtection>, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let previous = match protection {
                Some(p) => r.protection.insert(branch.to_string(), p),
                None => r.protection.remove(branch),
            };
            Ok(previous)
        })
    }

    /// Change the default branch, returning the previous one.
    pub fn set_default_branch(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<String, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let previous = std::mem::replace(&mut r.default_branch, branch.to_string());
            Ok(previous)
        })
    }

    /// Archive or unarchive, returning the previous flag.
    pub fn set_archived(&self, repo: &str, archived: bool) -> Result<bool, ConnectorError> {
        self.with_repo_mut(repo, |r| {
            let previous = std::mem::replace(&mut r.archived, archived);
            Ok(previous)
        })
    }
}

impl Default for SimulatedGithub {
    fn default() -> Self {
        Self::new()
    }
}
