//! Intent templates and intent-text extraction.
//!
//! Planning is template matching, not NLU: a fixed catalog of
//! intent-pattern -> action-sequence templates, matched by keyword. The
//! contract is determinism — the same intent text and context always yield
//! the same plan shape.

use serde_json::json;

use tether_core::{ExecutionMode, PlanStep};

/// Default target when the intent names no repository.
pub const DEFAULT_REPO: &str = "acme/website";

/// One entry of the template catalog.
pub struct PlanTemplate {
    /// All of these must appear in the lowercased intent.
    pub keywords: &'static [&'static str],
    pub title: &'static str,
    pub description: &'static str,
    /// The mode the plan is authored for.
    pub mode: ExecutionMode,
    pub build_steps: fn(&IntentFacts) -> Vec<PlanStep>,
}

/// Facts extracted from the intent text, shared by all templates.
pub struct IntentFacts {
    pub repo: String,
    pub issue_number: u64,
    pub branch: String,
    pub text: String,
}

impl IntentFacts {
    pub fn extract(intent: &str) -> Self {
        Self {
            repo: extract_repo(intent).unwrap_or_else(|| DEFAULT_REPO.to_string()),
            issue_number: extract_issue_number(intent).unwrap_or(1),
            branch: extract_branch(intent).unwrap_or_else(|| "main".to_string()),
            text: intent.trim().to_string(),
        }
    }
}

/// First `owner/name` token in the intent, with surrounding punctuation
/// stripped.
fn extract_repo(intent: &str) -> Option<String> {
    intent
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-' && c != '_' && c != '.'))
        .find(|word| {
            let parts: Vec<_> = word.split('/').collect();
            parts.len() == 2 && parts.iter().all(|p| !p.is_empty())
        })
        .map(str::to_string)
}

/// Issue reference of the form `#12`.
fn extract_issue_number(intent: &str) -> Option<u64> {
    let hash = intent.find('#')?;
    let digits: String = intent[hash + 1..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Branch named after " to " (e.g. "switch the default branch to develop").
fn extract_branch(intent: &str) -> Option<String> {
    let lowered = intent.to_lowercase();
    let idx = lowered.find(" to ")?;
    intent[idx + 4..]
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_' && c != '/' && c != '.').to_string())
        .filter(|w| !w.is_empty())
}

fn step(action_id: &str, input: serde_json::Value) -> PlanStep {
    PlanStep {
        action_id: action_id.to_string(),
        input,
    }
}

/// The fixed template catalog, in match-priority order.
pub fn catalog() -> Vec<PlanTemplate> {
    vec![
        PlanTemplate {
            keywords: &["protect", "branch"],
            title: "Protect the default branch",
            description: "Inspect the repository, then require reviews on its main branch.",
            mode: ExecutionMode::Auto,
            build_steps: |facts| {
                vec![
                    step("github.repo.get", json!({ "repo": facts.repo })),
                    step(
                        "github.repo.set_branch_protection",
                        json!({
                            "repo": facts.repo,
                            "branch": facts.branch,
                            "protection": { "requiredReviews": 1, "enforceAdmins": true }
                        }),
                    ),
                ]
            },
        },
        PlanTemplate {
            keywords: &["archive"],
            title: "Archive repository",
            description: "Inspect the repository, then archive it.",
            mode: ExecutionMode::Auto,
            build_steps: |facts| {
                vec![
                    step("github.repo.get", json!({ "repo": facts.repo })),
                    step(
                        "github.repo.archive",
                        json!({ "repo": facts.repo, "archived": true }),
                    ),
                ]
            },
        },
        PlanTemplate {
            keywords: &["default", "branch"],
            title: "Change default branch",
            description: "Point the repository's default branch at the named branch.",
            mode: ExecutionMode::Auto,
            build_steps: |facts| {
                vec![step(
                    "github.repo.set_default_branch",
                    json!({ "repo": facts.repo, "branch": facts.branch }),
                )]
            },
        },
        PlanTemplate {
            keywords: &["close", "issue"],
            title: "Close issue",
            description: "Close the referenced issue.",
            mode: ExecutionMode::Auto,
            build_steps: |facts| {
                vec![step(
                    "github.issue.close",
                    json!({ "repo": facts.repo, "number": facts.issue_number }),
                )]
            },
        },
        PlanTemplate {
            keywords: &["create", "issue"],
            title: "Create issue",
            description: "File a new issue carrying the request text.",
            mode: ExecutionMode::Auto,
            build_steps: |facts| {
                vec![step(
                    "github.issue.create",
                    json!({ "repo": facts.repo, "title": facts.text }),
                )]
            },
        },
        PlanTemplate {
            keywords: &["list", "issue"],
            title: "List issues",
            description: "Read the repository's issues.",
            mode: ExecutionMode::ReadOnly,
            build_steps: |facts| {
                vec![step("github.issue.list", json!({ "repo": facts.repo }))]
            },
        },
        PlanTemplate {
            keywords: &["review"],
            title: "Review repository",
            description: "Read the repository summary and its issues.",
            mode: ExecutionMode::ReadOnly,
            build_steps: |facts| {
                vec![
                    step("github.repo.get", json!({ "repo": facts.repo })),
                    step("github.issue.list", json!({ "repo": facts.repo })),
                ]
            },
        },
    ]
}

/// First template whose keywords all appear in the intent.
pub fn match_template(intent: &str) -> Option<PlanTemplate> {
    let lowered = intent.to_lowercase();
    catalog()
        .into_iter()
        .find(|t| t.keywords.iter().all(|k| lowered.contains(k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_repo_issue_and_branch() {
        let facts =
            IntentFacts::extract("switch acme/api default branch to develop, see #42.");
        assert_eq!(facts.repo, "acme/api");
        assert_eq!(facts.issue_number, 42);
        assert_eq!(facts.branch, "develop");
    }

    #[test]
    fn falls_back_to_defaults() {
        let facts = IntentFacts::extract("protect the branch");
        assert_eq!(facts.repo, DEFAULT_REPO);
        assert_eq!(facts.branch, "main");
    }

    #[test]
    fn keyword_match_is_order_insensitive() {
        assert_eq!(
            match_template("please PROTECT my main branch").unwrap().title,
            "Protect the default branch"
        );
        assert_eq!(
            match_template("close the issue #7 in acme/api").unwrap().title,
            "Close issue"
        );
        assert!(match_template("make me a sandwich").is_none());
    }
}
