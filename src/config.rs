//! Settings for talking to the course repository.

use crate::error::store::{Result, StoreError};
use regex::Regex;
use std::fmt;

pub const DEFAULT_REPO: &str = "meetpatel1812/mcmaster_course_outline_app";
pub const DEFAULT_TABLE_PATH: &str = "pdf_data.py";
pub const DEFAULT_VARIABLE: &str = "pdfs";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// `owner/name` of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn parse(slug: &str) -> Result<Self> {
        let re = Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)/([A-Za-z0-9._-]+)$")
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let caps = re
            .captures(slug.trim())
            .ok_or_else(|| StoreError::Config(format!("`{}` is not an owner/name repository", slug)))?;
        Ok(RepoSlug {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone)]
pub struct AdminConfig {
    pub credential: String,
    pub repo: RepoSlug,
    pub table_path: String,
    pub variable: String,
    pub branch: Option<String>,
    pub api_url: String,
}

// 不打印 token
impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("credential", &"***")
            .field("repo", &self.repo)
            .field("table_path", &self.table_path)
            .field("variable", &self.variable)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AdminConfig {
    pub fn new(credential: &str, repo: RepoSlug) -> Self {
        AdminConfig {
            credential: credential.to_string(),
            repo,
            table_path: DEFAULT_TABLE_PATH.to_string(),
            variable: DEFAULT_VARIABLE.to_string(),
            branch: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Reads `GITHUB_TOKEN`, `COURSE_REPO`, `COURSE_TABLE_PATH`,
    /// `COURSE_TABLE_VARIABLE`, `COURSE_BRANCH` and `GITHUB_API_URL` through
    /// `lookup`. A missing token is handed to `prompt_token`.
    pub fn from_lookup<F, P>(lookup: F, prompt_token: P) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        P: FnOnce() -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credential = get("GITHUB_TOKEN")
            .or_else(prompt_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StoreError::Config("GITHUB_TOKEN is not set".to_string()))?;

        let repo = RepoSlug::parse(&get("COURSE_REPO").unwrap_or_else(|| DEFAULT_REPO.to_string()))?;

        let table_path = get("COURSE_TABLE_PATH")
            .unwrap_or_else(|| DEFAULT_TABLE_PATH.to_string())
            .trim_matches('/')
            .to_string();
        if table_path.is_empty() {
            return Err(StoreError::Config("COURSE_TABLE_PATH is empty".to_string()));
        }

        let variable = get("COURSE_TABLE_VARIABLE").unwrap_or_else(|| DEFAULT_VARIABLE.to_string());
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| StoreError::Config(e.to_string()))?;
        if !ident.is_match(&variable) {
            return Err(StoreError::Config(format!(
                "COURSE_TABLE_VARIABLE `{}` is not a Python identifier",
                variable
            )));
        }

        let api_url = get("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_url).map_err(|e| StoreError::Config(format!("GITHUB_API_URL: {}", e)))?;

        Ok(AdminConfig {
            credential,
            repo,
            table_path,
            variable,
            branch: get("COURSE_BRANCH"),
            api_url,
        })
    }

    pub fn from_env<P>(prompt_token: P) -> Result<Self>
    where
        P: FnOnce() -> Option<String>,
    {
        Self::from_lookup(|key| std::env::var(key).ok(), prompt_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AdminConfig::from_lookup(lookup(&[("GITHUB_TOKEN", "ghp_x")]), || None).unwrap();
        assert_eq!(config.credential, "ghp_x");
        assert_eq!(config.repo.to_string(), DEFAULT_REPO);
        assert_eq!(config.table_path, "pdf_data.py");
        assert_eq!(config.variable, "pdfs");
        assert_eq!(config.branch, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn overrides_are_read() {
        let config = AdminConfig::from_lookup(
            lookup(&[
                ("GITHUB_TOKEN", "t"),
                ("COURSE_REPO", "octo/courses"),
                ("COURSE_TABLE_PATH", "/data/table.py"),
                ("COURSE_TABLE_VARIABLE", "courses"),
                ("COURSE_BRANCH", "staging"),
                ("GITHUB_API_URL", "https://ghe.example.com/api/v3/"),
            ]),
            || None,
        )
        .unwrap();
        assert_eq!(config.repo, RepoSlug { owner: "octo".into(), name: "courses".into() });
        assert_eq!(config.table_path, "data/table.py");
        assert_eq!(config.variable, "courses");
        assert_eq!(config.branch.as_deref(), Some("staging"));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn missing_token_uses_prompt() {
        let config = AdminConfig::from_lookup(lookup(&[]), || Some(" typed \n".to_string())).unwrap();
        assert_eq!(config.credential, "typed");

        let err = AdminConfig::from_lookup(lookup(&[]), || None).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn rejects_bad_values() {
        for pairs in [
            vec![("GITHUB_TOKEN", "t"), ("COURSE_REPO", "no-slash")],
            vec![("GITHUB_TOKEN", "t"), ("COURSE_REPO", "a/b/c")],
            vec![("GITHUB_TOKEN", "t"), ("COURSE_TABLE_VARIABLE", "pdfs = 1")],
            vec![("GITHUB_TOKEN", "t"), ("GITHUB_API_URL", "not a url")],
        ] {
            assert!(AdminConfig::from_lookup(lookup(&pairs), || None).is_err(), "{:?}", pairs);
        }
    }

    #[test]
    fn debug_hides_credential() {
        let config = AdminConfig::new("secret-token", RepoSlug::parse("a/b").unwrap());
        assert!(!format!("{:?}", config).contains("secret-token"));
    }
}
