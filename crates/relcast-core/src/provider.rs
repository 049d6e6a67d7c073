//! Per-provider strategy table: API URL shape, auth headers, JSON field
//! names, date formats, and error-response paths.
//!
//! Every behavior difference between providers lives in a [`ProviderSpec`]
//! entry, resolved once when a [`ProviderConfig`] is constructed. Nothing
//! downstream branches on the provider kind again.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Supported git hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// GitHub.
    GitHub,
    /// GitLab.
    GitLab,
}

impl ProviderKind {
    /// Resolve the static behavior table entry for this provider.
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            Self::GitHub => &GITHUB,
            Self::GitLab => &GITLAB,
        }
    }

    /// Header carrying a personal access token for this provider.
    pub fn token_header(self, token: &str) -> (String, String) {
        match self {
            Self::GitHub => ("Authorization".to_string(), format!("Bearer {token}")),
            Self::GitLab => ("PRIVATE-TOKEN".to_string(), token.to_string()),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            other => Err(SyncError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Native JSON key for each canonical release field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub name: &'static str,
    pub tag_name: &'static str,
    pub release_date: &'static str,
    pub description: &'static str,
}

/// One step of the path used to pull an error message out of a provider's
/// error response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Key(&'static str),
    /// Array index.
    Index(usize),
}

/// Per-provider behavior, held as data rather than inline conditionals.
pub struct ProviderSpec {
    /// Canonical field name to native JSON key translation.
    pub field_map: FieldMap,

    /// strptime-style pattern the provider emits release dates in.
    pub date_format: &'static str,

    /// Path to the failure reason inside the provider's error bodies.
    pub error_path: &'static [PathSegment],

    /// Headers every request to this provider carries unless the caller
    /// overrides the same key.
    pub default_headers: &'static [(&'static str, &'static str)],

    api_url: fn(&str) -> Result<String>,
}

static GITHUB: ProviderSpec = ProviderSpec {
    field_map: FieldMap {
        name: "name",
        tag_name: "tag_name",
        // The live API has been seen ignoring this field on create.
        release_date: "published_at",
        description: "body",
    },
    date_format: "%Y-%m-%dT%H:%M:%SZ",
    error_path: &[
        PathSegment::Key("errors"),
        PathSegment::Index(0),
        PathSegment::Key("code"),
    ],
    default_headers: &[("Accept", "application/vnd.github+json")],
    api_url: github_api_url,
};

static GITLAB: ProviderSpec = ProviderSpec {
    field_map: FieldMap {
        name: "name",
        tag_name: "tag_name",
        release_date: "released_at",
        description: "description",
    },
    date_format: "%Y-%m-%dT%H:%M:%S%.fZ",
    error_path: &[PathSegment::Key("message")],
    default_headers: &[],
    api_url: gitlab_api_url,
};

/// Offsets of the end of the scheme prefix and the end of the host segment
/// in a `scheme://host/namespace/repo` URL.
fn split_repo_url(url: &str) -> Result<(usize, usize)> {
    let scheme_end = url
        .find("://")
        .map(|i| i + 3)
        .ok_or_else(|| SyncError::InvalidRepoUrl(url.to_string()))?;
    let host_end = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| SyncError::InvalidRepoUrl(url.to_string()))?;
    if url[host_end..].is_empty() {
        return Err(SyncError::InvalidRepoUrl(url.to_string()));
    }
    Ok((scheme_end, host_end))
}

/// `https://github.com/ns/repo` -> `https://api.github.com/repos/ns/repo`
fn github_api_url(repo_url: &str) -> Result<String> {
    let (scheme_end, host_end) = split_repo_url(repo_url)?;
    Ok(format!(
        "{}api.{}repos/{}",
        &repo_url[..scheme_end],
        &repo_url[scheme_end..host_end],
        &repo_url[host_end..]
    ))
}

/// `https://gitlab.com/ns/repo` -> `https://gitlab.com/api/v4/projects/ns%2Frepo`
fn gitlab_api_url(repo_url: &str) -> Result<String> {
    let (_, host_end) = split_repo_url(repo_url)?;
    let project_path = repo_url[host_end..].replace('/', "%2F");
    Ok(format!(
        "{}api/v4/projects/{}",
        &repo_url[..host_end],
        project_path
    ))
}

/// Immutable per-endpoint configuration.
///
/// Constructed once per repository endpoint and never mutated; the source
/// and destination of a copy run each get one.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    kind: ProviderKind,
    repo_url: String,
    api_base_url: String,
    headers: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Build the configuration for one repository endpoint.
    ///
    /// Derives the provider's API base URL from `repo_url` and merges
    /// `headers` over the provider's defaults. On key collision the caller's
    /// value wins.
    pub fn new(
        kind: ProviderKind,
        repo_url: impl Into<String>,
        headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let repo_url = repo_url.into();
        let spec = kind.spec();
        let api_base_url = (spec.api_url)(&repo_url)?;

        let mut merged: Vec<(String, String)> = spec
            .default_headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        for (name, value) in headers {
            match merged
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some((_, existing_value)) => *existing_value = value.clone(),
                None => merged.push((name.clone(), value.clone())),
            }
        }

        Ok(Self {
            kind,
            repo_url,
            api_base_url,
            headers: merged,
        })
    }

    /// The provider this endpoint talks to.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// The repository URL this endpoint was constructed from.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// The derived API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Headers sent with every request to this endpoint.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The provider's behavior table entry.
    pub fn spec(&self) -> &'static ProviderSpec {
        self.kind.spec()
    }

    /// Test-only constructor bypassing URL derivation, so adapters can be
    /// pointed at a local mock server.
    #[cfg(test)]
    pub(crate) fn with_api_base_url(
        kind: ProviderKind,
        api_base_url: impl Into<String>,
        headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let api_base_url = api_base_url.into();
        let mut config = Self::new(kind, "https://example.com/ns/repo", headers)?;
        config.api_base_url = api_base_url;
        Ok(config)
    }
}
