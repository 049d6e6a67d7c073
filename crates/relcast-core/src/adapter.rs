//! Canonical release operations over one provider's REST API.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::provider::{PathSegment, ProviderConfig};
use crate::release::{CanonicalRelease, SortOrder, CANONICAL_DATE_FORMAT};

/// Releases are requested in fixed-size pages; a short page ends pagination.
const PAGE_SIZE: usize = 100;

/// Requests that take longer than this fail with a network error instead of
/// hanging.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of attempting to create a single release on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The provider answered 201.
    Created,
    /// Any other status, with the reason extracted from the error body.
    Rejected(String),
}

/// Fetches and creates releases for one configured endpoint, in canonical
/// form.
pub struct ProviderAdapter {
    config: ProviderConfig,
    http: Client,
}

impl ProviderAdapter {
    /// Create an adapter for one endpoint.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("relcast")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// The endpoint configuration this adapter was built from.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn releases_url(&self) -> String {
        format!("{}/releases", self.config.api_base_url())
    }

    fn apply_headers(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        for (name, value) in self.config.headers() {
            request = request.header(name, value);
        }
        request
    }

    /// Fetch every release of the repository, mapped into canonical form.
    ///
    /// Pages through the provider's list endpoint until a page comes back
    /// with fewer than [`PAGE_SIZE`] items. Providers list newest-first;
    /// [`SortOrder::OldestFirst`] reverses the concatenated result. A release
    /// whose date does not match the provider's format is skipped and
    /// reported rather than aborting the fetch.
    pub async fn fetch_releases(&self, order: SortOrder) -> Result<Vec<CanonicalRelease>> {
        let base_url = self.releases_url();
        let mut releases = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!("{base_url}?per_page={PAGE_SIZE}&page={page}");
            debug!("Fetching {url}");

            let response = self
                .apply_headers(self.http.get(&url))
                .send()
                .await
                .map_err(|e| SyncError::Network(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::Network(format!(
                    "release list request failed with status {status}: {body}"
                )));
            }

            let items: Vec<Value> = response
                .json()
                .await
                .map_err(|e| SyncError::ResponseParse(e.to_string()))?;
            let page_len = items.len();

            for item in &items {
                match self.canonicalize(item) {
                    Ok(release) => releases.push(release),
                    Err(e) => warn!("Skipping release with unusable metadata: {e}"),
                }
            }

            if page_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        if order == SortOrder::OldestFirst {
            releases.reverse();
        }
        Ok(releases)
    }

    /// POST one canonical release back in the provider's native field names.
    ///
    /// A 201 answer is [`CreateOutcome::Created`]; every other status is
    /// reported as [`CreateOutcome::Rejected`] with the reason extracted by
    /// walking the provider's error path. Never retried.
    pub async fn create_release(&self, release: &CanonicalRelease) -> Result<CreateOutcome> {
        let fields = &self.config.spec().field_map;

        let mut body = Map::new();
        body.insert(fields.name.to_string(), Value::String(release.name.clone()));
        body.insert(
            fields.tag_name.to_string(),
            Value::String(release.tag_name.clone()),
        );
        body.insert(
            fields.release_date.to_string(),
            Value::String(release.release_date.clone()),
        );
        body.insert(
            fields.description.to_string(),
            Value::String(release.description.clone()),
        );

        let response = self
            .apply_headers(self.http.post(self.releases_url()))
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if response.status() == StatusCode::CREATED {
            return Ok(CreateOutcome::Created);
        }

        let error_body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::ResponseParse(e.to_string()))?;
        let reason = extract_error_reason(&error_body, self.config.spec().error_path)?;
        Ok(CreateOutcome::Rejected(reason))
    }

    /// Map one raw provider release object into canonical form.
    fn canonicalize(&self, raw: &Value) -> Result<CanonicalRelease> {
        let spec = self.config.spec();
        let fields = &spec.field_map;

        let tag_name = string_field(raw, fields.tag_name);
        let mut name = string_field(raw, fields.name);
        if name.is_empty() {
            name = tag_name.clone();
        }
        let release_date = canonical_date(&string_field(raw, fields.release_date), spec.date_format)?;

        Ok(CanonicalRelease {
            name,
            tag_name,
            release_date,
            description: string_field(raw, fields.description),
        })
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Parse a native date with the provider's pattern and re-emit it in the
/// canonical format.
fn canonical_date(value: &str, format: &'static str) -> Result<String> {
    let parsed =
        NaiveDateTime::parse_from_str(value, format).map_err(|_| SyncError::DateFormat {
            value: value.to_string(),
            format,
        })?;
    Ok(parsed.format(CANONICAL_DATE_FORMAT).to_string())
}

/// Walk an error-response body along the provider's configured path.
fn extract_error_reason(body: &Value, path: &[PathSegment]) -> Result<String> {
    let mut current = body;
    for segment in path {
        current = match segment {
            PathSegment::Key(key) => current.get(key),
            PathSegment::Index(index) => current.get(index),
        }
        .ok_or_else(|| {
            SyncError::Extraction(format!("{segment:?} not found in error response: {body}"))
        })?;
    }
    Ok(match current {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GITLAB_RELEASES_PATH: &str = "/api/v4/projects/ns%2Frepo/releases";

    fn gitlab_adapter(server: &MockServer) -> ProviderAdapter {
        let config = ProviderConfig::new(
            ProviderKind::GitLab,
            format!("{}/ns/repo", server.uri()),
            &HashMap::new(),
        )
        .unwrap();
        ProviderAdapter::new(config).unwrap()
    }

    fn github_adapter(server: &MockServer) -> ProviderAdapter {
        let config = ProviderConfig::with_api_base_url(
            ProviderKind::GitHub,
            server.uri(),
            &HashMap::new(),
        )
        .unwrap();
        ProviderAdapter::new(config).unwrap()
    }

    fn gitlab_release(tag: &str, released_at: &str) -> Value {
        json!({
            "name": tag,
            "tag_name": tag,
            "released_at": released_at,
            "description": format!("notes for {tag}"),
        })
    }

    fn gitlab_page(page: usize, count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| gitlab_release(&format!("p{page}-r{i}"), "2021-01-01T00:00:00.000000Z"))
            .collect()
    }

    #[test]
    fn test_canonical_date_is_idempotent() {
        let once = canonical_date("2021-01-01T12:34:56Z", "%Y-%m-%dT%H:%M:%SZ").unwrap();
        let twice = canonical_date(&once, "%Y-%m-%dT%H:%M:%SZ").unwrap();
        assert_eq!(once, "2021-01-01T12:34:56Z");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_canonical_date_drops_fractional_seconds() {
        let date = canonical_date("2021-02-01T00:00:00.123456Z", "%Y-%m-%dT%H:%M:%S%.fZ").unwrap();
        assert_eq!(date, "2021-02-01T00:00:00Z");
    }

    #[test]
    fn test_canonical_date_rejects_mismatched_input() {
        let err = canonical_date("yesterday", "%Y-%m-%dT%H:%M:%SZ").unwrap_err();
        assert!(matches!(err, SyncError::DateFormat { .. }));
    }

    #[test]
    fn test_extract_error_reason_github_shape() {
        let body = json!({"errors": [{"code": "already_exists"}]});
        let path = ProviderKind::GitHub.spec().error_path;
        assert_eq!(extract_error_reason(&body, path).unwrap(), "already_exists");
    }

    #[test]
    fn test_extract_error_reason_unresolvable_path() {
        let body = json!({"documentation_url": "https://example.com"});
        let path = ProviderKind::GitHub.spec().error_path;
        assert!(matches!(
            extract_error_reason(&body, path),
            Err(SyncError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn test_pagination_stops_on_short_page() {
        let server = MockServer::start().await;
        for (page, count) in [(1usize, 100usize), (2, 100), (3, 50)] {
            Mock::given(method("GET"))
                .and(path(GITLAB_RELEASES_PATH))
                .and(query_param("per_page", "100"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(gitlab_page(page, count)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let adapter = gitlab_adapter(&server);
        let releases = adapter.fetch_releases(SortOrder::NewestFirst).await.unwrap();

        assert_eq!(releases.len(), 250);
        assert_eq!(releases[0].tag_name, "p1-r0");
        assert_eq!(releases[249].tag_name, "p3-r49");
    }

    #[tokio::test]
    async fn test_single_short_page_issues_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gitlab_page(1, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let releases = adapter.fetch_releases(SortOrder::NewestFirst).await.unwrap();
        assert_eq!(releases.len(), 3);
    }

    #[tokio::test]
    async fn test_oldest_first_reverses_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![
                gitlab_release("v3", "2021-03-01T00:00:00.000000Z"),
                gitlab_release("v2", "2021-02-01T00:00:00.000000Z"),
                gitlab_release("v1", "2021-01-01T00:00:00.000000Z"),
            ]))
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let newest = adapter.fetch_releases(SortOrder::NewestFirst).await.unwrap();
        let oldest = adapter.fetch_releases(SortOrder::OldestFirst).await.unwrap();

        let reversed: Vec<_> = newest.into_iter().rev().collect();
        assert_eq!(oldest, reversed);
        assert_eq!(oldest[0].tag_name, "v1");
    }

    #[tokio::test]
    async fn test_fetch_normalizes_dates_and_fills_empty_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "",
                    "tag_name": "v2",
                    "released_at": "2021-02-01T00:00:00.000000Z",
                    "description": "second",
                },
                {
                    "name": "v1",
                    "tag_name": "v1",
                    "released_at": "2021-01-01T00:00:00.000000Z",
                    "description": "first",
                },
            ])))
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let releases = adapter.fetch_releases(SortOrder::OldestFirst).await.unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].name, "v1");
        assert_eq!(releases[0].release_date, "2021-01-01T00:00:00Z");
        assert_eq!(releases[1].name, "v2");
        assert_eq!(releases[1].tag_name, "v2");
        assert_eq!(releases[1].release_date, "2021-02-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_fetch_skips_release_with_bad_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "broken",
                    "tag_name": "broken",
                    "released_at": "not-a-date",
                    "description": "",
                },
                {
                    "name": "v1",
                    "tag_name": "v1",
                    "released_at": "2021-01-01T00:00:00.000000Z",
                    "description": "",
                },
            ])))
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let releases = adapter.fetch_releases(SortOrder::NewestFirst).await.unwrap();

        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag_name, "v1");
    }

    #[tokio::test]
    async fn test_fetch_fails_on_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let err = adapter
            .fetch_releases(SortOrder::NewestFirst)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn test_create_release_posts_native_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/releases"))
            .and(body_partial_json(json!({
                "name": "v1",
                "tag_name": "v1",
                "published_at": "2021-01-01T00:00:00Z",
                "body": "notes",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = github_adapter(&server);
        let release = CanonicalRelease {
            name: "v1".to_string(),
            tag_name: "v1".to_string(),
            release_date: "2021-01-01T00:00:00Z".to_string(),
            description: "notes".to_string(),
        };

        let outcome = adapter.create_release(&release).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
    }

    #[tokio::test]
    async fn test_create_release_rejected_with_github_error_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "errors": [{"code": "already_exists", "field": "tag_name"}],
            })))
            .mount(&server)
            .await;

        let adapter = github_adapter(&server);
        let release = CanonicalRelease {
            name: "v1".to_string(),
            tag_name: "v1".to_string(),
            release_date: "2021-01-01T00:00:00Z".to_string(),
            description: String::new(),
        };

        let outcome = adapter.create_release(&release).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Rejected("already_exists".to_string()));
    }

    #[tokio::test]
    async fn test_create_release_rejected_with_gitlab_error_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GITLAB_RELEASES_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "Release already exists",
            })))
            .mount(&server)
            .await;

        let adapter = gitlab_adapter(&server);
        let release = CanonicalRelease {
            name: "v1".to_string(),
            tag_name: "v1".to_string(),
            release_date: "2021-01-01T00:00:00Z".to_string(),
            description: String::new(),
        };

        let outcome = adapter.create_release(&release).await.unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Rejected("Release already exists".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_release_unexpected_error_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"oops": true})))
            .mount(&server)
            .await;

        let adapter = github_adapter(&server);
        let release = CanonicalRelease {
            name: "v1".to_string(),
            tag_name: "v1".to_string(),
            release_date: "2021-01-01T00:00:00Z".to_string(),
            description: String::new(),
        };

        let err = adapter.create_release(&release).await.unwrap_err();
        assert!(matches!(err, SyncError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_create_release_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let adapter = github_adapter(&server);
        let release = CanonicalRelease {
            name: "v1".to_string(),
            tag_name: "v1".to_string(),
            release_date: "2021-01-01T00:00:00Z".to_string(),
            description: String::new(),
        };

        let err = adapter.create_release(&release).await.unwrap_err();
        assert!(matches!(err, SyncError::ResponseParse(_)));
    }
}
