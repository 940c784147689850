//! GitHub REST API client
//!
//! Blocking client for the three endpoints the step resolver needs:
//! matching refs, annotated tag objects, and commit comparison.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use ureq::Agent;

use super::{Comparison, GitRef, HostingApi, ObjectKind};
use crate::error::{PinnyError, Result};

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("pinny/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct RefEntry {
    #[serde(rename = "ref")]
    name: String,
    object: ObjectEntry,
}

#[derive(Deserialize)]
struct ObjectEntry {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TagEntry {
    object: ObjectEntry,
}

#[derive(Deserialize)]
struct CompareEntry {
    status: String,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Raw response pieces the client cares about
struct ApiResponse {
    status: u16,
    next_page: Option<String>,
    body: Vec<u8>,
}

/// GitHub API client with optional bearer authentication
pub struct GithubClient {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create a client for `api_url`, authenticating with `token` when given
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Performs a GET and returns status, pagination link, and body
    fn get(&self, target: &str, url: &str) -> Result<ApiResponse> {
        tracing::debug!("GET {}", url);

        let mut req = self
            .agent
            .get(url)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }

        let resp = req.call().map_err(|e| remote_error(target, e))?;
        let status = resp.status().as_u16();
        let next_page = resp
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);

        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| remote_error(target, e))?;

        Ok(ApiResponse {
            status,
            next_page,
            body,
        })
    }

    /// Performs a GET that must succeed and decodes the JSON body
    fn get_json<T: for<'de> Deserialize<'de>>(&self, target: &str, url: &str) -> Result<T> {
        let resp = self.get(target, url)?;
        if resp.status >= 400 {
            return Err(status_error(target, &resp));
        }
        serde_json::from_slice(&resp.body).map_err(|e| remote_error(target, e))
    }
}

impl HostingApi for GithubClient {
    fn list_refs(&self, owner: &str, repo: &str) -> Result<Vec<GitRef>> {
        let target = format!("{owner}/{repo}");
        let mut url = Some(format!(
            "{}/repos/{owner}/{repo}/git/matching-refs/?per_page=100",
            self.api_url
        ));
        let mut refs = Vec::new();

        while let Some(page_url) = url.take() {
            let resp = self.get(&target, &page_url)?;
            if resp.status >= 400 {
                return Err(status_error(&target, &resp));
            }
            let entries: Vec<RefEntry> =
                serde_json::from_slice(&resp.body).map_err(|e| remote_error(&target, e))?;
            refs.extend(entries.into_iter().map(|entry| {
                GitRef::new(
                    entry.name,
                    ObjectKind::from_api(&entry.object.kind),
                    entry.object.sha,
                )
            }));
            url = resp.next_page;
        }

        tracing::debug!("Listed {} refs for {}", refs.len(), target);
        Ok(refs)
    }

    fn annotated_tag_target(&self, owner: &str, repo: &str, sha: &str) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}/git/tags/{sha}", self.api_url);
        let tag: TagEntry = self.get_json(&format!("{owner}/{repo}"), &url)?;
        Ok(tag.object.sha)
    }

    fn compare(&self, owner: &str, repo: &str, base: &str, head: &str) -> Result<Comparison> {
        let target = format!("{owner}/{repo}");
        let url = format!(
            "{}/repos/{owner}/{repo}/compare/{base}...{head}?per_page=1",
            self.api_url
        );
        let resp = self.get(&target, &url)?;

        // No common ancestor between the two revisions
        if resp.status == 404 {
            return Ok(Comparison::NotFound);
        }
        if resp.status >= 400 {
            return Err(status_error(&target, &resp));
        }

        let entry: CompareEntry =
            serde_json::from_slice(&resp.body).map_err(|e| remote_error(&target, e))?;
        Ok(Comparison::from_api(&entry.status))
    }
}

/// Extract the `rel="next"` URL from a `Link` header
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (url, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let url = url.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

fn remote_error(target: &str, err: impl std::fmt::Display) -> PinnyError {
    PinnyError::RemoteUnavailable {
        target: target.to_string(),
        reason: err.to_string(),
    }
}

fn status_error(target: &str, resp: &ApiResponse) -> PinnyError {
    let detail = serde_json::from_slice::<ApiMessage>(&resp.body)
        .map(|m| m.message)
        .unwrap_or_default();
    let reason = if detail.is_empty() {
        format!("HTTP {}", resp.status)
    } else {
        format!("HTTP {}: {}", resp.status, detail)
    };
    PinnyError::RemoteUnavailable {
        target: target.to_string(),
        reason,
    }
}
