//! OCI Distribution protocol client.
//!
//! Resolves image tags to manifest digests against Docker Hub, GHCR, and any
//! other OCI-compliant registry that follows the bearer token challenge flow.

use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use ureq::Agent;

use super::RegistryApi;
use crate::error::{PinnyError, Result};
use crate::reference::ImageRef;
use crate::reference::image::DEFAULT_REGISTRY;

/// OCI / Docker manifest media types accepted when resolving.
const ACCEPT_MANIFEST: &str = "\
    application/vnd.oci.image.index.v1+json, \
    application/vnd.docker.distribution.manifest.list.v2+json, \
    application/vnd.oci.image.manifest.v1+json, \
    application/vnd.docker.distribution.manifest.v2+json";

const USER_AGENT: &str = concat!("pinny/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static CHALLENGE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"(\w+)="([^"]*)""#).unwrap()
});

/// Bearer token response from a registry auth endpoint.
#[derive(Deserialize)]
struct TokenResp {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parsed `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, PartialEq, Eq)]
struct Challenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

/// Manifest response pieces the client cares about
struct ManifestResp {
    status: u16,
    digest: Option<String>,
    challenge: Option<String>,
}

/// Registry client with per-repository bearer token caching.
pub struct RegistryClient {
    agent: Agent,
    tokens: HashMap<String, String>,
}

impl RegistryClient {
    pub fn new() -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        Self {
            agent,
            tokens: HashMap::new(),
        }
    }

    /// Sends a HEAD for the manifest, returning status, digest header, and auth challenge
    fn head_manifest(&self, image: &ImageRef, url: &str) -> Result<ManifestResp> {
        tracing::debug!("HEAD {}", url);

        let mut req = self
            .agent
            .head(url)
            .header("Accept", ACCEPT_MANIFEST)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = self.tokens.get(&token_key(image)) {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }

        let resp = req.call().map_err(|e| remote_error(image, e))?;
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(ManifestResp {
            status: resp.status().as_u16(),
            digest: header("docker-content-digest"),
            challenge: header("www-authenticate"),
        })
    }

    /// Downloads the manifest body and hashes it
    fn fetch_manifest_digest(&self, image: &ImageRef, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);

        let mut req = self
            .agent
            .get(url)
            .header("Accept", ACCEPT_MANIFEST)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = self.tokens.get(&token_key(image)) {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }

        let resp = req.call().map_err(|e| remote_error(image, e))?;
        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(remote_error(image, format!("HTTP {status}")));
        }

        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| remote_error(image, e))?;
        Ok(content_digest(&body))
    }

    /// Answers a bearer challenge and caches the token for the repository
    fn authenticate(&mut self, image: &ImageRef, header: &str) -> Result<()> {
        let challenge = parse_challenge(header)
            .ok_or_else(|| remote_error(image, format!("unsupported auth challenge: {header}")))?;

        let mut params = Vec::new();
        if let Some(service) = &challenge.service {
            params.push(format!("service={service}"));
        }
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", image.repository()));
        params.push(format!("scope={scope}"));
        let url = format!("{}?{}", challenge.realm, params.join("&"));

        tracing::debug!("Fetching registry token from {}", challenge.realm);
        let resp = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| remote_error(image, e))?;
        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(remote_error(image, format!("token endpoint returned HTTP {status}")));
        }

        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| remote_error(image, e))?;
        let token: TokenResp = serde_json::from_slice(&body).map_err(|e| remote_error(image, e))?;
        let token = token
            .token
            .or(token.access_token)
            .ok_or_else(|| remote_error(image, "token endpoint returned no token"))?;

        self.tokens.insert(token_key(image), token);
        Ok(())
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryApi for RegistryClient {
    fn digest(&mut self, image: &ImageRef) -> Result<String> {
        let url = manifest_url(image);

        let mut resp = self.head_manifest(image, &url)?;
        if resp.status == 401 {
            let challenge = resp
                .challenge
                .clone()
                .ok_or_else(|| remote_error(image, "HTTP 401 without auth challenge"))?;
            self.authenticate(image, &challenge)?;
            resp = self.head_manifest(image, &url)?;
        }

        match resp.status {
            404 => Err(remote_error(image, "manifest not found")),
            status if status >= 400 => Err(remote_error(image, format!("HTTP {status}"))),
            _ => match resp.digest {
                Some(digest) => Ok(digest),
                None => self.fetch_manifest_digest(image, &url),
            },
        }
    }
}

/// Returns the registry API base URL.
fn api_base(image: &ImageRef) -> String {
    let host = match image.registry() {
        DEFAULT_REGISTRY => "registry-1.docker.io",
        other => other,
    };
    let scheme = if host == "localhost" || host.starts_with("localhost:") {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{host}/v2")
}

fn manifest_url(image: &ImageRef) -> String {
    format!(
        "{}/{}/manifests/{}",
        api_base(image),
        image.repository(),
        image.manifest_reference()
    )
}

fn token_key(image: &ImageRef) -> String {
    format!("{}/{}", image.registry(), image.repository())
}

/// Computes the `sha256:` digest of raw manifest bytes.
fn content_digest(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

fn parse_challenge(header: &str) -> Option<Challenge> {
    let (scheme, params) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for cap in CHALLENGE_PARAM.captures_iter(params) {
        let value = cap[2].to_string();
        match &cap[1] {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }

    Some(Challenge {
        realm: realm?,
        service,
        scope,
    })
}

fn remote_error(image: &ImageRef, err: impl std::fmt::Display) -> PinnyError {
    PinnyError::RemoteUnavailable {
        target: image.canonical(),
        reason: err.to_string(),
    }
}
