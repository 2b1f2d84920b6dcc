//! Remote release listings.
//!
//! Two sources are used:
//!
//! - the download feed at `{dist_server}/dl/?mode=json`, which lists the
//!   currently supported releases and flags the stable ones. It resolves
//!   `latest`.
//! - the git tree of the `golang/dl` repository, which has one directory per
//!   release wrapper ever published. It backs the full listing.
//!
//! ## Feed Format
//!
//! ```json
//! [
//!   { "version": "go1.21.3", "stable": true, "files": [ ... ] },
//!   { "version": "go1.22rc1", "stable": false, "files": [ ... ] }
//! ]
//! ```
//!
//! ## Tree Format
//!
//! ```json
//! {
//!   "tree": [
//!     { "path": "go1.21.3", "type": "tree" },
//!     { "path": "README.md", "type": "blob" }
//!   ],
//!   "truncated": false
//! }
//! ```

use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::ChgoError;
use crate::release::{Release, ReleaseSet};

/// Default server hosting the download feed.
pub const DEFAULT_DIST_SERVER: &str = "https://go.dev";

/// Default location of the `golang/dl` repository tree.
pub const DEFAULT_TREE_URL: &str = "https://api.github.com/repos/golang/dl/git/trees/master";

/// Path of the JSON download feed on the distribution server.
const FEED_PATH: &str = "/dl/?mode=json";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = "chgo-toolchain-switcher";

/// A release as reported by a listing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListedRelease {
    pub release: Release,
    /// Whether the source considers this release stable.
    pub stable: bool,
}

/// Source of known releases.
pub trait ReleaseLister {
    /// Lists every release the source knows about, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`ChgoError::Cancelled`] if `cancel` fires first, or
    /// [`ChgoError::Listing`] if the source cannot be read.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<ListedRelease>, ChgoError>;
}

/// Keeps only the releases flagged stable.
#[must_use]
pub fn stable_releases(listed: &[ListedRelease]) -> ReleaseSet {
    listed
        .iter()
        .filter(|l| l.stable)
        .map(|l| l.release)
        .collect()
}

/// The JSON download feed.
#[derive(Debug, Clone)]
pub struct StableFeed {
    client: reqwest::Client,
    url: String,
}

impl StableFeed {
    /// Creates a lister for the feed served by `dist_server`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(dist_server: &str) -> Result<Self, ChgoError> {
        Ok(Self {
            client: http_client()?,
            url: feed_url(dist_server),
        })
    }
}

impl ReleaseLister for StableFeed {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<ListedRelease>, ChgoError> {
        let text = fetch_text(&self.client, &self.url, true, cancel).await?;
        decode_feed(&text)
    }
}

/// The `golang/dl` repository tree.
#[derive(Debug, Clone)]
pub struct DownloadTree {
    client: reqwest::Client,
    url: String,
}

impl DownloadTree {
    /// Creates a lister for the git tree API response at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: &str) -> Result<Self, ChgoError> {
        Ok(Self {
            client: http_client()?,
            url: url.to_string(),
        })
    }
}

impl ReleaseLister for DownloadTree {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<ListedRelease>, ChgoError> {
        let text = fetch_text(&self.client, &self.url, false, cancel).await?;
        decode_tree(&text)
    }
}

/// Returns the URL of the download feed on `dist_server`.
fn feed_url(dist_server: &str) -> String {
    let server = dist_server.trim().trim_end_matches('/');
    format!("{server}{FEED_PATH}")
}

fn http_client() -> Result<reqwest::Client, ChgoError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ChgoError::listing_with_source("failed to create HTTP client", e))
}

/// Fetches `url` as text, giving up as soon as `cancel` fires.
async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    require_json: bool,
    cancel: &CancellationToken,
) -> Result<String, ChgoError> {
    let request = async {
        debug!(url, "fetching release listing");

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ChgoError::listing_with_source(format!("failed to fetch {url}"), e))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        check_response(response.status(), content_type.as_deref(), url, require_json)?;

        response
            .text()
            .await
            .map_err(|e| ChgoError::listing_with_source(format!("failed to read {url}"), e))
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ChgoError::Cancelled),
        result = request => result,
    }
}

/// Rejects unsuccessful responses and, where required, non-JSON bodies.
fn check_response(
    status: StatusCode,
    content_type: Option<&str>,
    url: &str,
    require_json: bool,
) -> Result<(), ChgoError> {
    if status != StatusCode::OK {
        return Err(http_error(status, url));
    }

    if require_json && !content_type.is_some_and(|ct| ct.starts_with("application/json")) {
        return Err(ChgoError::listing(format!(
            "content type of {url} was not application/json"
        )));
    }

    Ok(())
}

/// Maps an unexpected HTTP status to a user-friendly error.
fn http_error(status: StatusCode, url: &str) -> ChgoError {
    match status.as_u16() {
        404 => ChgoError::listing(format!("release listing not found at {url}")),
        code if code >= 500 => ChgoError::listing(format!("server error ({code}): {url}")),
        code => ChgoError::listing(format!("HTTP error {code}: {url}")),
    }
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    version: Release,
    stable: bool,
}

/// Decodes the JSON download feed.
///
/// # Errors
///
/// Returns an error if the body is not a feed or lists an unparseable version.
pub fn decode_feed(text: &str) -> Result<Vec<ListedRelease>, ChgoError> {
    let entries: Vec<FeedEntry> = serde_json::from_str(text)
        .map_err(|e| ChgoError::listing_with_source("failed to parse download feed", e))?;

    Ok(entries
        .into_iter()
        .map(|e| ListedRelease {
            release: e.version,
            stable: e.stable,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct Tree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Decodes a git tree API response into the releases it has directories for.
///
/// Only directories whose name starts with `go` are considered. Names that do
/// not parse as a release are skipped. A directory counts as stable when it
/// is a final tagged release.
///
/// # Errors
///
/// Returns an error if the body is not a git tree response.
pub fn decode_tree(text: &str) -> Result<Vec<ListedRelease>, ChgoError> {
    let tree: Tree = serde_json::from_str(text)
        .map_err(|e| ChgoError::listing_with_source("failed to parse release tree", e))?;

    if tree.truncated {
        warn!("release tree was truncated; some releases may be missing");
    }

    Ok(tree
        .tree
        .iter()
        .filter(|entry| entry.kind == "tree" && entry.path.starts_with("go"))
        .filter_map(|entry| match entry.path.parse::<Release>() {
            Ok(release) => Some(ListedRelease {
                release,
                stable: release.is_final(),
            }),
            Err(err) => {
                debug!(path = %entry.path, %err, "skipping tree entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed_json() -> &'static str {
        r#"[
            {
                "version": "go1.22rc1",
                "stable": false,
                "files": [
                    { "filename": "go1.22rc1.linux-amd64.tar.gz", "os": "linux" }
                ]
            },
            { "version": "go1.21.3", "stable": true, "files": [] },
            { "version": "go1.20.10", "stable": true, "files": [] }
        ]"#
    }

    fn sample_tree_json() -> &'static str {
        r#"{
            "sha": "abc123",
            "tree": [
                { "path": ".github", "type": "tree" },
                { "path": "README.md", "type": "blob" },
                { "path": "go.mod", "type": "blob" },
                { "path": "go1.20.10", "type": "tree" },
                { "path": "go1.21.3", "type": "tree" },
                { "path": "go1.21rc2", "type": "tree" },
                { "path": "go1.9.2rc2", "type": "tree" },
                { "path": "gotip", "type": "tree" },
                { "path": "internal", "type": "tree" }
            ],
            "truncated": false
        }"#
    }

    #[test]
    fn decode_feed_keeps_stability_flags() {
        let listed = decode_feed(sample_feed_json()).expect("Should parse feed");

        assert_eq!(listed.len(), 3);
        assert_eq!(
            listed[0],
            ListedRelease {
                release: Release::candidate(22, 1),
                stable: false
            }
        );
        assert!(listed[1].stable);
    }

    #[test]
    fn decode_feed_rejects_bad_versions() {
        let err = decode_feed(r#"[{ "version": "bogus", "stable": true }]"#).unwrap_err();
        assert!(matches!(err, ChgoError::Listing { .. }));
    }

    #[test]
    fn decode_feed_rejects_non_json() {
        assert!(decode_feed("<html></html>").is_err());
    }

    #[test]
    fn stable_releases_filters_and_picks_latest() {
        let listed = decode_feed(sample_feed_json()).expect("Should parse feed");
        let stable = stable_releases(&listed);

        assert_eq!(stable.len(), 2);
        assert_eq!(stable.latest(), Some(Release::new(21, 3)));
    }

    #[test]
    fn stable_releases_empty_when_nothing_stable() {
        let listed = [ListedRelease {
            release: Release::beta(23, 1),
            stable: false,
        }];
        assert!(stable_releases(&listed).is_empty());
    }

    #[test]
    fn decode_tree_keeps_release_directories() {
        let listed = decode_tree(sample_tree_json()).expect("Should parse tree");
        let releases: Vec<Release> = listed.iter().map(|l| l.release).collect();

        assert_eq!(
            releases,
            [
                Release::new(20, 10),
                Release::new(21, 3),
                Release::candidate(21, 2),
                Release::Tip,
            ]
        );
    }

    #[test]
    fn decode_tree_marks_final_releases_stable() {
        let listed = decode_tree(sample_tree_json()).expect("Should parse tree");

        let stable: Vec<String> = listed
            .iter()
            .filter(|l| l.stable)
            .map(|l| l.release.to_string())
            .collect();
        assert_eq!(stable, ["go1.20.10", "go1.21.3"]);
    }

    #[test]
    fn decode_tree_accepts_missing_truncated_flag() {
        let listed = decode_tree(r#"{ "tree": [] }"#).expect("Should parse tree");
        assert!(listed.is_empty());
    }

    #[test]
    fn feed_url_handles_trailing_slash_and_whitespace() {
        assert_eq!(feed_url("https://go.dev"), "https://go.dev/dl/?mode=json");
        assert_eq!(feed_url("https://go.dev/"), "https://go.dev/dl/?mode=json");
        assert_eq!(
            feed_url("  http://localhost:8080  "),
            "http://localhost:8080/dl/?mode=json"
        );
    }

    #[test]
    fn check_response_accepts_json_ok() {
        let result = check_response(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            "https://go.dev/dl/?mode=json",
            true,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn check_response_rejects_wrong_content_type() {
        let err = check_response(StatusCode::OK, Some("text/html"), "https://x", true).unwrap_err();
        assert!(err.to_string().contains("application/json"));

        let err = check_response(StatusCode::OK, None, "https://x", true).unwrap_err();
        assert!(err.to_string().contains("application/json"));

        assert!(check_response(StatusCode::OK, None, "https://x", false).is_ok());
    }

    #[test]
    fn check_response_404() {
        let err = check_response(StatusCode::NOT_FOUND, None, "https://x", false).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn check_response_500() {
        let err = check_response(StatusCode::BAD_GATEWAY, None, "https://x", false).unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn check_response_rejects_non_200_success() {
        let err = check_response(StatusCode::NO_CONTENT, None, "https://x", false).unwrap_err();
        assert!(err.to_string().contains("204"));
    }

    #[tokio::test]
    async fn list_returns_cancelled_when_token_fired() {
        let feed = StableFeed::new("http://127.0.0.1:9").expect("Should build client");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = feed.list(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
