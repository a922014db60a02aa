//! Where the viewer gets the published files from

use crate::config::ViewerConfig;
use crate::error::{SheetError, SheetResult};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// A place the CSV and its timestamp sidecar can be read from.
///
/// `Ok(None)` means the file does not exist there.
pub trait ArtifactSource {
    fn describe(&self) -> String;
    fn fetch_csv(&mut self) -> SheetResult<Option<String>>;
    fn fetch_timestamp(&mut self) -> SheetResult<Option<String>>;
    /// Forget anything cached so the next fetch hits the source
    fn clear_cache(&mut self);
}

//==============================================================================
// Local directory
//==============================================================================

pub struct LocalSource {
    dir: PathBuf,
    csv_name: String,
    timestamp_name: String,
}

impl LocalSource {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            csv_name: config.csv_name.clone(),
            timestamp_name: config.timestamp_name.clone(),
        }
    }

    fn read(&self, name: &str) -> SheetResult<Option<String>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }
}

impl ArtifactSource for LocalSource {
    fn describe(&self) -> String {
        self.dir.join(&self.csv_name).display().to_string()
    }

    fn fetch_csv(&mut self) -> SheetResult<Option<String>> {
        self.read(&self.csv_name)
    }

    fn fetch_timestamp(&mut self) -> SheetResult<Option<String>> {
        Ok(self
            .read(&self.timestamp_name)?
            .map(|s| s.trim().to_string()))
    }

    fn clear_cache(&mut self) {}
}

//==============================================================================
// Remote repository (raw file host + commit listing API)
//==============================================================================

/// Bodies fetched within the last `ttl`, keyed by repository path
pub struct TtlCache {
    ttl: Duration,
    entries: HashMap<String, (Instant, Option<String>)>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Option<String>> {
        self.entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, body)| body.clone())
    }

    pub fn insert(&mut self, key: &str, body: Option<String>) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(key.to_string(), (Instant::now(), body));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct RemoteSource {
    client: Client,
    repo: String,
    branch: String,
    raw_base: String,
    api_base: String,
    csv_path: String,
    timestamp_path: String,
    /// Cache-busting value for branch URLs, renewed on refresh
    token: String,
    cache: TtlCache,
}

impl RemoteSource {
    pub fn new(config: &ViewerConfig) -> SheetResult<Self> {
        let repo = config
            .repo
            .clone()
            .ok_or_else(|| SheetError::Config("no remote repo configured".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("sheetcast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            repo,
            branch: config.branch.clone(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            csv_path: config.remote_csv_path(),
            timestamp_path: config.remote_timestamp_path(),
            token: cache_token(),
            cache: TtlCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Raw URL pinned to an exact commit
    pub fn pinned_url(&self, sha: &str, path: &str) -> String {
        format!("{}/{}/{}/{}", self.raw_base, self.repo, sha, path)
    }

    /// Raw URL on the branch head, with the cache-busting token
    pub fn branch_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}?v={}",
            self.raw_base, self.repo, self.branch, path, self.token
        )
    }

    pub fn commits_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/commits?path={}&sha={}&per_page=1",
            self.api_base,
            self.repo,
            urlencoding::encode(path),
            urlencoding::encode(&self.branch)
        )
    }

    /// Newest commit that touched `path` on the branch
    fn latest_commit(&self, path: &str) -> SheetResult<Option<String>> {
        let url = self.commits_url(path);
        debug!("commit lookup {}", url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?;
        if !response.status().is_success() {
            return Err(SheetError::Http(format!(
                "commit lookup returned {}",
                response.status()
            )));
        }
        let body: serde_json::Value = serde_json::from_str(&response.text()?)
            .map_err(|e| SheetError::Http(format!("bad commit listing: {}", e)))?;
        Ok(body
            .as_array()
            .and_then(|commits| commits.first())
            .and_then(|commit| commit.get("sha"))
            .and_then(|sha| sha.as_str())
            .map(str::to_string))
    }

    fn get_text(&self, url: &str) -> SheetResult<Option<String>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text()?)),
            status => Err(SheetError::Http(format!("{} returned {}", url, status))),
        }
    }

    /// Pinned fetch first; any failure falls back to the branch URL
    fn fetch(&mut self, path: &str) -> SheetResult<Option<String>> {
        if let Some(hit) = self.cache.get(path) {
            debug!("cache hit for {}", path);
            return Ok(hit);
        }

        let pinned = match self.latest_commit(path) {
            Ok(Some(sha)) => match self.get_text(&self.pinned_url(&sha, path)) {
                Ok(body) => body,
                Err(e) => {
                    warn!("pinned fetch of {} failed: {}", path, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("commit lookup for {} failed: {}", path, e);
                None
            }
        };

        let body = match pinned {
            Some(body) => Some(body),
            None => self.get_text(&self.branch_url(path))?,
        };

        self.cache.insert(path, body.clone());
        Ok(body)
    }
}

impl ArtifactSource for RemoteSource {
    fn describe(&self) -> String {
        format!("{}@{}:{}", self.repo, self.branch, self.csv_path)
    }

    fn fetch_csv(&mut self) -> SheetResult<Option<String>> {
        let path = self.csv_path.clone();
        self.fetch(&path)
    }

    fn fetch_timestamp(&mut self) -> SheetResult<Option<String>> {
        let path = self.timestamp_path.clone();
        Ok(self.fetch(&path)?.map(|s| s.trim().to_string()))
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
        self.token = cache_token();
    }
}

fn cache_token() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteSource {
        let config = ViewerConfig {
            repo: Some("someone/excel-viewer".to_string()),
            ..Default::default()
        };
        RemoteSource::new(&config).unwrap()
    }

    #[test]
    fn test_remote_urls() {
        let source = remote();
        assert_eq!(
            source.pinned_url("abc123", "data/latest.csv"),
            "https://raw.githubusercontent.com/someone/excel-viewer/abc123/data/latest.csv"
        );
        assert!(source
            .branch_url("data/latest.csv")
            .starts_with("https://raw.githubusercontent.com/someone/excel-viewer/main/data/latest.csv?v="));
        assert_eq!(
            source.commits_url("data/latest.csv"),
            "https://api.github.com/repos/someone/excel-viewer/commits?path=data%2Flatest.csv&sha=main&per_page=1"
        );
        assert_eq!(source.describe(), "someone/excel-viewer@main:data/latest.csv");
    }

    #[test]
    fn test_remote_requires_repo() {
        assert!(RemoteSource::new(&ViewerConfig::default()).is_err());
    }

    #[test]
    fn test_ttl_cache() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("data/latest.csv", Some("a\n1\n".to_string()));
        cache.insert("data/updated_at.txt", None);

        assert_eq!(cache.get("data/latest.csv"), Some(Some("a\n1\n".to_string())));
        assert_eq!(cache.get("data/updated_at.txt"), Some(None));
        assert_eq!(cache.get("other"), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let mut cache = TtlCache::new(Duration::ZERO);
        cache.insert("k", Some("v".to_string()));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_local_source_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ViewerConfig {
            dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut source = LocalSource::new(&config);
        assert_eq!(source.fetch_csv().unwrap(), None);
        assert_eq!(source.fetch_timestamp().unwrap(), None);

        fs::write(dir.path().join("updated_at.txt"), "2025-03-20 19:00:00 UTC\n").unwrap();
        assert_eq!(
            source.fetch_timestamp().unwrap().as_deref(),
            Some("2025-03-20 19:00:00 UTC")
        );
    }
}
