use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::app_cache_dir;

const CACHE_VERSION: u32 = 1;
const CACHE_FILE: &str = "http_cache.json";

static CACHE: Mutex<Option<HttpCacheFile>> = Mutex::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: u64, max_age: Duration) -> bool {
        now.saturating_sub(self.fetched_at) < max_age.as_secs()
    }
}

/// GETs `url` and returns the body, reusing the on-disk copy stored under
/// `cache_key` while it is younger than `max_age`.
///
/// Older copies are revalidated with `ETag`/`Last-Modified`. If the request
/// fails outright the stale copy is served instead of the error.
pub fn fetch_json_cached(
    client: &Client,
    url: &str,
    cache_key: &str,
    max_age: Duration,
) -> Result<String> {
    let now = now_secs();
    let cached_entry = {
        let mut guard = CACHE.lock().expect("http cache lock poisoned");
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.entries.get(cache_key).cloned()
    };
    if let Some(entry) = cached_entry.as_ref()
        && entry.is_fresh(now, max_age)
    {
        debug!(cache_key, "http cache hit");
        return Ok(entry.body.clone());
    }

    let mut req = client.get(url);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = match req.send() {
        Ok(resp) => resp,
        Err(err) => {
            if let Some(entry) = cached_entry {
                warn!(cache_key, error = %err, "request failed, serving stale cache entry");
                return Ok(entry.body);
            }
            return Err(err).context("request failed");
        }
    };
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(mut entry) = cached_entry {
            entry.fetched_at = now;
            refresh_cache_entry(cache_key, entry.clone());
            return Ok(entry.body);
        }
        return Err(anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, body));
    }

    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let entry = CacheEntry {
        body: body.clone(),
        etag: header(ETAG),
        last_modified: header(LAST_MODIFIED),
        fetched_at: now,
    };
    refresh_cache_entry(cache_key, entry);
    Ok(body)
}

fn refresh_cache_entry(key: &str, entry: CacheEntry) {
    let mut guard = CACHE.lock().expect("http cache lock poisoned");
    let cache = guard.get_or_insert_with(load_cache_file);
    cache.version = CACHE_VERSION;
    cache.entries.insert(key.to_string(), entry);
    if let Err(err) = save_cache_file(cache) {
        debug!(error = %format!("{err:#}"), "http cache not persisted");
    }
}

fn load_cache_file() -> HttpCacheFile {
    let Some(path) = cache_path() else {
        return HttpCacheFile::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_file(cache: &HttpCacheFile) -> Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).context("create cache dir")?;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
