//! Optional config from .bootcdnrc or ~/.bootcdnrc (JSON). Merged with env and CLI.

use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.bootcdn.cn";
pub const DEFAULT_CDN_URL: &str = "https://cdn.bootcss.com";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600 * 24;
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 1024 * 2048;

/// Optional config from file. Env and CLI override these.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub cdn_url: Option<String>,
    pub cache_dir: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_max_bytes: Option<u64>,
    pub raw: Option<bool>,
    pub async_script: Option<bool>,
}

impl Config {
    /// Catalog API base: BOOTCDN_API_URL, then config, then the public API.
    pub fn api_url(&self) -> String {
        env_url("BOOTCDN_API_URL")
            .or_else(|| self.api_url.as_deref().map(|u| u.trim().trim_end_matches('/').to_string()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// CDN base used to build asset urls: BOOTCDN_CDN_URL, then config, then the public CDN.
    pub fn cdn_url(&self) -> String {
        env_url("BOOTCDN_CDN_URL")
            .or_else(|| self.cdn_url.as_deref().map(|u| u.trim().trim_end_matches('/').to_string()))
            .unwrap_or_else(|| DEFAULT_CDN_URL.to_string())
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn cache_max_bytes(&self) -> u64 {
        self.cache_max_bytes.unwrap_or(DEFAULT_CACHE_MAX_BYTES)
    }
}

fn env_url(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

/// Load config from .bootcdnrc in dir, then ~/.bootcdnrc. Missing or invalid file = default.
pub fn load_config(dir: &Path) -> Config {
    let mut candidates = vec![dir.join(".bootcdnrc")];
    if let Some(home) = dirs_home() {
        candidates.push(home.join(".bootcdnrc"));
    }
    for path in &candidates {
        if path.is_file() {
            if let Ok(s) = std::fs::read_to_string(path) {
                return parse_config(&s);
            }
            break;
        }
    }
    Config::default()
}

fn parse_config(s: &str) -> Config {
    let mut cfg = Config::default();
    let Ok(v) = serde_json::from_str::<serde_json::Value>(s) else {
        return cfg;
    };
    if let Some(u) = v.get("apiUrl").and_then(|x| x.as_str()) {
        cfg.api_url = Some(u.to_string());
    }
    if let Some(u) = v.get("cdnUrl").and_then(|x| x.as_str()) {
        cfg.cdn_url = Some(u.to_string());
    }
    if let Some(c) = v.get("cacheDir").and_then(|x| x.as_str()) {
        cfg.cache_dir = Some(c.to_string());
    }
    if let Some(t) = v.get("cacheTtlSecs").and_then(|x| x.as_u64()) {
        cfg.cache_ttl_secs = Some(t);
    }
    if let Some(m) = v.get("cacheMaxBytes").and_then(|x| x.as_u64()) {
        cfg.cache_max_bytes = Some(m);
    }
    if let Some(r) = v.get("raw").and_then(|x| x.as_bool()) {
        cfg.raw = Some(r);
    }
    if let Some(a) = v.get("async").and_then(|x| x.as_bool()) {
        cfg.async_script = Some(a);
    }
    cfg
}

fn dirs_home() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
}
