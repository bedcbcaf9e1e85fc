//! BootCDN catalog API client: library index, name list and per-library details.
//! The [`CatalogSource`] trait is the seam the session talks to, so the cache
//! and tests can stand in for the network.

use crate::error::{CdnError, Result};
use crate::http_client::HttpClient;
use crate::model::{LibraryCatalog, LibraryDetail, LibrarySummary};

pub trait CatalogSource {
    /// Every library in the index, in API order.
    fn fetch_catalog(&self) -> Result<LibraryCatalog>;

    /// Every library name in the index.
    fn fetch_library_names(&self) -> Result<Vec<String>>;

    /// Details for one library; `Ok(None)` when the API does not know it.
    /// An empty name is rejected before any request is made.
    fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>>;

    /// Identifies where responses come from. Cached responses are keyed by it,
    /// so switching API or CDN never serves entries fetched from the old one.
    fn origin(&self) -> String {
        String::new()
    }
}

impl<S: CatalogSource + ?Sized> CatalogSource for &S {
    fn fetch_catalog(&self) -> Result<LibraryCatalog> {
        (**self).fetch_catalog()
    }

    fn fetch_library_names(&self) -> Result<Vec<String>> {
        (**self).fetch_library_names()
    }

    fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>> {
        (**self).fetch_library(name)
    }

    fn origin(&self) -> String {
        (**self).origin()
    }
}

impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    fn fetch_catalog(&self) -> Result<LibraryCatalog> {
        (**self).fetch_catalog()
    }

    fn fetch_library_names(&self) -> Result<Vec<String>> {
        (**self).fetch_library_names()
    }

    fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>> {
        (**self).fetch_library(name)
    }

    fn origin(&self) -> String {
        (**self).origin()
    }
}

pub(crate) fn require_library_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CdnError::invalid_argument("fetch_library", "No library specified."));
    }
    Ok(())
}

fn catalog_error(operation: &str, library: Option<&str>, source: String) -> CdnError {
    CdnError::Catalog {
        operation: operation.to_string(),
        library: library.map(String::from),
        source,
    }
}

/// Parse `libraries.min.json`: an array of `[name, description, stars]` rows.
/// Rows without a string name are skipped.
pub fn parse_catalog(body: &[u8]) -> Result<LibraryCatalog> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| catalog_error("parse_catalog", None, e.to_string()))?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = row.get(0).and_then(|v| v.as_str())?;
            let description = row.get(1).and_then(|v| v.as_str()).unwrap_or("");
            let popularity = row.get(2).and_then(|v| v.as_i64()).unwrap_or(0);
            Some(LibrarySummary::new(name, description, popularity))
        })
        .collect())
}

pub fn parse_library_names(body: &[u8]) -> Result<Vec<String>> {
    let names: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| catalog_error("parse_library_names", None, e.to_string()))?;
    Ok(names
        .into_iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

/// Parse `libraries/<name>.min.json` and resolve asset urls against `cdn_base`.
pub fn parse_library(body: &[u8], cdn_base: &str) -> Result<LibraryDetail> {
    let mut lib: LibraryDetail = serde_json::from_slice(body)
        .map_err(|e| catalog_error("parse_library", None, e.to_string()))?;
    lib.resolve_assets(cdn_base);
    Ok(lib)
}

/// HTTP-backed catalog source.
pub struct BootCdnClient {
    http: HttpClient,
    api_url: String,
    cdn_url: String,
}

impl BootCdnClient {
    pub fn new(http: HttpClient, api_url: &str, cdn_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            cdn_url: cdn_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn library_url(&self, name: &str) -> String {
        format!("{}/libraries/{}.min.json", self.api_url, urlencoding::encode(name))
    }
}

impl CatalogSource for BootCdnClient {
    fn fetch_catalog(&self) -> Result<LibraryCatalog> {
        let body = self.http.get(&format!("{}/libraries.min.json", self.api_url))?;
        parse_catalog(&body)
    }

    fn fetch_library_names(&self) -> Result<Vec<String>> {
        let body = self.http.get(&format!("{}/names.min.json", self.api_url))?;
        parse_library_names(&body)
    }

    fn fetch_library(&self, name: &str) -> Result<Option<LibraryDetail>> {
        require_library_name(name)?;
        match self.http.get_optional(&self.library_url(name))? {
            Some(body) => parse_library(&body, &self.cdn_url)
                .map(Some)
                .map_err(|e| match e {
                    CdnError::Catalog { operation, source, .. } => CdnError::Catalog {
                        operation,
                        library: Some(name.to_string()),
                        source,
                    },
                    other => other,
                }),
            None => Ok(None),
        }
    }

    fn origin(&self) -> String {
        format!("{} {}", self.api_url, self.cdn_url)
    }
}
