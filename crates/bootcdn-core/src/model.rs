//! Catalog data model: library summaries, library details and version assets.
//! Everything here is read-only once built; the picker only filters references.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::picker::classify_stability;

/// Treat an explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row of the catalog index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub name: String,
    pub description: String,
    /// GitHub stars as reported by the index.
    pub popularity: i64,
}

impl LibrarySummary {
    pub fn new(name: &str, description: &str, popularity: i64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            popularity,
        }
    }
}

/// The full library index, keyed by name. Iteration follows upstream order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LibrarySummary>", into = "Vec<LibrarySummary>")]
pub struct LibraryCatalog {
    entries: Vec<LibrarySummary>,
    index: HashMap<String, usize>,
}

impl LibraryCatalog {
    pub fn get(&self, name: &str) -> Option<&LibrarySummary> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LibrarySummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|lib| lib.name.as_str()).collect()
    }
}

impl FromIterator<LibrarySummary> for LibraryCatalog {
    /// Duplicate names keep the first entry.
    fn from_iter<I: IntoIterator<Item = LibrarySummary>>(iter: I) -> Self {
        let mut catalog = LibraryCatalog::default();
        for lib in iter {
            if catalog.index.contains_key(&lib.name) {
                continue;
            }
            catalog.index.insert(lib.name.clone(), catalog.entries.len());
            catalog.entries.push(lib);
        }
        catalog
    }
}

impl From<Vec<LibrarySummary>> for LibraryCatalog {
    fn from(entries: Vec<LibrarySummary>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<LibraryCatalog> for Vec<LibrarySummary> {
    fn from(catalog: LibraryCatalog) -> Self {
        catalog.entries
    }
}

impl<'a> IntoIterator for &'a LibraryCatalog {
    type Item = &'a LibrarySummary;
    type IntoIter = std::slice::Iter<'a, LibrarySummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Files published for one version of a library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAsset {
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub files: Vec<String>,
    /// CDN url for each entry of `files`, same order.
    #[serde(default, deserialize_with = "nullable")]
    pub urls: Vec<String>,
    #[serde(default, rename = "isUnstable")]
    pub is_unstable: bool,
}

impl VersionAsset {
    /// Build an asset with urls rooted at `{cdn_base}/{library}/{version}/`.
    pub fn new(library: &str, cdn_base: &str, version: &str, files: Vec<String>) -> Self {
        let mut asset = Self {
            version: version.to_string(),
            files,
            urls: Vec::new(),
            is_unstable: false,
        };
        asset.resolve(library, cdn_base);
        asset
    }

    /// Recompute `urls` and `is_unstable` from `version` and `files`.
    pub fn resolve(&mut self, library: &str, cdn_base: &str) {
        let base = cdn_base.trim_end_matches('/');
        self.urls = self
            .files
            .iter()
            .map(|path| format!("{}/{}/{}/{}", base, library, self.version, path.trim_start_matches('/')))
            .collect();
        self.is_unstable = classify_stability(&self.version);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
}

/// Per-library details; `assets` is newest-first exactly as the API sent it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDetail {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub npm_name: String,
    /// Latest version according to the API.
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub homepage: String,
    #[serde(default, deserialize_with = "nullable")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub license: String,
    #[serde(default, deserialize_with = "nullable")]
    pub repository: Repository,
    #[serde(default, deserialize_with = "nullable")]
    pub assets: Vec<VersionAsset>,
}

impl LibraryDetail {
    /// Fill in urls and stability for every asset.
    pub fn resolve_assets(&mut self, cdn_base: &str) {
        let name = self.name.clone();
        for asset in &mut self.assets {
            asset.resolve(&name, cdn_base);
        }
    }

    pub fn version_names(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.version.as_str()).collect()
    }
}
