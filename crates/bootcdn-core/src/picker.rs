//! Narrow a typed query down to one library or one version.
//!
//! Both pickers share [`narrow`]: an exact hit returns immediately, a single
//! candidate returns without asking, and anything more goes back to the
//! caller's `confirm` callback until one or zero candidates remain. An empty
//! confirmation accepts the first candidate. Nothing here sorts: "first" and
//! "latest" always mean upstream order, which the API sends newest-first.

use crate::model::{LibraryCatalog, LibraryDetail, LibrarySummary, VersionAsset};

/// Substrings that mark a version as a pre-release. Case-sensitive.
pub const UNSTABLE_MARKERS: [&str; 3] = ["rc", "alpha", "beta"];

/// True when `version` contains any of [`UNSTABLE_MARKERS`].
///
/// This is a plain substring test with no semver parsing, so anything that
/// happens to contain "rc" (e.g. "1.0.0-src") is reported unstable too.
pub fn classify_stability(version: &str) -> bool {
    UNSTABLE_MARKERS.iter().any(|marker| version.contains(marker))
}

/// Ask `confirm` and re-`filter` until at most one candidate is left.
///
/// Returns the first candidate as soon as `confirm` answers with an empty
/// string. `filter` must never grow the set, otherwise this can loop for as
/// long as `confirm` keeps answering. Errors from `confirm` are returned as-is.
pub fn narrow<'a, T, E, C, F>(
    mut candidates: Vec<&'a T>,
    mut confirm: C,
    filter: F,
) -> Result<Option<&'a T>, E>
where
    C: FnMut(&[&'a T]) -> Result<String, E>,
    F: Fn(&str, &[&'a T]) -> Vec<&'a T>,
{
    while candidates.len() > 1 {
        let selection = confirm(&candidates)?;
        if selection.is_empty() {
            return Ok(Some(candidates[0]));
        }
        candidates = filter(&selection, &candidates);
    }
    Ok(candidates.first().copied())
}

/// Library names containing `needle`; an exact name collapses the set to itself.
fn match_libraries<'a>(needle: &str, haystack: &[&'a LibrarySummary]) -> Vec<&'a LibrarySummary> {
    if let Some(exact) = haystack.iter().find(|lib| lib.name == needle) {
        return vec![*exact];
    }
    haystack
        .iter()
        .filter(|lib| lib.name.contains(needle))
        .copied()
        .collect()
}

/// Versions starting with `needle`; an exact version collapses the set to itself.
fn match_versions<'a>(needle: &str, haystack: &[&'a VersionAsset]) -> Vec<&'a VersionAsset> {
    if let Some(exact) = haystack.iter().find(|asset| asset.version == needle) {
        return vec![*exact];
    }
    haystack
        .iter()
        .filter(|asset| asset.version.starts_with(needle))
        .copied()
        .collect()
}

/// Pick one library for `query`.
///
/// `Ok(None)` means nothing in the catalog contains `query`. An answer that is a
/// full library name wins over longer names containing it, so answering `vue`
/// picks `vue` even while `vue-router` is still a candidate.
pub fn pick_library<'a, E, C>(
    query: &str,
    catalog: &'a LibraryCatalog,
    confirm: C,
) -> Result<Option<&'a LibrarySummary>, E>
where
    C: FnMut(&[&'a LibrarySummary]) -> Result<String, E>,
{
    if let Some(lib) = catalog.get(query) {
        return Ok(Some(lib));
    }
    let all: Vec<&LibrarySummary> = catalog.iter().collect();
    narrow(match_libraries(query, &all), confirm, match_libraries)
}

/// Pick one version of `library` for `query`.
///
/// An empty query yields the newest stable version, or `None` when the library
/// has no stable release. Otherwise `None` means no version starts with `query`.
pub fn pick_version<'a, E, C>(
    query: &str,
    library: &'a LibraryDetail,
    confirm: C,
) -> Result<Option<&'a VersionAsset>, E>
where
    C: FnMut(&[&'a VersionAsset]) -> Result<String, E>,
{
    if query.is_empty() {
        return Ok(library.assets.iter().find(|asset| !asset.is_unstable));
    }
    let all: Vec<&VersionAsset> = library.assets.iter().collect();
    narrow(match_versions(query, &all), confirm, match_versions)
}

/// Newest version of each stability class. Either side may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatestVersions<'a> {
    pub latest_stable: Option<&'a VersionAsset>,
    pub latest_unstable: Option<&'a VersionAsset>,
}

pub fn latest_versions(library: &LibraryDetail) -> LatestVersions<'_> {
    LatestVersions {
        latest_stable: library.assets.iter().find(|asset| !asset.is_unstable),
        latest_unstable: library.assets.iter().find(|asset| asset.is_unstable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn catalog() -> LibraryCatalog {
        vec![
            LibrarySummary::new("jquery", "jQuery JavaScript Library", 52000),
            LibrarySummary::new("node-waves", "Click effect inspired by Material Design", 1500),
            LibrarySummary::new("bootstrap", "The most popular front-end framework", 90000),
            LibrarySummary::new("node-uuid", "Generate RFC-compliant UUIDs", 900),
            LibrarySummary::new("jquery-countdown", "The Final Countdown", 1800),
            LibrarySummary::new("bootstrap-table", "An extended table", 8000),
        ]
        .into()
    }

    fn library(name: &str, versions: &[&str]) -> LibraryDetail {
        LibraryDetail {
            name: name.to_string(),
            assets: versions
                .iter()
                .map(|v| VersionAsset::new(name, "https://cdn.bootcss.com", v, vec!["x.min.js".to_string()]))
                .collect(),
            ..LibraryDetail::default()
        }
    }

    fn bootstrap() -> LibraryDetail {
        library(
            "bootstrap",
            &[
                "4.0.0-beta.2", "4.0.0-beta", "4.0.0-alpha.6", "3.3.7", "3.3.6", "3.3.5", "3.3.4",
                "3.3.2", "3.3.1", "3.3.0", "3.2.0", "3.1.1", "3.1.0", "3.0.3", "3.0.2", "3.0.1",
                "3.0.0", "3.0.0-rc2", "3.0.0-rc1", "2.3.2", "2.3.1",
            ],
        )
    }

    fn never<T>(_: &[&T]) -> Result<String, Infallible> {
        panic!("Shouldn't hesitate.")
    }

    fn answer<T>(reply: &'static str) -> impl FnMut(&[&T]) -> Result<String, Infallible> {
        move |_| Ok(reply.to_string())
    }

    #[test]
    fn test_classify_stability() {
        assert!(!classify_stability("2.0.2"));
        assert!(classify_stability("1.0.0-rc1"));
        assert!(classify_stability("4.0.0-alpha.3"));
        assert!(classify_stability("1.2.0-beta"));
        assert!(!classify_stability("1.2.0-BETA"));
        // plain substring test, not semver
        assert!(classify_stability("1.0.0-src"));
    }

    #[test]
    fn test_pick_library_exact_match_skips_confirm() {
        let libs = catalog();
        let picked = pick_library("bootstrap", &libs, never::<LibrarySummary>).unwrap();
        assert_eq!(picked.map(|l| l.name.as_str()), Some("bootstrap"));
    }

    #[test]
    fn test_pick_library_confirms_ambiguous_query() {
        let libs = catalog();
        let mut calls = 0;
        let picked = pick_library("node", &libs, |options: &[&LibrarySummary]| {
            calls += 1;
            let names: Vec<&str> = options.iter().map(|l| l.name.as_str()).collect();
            assert_eq!(names, vec!["node-waves", "node-uuid"]);
            Ok::<_, Infallible>(options[1].name.clone())
        })
        .unwrap();
        assert_eq!(picked.map(|l| l.name.as_str()), Some("node-uuid"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_pick_library_empty_confirmation_takes_first() {
        let libs = catalog();
        let picked = pick_library("node", &libs, answer::<LibrarySummary>("")).unwrap();
        assert_eq!(picked.map(|l| l.name.as_str()), Some("node-waves"));
    }

    #[test]
    fn test_pick_library_matches_substring() {
        let libs = catalog();
        let picked = pick_library("countdown", &libs, never::<LibrarySummary>).unwrap();
        assert_eq!(picked.map(|l| l.name.as_str()), Some("jquery-countdown"));
    }

    #[test]
    fn test_pick_library_no_match_skips_confirm() {
        let libs = catalog();
        assert_eq!(pick_library("notalibrary", &libs, never::<LibrarySummary>).unwrap(), None);
    }

    #[test]
    fn test_pick_library_exact_answer_ends_narrowing() {
        let libs = catalog();
        let mut calls = 0;
        let picked = pick_library("jq", &libs, |options: &[&LibrarySummary]| {
            calls += 1;
            assert_eq!(options.len(), 2);
            Ok::<_, Infallible>("jquery".to_string())
        })
        .unwrap();
        assert_eq!(picked.map(|l| l.name.as_str()), Some("jquery"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_pick_library_answer_without_match_is_none() {
        let libs = catalog();
        assert_eq!(pick_library("node", &libs, answer::<LibrarySummary>("react")).unwrap(), None);
    }

    #[test]
    fn test_confirm_error_propagates() {
        let libs = catalog();
        let result = pick_library("boot", &libs, |_: &[&LibrarySummary]| Err("interrupted"));
        assert_eq!(result, Err("interrupted"));
    }

    #[test]
    fn test_pick_version_exact_match_skips_confirm() {
        let lib = bootstrap();
        let picked = pick_version("3.3.7", &lib, never::<VersionAsset>).unwrap();
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.3.7"));
    }

    #[test]
    fn test_pick_version_prefix_confirms_once() {
        let lib = bootstrap();
        let mut calls = 0;
        let picked = pick_version("3", &lib, |options: &[&VersionAsset]| {
            calls += 1;
            assert_eq!(options.len(), 16);
            assert!(options.iter().all(|v| v.version.starts_with('3')));
            assert_eq!(options[0].version, "3.3.7");
            Ok::<_, Infallible>(options[3].version.clone())
        })
        .unwrap();
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.3.4"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_pick_version_narrows_in_steps() {
        let lib = bootstrap();
        let mut answers = vec!["3.3", "3.3.6"].into_iter();
        let mut seen = Vec::new();
        let picked = pick_version("3", &lib, |options: &[&VersionAsset]| {
            seen.push(options.len());
            Ok::<_, Infallible>(answers.next().unwrap_or_default().to_string())
        })
        .unwrap();
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.3.6"));
        assert_eq!(seen, vec![16, 7]);
    }

    #[test]
    fn test_pick_version_prefix_is_not_contains() {
        let lib = library("lodash", &["13.0.0", "3.1.0"]);
        let picked = pick_version("3", &lib, never::<VersionAsset>).unwrap();
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.1.0"));
    }

    #[test]
    fn test_pick_version_empty_confirmation_takes_first() {
        let lib = bootstrap();
        let picked = pick_version("3", &lib, answer::<VersionAsset>("")).unwrap();
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.3.7"));
    }

    #[test]
    fn test_pick_version_empty_query_is_latest_stable() {
        let lib = bootstrap();
        let picked = pick_version("", &lib, never::<VersionAsset>).unwrap();
        assert_eq!(picked, lib.assets.iter().find(|v| !v.is_unstable));
        assert_eq!(picked.map(|v| v.version.as_str()), Some("3.3.7"));
    }

    #[test]
    fn test_pick_version_empty_query_without_stable_release() {
        let lib = library("next-thing", &["1.0.0-rc.2", "1.0.0-beta"]);
        assert_eq!(pick_version("", &lib, never::<VersionAsset>).unwrap(), None);
    }

    #[test]
    fn test_pick_version_no_match_skips_confirm() {
        let lib = bootstrap();
        assert_eq!(pick_version("notaversion", &lib, never::<VersionAsset>).unwrap(), None);
    }

    #[test]
    fn test_latest_versions() {
        let lib = bootstrap();
        let latest = latest_versions(&lib);
        assert_eq!(latest.latest_stable.map(|v| v.version.as_str()), Some("3.3.7"));
        assert_eq!(latest.latest_unstable.map(|v| v.version.as_str()), Some("4.0.0-beta.2"));
    }

    #[test]
    fn test_latest_versions_absent_unstable_is_valid() {
        let lib = library("jquery-countdown", &["2.0.2", "2.0.1", "1.0.1"]);
        let latest = latest_versions(&lib);
        assert_eq!(latest.latest_stable.map(|v| v.version.as_str()), Some("2.0.2"));
        assert!(latest.latest_unstable.is_none());
    }

    #[test]
    fn test_picking_is_repeatable() {
        let libs = catalog();
        let lib = bootstrap();
        let before = (libs.clone(), lib.clone());
        let first = pick_library("boot", &libs, answer::<LibrarySummary>("")).unwrap().cloned();
        let second = pick_library("boot", &libs, answer::<LibrarySummary>("")).unwrap().cloned();
        assert_eq!(first, second);
        let v1 = pick_version("3.1", &lib, answer::<VersionAsset>("")).unwrap().cloned();
        let v2 = pick_version("3.1", &lib, answer::<VersionAsset>("")).unwrap().cloned();
        assert_eq!(v1, v2);
        assert_eq!(before, (libs, lib));
    }
}
