//! One CLI run: fetch from a [`CatalogSource`], pick with the [`Prompt`], and
//! collect wrapped urls in an [`Output`]. All state is owned by the session;
//! nothing is kept in globals between runs.

use crate::catalog::CatalogSource;
use crate::error::{CdnError, Result};
use crate::model::{LibraryDetail, LibrarySummary, VersionAsset};
use crate::output::{wrap_url, Output, OutputOptions};
use crate::picker::{latest_versions, pick_library, pick_version};
use crate::utils;

/// A version that was resolved and printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionReport {
    pub library: String,
    pub version: String,
    pub is_latest: bool,
    pub is_unstable: bool,
    /// Urls after HTML wrapping, one per file.
    pub lines: Vec<String>,
}

/// Where the session gets answers from and shows progress to.
pub trait Prompt {
    /// Ask `question` and return the raw answer line.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Informational line, e.g. a heading.
    fn notice(&mut self, line: &str);

    /// A list of names (candidates, or every version of a library).
    fn list(&mut self, items: &[&str]);

    fn show_version(&mut self, report: &VersionReport);

    /// Re-confirm an ambiguous pick. An empty answer accepts `options[0]`.
    fn confirm(&mut self, kind: &str, options: &[&str]) -> Result<String> {
        self.notice("Which one?");
        self.list(options);
        let default = options.first().copied().unwrap_or("");
        self.ask(&format!("{} full name(default to {}):", kind, default))
    }
}

/// Non-interactive prompt: every question is answered with "" (take the default).
#[derive(Clone, Copy, Debug, Default)]
pub struct Defaults;

impl Prompt for Defaults {
    fn ask(&mut self, _question: &str) -> Result<String> {
        Ok(String::new())
    }

    fn notice(&mut self, _line: &str) {}

    fn list(&mut self, _items: &[&str]) {}

    fn show_version(&mut self, _report: &VersionReport) {}
}

/// Split `name[@version]` at the first `@`.
pub fn split_spec(spec: &str) -> (&str, &str) {
    spec.split_once('@').unwrap_or((spec, ""))
}

pub struct Session<S, P> {
    source: S,
    prompt: P,
    options: OutputOptions,
    output: Output,
}

impl<S: CatalogSource, P: Prompt> Session<S, P> {
    pub fn new(source: S, prompt: P, options: OutputOptions) -> Self {
        Self {
            source,
            prompt,
            options,
            output: Output::new(),
        }
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn into_output(self) -> Output {
        self.output
    }

    /// Resolve one `name[@version]` argument without asking about versions.
    /// Returns whether anything was printed.
    pub fn run_spec(&mut self, spec: &str) -> Result<bool> {
        let (lib, version) = split_spec(spec.trim());
        self.query_library(lib, version, false)
    }

    /// Ask for a library, then walk the user through its versions.
    pub fn interactive(&mut self) -> Result<bool> {
        let answer = self.prompt.ask("Which library to select:")?;
        let lib = answer.trim();
        if lib.is_empty() {
            utils::log_warn("Empty input!");
            return Ok(false);
        }
        self.query_library(lib, "", true)
    }

    /// Look `lib` up directly; fall back to searching the catalog when it is unknown.
    ///
    /// With `need_confirm` the latest versions are shown and the user may pick
    /// more; otherwise `version` is resolved with default answers.
    pub fn query_library(&mut self, lib: &str, version: &str, need_confirm: bool) -> Result<bool> {
        if lib.is_empty() {
            return Err(CdnError::invalid_argument("query_library", "No library specified."));
        }
        utils::log(&format!("Fetching library info for {:?} ...", lib));
        match self.source.fetch_library(lib)? {
            Some(detail) => self.show_library(&detail, version, need_confirm),
            None => {
                utils::log_warn(&format!("{:?} not found", lib));
                self.confirm_library(lib, version, need_confirm)
            }
        }
    }

    /// Search the whole catalog for `query` and continue with the library picked.
    pub fn confirm_library(&mut self, query: &str, version: &str, need_confirm: bool) -> Result<bool> {
        utils::log("Fetching all libraries...");
        let catalog = self.source.fetch_catalog()?;
        let prompt = &mut self.prompt;
        let picked = pick_library(query, &catalog, |options: &[&LibrarySummary]| {
            let names: Vec<&str> = options.iter().map(|lib| lib.name.as_str()).collect();
            prompt.confirm("library", &names).map(|a| a.trim().to_string())
        })?;
        let Some(picked) = picked else {
            utils::log_error(&format!("No match found for {:?} :(", query));
            return Ok(false);
        };
        let name = picked.name.clone();
        utils::log(&format!("Fetching library info for {:?} ...", name));
        match self.source.fetch_library(&name)? {
            Some(detail) => self.show_library(&detail, version, need_confirm),
            None => Err(CdnError::Catalog {
                operation: "confirm_library".to_string(),
                library: Some(name),
                source: "listed in the catalog but has no details".to_string(),
            }),
        }
    }

    fn show_library(&mut self, detail: &LibraryDetail, version: &str, need_confirm: bool) -> Result<bool> {
        if need_confirm {
            let latest = latest_versions(detail);
            let mut shown = false;
            for asset in [latest.latest_unstable, latest.latest_stable].into_iter().flatten() {
                self.report(&detail.name, asset, true);
                shown = true;
            }
            let picked_more = self.confirm_version(detail)?;
            return Ok(shown || picked_more);
        }
        let picked = pick_version(version, detail, |_: &[&VersionAsset]| Ok::<_, CdnError>(String::new()))?;
        match picked {
            Some(asset) => {
                self.report(&detail.name, asset, false);
                Ok(true)
            }
            None => {
                utils::log_warn(&format!("No version of {} matches {:?}", detail.name, version));
                Ok(false)
            }
        }
    }

    /// Keep asking for versions until the answer is empty; "all" lists every version.
    pub fn confirm_version(&mut self, detail: &LibraryDetail) -> Result<bool> {
        let mut picked_any = false;
        loop {
            let answer = self.prompt.ask("Enter a specified version(type all to see all):")?;
            let wanted = answer.trim();
            if wanted.is_empty() {
                break;
            }
            if wanted == "all" {
                self.prompt.list(&detail.version_names());
                continue;
            }
            let prompt = &mut self.prompt;
            let picked = pick_version(wanted, detail, |options: &[&VersionAsset]| {
                let names: Vec<&str> = options.iter().map(|v| v.version.as_str()).collect();
                prompt.confirm("version", &names).map(|a| a.trim().to_string())
            })?;
            match picked {
                Some(asset) => {
                    self.report(&detail.name, asset, false);
                    picked_any = true;
                }
                None => utils::log_warn(&format!("No version of {} matches {:?}", detail.name, wanted)),
            }
        }
        Ok(picked_any)
    }

    fn report(&mut self, library: &str, asset: &VersionAsset, is_latest: bool) {
        let lines: Vec<String> = asset.urls.iter().map(|url| wrap_url(url, &self.options)).collect();
        for line in &lines {
            self.output.emit(line);
        }
        self.prompt.show_version(&VersionReport {
            library: library.to_string(),
            version: asset.version.clone(),
            is_latest,
            is_unstable: asset.is_unstable,
            lines,
        });
    }
}
