//! Core library for bootcdn: catalog client, response cache, library/version picker, output.
//! Used by the CLI binary; the picker has no I/O and can be reused on its own.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod output;
pub mod picker;
pub mod session;
pub mod utils;

// Re-export main API for CLI
pub use cache::{CachedCatalog, ResponseCache};
pub use catalog::{BootCdnClient, CatalogSource};
pub use config::{load_config, Config};
pub use error::{CdnError, Result};
pub use http_client::HttpClient;
pub use model::{LibraryCatalog, LibraryDetail, LibrarySummary, Repository, VersionAsset};
pub use output::{copy_to_clipboard, wrap_url, Output, OutputOptions};
pub use picker::{classify_stability, latest_versions, narrow, pick_library, pick_version, LatestVersions};
pub use session::{split_spec, Defaults, Prompt, Session, VersionReport};
pub use utils::{get_cache_dir, init_cache, log, log_error, log_warn};
