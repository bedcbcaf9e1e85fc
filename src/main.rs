//! Thin CLI layer: parse args, styled output, prompting, and call into bootcdn-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use bootcdn_core::{
    BootCdnClient, CachedCatalog, CatalogSource, CdnError, HttpClient, LibraryCatalog, LibraryDetail,
    OutputOptions, Prompt, ResponseCache, Session, VersionReport,
};

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal()
        && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.green());
    } else {
        eprintln!("{}", msg);
    }
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.dimmed());
    } else {
        eprintln!("{}", msg);
    }
}

/// Terminal prompt. Questions and listings go to stderr so stdout only carries urls.
/// When not interactive every question is answered with "" (take the default).
struct TerminalPrompt {
    interactive: bool,
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> bootcdn_core::Result<String> {
        if !self.interactive {
            return Ok(String::new());
        }
        eprint!("{}", question);
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CdnError::Prompt {
                question: question.to_string(),
                source: e.to_string(),
            })?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn notice(&mut self, line: &str) {
        if use_color() {
            eprintln!("{}", line.cyan());
        } else {
            eprintln!("{}", line);
        }
    }

    fn list(&mut self, items: &[&str]) {
        for item in items {
            if use_color() {
                eprintln!("{}", item.bold());
            } else {
                eprintln!("{}", item);
            }
        }
    }

    fn show_version(&mut self, report: &VersionReport) {
        let stability = if report.is_unstable { "unstable" } else { "stable" };
        let latest = if report.is_latest { "latest " } else { "" };
        let heading = format!("Found {}{} version {}:", latest, stability, report.version);
        if use_color() {
            let heading = if report.is_unstable { heading.yellow() } else { heading.cyan() };
            eprintln!("{}", heading);
            for line in &report.lines {
                let line = if report.is_unstable { line.magenta() } else { line.green() };
                println!("{}", line);
            }
        } else {
            eprintln!("{}", heading);
            for line in &report.lines {
                println!("{}", line);
            }
        }
        eprintln!();
    }
}

/// Wraps a catalog source with a stderr spinner while each request runs.
struct Spinning<S> {
    inner: S,
    enabled: bool,
}

impl<S: CatalogSource> Spinning<S> {
    fn with_spinner<T>(&self, message: &str, f: impl FnOnce(&S) -> T) -> T {
        if !self.enabled {
            return f(&self.inner);
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⠈⠐⠠⠰⠸⠹")
            .template("{spinner:.dim} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        let out = f(&self.inner);
        spinner.finish_and_clear();
        out
    }
}

impl<S: CatalogSource> CatalogSource for Spinning<S> {
    fn fetch_catalog(&self) -> bootcdn_core::Result<LibraryCatalog> {
        self.with_spinner("Fetching all libraries...", |s| s.fetch_catalog())
    }

    fn fetch_library_names(&self) -> bootcdn_core::Result<Vec<String>> {
        self.with_spinner("Fetching library names...", |s| s.fetch_library_names())
    }

    fn fetch_library(&self, name: &str) -> bootcdn_core::Result<Option<LibraryDetail>> {
        self.with_spinner(&format!("Fetching library info for {:?} ...", name), |s| {
            s.fetch_library(name)
        })
    }

    fn origin(&self) -> String {
        self.inner.origin()
    }
}

fn run() -> Result<(), String> {
    let matches = Command::new("bootcdn")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Output library urls from bootcdn.cn")
        .after_help(
            "Examples:\n  bootcdn jquery\n  bootcdn twitter-bootstrap@3.3 vue --raw\n  bootcdn jq --yes --copy\n  bootcdn",
        )
        .arg(
            Arg::new("library")
                .required(false)
                .num_args(0..)
                .value_name("library[@version]")
                .help("Libraries to resolve; omit for the interactive prompt"),
        )
        .arg(
            Arg::new("raw")
                .short('r')
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Don't wrap urls in HTML tags"),
        )
        .arg(
            Arg::new("async")
                .short('a')
                .long("async")
                .action(ArgAction::SetTrue)
                .help("Add the async attribute to <script> tags"),
        )
        .arg(
            Arg::new("copy")
                .short('c')
                .long("copy")
                .action(ArgAction::SetTrue)
                .help("Also copy the output to the clipboard"),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .action(ArgAction::SetTrue)
                .help("Never prompt; take the first candidate whenever a name is ambiguous"),
        )
        .arg(
            Arg::new("no-cache")
                .long("no-cache")
                .action(ArgAction::SetTrue)
                .help("Ignore cached API responses and fetch from bootcdn.cn"),
        )
        .arg(
            Arg::new("clear-cache")
                .long("clear-cache")
                .action(ArgAction::SetTrue)
                .exclusive(true)
                .help("Remove all cached API responses and exit"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .conflicts_with("library")
                .help("Print every library name and exit"),
        )
        .get_matches();

    let cwd = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let config = bootcdn_core::load_config(&cwd);
    if let Some(ref d) = config.cache_dir {
        if env::var("BOOTCDN_CACHE_DIR").is_err() {
            env::set_var("BOOTCDN_CACHE_DIR", d);
        }
    }
    bootcdn_core::init_cache().map_err(|e| format!("Failed to initialize cache: {}", e))?;

    let cache = ResponseCache::new(
        Path::new(&bootcdn_core::get_cache_dir()),
        config.cache_ttl_secs(),
        config.cache_max_bytes(),
    );

    if matches.get_flag("clear-cache") {
        let removed = cache.clear().map_err(|e| e.to_string())?;
        success(&format!("Removed {} cached responses.", removed));
        return Ok(());
    }

    let interactive = !matches.get_flag("yes") && std::io::stdin().is_terminal();
    let client = BootCdnClient::new(HttpClient::new(), &config.api_url(), &config.cdn_url());
    let inner: Box<dyn CatalogSource> = if matches.get_flag("no-cache") {
        Box::new(client)
    } else {
        Box::new(CachedCatalog::new(client, cache))
    };
    let source = Spinning {
        inner,
        enabled: std::io::stderr().is_terminal(),
    };

    if matches.get_flag("list") {
        let names = source.fetch_library_names().map_err(|e| e.to_string())?;
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }

    let options = OutputOptions {
        raw: matches.get_flag("raw") || config.raw.unwrap_or(false),
        async_script: matches.get_flag("async") || config.async_script.unwrap_or(false),
    };
    let specs: Vec<String> = matches
        .get_many::<String>("library")
        .map(|it| it.cloned().collect())
        .unwrap_or_default();

    let mut session = Session::new(source, TerminalPrompt { interactive }, options);
    let mut unresolved = Vec::new();
    if specs.is_empty() {
        if !interactive {
            return Err("No library given. Pass library[@version] or run in a terminal.".to_string());
        }
        bootcdn_core::log("Using interactive CLI");
        session.interactive().map_err(|e| e.to_string())?;
    } else {
        for spec in &specs {
            if !session.run_spec(spec).map_err(|e| e.to_string())? {
                unresolved.push(spec.as_str());
            }
        }
    }

    let output = session.into_output();
    if matches.get_flag("copy") {
        if output.is_empty() {
            dim("Nothing to copy.");
        } else {
            bootcdn_core::copy_to_clipboard(&output.text()).map_err(|e| e.to_string())?;
            success(&format!("Copied {} lines to the clipboard.", output.lines().len()));
        }
    }

    if !unresolved.is_empty() {
        return Err(format!("Could not resolve: {}", unresolved.join(", ")));
    }
    Ok(())
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error(&e);
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}
