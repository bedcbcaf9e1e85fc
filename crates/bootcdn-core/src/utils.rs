use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{Result, Write};
use std::path::PathBuf;
use chrono::Local;

pub const LOG_FILE: &str = "logs.txt";

/// Returns the path to the cache directory. Uses BOOTCDN_CACHE_DIR if set;
/// otherwise Windows: %USERPROFILE%\.bootcdn-cache, Unix: $HOME/.bootcdn-cache
pub fn get_cache_dir() -> String {
    if let Ok(dir) = env::var("BOOTCDN_CACHE_DIR") {
        if !dir.trim().is_empty() {
            return dir;
        }
    }
    let base = if cfg!(target_os = "windows") {
        env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
    } else {
        env::var("HOME").unwrap_or_else(|_| ".".to_string())
    };
    let sep = if cfg!(target_os = "windows") { "\\" } else { "/" };
    format!("{}{}.bootcdn-cache", base, sep)
}

pub fn init_cache() -> Result<()> {
    let cache_dir = get_cache_dir();
    fs::create_dir_all(&cache_dir)?;

    let log_path = PathBuf::from(&cache_dir).join(LOG_FILE);
    if !log_path.exists() {
        File::create(&log_path)?;
    }

    Ok(())
}

fn is_quiet() -> bool {
    if env::var("BOOTCDN_QUIET").map(|v| v == "1" || v == "true").unwrap_or(false) {
        return true;
    }
    env::var("BOOTCDN_LOG")
        .map(|v| v.to_lowercase() == "quiet" || v.to_lowercase() == "error")
        .unwrap_or(false)
}

/// Unit tests log to stderr only, so they never write into the user's cache dir.
fn log_to_file() -> bool {
    !cfg!(test)
}

fn write_log(level: &str, message: &str, always_print: bool) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let log_message = format!("[{}] {} {}", timestamp, level, message);

    // stdout carries the urls; diagnostics go to stderr
    if always_print || !is_quiet() {
        eprintln!("{}", log_message);
    }

    if !log_to_file() {
        return;
    }
    let log_path = PathBuf::from(get_cache_dir()).join(LOG_FILE);
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let _ = writeln!(file, "{}", log_message);
    }
}

pub fn log(message: &str) {
    write_log("INFO", message, false);
}

pub fn log_warn(message: &str) {
    write_log("WARN", message, false);
}

pub fn log_error(message: &str) {
    write_log("ERR!", message, true);
}
