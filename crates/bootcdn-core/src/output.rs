//! Turning resolved urls into something pasteable: HTML tags, an output buffer,
//! and a best-effort copy to the system clipboard.

use crate::error::{CdnError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Print bare urls instead of HTML tags.
    pub raw: bool,
    /// Add `async` to generated `<script>` tags.
    pub async_script: bool,
}

/// Text after the last `.` of the url (the whole url when there is none).
pub fn determine_suffix(url: &str) -> &str {
    url.rsplit('.').next().unwrap_or(url)
}

pub fn wrap_url(url: &str, opts: &OutputOptions) -> String {
    if opts.raw {
        return url.to_string();
    }
    match determine_suffix(url) {
        "js" => {
            let async_attr = if opts.async_script { "async " } else { "" };
            format!("<script type=\"text/javascript\" {}src=\"{}\"></script>", async_attr, url)
        }
        "css" => format!("<link rel=\"stylesheet\" href=\"{}\" />", url),
        _ => format!("<!-- {} -->", url),
    }
}

/// Everything printed for the user during one run, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    lines: Vec<String>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines joined with `\n`, with a trailing newline when non-empty.
    pub fn text(&self) -> String {
        let mut s = self.lines.join("\n");
        if !s.is_empty() {
            s.push('\n');
        }
        s
    }
}

fn clipboard_error(source: String) -> CdnError {
    CdnError::Io {
        operation: "copy_to_clipboard".to_string(),
        path: None,
        source,
    }
}

/// Put `text` on the system clipboard.
#[cfg(feature = "clipboard")]
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
        .map_err(|e| clipboard_error(e.to_string()))
}

#[cfg(not(feature = "clipboard"))]
pub fn copy_to_clipboard(_text: &str) -> Result<()> {
    Err(clipboard_error(
        "clipboard support is disabled in this build".to_string(),
    ))
}
