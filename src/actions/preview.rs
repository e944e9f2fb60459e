//! HTML preview surface
//!
//! A terminal cannot run a page, so the preview is a small host document in a
//! private temp directory that embeds the code in a sandboxed iframe and is
//! handed to the system browser. The iframe only gets `allow-scripts`: no
//! same-origin access, no forms, no popups, no top navigation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Policy for the host page. `srcdoc` frames inherit it, so inline script and
/// style must stay allowed for the previewed page to work.
const HOST_CSP: &str = "default-src 'none'; script-src 'unsafe-inline'; \
style-src 'unsafe-inline'; img-src data: https:; font-src data: https:; \
media-src data: https:; form-action 'none'; base-uri 'none'";

/// Somewhere HTML can be shown
pub trait PreviewSurface {
    fn open(&mut self, html: &str) -> Result<PreviewHandle>;
}

/// An open preview. Dropping it deletes the generated document.
#[derive(Debug)]
pub struct PreviewHandle {
    _dir: TempDir,
    path: PathBuf,
}

impl PreviewHandle {
    pub fn new(dir: TempDir, path: PathBuf) -> Self {
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes the host document and opens it in the default browser
#[derive(Debug, Default)]
pub struct BrowserPreview {
    /// Skip launching the browser (headless terminals, tests)
    pub write_only: bool,
}

impl PreviewSurface for BrowserPreview {
    fn open(&mut self, html: &str) -> Result<PreviewHandle> {
        let dir = tempfile::Builder::new()
            .prefix("chatmark-preview-")
            .tempdir()
            .context("Failed to create preview directory")?;
        let path = dir.path().join("preview.html");
        std::fs::write(&path, preview_document(html))
            .with_context(|| format!("Failed to write {}", path.display()))?;

        if !self.write_only {
            open::that(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        }
        Ok(PreviewHandle::new(dir, path))
    }
}

/// Host page embedding `html` in a sandboxed frame
pub fn preview_document(html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Security-Policy" content="{csp}">
<title>HTML Preview</title>
<style>
  html, body {{ margin: 0; height: 100%; background: #1e1e1e; }}
  header {{ font: 600 14px system-ui, sans-serif; color: #ddd; padding: 8px 12px; }}
  iframe {{ border: 0; width: 100%; height: calc(100% - 34px); background: #fff; }}
</style>
</head>
<body>
<header>HTML Preview</header>
<iframe title="Code Preview" sandbox="allow-scripts" srcdoc="{doc}"></iframe>
</body>
</html>
"#,
        csp = HOST_CSP,
        doc = escape_attribute(html)
    )
}

/// Escape text for a double-quoted HTML attribute
fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Open a URL with the system handler, never inside the terminal
pub fn open_external(url: &str) -> Result<()> {
    open::that(url).with_context(|| format!("Failed to open {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute(r#"<a href="x" title='y'>&</a>"#),
            "&lt;a href=&quot;x&quot; title=&#39;y&#39;&gt;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_document_cannot_break_out_of_srcdoc() {
        let doc = preview_document(r#""></iframe><script>alert(1)</script>"#);
        assert_eq!(doc.matches("<iframe").count(), 1);
        assert_eq!(doc.matches("</iframe>").count(), 1);
        assert!(!doc.contains("<script>"));
        assert!(doc.contains(r#"sandbox="allow-scripts""#));
        assert!(doc.contains("Content-Security-Policy"));
    }

    #[test]
    fn test_write_only_preview_lifecycle() {
        let mut surface = BrowserPreview { write_only: true };
        let handle = surface.open("<p>hello</p>").unwrap();
        let path = handle.path().to_path_buf();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("&lt;p&gt;hello&lt;/p&gt;"));

        drop(handle);
        assert!(!path.exists());
    }
}
