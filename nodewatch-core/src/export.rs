use nodewatch_client::ExportDocument;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No export has been produced yet")]
    NothingExported,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid export URL: {0}")]
    InvalidUrl(String),
}

/// Somewhere export text can be copied to. The terminal front ends provide
/// a system clipboard; tests provide a buffer.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

/// The document returned by the last export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSession {
    pub document: String,
    pub filename: String,
    /// Server-relative (or absolute) location the document can be fetched from.
    pub url: String,
}

impl From<ExportDocument> for ExportSession {
    fn from(doc: ExportDocument) -> Self {
        Self {
            document: doc.yaml,
            filename: doc.filename,
            url: doc.url,
        }
    }
}

impl ExportSession {
    /// Write the document into `dir` under its suggested filename.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        // Only the final component of the suggested name is trusted.
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "export.yaml".into());
        let path = dir.join(name);

        fs::write(&path, &self.document).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn copy_to(&self, clipboard: &mut dyn ClipboardSink) -> Result<(), ExportError> {
        clipboard
            .set_text(&self.document)
            .map_err(ExportError::Clipboard)
    }

    /// Absolute location of the exported file on `server`.
    pub fn absolute_url(&self, server: &Url) -> Result<Url, ExportError> {
        server
            .join(&self.url)
            .map_err(|e| ExportError::InvalidUrl(format!("{}: {}", self.url, e)))
    }

    /// Deep link a Clash client understands:
    /// `clash://install-config?url=<absolute url>&name=<name>`.
    pub fn import_uri(&self, server: &Url) -> Result<String, ExportError> {
        let absolute = self.absolute_url(server)?;
        let name = self.filename.replacen(".yaml", "", 1);

        Ok(format!(
            "clash://install-config?url={}&name={}",
            encode_component(absolute.as_str()),
            encode_component(&name)
        ))
    }
}

/// Percent-encode a query value the way browsers' `encodeURIComponent`
/// does: spaces become `%20` and `!~'()` stay literal.
fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%21", "!")
        .replace("%7E", "~")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}
