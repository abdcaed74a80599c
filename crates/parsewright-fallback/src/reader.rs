//! Document readers

use parsewright_domain::traits::DocumentReader;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Configuration for [`PdfTextReader`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// `pdftotext` executable
    pub pdftotext: String,

    /// Keep the physical layout (`-layout`)
    pub layout: bool,
}

impl ReaderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.pdftotext.trim().is_empty() {
            return Err("pdftotext command must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            pdftotext: "pdftotext".to_string(),
            layout: true,
        }
    }
}

/// Reads PDFs through the `pdftotext` tool
#[derive(Debug, Clone)]
pub struct PdfTextReader {
    command: String,
    layout: bool,
}

impl PdfTextReader {
    /// Create a reader from configuration
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            command: config.pdftotext.clone(),
            layout: config.layout,
        }
    }
}

impl DocumentReader for PdfTextReader {
    fn read_text(&self, document: &Path) -> io::Result<String> {
        let mut command = Command::new(&self.command);
        if self.layout {
            command.arg("-layout");
        }
        command.arg("-enc").arg("UTF-8").arg(document).arg("-");

        let output = command.output().map_err(|e| {
            io::Error::new(e.kind(), format!("failed to execute {}: {}", self.command, e))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "{} returned non-zero exit status for {}: {}",
                self.command,
                document.display(),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
        debug!(document = %document.display(), chars = text.len(), "pdftotext finished");
        Ok(text)
    }
}

/// Reads documents that are already text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn read_text(&self, document: &Path) -> io::Result<String> {
        std::fs::read_to_string(document)
    }
}

/// Picks a reader by file extension: `pdf` through `pdftotext`, anything else as text
#[derive(Debug, Clone)]
pub struct AutoReader {
    pdf: PdfTextReader,
    text: PlainTextReader,
}

impl AutoReader {
    /// Create a reader from configuration
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            pdf: PdfTextReader::new(config),
            text: PlainTextReader,
        }
    }
}

impl DocumentReader for AutoReader {
    fn read_text(&self, document: &Path) -> io::Result<String> {
        let is_pdf = document
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            self.pdf.read_text(document)
        } else {
            self.text.read_text(document)
        }
    }
}
