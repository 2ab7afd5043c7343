// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Docset dataset builder.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocsetError;

/// Extensions accepted as input documents (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "gif", "pdf"];

/// The container family of an input document, which decides how its pages
/// are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Single-page raster (PNG, JPEG, BMP, GIF). Always exactly one page.
    FlatImage,
    /// Multi-frame TIFF; each frame is a page.
    Tiff,
    /// Multi-page PDF; each page is rendered at the configured DPI.
    Pdf,
}

impl DocumentKind {
    /// Infer the document kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "tif" | "tiff" => Some(Self::Tiff),
            "png" | "jpg" | "jpeg" | "bmp" | "gif" => Some(Self::FlatImage),
            _ => None,
        }
    }

    /// Infer the document kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Whether `path` carries one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_document(path: &Path) -> bool {
    DocumentKind::from_path(path).is_some()
}

/// One input file together with the class it was discovered under.
///
/// Immutable once created; every reference maps to exactly one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    path: PathBuf,
    class_name: String,
}

impl FileReference {
    pub fn new(path: impl Into<PathBuf>, class_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            class_name: class_name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Final path component, e.g. `invoice_01.pdf`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its extension, e.g. `invoice_01`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_path(&self.path)
    }
}

/// Which pages of a multi-page document to extract.
///
/// Negative indices count from the end (`-1` is the last page). Resolution
/// happens per document, once its page count is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<i64>>", into = "Option<Vec<i64>>")]
pub enum PageSelection {
    #[default]
    All,
    Pages(Vec<i64>),
}

impl PageSelection {
    /// Resolve the selection against a document with `page_count` pages.
    ///
    /// Returns ascending, de-duplicated, non-negative indices. Indices that
    /// fall outside `[0, page_count)` after wrap-around are dropped silently.
    pub fn resolve(&self, page_count: usize) -> Vec<usize> {
        match self {
            Self::All => (0..page_count).collect(),
            Self::Pages(requested) => {
                let count = page_count as i64;
                requested
                    .iter()
                    .map(|&p| if p < 0 { count + p } else { p })
                    .filter(|&p| (0..count).contains(&p))
                    .map(|p| p as usize)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<Option<Vec<i64>>> for PageSelection {
    fn from(pages: Option<Vec<i64>>) -> Self {
        match pages {
            Some(p) => Self::Pages(p),
            None => Self::All,
        }
    }
}

impl From<PageSelection> for Option<Vec<i64>> {
    fn from(selection: PageSelection) -> Self {
        match selection {
            PageSelection::All => None,
            PageSelection::Pages(p) => Some(p),
        }
    }
}

impl FromStr for PageSelection {
    type Err = DocsetError;

    /// Parse `all` or a comma-separated list such as `0,1,-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let pages = trimmed
            .split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|err| {
                    DocsetError::Config(format!("invalid page index '{}': {}", part.trim(), err))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Pages(pages))
    }
}

/// One manifest row: a single page of a single source file.
///
/// Field names serialise to the manifest column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "SourceFilename")]
    pub source_filename: String,
    #[serde(rename = "Page")]
    pub page: usize,
    /// Recognised text; empty when OCR is disabled or failed.
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Class")]
    pub class_name: String,
    /// Path of the persisted page image, or empty.
    #[serde(rename = "PreprocessedFilename")]
    pub preprocessed_filename: String,
}

/// Ordered collection of [`ResultRow`]s, materialised after all batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    rows: Vec<ResultRow>,
}

impl Dataset {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// Concatenate per-file row groups, keeping their order.
    pub fn from_groups(groups: impl IntoIterator<Item = Vec<ResultRow>>) -> Self {
        Self {
            rows: groups.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// Distinct class labels in first-seen order.
    pub fn classes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.class_name.as_str()) {
                seen.push(row.class_name.as_str());
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
