// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manifest CSV — one row per extracted page.

use std::path::Path;

use docset_core::error::{DocsetError, Result};
use docset_core::{Dataset, ResultRow};
use tracing::info;

/// Column headers, in file order.
pub const MANIFEST_HEADER: [&str; 5] = [
    "SourceFilename",
    "Page",
    "Text",
    "Class",
    "PreprocessedFilename",
];

fn manifest_err(path: &Path, err: impl std::fmt::Display) -> DocsetError {
    DocsetError::Manifest(format!("{}: {}", path.display(), err))
}

/// Write `dataset` to `path`, replacing any existing file. An empty dataset
/// still produces the header line.
pub fn write_manifest(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| manifest_err(path, err))?;

    writer
        .write_record(MANIFEST_HEADER)
        .map_err(|err| manifest_err(path, err))?;
    for row in dataset {
        writer.serialize(row).map_err(|err| manifest_err(path, err))?;
    }
    writer.flush().map_err(|err| manifest_err(path, err))?;

    info!(path = %path.display(), rows = dataset.len(), "Manifest written");
    Ok(())
}

/// Read a manifest written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| manifest_err(path, err))?;

    let headers = reader.headers().map_err(|err| manifest_err(path, err))?;
    if headers.iter().ne(MANIFEST_HEADER) {
        return Err(manifest_err(path, format!("unexpected header {:?}", headers)));
    }

    let rows = reader
        .deserialize::<ResultRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| manifest_err(path, err))?;
    Ok(Dataset::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, page: usize, text: &str) -> ResultRow {
        ResultRow {
            source_filename: file.into(),
            page,
            text: text.into(),
            class_name: "invoices".into(),
            preprocessed_filename: String::new(),
        }
    }

    #[test]
    fn empty_dataset_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_manifest(&path, &Dataset::default()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "SourceFilename,Page,Text,Class,PreprocessedFilename\n");
        assert!(read_manifest(&path).unwrap().is_empty());
    }

    #[test]
    fn multiline_text_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let dataset = Dataset::new(vec![
            row("a.pdf", 0, "Total, due\n\"now\""),
            row("a.pdf", 1, ""),
        ]);
        write_manifest(&path, &dataset).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"Total, due\n\"\"now\"\"\""));
        assert_eq!(read_manifest(&path).unwrap(), dataset);
    }

    #[test]
    fn foreign_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "name,value\nx,1\n").unwrap();
        assert!(matches!(read_manifest(&path), Err(DocsetError::Manifest(_))));
    }
}
