// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dataset orchestrator — drives extraction and recognition over every
// discovered batch, in parallel where the recognizer allows it, and collects
// the rows in discovery order.

use std::sync::Arc;
use std::time::Instant;

use docset_core::error::{DocsetError, Result};
use docset_core::{Dataset, FileReference, ResultRow};
use docset_document::{NormalizedPage, PageExtractor};
use docset_ocr::Recognizer;
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, error, info, instrument, warn};

/// Runs page extraction and recognition across a worker pool.
pub struct DatasetOrchestrator {
    extractor: PageExtractor,
    recognizer: Option<Arc<dyn Recognizer>>,
    num_workers: usize,
}

impl DatasetOrchestrator {
    /// `recognizer: None` disables OCR; every row then has empty text.
    pub fn new(
        extractor: PageExtractor,
        recognizer: Option<Arc<dyn Recognizer>>,
        num_workers: usize,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            num_workers: num_workers.max(1),
        }
    }

    /// Whether batches will be spread across the pool. A recognizer that
    /// cannot be shared between threads forces sequential processing.
    pub fn parallel(&self) -> bool {
        self.num_workers > 1
            && self
                .recognizer
                .as_ref()
                .is_none_or(|recognizer| recognizer.parallel_safe())
    }

    /// Process every batch and assemble the dataset.
    ///
    /// Rows come out grouped by file, files in batch order, pages ascending
    /// within a file. A file that fails as a whole contributes no rows; a
    /// discovery error aborts the run.
    #[instrument(skip_all, fields(workers = self.num_workers))]
    pub fn run<I>(&self, batches: I) -> Result<Dataset>
    where
        I: IntoIterator<Item = Result<Vec<FileReference>>>,
    {
        let started = Instant::now();
        let parallel = self.parallel();
        if self.num_workers > 1 && !parallel {
            warn!(
                engine = self.recognizer.as_ref().map(|r| r.name()),
                "Recognizer is not thread-safe; processing sequentially"
            );
        }
        let pool = if parallel { Some(self.build_pool()?) } else { None };

        let mut groups: Vec<Vec<ResultRow>> = Vec::new();
        let mut files = 0usize;
        for (batch_no, batch) in batches.into_iter().enumerate() {
            let batch = batch?;
            debug!(batch = batch_no, files = batch.len(), "Processing batch");
            files += batch.len();
            let rows = match &pool {
                Some(pool) => self.process_batch_parallel(pool, &batch),
                None => batch.iter().map(|file| self.process_file(file)).collect(),
            };
            groups.extend(rows);
        }

        let dataset = Dataset::from_groups(groups);
        info!(
            files,
            rows = dataset.len(),
            classes = dataset.classes().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dataset assembled"
        );
        Ok(dataset)
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_workers)
            .thread_name(|i| format!("docset-worker-{i}"))
            .build()
            .map_err(|err| DocsetError::WorkerPool(err.to_string()))
    }

    fn process_batch_parallel(
        &self,
        pool: &ThreadPool,
        batch: &[FileReference],
    ) -> Vec<Vec<ResultRow>> {
        // `collect` on an indexed parallel iterator keeps input order.
        pool.install(|| batch.par_iter().map(|file| self.process_file(file)).collect())
    }

    /// All rows for one file. Never fails: a page-local error drops only
    /// that page, any other error drops the whole file along with the page
    /// images already saved for it.
    fn process_file(&self, file: &FileReference) -> Vec<ResultRow> {
        let pages = match self.extractor.extract(file) {
            Ok(pages) => pages,
            Err(err) => {
                error!(file = %file.path().display(), error = %err, "Skipping unreadable document");
                return Vec::new();
            }
        };

        let mut rows = Vec::new();
        for page in pages {
            match page {
                Ok(page) => rows.push(self.page_row(page)),
                Err(err) if err.is_page_local() => {
                    error!(file = %file.path().display(), error = %err, "Skipping page");
                }
                Err(err) => {
                    error!(
                        file = %file.path().display(),
                        error = %err,
                        dropped = rows.len(),
                        "Abandoning document"
                    );
                    discard_saved_pages(&rows);
                    return Vec::new();
                }
            }
        }
        rows
    }

    fn page_row(&self, page: NormalizedPage) -> ResultRow {
        let text = match &self.recognizer {
            Some(recognizer) => match recognizer.recognize(&page.image) {
                Ok(text) => text,
                Err(err) => {
                    error!(
                        file = %page.source.path().display(),
                        page = page.index,
                        engine = recognizer.name(),
                        error = %err,
                        "Recognition failed; keeping page with empty text"
                    );
                    String::new()
                }
            },
            None => String::new(),
        };

        ResultRow {
            source_filename: page.source.file_name(),
            page: page.index,
            text,
            class_name: page.source.class_name().to_string(),
            preprocessed_filename: page
                .persisted
                .map(|p| p.path.display().to_string())
                .unwrap_or_default(),
        }
    }
}

fn discard_saved_pages(rows: &[ResultRow]) {
    for row in rows.iter().filter(|row| !row.preprocessed_filename.is_empty()) {
        if let Err(err) = std::fs::remove_file(&row.preprocessed_filename) {
            warn!(path = %row.preprocessed_filename, error = %err, "Could not remove page image");
        }
    }
}
