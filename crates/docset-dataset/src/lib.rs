// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docset-dataset — Dataset assembly for Docset.
//
// Discovers class-partitioned input files, samples and batches them, drives
// page extraction and recognition across a worker pool, and writes the
// manifest and reproducibility record.

pub mod discovery;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod run_record;

pub use discovery::{Batches, DiscoveryOptions, FileDiscoverer};
pub use manifest::{MANIFEST_HEADER, read_manifest, write_manifest};
pub use orchestrator::DatasetOrchestrator;
pub use output::allocate_output_dir;
pub use run_record::{RUN_RECORD_FILE, RunRecord};

#[cfg(test)]
pub(crate) mod test_support;
