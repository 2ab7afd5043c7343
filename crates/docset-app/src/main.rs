// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docset — builds a labelled page dataset from class-partitioned folders of
// scans, TIFFs, and PDFs.
//
// Entry point. Resolves the run configuration, allocates the output
// directory, initialises logging, then runs discovery, extraction, and
// recognition and writes the manifest and run record.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use docset_dataset::{
    DatasetOrchestrator, FileDiscoverer, RunRecord, allocate_output_dir, write_manifest,
};
use docset_document::{ExtractOptions, PageExtractor, ProcessingPipeline};

use cli::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.to_config()?;
    config.validate().context("invalid run configuration")?;

    let output_dir = allocate_output_dir(&config.output_path).with_context(|| {
        format!("cannot create output directory {}", config.output_path.display())
    })?;
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| output_dir.join(logging::DEFAULT_LOG_FILE));
    logging::init(&config.log_level, &log_file)?;

    tracing::info!(
        input = %config.input_path.display(),
        output = %output_dir.display(),
        workers = config.num_workers,
        "Docset starting"
    );
    let mut record = RunRecord::new(config.clone(), &output_dir);

    // Step and engine errors surface before any file is touched.
    let pipeline =
        ProcessingPipeline::from_config(&config.pipeline).context("invalid processing pipeline")?;
    let recognizer =
        docset_ocr::build_recognizer(&config).context("cannot initialise the OCR engine")?;
    record.ocr_engine_used = recognizer
        .as_ref()
        .map_or_else(|| "none".to_string(), |r| r.name().to_string());

    let extractor =
        PageExtractor::new(ExtractOptions::from_config(&config, &output_dir)).with_pipeline(pipeline);
    let orchestrator = DatasetOrchestrator::new(extractor, recognizer, config.num_workers);

    let batches = FileDiscoverer::from_config(&config)
        .discover()
        .context("cannot enumerate input classes")?;
    let dataset = orchestrator.run(batches).context("dataset run aborted")?;

    let manifest_path = output_dir.join(&config.csv_name);
    write_manifest(&manifest_path, &dataset)?;
    record.rows = dataset.len();
    let record_path = record
        .write(&output_dir)
        .context("cannot write run record")?;

    tracing::info!(
        rows = dataset.len(),
        manifest = %manifest_path.display(),
        record = %record_path.display(),
        "Docset finished"
    );
    Ok(())
}
