// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their mapping onto `RunConfig`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use docset_core::{OcrEngineKind, PageSelection, RunConfig, StepConfig};

#[derive(Debug, Parser)]
#[command(name = "docset", version)]
#[command(
    about = "Turn class-partitioned folders of scans, TIFFs, and PDFs into a labelled page dataset"
)]
pub struct Args {
    /// Root directory; each immediate subdirectory is one class
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (a numbered sibling is used if it exists)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Manifest file name inside the output directory
    #[arg(long)]
    pub csv_name: Option<String>,

    /// Maximum documents sampled per class (0 = all)
    #[arg(short = 'n', long)]
    pub max_docs_per_class: Option<usize>,

    /// Worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Files per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// PDF rendering resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Pages to extract, e.g. `0,1,-1` or `all`
    #[arg(long)]
    pub pages: Option<PageSelection>,

    /// Persist every page as a JPEG under image_data/
    #[arg(long, overrides_with = "no_save_images")]
    pub save_images: bool,

    /// Do not persist pages, even if a replayed run did
    #[arg(long, overrides_with = "save_images")]
    pub no_save_images: bool,

    /// Skip text recognition
    #[arg(long, overrides_with = "ocr")]
    pub no_ocr: bool,

    /// Run text recognition, even if a replayed run skipped it
    #[arg(long, overrides_with = "no_ocr")]
    pub ocr: bool,

    /// Balance each class sample across its subdirectories
    #[arg(long, overrides_with = "no_smart_shuffle")]
    pub smart_shuffle: bool,

    /// Sample each class uniformly, even if a replayed run balanced it
    #[arg(long, overrides_with = "smart_shuffle")]
    pub no_smart_shuffle: bool,

    /// Megapixel cap for decoded pages
    #[arg(long)]
    pub megapixel: Option<f64>,

    /// Size cap for persisted JPEGs, in megabytes
    #[arg(long)]
    pub size_threshold_mb: Option<f64>,

    /// Recognition backend: tesseract or ocrs
    #[arg(long)]
    pub ocr_engine: Option<OcrEngineKind>,

    /// Recognition language code
    #[arg(long)]
    pub ocr_lang: Option<String>,

    /// Directory with the ocrs detection and recognition models
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Tesseract tessdata directory
    #[arg(long)]
    pub tessdata: Option<PathBuf>,

    /// Per-page recognition timeout in seconds (0 = none)
    #[arg(long)]
    pub ocr_timeout: Option<u64>,

    /// Drop recognised words below this confidence (0-100)
    #[arg(long)]
    pub ocr_min_confidence: Option<f32>,

    /// JSON file with the processing steps, e.g. `[{"name": "deskew"}]`
    #[arg(long)]
    pub pipeline: Option<PathBuf>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log file (default: app.log in the output directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start from a previous run's used_args.json; other flags override it
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

impl Args {
    /// Resolve the effective configuration: replayed record or defaults,
    /// overridden by whatever was given on the command line.
    pub fn to_config(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.replay {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("cannot replay {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(name) = &self.csv_name {
            config.csv_name = name.clone();
        }
        if let Some(limit) = self.max_docs_per_class {
            config.max_docs_per_class = Some(limit);
        }
        if let Some(workers) = self.workers {
            config.num_workers = workers;
        }
        if let Some(size) = self.batch_size {
            config.batch_size_per_worker = size;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(pages) = &self.pages {
            config.target_pages = pages.clone();
        }
        if let Some(save) = switch(self.save_images, self.no_save_images) {
            config.save_processed_img = save;
        }
        if let Some(ocr) = switch(self.ocr, self.no_ocr) {
            config.do_ocr = ocr;
        }
        if let Some(smart) = switch(self.smart_shuffle, self.no_smart_shuffle) {
            config.smart_shuffle = smart;
        }
        if let Some(mp) = self.megapixel {
            config.megapixel = mp;
        }
        if let Some(mb) = self.size_threshold_mb {
            config.size_threshold_mb = mb;
        }
        if let Some(engine) = self.ocr_engine {
            config.ocr_engine = engine;
        }
        if let Some(lang) = &self.ocr_lang {
            config.ocr_lang = lang.clone();
        }
        if let Some(dir) = &self.model_dir {
            config.ocr_model_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.tessdata {
            config.tessdata_path = Some(dir.clone());
        }
        if let Some(secs) = self.ocr_timeout {
            config.ocr_timeout_secs = secs;
        }
        if let Some(conf) = self.ocr_min_confidence {
            config.ocr_min_confidence = conf;
        }
        if let Some(path) = &self.pipeline {
            config.pipeline = read_steps(path)?;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

/// A `--x` / `--no-x` pair; `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn read_steps(path: &std::path::Path) -> anyhow::Result<Vec<StepConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read pipeline file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("pipeline file {} is not a list of steps", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("docset").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--input", "/data/in",
            "--workers", "4",
            "--pages", "0,-1",
            "--no-ocr",
            "--save-images",
            "--ocr-engine", "ocrs",
            "-n", "25",
        ])
        .to_config()
        .unwrap();

        assert_eq!(config.input_path, PathBuf::from("/data/in"));
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.target_pages, PageSelection::Pages(vec![0, -1]));
        assert!(!config.do_ocr);
        assert!(config.save_processed_img);
        assert_eq!(config.ocr_engine, OcrEngineKind::Ocrs);
        assert_eq!(config.class_limit(), Some(25));
        assert_eq!(config.dpi, 300);
    }

    #[test]
    fn replay_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("used_args.json");
        let previous = RunConfig {
            input_path: PathBuf::from("/old/in"),
            seed: Some(3),
            dpi: 150,
            ..RunConfig::default()
        };
        std::fs::write(&record, serde_json::to_string(&previous).unwrap()).unwrap();

        let config = parse(&["--replay", record.to_str().unwrap(), "--dpi", "200"])
            .to_config()
            .unwrap();
        assert_eq!(config.input_path, PathBuf::from("/old/in"));
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.dpi, 200);
    }

    #[test]
    fn negated_flags_clear_replayed_switches() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("used_args.json");
        let previous = RunConfig {
            do_ocr: false,
            save_processed_img: true,
            smart_shuffle: true,
            ..RunConfig::default()
        };
        std::fs::write(&record, serde_json::to_string(&previous).unwrap()).unwrap();
        let replay = record.to_str().unwrap();

        let kept = parse(&["--replay", replay]).to_config().unwrap();
        assert!(!kept.do_ocr && kept.save_processed_img && kept.smart_shuffle);

        let cleared = parse(&[
            "--replay", replay,
            "--ocr",
            "--no-save-images",
            "--no-smart-shuffle",
        ])
        .to_config()
        .unwrap();
        assert!(cleared.do_ocr);
        assert!(!cleared.save_processed_img);
        assert!(!cleared.smart_shuffle);
    }

    #[test]
    fn last_of_a_flag_pair_wins() {
        let config = parse(&["--no-ocr", "--ocr", "--save-images", "--no-save-images"])
            .to_config()
            .unwrap();
        assert!(config.do_ocr);
        assert!(!config.save_processed_img);

        let config = parse(&["--ocr", "--no-ocr"]).to_config().unwrap();
        assert!(!config.do_ocr);
    }

    #[test]
    fn pipeline_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let steps = dir.path().join("steps.json");
        std::fs::write(
            &steps,
            r#"[{"name": "deskew", "params": {"max_angle": 5.0}}, {"name": "otsu"}]"#,
        )
        .unwrap();

        let config = parse(&["--pipeline", steps.to_str().unwrap()]).to_config().unwrap();
        let names: Vec<&str> = config.pipeline.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["deskew", "otsu"]);
    }

    #[test]
    fn bad_page_list_is_rejected() {
        assert!(Args::try_parse_from(["docset", "--pages", "1,x"]).is_err());
    }
}
