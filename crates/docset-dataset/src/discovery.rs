// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File discovery — enumerates class directories, samples each class down to
// the configured limit, and yields fixed-size batches of file references.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use docset_core::error::{DocsetError, Result};
use docset_core::{FileReference, RunConfig, is_supported_document};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

/// Sampling and batching parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum files per class; `None` keeps all of them.
    pub class_limit: Option<usize>,
    /// Files per emitted batch (at least 1).
    pub batch_size: usize,
    /// Balance the sample across a class's immediate subdirectories.
    pub smart_shuffle: bool,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            class_limit: None,
            batch_size: 10,
            smart_shuffle: false,
            seed: None,
        }
    }
}

impl DiscoveryOptions {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            class_limit: config.class_limit(),
            batch_size: config.batch_size_per_worker,
            smart_shuffle: config.smart_shuffle,
            seed: config.seed,
        }
    }
}

/// Finds class-labelled documents under a root directory.
///
/// Every immediate subdirectory of the root is a class; documents are
/// collected recursively beneath it. Files lying directly in the root
/// belong to no class and are ignored.
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    root: PathBuf,
    options: DiscoveryOptions,
}

impl FileDiscoverer {
    pub fn new(root: impl Into<PathBuf>, options: DiscoveryOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(&config.input_path, DiscoveryOptions::from_config(config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class names and directories, sorted by name.
    pub fn classes(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.root).map_err(|err| discovery_err(&self.root, err))?;
        let mut classes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| discovery_err(&self.root, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| discovery_err(&entry.path(), err))?;
            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                classes.push((name, entry.path()));
            }
        }
        classes.sort();
        Ok(classes)
    }

    /// Start a lazy batch sequence. Classes are enumerated one at a time, in
    /// name order; each class is fully batched before the next is read.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn discover(&self) -> Result<Batches> {
        let classes = self.classes()?;
        info!(
            classes = classes.len(),
            limit = ?self.options.class_limit,
            smart_shuffle = self.options.smart_shuffle,
            "Discovering documents"
        );
        let rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Batches {
            classes: classes.into_iter(),
            pending: Vec::new().into_iter(),
            options: self.options.clone(),
            rng,
        })
    }

    /// Sampled files of one class, before batching.
    fn sample_class(
        options: &DiscoveryOptions,
        class_dir: &Path,
        rng: &mut StdRng,
    ) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_documents(class_dir, &mut files)?;
        files.sort();

        let selected = match options.class_limit {
            Some(limit) if options.smart_shuffle => smart_sample(class_dir, files, limit, rng),
            Some(limit) => {
                files.shuffle(rng);
                files.truncate(limit);
                files
            }
            None => {
                files.shuffle(rng);
                files
            }
        };
        Ok(selected)
    }
}

/// Lazy sequence of file batches produced by [`FileDiscoverer::discover`].
pub struct Batches {
    classes: std::vec::IntoIter<(String, PathBuf)>,
    pending: std::vec::IntoIter<Vec<FileReference>>,
    options: DiscoveryOptions,
    rng: StdRng,
}

impl Iterator for Batches {
    type Item = Result<Vec<FileReference>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(batch) = self.pending.next() {
                return Some(Ok(batch));
            }
            let (class_name, class_dir) = self.classes.next()?;
            let files = match FileDiscoverer::sample_class(&self.options, &class_dir, &mut self.rng)
            {
                Ok(files) => files,
                Err(err) => return Some(Err(err)),
            };
            debug!(class = %class_name, files = files.len(), "Class sampled");

            let batch_size = self.options.batch_size.max(1);
            let batches: Vec<Vec<FileReference>> = files
                .chunks(batch_size)
                .map(|chunk| {
                    chunk
                        .iter()
                        .map(|path| FileReference::new(path, class_name.as_str()))
                        .collect()
                })
                .collect();
            self.pending = batches.into_iter();
        }
    }
}

fn discovery_err(path: &Path, err: std::io::Error) -> DocsetError {
    DocsetError::Discovery(format!("{}: {}", path.display(), err))
}

/// Recursively gather supported documents under `dir`.
fn collect_documents(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|err| discovery_err(dir, err))? {
        let entry = entry.map_err(|err| discovery_err(dir, err))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| discovery_err(&path, err))?;
        if file_type.is_dir() {
            collect_documents(&path, out)?;
        } else if path.is_file() && is_supported_document(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Subdirectory-balanced sample of at most `limit` files.
///
/// Files are grouped by the class's immediate subdirectory they live under
/// (files directly in the class directory form their own group). Each round
/// takes up to `ceil(remaining / groups)` files from every non-empty group,
/// so small subdirectories are always represented and unused quota flows to
/// the larger ones.
pub fn smart_sample(
    class_dir: &Path,
    files: Vec<PathBuf>,
    limit: usize,
    rng: &mut StdRng,
) -> Vec<PathBuf> {
    let mut grouped: BTreeMap<Option<OsString>, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let key = path
            .strip_prefix(class_dir)
            .ok()
            .filter(|rel| rel.components().count() > 1)
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_os_string());
        grouped.entry(key).or_default().push(path);
    }

    let mut groups: Vec<Vec<PathBuf>> = grouped.into_values().filter(|g| !g.is_empty()).collect();
    for group in &mut groups {
        group.shuffle(rng);
    }

    let mut selected = Vec::with_capacity(limit);
    while selected.len() < limit && !groups.is_empty() {
        let per_group = (limit - selected.len()).div_ceil(groups.len());
        for group in &mut groups {
            let take = per_group.min(group.len());
            selected.extend(group.drain(..take));
        }
        groups.retain(|g| !g.is_empty());
    }

    selected.shuffle(rng);
    selected.truncate(limit);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::touch;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn all_files(discoverer: &FileDiscoverer) -> Vec<FileReference> {
        discoverer
            .discover()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn every_file_belongs_to_its_class_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("stray.pdf"));
        touch(&root.join("invoices/a.pdf"));
        touch(&root.join("invoices/2024/q1/b.PNG"));
        touch(&root.join("invoices/readme.txt"));
        touch(&root.join("letters/c.tif"));
        touch(&root.join("letters/nested/d.jpeg"));

        let files = all_files(&FileDiscoverer::new(root, DiscoveryOptions::default()));
        assert_eq!(files.len(), 4);
        for file in &files {
            let rel = file.path().strip_prefix(root).unwrap();
            let first = rel.components().next().unwrap().as_os_str();
            assert_eq!(first.to_string_lossy(), file.class_name());
            assert!(rel.components().count() > 1);
        }
        assert!(!files.iter().any(|f| f.file_name() == "stray.pdf"));
        assert!(!files.iter().any(|f| f.file_name() == "readme.txt"));
    }

    #[test]
    fn classes_are_emitted_in_order_and_batched() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(&dir.path().join(format!("b_class/{i}.png")));
        }
        for i in 0..2 {
            touch(&dir.path().join(format!("a_class/{i}.png")));
        }
        let options = DiscoveryOptions {
            batch_size: 2,
            seed: Some(1),
            ..DiscoveryOptions::default()
        };
        let batches: Vec<Vec<FileReference>> = FileDiscoverer::new(dir.path(), options)
            .discover()
            .unwrap()
            .map(|b| b.unwrap())
            .collect();

        let shape: Vec<(String, usize)> = batches
            .iter()
            .map(|b| (b[0].class_name().to_string(), b.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("a_class".into(), 2),
                ("b_class".into(), 2),
                ("b_class".into(), 2),
                ("b_class".into(), 1),
            ]
        );
        assert!(batches.iter().all(|b| b.iter().all(|f| f.class_name() == b[0].class_name())));
    }

    #[test]
    fn plain_limit_truncates_each_class() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..6 {
            touch(&dir.path().join(format!("x/{i}.pdf")));
        }
        touch(&dir.path().join("y/only.pdf"));
        let options = DiscoveryOptions {
            class_limit: Some(3),
            ..DiscoveryOptions::default()
        };
        let files = all_files(&FileDiscoverer::new(dir.path(), options));
        assert_eq!(files.iter().filter(|f| f.class_name() == "x").count(), 3);
        assert_eq!(files.iter().filter(|f| f.class_name() == "y").count(), 1);
    }

    #[test]
    fn smart_sample_reaches_every_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let class = dir.path().join("forms");
        let mut files = Vec::new();
        for i in 0..5 {
            files.push(class.join(format!("big/{i}.png")));
        }
        files.push(class.join("small_a/0.png"));
        files.push(class.join("small_b/0.png"));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = smart_sample(&class, files.clone(), 4, &mut rng);
            assert_eq!(picked.len(), 4);
            assert!(picked.iter().any(|p| p.starts_with(class.join("small_a"))));
            assert!(picked.iter().any(|p| p.starts_with(class.join("small_b"))));
            assert_eq!(picked.iter().filter(|p| p.starts_with(class.join("big"))).count(), 2);
        }
    }

    #[test]
    fn smart_sample_redistributes_leftover_quota() {
        let class = PathBuf::from("/data/receipts");
        let mut files = vec![class.join("top.png")];
        for i in 0..6 {
            files.push(class.join(format!("2023/{i}.png")));
        }
        // Root group has one file; the rest of the quota must come from 2023/.
        let picked = smart_sample(&class, files, 5, &mut seeded());
        assert_eq!(picked.len(), 5);
        assert!(picked.contains(&class.join("top.png")));
    }

    #[test]
    fn smart_sample_returns_everything_when_short() {
        let class = PathBuf::from("/c");
        let files = vec![class.join("a/1.pdf"), class.join("b/2.pdf")];
        let picked = smart_sample(&class, files, 10, &mut seeded());
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn smart_shuffle_applies_through_discoverer() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(&dir.path().join(format!("cls/big/{i}.pdf")));
        }
        touch(&dir.path().join("cls/one/0.pdf"));
        touch(&dir.path().join("cls/two/0.pdf"));
        let options = DiscoveryOptions {
            class_limit: Some(4),
            smart_shuffle: true,
            seed: Some(3),
            ..DiscoveryOptions::default()
        };
        let files = all_files(&FileDiscoverer::new(dir.path(), options));
        assert_eq!(files.len(), 4);
        assert!(files.iter().any(|f| f.path().parent().unwrap().ends_with("one")));
        assert!(files.iter().any(|f| f.path().parent().unwrap().ends_with("two")));
    }

    #[test]
    fn same_seed_same_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            touch(&dir.path().join(format!("k/{i}.png")));
        }
        let options = DiscoveryOptions {
            seed: Some(99),
            ..DiscoveryOptions::default()
        };
        let first = all_files(&FileDiscoverer::new(dir.path(), options.clone()));
        let second = all_files(&FileDiscoverer::new(dir.path(), options));
        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_is_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let discoverer =
            FileDiscoverer::new(dir.path().join("absent"), DiscoveryOptions::default());
        assert!(matches!(discoverer.discover().err(), Some(DocsetError::Discovery(_))));
    }
}
