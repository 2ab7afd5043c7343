// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output directory allocation. Runs never write into an existing directory.

use std::fs;
use std::path::{Path, PathBuf};

use docset_core::error::{DocsetError, Result};
use tracing::info;

/// Create a fresh output directory.
///
/// Uses `base` if it does not exist yet, otherwise the first free sibling
/// `base_1`, `base_2`, ... The returned directory exists and is empty.
pub fn allocate_output_dir(base: &Path) -> Result<PathBuf> {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            DocsetError::Config(format!("output path {} has no final component", base.display()))
        })?;

    let mut candidate = base.to_path_buf();
    let mut suffix = 0u32;
    loop {
        if let Some(parent) = candidate.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        match fs::create_dir(&candidate) {
            Ok(()) => break,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                suffix += 1;
                candidate = base.with_file_name(format!("{name}_{suffix}"));
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(path = %candidate.display(), "Output directory created");
    Ok(candidate)
}
