// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TIFF module — multi-frame TIFF enumeration and frame decoding.

pub mod reader;

pub use reader::TiffReader;
