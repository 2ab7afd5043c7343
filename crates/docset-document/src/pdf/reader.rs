// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open PDF documents and rasterize individual pages at a given
// DPI using the pure-Rust `hayro` renderer.

use std::path::Path;
use std::sync::Arc;

use docset_core::error::{DocsetError, Result};
use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::RgbImage;
use tracing::{debug, info, instrument};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Opens a PDF once and renders requested pages on demand.
pub struct PdfReader {
    pdf: Pdf,
    page_count: usize,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = std::fs::read(path_ref).map_err(|err| {
            DocsetError::PdfError(format!("failed to read {}: {}", path_ref.display(), err))
        })?;
        let reader = Self::from_bytes(data)?;
        info!(pages = reader.page_count, "PDF opened");
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let pdf = Pdf::new(Arc::new(data))
            .map_err(|err| DocsetError::PdfError(format!("failed to parse PDF: {:?}", err)))?;
        let page_count = pdf.pages().len();
        debug!(page_count, "PDF parsed");
        Ok(Self { pdf, page_count })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    // -- Rendering ------------------------------------------------------------

    /// Render the zero-based page `index` at `dpi` to an RGB raster.
    ///
    /// Transparent regions are composited onto white. A page that cannot be
    /// located or has a degenerate media box yields [`DocsetError::PageDecode`].
    #[instrument(skip(self))]
    pub fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage> {
        let pages = self.pdf.pages();
        let page = pages.get(index).ok_or_else(|| DocsetError::PageDecode {
            page: index,
            reason: format!("document has {} pages", self.page_count),
        })?;

        let media_box = page.media_box();
        let width = (media_box.x1 - media_box.x0) as f32;
        let height = (media_box.y1 - media_box.y0) as f32;
        if width <= 0.0 || height <= 0.0 {
            return Err(DocsetError::PageDecode {
                page: index,
                reason: format!("invalid media box {}x{}", width, height),
            });
        }

        let scale = dpi as f32 / POINTS_PER_INCH;
        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);

        let (w, h) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
        let rgb = premultiplied_rgba_on_white(pixmap.data_as_u8_slice(), w, h).ok_or_else(
            || DocsetError::PageDecode {
                page: index,
                reason: "rendered pixmap has unexpected size".into(),
            },
        )?;

        debug!(width = w, height = h, "Page rendered");
        Ok(rgb)
    }
}

/// Flatten premultiplied RGBA onto an opaque white background.
fn premultiplied_rgba_on_white(rgba: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in rgba.chunks_exact(4) {
        let uncovered = 255 - px[3];
        rgb.push(px[0].saturating_add(uncovered));
        rgb.push(px[1].saturating_add(uncovered));
        rgb.push(px[2].saturating_add(uncovered));
    }
    RgbImage::from_raw(width, height, rgb)
}
