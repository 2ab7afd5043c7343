// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page extraction — turns one input file into a lazy, ordered sequence of
// normalized page rasters, whatever its container format.

use std::path::PathBuf;

use docset_core::error::{DocsetError, Result};
use docset_core::{DocumentKind, FileReference, PageSelection, RunConfig};
use image::{DynamicImage, ImageReader, RgbImage};
use tracing::{debug, instrument};

use crate::image::budget::SizeBudget;
use crate::image::processor::ImageProcessor;
use crate::pdf::reader::PdfReader;
use crate::persist::{PagePersister, PersistedImage};
use crate::pipeline::ProcessingPipeline;
use crate::tiff::reader::TiffReader;

/// Per-run extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Pages to take from PDFs and TIFFs. Flat images ignore it.
    pub pages: PageSelection,
    /// PDF rasterization resolution.
    pub dpi: u32,
    /// Megapixel cap applied to every decoded page.
    pub megapixel_cap: f64,
    /// Encoded-size cap for persisted pages.
    pub size_budget: SizeBudget,
    /// Output directory; pages are saved under its `image_data/` when set.
    pub persist_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: PageSelection::All,
            dpi: 300,
            megapixel_cap: 3.0,
            size_budget: SizeBudget::from_megabytes(5.0),
            persist_dir: None,
        }
    }
}

impl ExtractOptions {
    /// Options for a run writing into `output_dir`.
    pub fn from_config(config: &RunConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages: config.target_pages.clone(),
            dpi: config.dpi,
            megapixel_cap: config.megapixel,
            size_budget: SizeBudget::from_megabytes(config.size_threshold_mb),
            persist_dir: config.save_processed_img.then(|| output_dir.into()),
        }
    }
}

/// One page ready for recognition.
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    /// Final raster, always 8-bit RGB.
    pub image: RgbImage,
    pub source: FileReference,
    /// Resolved, non-negative page index.
    pub index: usize,
    /// Present when page persistence is enabled.
    pub persisted: Option<PersistedImage>,
}

/// Opens documents and yields their pages. Shared read-only by all workers.
#[derive(Debug)]
pub struct PageExtractor {
    options: ExtractOptions,
    pipeline: ProcessingPipeline,
    persister: Option<PagePersister>,
}

impl PageExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        let persister = options
            .persist_dir
            .as_ref()
            .map(|dir| PagePersister::new(dir, options.size_budget));
        Self {
            options,
            pipeline: ProcessingPipeline::new(),
            persister,
        }
    }

    /// Run `pipeline` on every page after resolution normalization.
    pub fn with_pipeline(mut self, pipeline: ProcessingPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Open `file` and prepare its page sequence.
    ///
    /// Container-level failures (unsupported extension, unreadable PDF or
    /// TIFF header, undecodable image) are returned here; failures of a
    /// single page surface as [`DocsetError::PageDecode`] items from the
    /// iterator.
    #[instrument(skip_all, fields(file = %file.path().display(), class = file.class_name()))]
    pub fn extract(&self, file: &FileReference) -> Result<PageIter<'_>> {
        let kind = file
            .kind()
            .ok_or_else(|| DocsetError::UnsupportedDocument(file.path().display().to_string()))?;

        let (source, page_count, indices) = match kind {
            DocumentKind::FlatImage => {
                // A flat image is page 0 whatever the selection says.
                let image = open_flat_image(file)?;
                (PageSource::Flat(Some(image)), 1, vec![0])
            }
            DocumentKind::Pdf => {
                let reader = PdfReader::open(file.path())?;
                let count = reader.page_count();
                (PageSource::Pdf(reader), count, self.options.pages.resolve(count))
            }
            DocumentKind::Tiff => {
                let reader = TiffReader::open(file.path())?;
                let count = reader.frame_count();
                (PageSource::Tiff(reader), count, self.options.pages.resolve(count))
            }
        };
        debug!(?kind, page_count, selected = indices.len(), "Document opened");

        Ok(PageIter {
            extractor: self,
            file: file.clone(),
            source,
            page_count,
            indices: indices.into_iter(),
        })
    }

    /// Normalize, process, and optionally persist one decoded page.
    fn finish_page(
        &self,
        raw: DynamicImage,
        file: &FileReference,
        index: usize,
        flat: bool,
    ) -> Result<NormalizedPage> {
        let mut image = ImageProcessor::from_dynamic(raw)
            .limit_megapixels(self.options.megapixel_cap)
            .into_dynamic();
        if !self.pipeline.is_empty() {
            image = self.pipeline.run(image);
        }
        let image = image.into_rgb8();

        let persisted = match &self.persister {
            Some(persister) => {
                let suffix = if flat { None } else { Some(index) };
                Some(persister.persist(&image, file, suffix)?)
            }
            None => None,
        };

        Ok(NormalizedPage {
            image,
            source: file.clone(),
            index,
            persisted,
        })
    }
}

fn open_flat_image(file: &FileReference) -> Result<DynamicImage> {
    let path = file.path();
    let image_err =
        |err: &dyn std::fmt::Display| DocsetError::ImageError(format!("{}: {}", path.display(), err));

    let mut reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(|err| image_err(&err))?;
    reader.no_limits();
    reader.decode().map_err(|err| image_err(&err))
}

enum PageSource {
    Flat(Option<DynamicImage>),
    Pdf(PdfReader),
    Tiff(TiffReader),
}

/// Lazy page sequence of one document, in ascending page order.
///
/// Consumed once; extracting again reopens the file.
pub struct PageIter<'a> {
    extractor: &'a PageExtractor,
    file: FileReference,
    source: PageSource,
    page_count: usize,
    indices: std::vec::IntoIter<usize>,
}

impl PageIter<'_> {
    /// Pages in the container, before selection.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Indices still to be yielded.
    pub fn remaining_indices(&self) -> &[usize] {
        self.indices.as_slice()
    }

    fn decode(&mut self, index: usize) -> Result<DynamicImage> {
        match &mut self.source {
            PageSource::Flat(image) => image.take().ok_or_else(|| DocsetError::PageDecode {
                page: index,
                reason: "image already consumed".into(),
            }),
            PageSource::Pdf(reader) => reader
                .render_page(index, self.extractor.options.dpi)
                .map(DynamicImage::ImageRgb8),
            PageSource::Tiff(reader) => reader.read_frame(index).map(DynamicImage::ImageRgb8),
        }
    }
}

impl Iterator for PageIter<'_> {
    type Item = Result<NormalizedPage>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        let flat = matches!(self.source, PageSource::Flat(_));
        Some(
            self.decode(index)
                .and_then(|raw| self.extractor.finish_page(raw, &self.file, index, flat)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::tests::build_pdf;
    use crate::tiff::reader::tests::write_tiff;
    use docset_core::StepConfig;
    use image::Rgb;
    use std::path::Path;

    fn options() -> ExtractOptions {
        ExtractOptions {
            dpi: 36,
            ..ExtractOptions::default()
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([30, 90, 200]))
            .save(path)
            .unwrap();
    }

    fn indices(extractor: &PageExtractor, file: &FileReference) -> Vec<usize> {
        extractor
            .extract(file)
            .unwrap()
            .map(|page| page.unwrap().index)
            .collect()
    }

    #[test]
    fn flat_image_is_always_page_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 20, 10);

        let extractor = PageExtractor::new(ExtractOptions {
            pages: PageSelection::Pages(vec![3, -2]),
            ..options()
        });
        let file = FileReference::new(&path, "photos");
        assert_eq!(indices(&extractor, &file), vec![0]);
    }

    #[test]
    fn pdf_pages_follow_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, build_pdf(5)).unwrap();
        let file = FileReference::new(&path, "reports");

        let all = PageExtractor::new(options());
        assert_eq!(indices(&all, &file), vec![0, 1, 2, 3, 4]);

        let tail = PageExtractor::new(ExtractOptions {
            pages: PageSelection::Pages(vec![-1, -2]),
            ..options()
        });
        assert_eq!(indices(&tail, &file), vec![3, 4]);
    }

    #[test]
    fn tiff_frames_follow_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fax.tif");
        write_tiff(&path, 12, 8, &[0, 128, 255]);
        let file = FileReference::new(&path, "faxes");

        let extractor = PageExtractor::new(ExtractOptions {
            pages: PageSelection::Pages(vec![-1, 0, 9]),
            ..options()
        });
        let pages: Vec<_> = extractor
            .extract(&file)
            .unwrap()
            .map(|p| p.unwrap())
            .collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].index, 0);
        assert_eq!(pages[1].index, 2);
        assert_eq!(pages[1].image.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn extraction_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_pdf(4)).unwrap();
        let file = FileReference::new(&path, "docs");
        let extractor = PageExtractor::new(ExtractOptions {
            pages: PageSelection::Pages(vec![2, -1, 2]),
            ..options()
        });

        let first = extractor.extract(&file).unwrap();
        let second = extractor.extract(&file).unwrap();
        assert_eq!(first.page_count(), second.page_count());
        assert_eq!(first.remaining_indices(), second.remaining_indices());
        assert_eq!(indices(&extractor, &file), indices(&extractor, &file));
    }

    #[test]
    fn large_pages_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_png(&path, 400, 300);

        let extractor = PageExtractor::new(ExtractOptions {
            megapixel_cap: 0.03,
            ..options()
        });
        let file = FileReference::new(&path, "scans");
        let page = extractor.extract(&file).unwrap().next().unwrap().unwrap();
        assert_eq!(page.image.dimensions(), (200, 150));
    }

    #[test]
    fn pipeline_output_replaces_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colour.png");
        write_png(&path, 8, 8);

        let pipeline =
            ProcessingPipeline::from_config(&[StepConfig::new("grayscale")]).unwrap();
        let extractor = PageExtractor::new(options()).with_pipeline(pipeline);
        let file = FileReference::new(&path, "scans");
        let page = extractor.extract(&file).unwrap().next().unwrap().unwrap();
        let [r, g, b] = page.image.get_pixel(4, 4).0;
        assert!(r == g && g == b);
    }

    #[test]
    fn persisted_names_carry_page_suffix_for_multipage_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("memo.pdf"), build_pdf(2)).unwrap();
        write_png(&input.join("card.png"), 10, 10);

        let extractor = PageExtractor::new(ExtractOptions {
            persist_dir: Some(output.clone()),
            ..options()
        });

        let pdf = FileReference::new(input.join("memo.pdf"), "memos");
        let saved: Vec<PathBuf> = extractor
            .extract(&pdf)
            .unwrap()
            .map(|p| p.unwrap().persisted.unwrap().path)
            .collect();
        assert_eq!(
            saved,
            vec![
                output.join("image_data/memos/memos__memo_page0.jpg"),
                output.join("image_data/memos/memos__memo_page1.jpg"),
            ]
        );

        let png = FileReference::new(input.join("card.png"), "memos");
        let page = extractor.extract(&png).unwrap().next().unwrap().unwrap();
        let persisted = page.persisted.unwrap();
        assert_eq!(persisted.path, output.join("image_data/memos/memos__card.jpg"));
        assert!(persisted.path.exists());
    }

    #[test]
    fn container_errors_fail_extract() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"this is not a pdf document").unwrap();
        let extractor = PageExtractor::new(options());

        assert!(extractor.extract(&FileReference::new(&broken, "x")).is_err());

        let notes = FileReference::new(dir.path().join("notes.txt"), "x");
        assert!(matches!(
            extractor.extract(&notes).err(),
            Some(DocsetError::UnsupportedDocument(_))
        ));
    }
}
