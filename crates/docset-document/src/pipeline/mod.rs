// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing pipeline — an ordered composition of named page steps built from
// configuration and applied to every normalized page.

pub mod deskew;
pub mod registry;
pub mod steps;
pub mod threshold;

use std::fmt;

use docset_core::StepConfig;
use docset_core::error::Result;
use image::DynamicImage;
use tracing::{debug, info};

pub use registry::{build_step, registered_steps};

/// One configurable image transformation.
///
/// Steps hold only their parameters, so a built pipeline can be shared by
/// every worker.
pub trait PageStep: Send + Sync {
    /// Registered name of the step.
    fn name(&self) -> &'static str;

    /// Transform a page raster.
    fn apply(&self, image: DynamicImage) -> DynamicImage;
}

/// Ordered list of steps applied left to right.
#[derive(Default)]
pub struct ProcessingPipeline {
    steps: Vec<Box<dyn PageStep>>,
}

impl ProcessingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured step, failing on the first unknown name or bad
    /// parameter.
    pub fn from_config(config: &[StepConfig]) -> Result<Self> {
        let steps = config.iter().map(build_step).collect::<Result<Vec<_>>>()?;
        let pipeline = Self { steps };
        info!(steps = ?pipeline.step_names(), "Processing pipeline built");
        Ok(pipeline)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, image: DynamicImage) -> DynamicImage {
        self.steps.iter().fold(image, |img, step| {
            debug!(step = step.name(), "Applying processing step");
            step.apply(img)
        })
    }
}

impl fmt::Debug for ProcessingPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingPipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn empty_pipeline_is_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([9, 8, 7])));
        let out = ProcessingPipeline::new().run(img.clone());
        assert_eq!(out, img);
    }

    #[test]
    fn steps_run_in_order() {
        let config = vec![
            StepConfig::new("brightness").with_param("value", 100),
            StepConfig::new("otsu"),
        ];
        let pipeline = ProcessingPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.step_names(), vec!["brightness", "otsu"]);

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 200, 200])));
        let out = pipeline.run(img).to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn unknown_step_fails_the_whole_build() {
        let config = vec![StepConfig::new("grayscale"), StepConfig::new("sharpen")];
        let err = ProcessingPipeline::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("sharpen"));
    }
}
