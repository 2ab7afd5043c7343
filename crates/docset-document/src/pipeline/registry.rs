// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Step registry — maps configured step names to constructors and validates
// their parameters before any page is processed.

use docset_core::StepConfig;
use docset_core::error::{DocsetError, Result};
use serde_json::{Map, Value};

use super::PageStep;
use super::steps::{
    Binarize, Brightness, Contrast, Denoise, Deskew, Grayscale, Median, Otsu, Rotate,
};

type StepBuilder = fn(&Params<'_>) -> Result<Box<dyn PageStep>>;

/// Every step that can appear in a pipeline configuration.
const REGISTRY: &[(&str, StepBuilder)] = &[
    ("grayscale", grayscale),
    ("contrast", contrast),
    ("brightness", brightness),
    ("binarize", binarize),
    ("otsu", otsu),
    ("denoise", denoise),
    ("median", median),
    ("rotate", rotate),
    ("deskew", deskew),
];

fn grayscale(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&[])?;
    Ok(Box::new(Grayscale))
}

fn contrast(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["factor"])?;
    Ok(Box::new(Contrast {
        factor: p.float("factor", 1.4)?,
    }))
}

fn brightness(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["value"])?;
    Ok(Box::new(Brightness {
        value: p.int("value", 0)?,
    }))
}

fn binarize(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["block_radius", "c"])?;
    Ok(Box::new(Binarize {
        block_radius: p.unsigned("block_radius", 15)?,
        c: p.int("c", 10)?,
    }))
}

fn otsu(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&[])?;
    Ok(Box::new(Otsu))
}

fn denoise(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["sigma"])?;
    let sigma = p.float("sigma", 1.0)?;
    if sigma <= 0.0 {
        return Err(p.invalid("sigma must be positive"));
    }
    Ok(Box::new(Denoise { sigma }))
}

fn median(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["radius"])?;
    Ok(Box::new(Median {
        radius: p.unsigned("radius", 1)?,
    }))
}

fn rotate(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["degrees"])?;
    Ok(Box::new(Rotate {
        degrees: p.required_float("degrees")?,
    }))
}

fn deskew(p: &Params<'_>) -> Result<Box<dyn PageStep>> {
    p.expect_keys(&["max_angle"])?;
    let max_angle = p.float("max_angle", 10.0)?;
    if !(0.0..=45.0).contains(&max_angle) {
        return Err(p.invalid("max_angle must be within 0..=45 degrees"));
    }
    Ok(Box::new(Deskew { max_angle }))
}

/// Construct the step named by `config`.
pub fn build_step(config: &StepConfig) -> Result<Box<dyn PageStep>> {
    let (_, builder) = REGISTRY
        .iter()
        .find(|(name, _)| *name == config.name)
        .ok_or_else(|| DocsetError::UnknownStep(config.name.clone()))?;
    builder(&Params {
        step: &config.name,
        map: &config.params,
    })
}

/// Names accepted by [`build_step`], in registration order.
pub fn registered_steps() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Typed view over a step's parameter object.
struct Params<'a> {
    step: &'a str,
    map: &'a Map<String, Value>,
}

impl Params<'_> {
    fn invalid(&self, reason: impl Into<String>) -> DocsetError {
        DocsetError::InvalidStepParam {
            step: self.step.to_string(),
            reason: reason.into(),
        }
    }

    fn expect_keys(&self, allowed: &[&str]) -> Result<()> {
        match self.map.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(self.invalid(format!("unknown parameter '{unknown}'"))),
            None => Ok(()),
        }
    }

    fn float(&self, key: &str, default: f32) -> Result<f32> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| self.invalid(format!("'{key}' must be a number, got {value}"))),
        }
    }

    fn required_float(&self, key: &str) -> Result<f32> {
        if !self.map.contains_key(key) {
            return Err(self.invalid(format!("missing required parameter '{key}'")));
        }
        self.float(key, 0.0)
    }

    fn int(&self, key: &str, default: i32) -> Result<i32> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| self.invalid(format!("'{key}' must be an integer, got {value}"))),
        }
    }

    fn unsigned(&self, key: &str, default: u32) -> Result<u32> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    self.invalid(format!("'{key}' must be a non-negative integer, got {value}"))
                }),
        }
    }
}
