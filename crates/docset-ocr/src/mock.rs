// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mock backend — returns preset text without looking at the page. Used to
// test the dataset pipeline without an OCR engine installed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use docset_core::error::{DocsetError, Result};
use image::RgbImage;

use crate::recognizer::{Recognizer, TextItem};

#[derive(Debug)]
pub struct MockRecognizer {
    text: String,
    fail: bool,
    parallel_safe: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            parallel_safe: true,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A recognizer whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Report itself as unsafe for concurrent use.
    pub fn single_threaded(mut self) -> Self {
        self.parallel_safe = false;
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of recognition calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Recognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn recognize_items(&self, _image: &RgbImage) -> Result<Vec<TextItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(DocsetError::OcrError("mock recognizer set to fail".into()));
        }
        Ok(vec![TextItem::plain(self.text.clone())])
    }

    fn parallel_safe(&self) -> bool {
        self.parallel_safe
    }
}
