// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The recognition capability and its text-item model.

use docset_core::error::Result;
use image::RgbImage;

/// Pixel rectangle of a recognised item, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// One unit of recognised text (a word or a line, depending on backend).
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub bbox: Option<BoundingBox>,
    /// Engine confidence on a 0-100 scale; negative for non-text rows.
    pub confidence: Option<f32>,
}

impl TextItem {
    /// Item without layout or confidence information.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: None,
            confidence: None,
        }
    }
}

/// Join the text of every item at or above `min_confidence`, skipping
/// whitespace-only items. Items without a confidence are always kept.
pub fn join_confident(items: &[TextItem], min_confidence: f32) -> String {
    items
        .iter()
        .filter(|item| item.confidence.is_none_or(|c| c >= min_confidence))
        .map(|item| item.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A text recognition engine.
///
/// Implementations must not mutate the input page. The orchestrator calls
/// [`Recognizer::recognize`] once per page and consults
/// [`Recognizer::parallel_safe`] before fanning pages out to a worker pool.
pub trait Recognizer: Send + Sync {
    /// Engine name recorded in the run record.
    fn name(&self) -> &str;

    /// Recognise individual text items on `image`.
    fn recognize_items(&self, image: &RgbImage) -> Result<Vec<TextItem>>;

    /// Items below this confidence are left out of [`Recognizer::recognize`].
    fn min_confidence(&self) -> f32 {
        0.0
    }

    /// Recognised text of `image` as one space-separated string.
    fn recognize(&self, image: &RgbImage) -> Result<String> {
        let items = self.recognize_items(image)?;
        Ok(join_confident(&items, self.min_confidence()))
    }

    /// Whether concurrent calls from several worker threads are safe.
    fn parallel_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, conf: f32) -> TextItem {
        TextItem {
            text: text.into(),
            bbox: None,
            confidence: Some(conf),
        }
    }

    #[test]
    fn drops_low_confidence_and_blank_items() {
        let items = vec![
            word("", -1.0),
            word("Invoice", 96.0),
            word("  ", 90.0),
            word("smudge", 12.0),
            word("No.42", 88.5),
        ];
        assert_eq!(join_confident(&items, 0.0), "Invoice smudge No.42");
        assert_eq!(join_confident(&items, 50.0), "Invoice No.42");
    }

    #[test]
    fn items_without_confidence_are_kept() {
        let items = vec![TextItem::plain("first line"), TextItem::plain(" second ")];
        assert_eq!(join_confident(&items, 99.0), "first line second");
    }
}
