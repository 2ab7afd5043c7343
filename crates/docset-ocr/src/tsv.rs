// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parser for Tesseract's TSV output (`level page block par line word left top
// width height conf text`).

use crate::recognizer::{BoundingBox, TextItem};

/// TSV `level` value of word rows.
const WORD_LEVEL: &str = "5";

/// Extract word items from Tesseract TSV output.
///
/// The header row, non-word rows, and malformed rows are skipped.
pub fn parse_words(tsv: &str) -> Vec<TextItem> {
    tsv.lines().filter_map(parse_word_row).collect()
}

fn parse_word_row(line: &str) -> Option<TextItem> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 11 || fields[0] != WORD_LEVEL {
        return None;
    }
    let bbox = BoundingBox {
        left: fields[6].trim().parse().ok()?,
        top: fields[7].trim().parse().ok()?,
        width: fields[8].trim().parse().ok()?,
        height: fields[9].trim().parse().ok()?,
    };
    let confidence: f32 = fields[10].trim().parse().ok()?;
    let text = fields.get(11).copied().unwrap_or_default();

    Some(TextItem {
        text: text.to_string(),
        bbox: Some(bbox),
        confidence: Some(confidence),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::join_confident;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t40\t30\t300\t24\t-1\t
5\t1\t1\t1\t1\t1\t40\t30\t120\t24\t95.123\tСчёт
5\t1\t1\t1\t1\t2\t170\t30\t80\t24\t31.5\tна
5\t1\t1\t1\t1\t3\t260\t30\t10\t24\t0\t 
5\t1\t1\t1\t1\t4\t280\t30\t60\t24\t88\tоплату
";

    #[test]
    fn parses_word_rows_only() {
        let words = parse_words(SAMPLE);
        assert_eq!(words.len(), 4);
        assert_eq!(words[0].text, "Счёт");
        assert_eq!(
            words[0].bbox,
            Some(BoundingBox {
                left: 40,
                top: 30,
                width: 120,
                height: 24
            })
        );
        assert_eq!(words[1].confidence, Some(31.5));
    }

    #[test]
    fn confidence_filter_over_tsv() {
        let words = parse_words(SAMPLE);
        assert_eq!(join_confident(&words, 0.0), "Счёт на оплату");
        assert_eq!(join_confident(&words, 50.0), "Счёт оплату");
    }

    #[test]
    fn malformed_rows_are_ignored() {
        let words = parse_words("5\t1\t1\nnot tsv at all\n5\t1\t1\t1\t1\t1\tx\t0\t1\t1\t90\tword\n");
        assert!(words.is_empty());
    }
}
