// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filesystem fixtures shared by this crate's tests.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Create an empty file, making parent directories as needed.
pub(crate) fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

/// Write a small PNG page.
pub(crate) fn write_png(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(24, 16, image::Rgb([250, 250, 250]))
        .save(path)
        .unwrap();
}

/// Write a PDF with `pages` small pages, each with one filled rectangle.
pub(crate) fn write_pdf(path: &Path, pages: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new(
                    "re",
                    vec![
                        Object::Integer(20),
                        Object::Integer(20),
                        Object::Integer(100),
                        Object::Integer(40),
                    ],
                ),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(200),
                Object::Integer(280),
            ],
            "Resources" => dictionary! {},
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    doc.save(path).unwrap();
}

/// Write an uncompressed 8-bit gray TIFF of 8x8 frames, one per entry.
/// `Some(shade)` is a solid fill; `None` is a frame whose strip offset points
/// past the end of the file.
pub(crate) fn write_gray_tiff(path: &Path, frames: &[Option<u8>]) {
    const SIDE: u32 = 8;
    let mut out = b"II*\0".to_vec();
    out.extend_from_slice(&0u32.to_le_bytes());
    let mut link = 4;

    for frame in frames {
        let strip_offset = match frame {
            Some(shade) => {
                let offset = out.len() as u32;
                out.extend(std::iter::repeat_n(*shade, (SIDE * SIDE) as usize));
                offset
            }
            None => 1 << 24,
        };

        // (tag, type, value) with SHORT = 3 and LONG = 4, all of count 1
        let entries: [(u16, u16, u32); 9] = [
            (256, 4, SIDE),
            (257, 4, SIDE),
            (258, 3, 8),
            (259, 3, 1),
            (262, 3, 1),
            (273, 4, strip_offset),
            (277, 3, 1),
            (278, 4, SIDE),
            (279, 4, SIDE * SIDE),
        ];
        let ifd_offset = out.len() as u32;
        out[link..link + 4].copy_from_slice(&ifd_offset.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, kind, value) in entries {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
        }
        link = out.len();
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, out).unwrap();
}
