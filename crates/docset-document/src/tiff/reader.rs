// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TIFF reader — counts the frames of a multi-page TIFF and decodes requested
// frames to RGB rasters, walking the IFD chain forward.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use docset_core::error::{DocsetError, Result};
use image::RgbImage;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, instrument, warn};

type FileDecoder = Decoder<BufReader<File>>;

const PHOTOMETRIC_PALETTE: u16 = 3;
const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_PACKBITS: u16 = 32773;

/// Sequential reader over the frames of one TIFF file.
///
/// Frames are addressed by zero-based index. Reading frames in ascending
/// order costs a single pass over the file; asking for an earlier frame
/// reopens the decoder.
pub struct TiffReader {
    path: PathBuf,
    frame_count: usize,
    decoder: FileDecoder,
    /// Index of the frame the decoder is currently positioned on.
    position: usize,
}

impl TiffReader {
    /// Open a TIFF and count its frames.
    ///
    /// A malformed IFD partway through the chain ends the count there; the
    /// frames before it remain readable.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut counter = open_decoder(&path)?;
        let mut frame_count = 1;
        while counter.more_images() {
            if let Err(err) = counter.next_image() {
                warn!(frame = frame_count, error = %err, "Stopping at unreadable TIFF directory");
                break;
            }
            frame_count += 1;
        }
        debug!(frame_count, "TIFF frames counted");

        Ok(Self {
            decoder: open_decoder(&path)?,
            path,
            frame_count,
            position: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Decode frame `index` to RGB.
    ///
    /// Failures are reported as [`DocsetError::PageDecode`] so callers can
    /// skip the frame and continue with the rest of the file.
    pub fn read_frame(&mut self, index: usize) -> Result<RgbImage> {
        if index >= self.frame_count {
            return Err(DocsetError::PageDecode {
                page: index,
                reason: format!("file has {} frames", self.frame_count),
            });
        }
        self.seek_frame(index)?;

        let page_err = |reason: String| DocsetError::PageDecode {
            page: index,
            reason,
        };
        let (width, height) = self
            .decoder
            .dimensions()
            .map_err(|err| page_err(err.to_string()))?;
        let photometric = self
            .decoder
            .find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)
            .map_err(|err| page_err(err.to_string()))?;
        if photometric == Some(PHOTOMETRIC_PALETTE) {
            return self.read_palette_frame(width, height).map_err(page_err);
        }

        let color = self
            .decoder
            .colortype()
            .map_err(|err| page_err(err.to_string()))?;
        let data = self
            .decoder
            .read_image()
            .map_err(|err| page_err(err.to_string()))?;

        frame_to_rgb(width, height, color, data).map_err(page_err)
    }

    /// Palette frames are outside the decoder's colour model, so their
    /// strips are read straight from the file and mapped through the
    /// ColorMap. Uncompressed and PackBits strips are supported.
    fn read_palette_frame(
        &mut self,
        width: u32,
        height: u32,
    ) -> std::result::Result<RgbImage, String> {
        let tiff_err = |err: tiff::TiffError| err.to_string();
        let bits = self
            .decoder
            .find_tag_unsigned::<u8>(Tag::BitsPerSample)
            .map_err(tiff_err)?
            .unwrap_or(1);
        let compression = self
            .decoder
            .find_tag_unsigned::<u16>(Tag::Compression)
            .map_err(tiff_err)?
            .unwrap_or(COMPRESSION_NONE);
        let colormap = self.decoder.get_tag_u16_vec(Tag::ColorMap).map_err(tiff_err)?;
        let offsets = self.decoder.get_tag_u64_vec(Tag::StripOffsets).map_err(tiff_err)?;
        let counts = self
            .decoder
            .get_tag_u64_vec(Tag::StripByteCounts)
            .map_err(tiff_err)?;

        if !matches!(bits, 1 | 2 | 4 | 8) {
            return Err(format!("unsupported palette depth {bits}"));
        }
        let entries = 1usize << bits;
        if colormap.len() != 3 * entries {
            return Err(format!(
                "colour map holds {} values, expected {}",
                colormap.len(),
                3 * entries
            ));
        }
        if offsets.len() != counts.len() {
            return Err("strip offsets and byte counts disagree".to_string());
        }

        let mut file = File::open(&self.path).map_err(|err| err.to_string())?;
        let mut indices = Vec::new();
        for (&offset, &count) in offsets.iter().zip(&counts) {
            let mut strip = vec![0; count as usize];
            file.seek(SeekFrom::Start(offset))
                .and_then(|_| file.read_exact(&mut strip))
                .map_err(|err| format!("strip at {offset}: {err}"))?;
            match compression {
                COMPRESSION_NONE => indices.extend_from_slice(&strip),
                COMPRESSION_PACKBITS => indices.extend(unpack_bits(&strip)?),
                other => return Err(format!("unsupported palette compression {other}")),
            }
        }

        let stride = (width as usize * bits as usize).div_ceil(8);
        if indices.len() < stride * height as usize {
            return Err(format!(
                "frame holds {} bytes, expected {}",
                indices.len(),
                stride * height as usize
            ));
        }

        let (red, rest) = colormap.split_at(entries);
        let (green, blue) = rest.split_at(entries);
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for row in indices.chunks_exact(stride).take(height as usize) {
            for index in unpack_row(row, width as usize, bits) {
                let i = index as usize;
                rgb.extend_from_slice(&[
                    (red[i] >> 8) as u8,
                    (green[i] >> 8) as u8,
                    (blue[i] >> 8) as u8,
                ]);
            }
        }

        RgbImage::from_raw(width, height, rgb).ok_or_else(|| "frame buffer size mismatch".to_string())
    }

    fn seek_frame(&mut self, index: usize) -> Result<()> {
        if index < self.position {
            self.decoder = open_decoder(&self.path)?;
            self.position = 0;
        }
        while self.position < index {
            self.decoder
                .next_image()
                .map_err(|err| DocsetError::PageDecode {
                    page: index,
                    reason: err.to_string(),
                })?;
            self.position += 1;
        }
        Ok(())
    }
}

fn open_decoder(path: &Path) -> Result<FileDecoder> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file))
        .map_err(|err| DocsetError::TiffError(format!("{}: {}", path.display(), err)))
}

/// Sample values of one packed row, most significant bits first.
fn unpack_row(row: &[u8], width: usize, bits: u8) -> impl Iterator<Item = u8> + '_ {
    let mask = ((1u16 << bits) - 1) as u8;
    (0..width).map(move |x| {
        let bit = x * bits as usize;
        let shift = 8 - bits as usize - bit % 8;
        (row[bit / 8] >> shift) & mask
    })
}

/// Expand a PackBits-compressed strip.
fn unpack_bits(mut input: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(input.len() * 2);
    while let Some((&header, rest)) = input.split_first() {
        let header = header as i8;
        input = rest;
        match header {
            0..=127 => {
                let len = header as usize + 1;
                let literal = input.get(..len).ok_or("truncated PackBits literal")?;
                out.extend_from_slice(literal);
                input = &input[len..];
            }
            -127..=-1 => {
                let (&byte, rest) = input.split_first().ok_or("truncated PackBits run")?;
                out.extend(std::iter::repeat_n(byte, (1 - header as isize) as usize));
                input = rest;
            }
            -128 => {}
        }
    }
    Ok(out)
}

/// Convert one decoded frame into 8-bit RGB.
fn frame_to_rgb(
    width: u32,
    height: u32,
    color: ColorType,
    data: DecodingResult,
) -> std::result::Result<RgbImage, String> {
    // Sub-byte gray arrives bit-packed with each row padded to a whole
    // byte. WhiteIsZero has already been inverted by the decoder.
    if let ColorType::Gray(bits @ (1 | 2 | 4)) = color {
        let DecodingResult::U8(packed) = data else {
            return Err(format!("unsupported sample format for {:?}", color));
        };
        return packed_gray_to_rgb(width, height, bits, &packed);
    }

    let samples: Vec<u8> = match data {
        DecodingResult::U8(buf) => buf,
        DecodingResult::U16(buf) => buf.into_iter().map(|v| (v >> 8) as u8).collect(),
        _ => return Err(format!("unsupported sample format for {:?}", color)),
    };

    let pixels = width as usize * height as usize;
    let channels = match color {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) | ColorType::CMYK(_) => 4,
        other => return Err(format!("unsupported colour type {:?}", other)),
    };
    if samples.len() < pixels * channels {
        return Err(format!(
            "frame holds {} samples, expected {}",
            samples.len(),
            pixels * channels
        ));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for px in samples.chunks_exact(channels).take(pixels) {
        match color {
            ColorType::Gray(_) | ColorType::GrayA(_) => rgb.extend_from_slice(&[px[0]; 3]),
            ColorType::CMYK(_) => {
                let k = 255 - px[3] as u16;
                for c in &px[..3] {
                    rgb.push(((255 - *c as u16) * k / 255) as u8);
                }
            }
            _ => rgb.extend_from_slice(&px[..3]),
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| "frame buffer size mismatch".to_string())
}

fn packed_gray_to_rgb(
    width: u32,
    height: u32,
    bits: u8,
    packed: &[u8],
) -> std::result::Result<RgbImage, String> {
    let stride = (width as usize * bits as usize).div_ceil(8);
    if packed.len() < stride * height as usize {
        return Err(format!(
            "frame holds {} bytes, expected {}",
            packed.len(),
            stride * height as usize
        ));
    }

    let max = (1u16 << bits) - 1;
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for row in packed.chunks_exact(stride).take(height as usize) {
        for value in unpack_row(row, width as usize, bits) {
            rgb.extend_from_slice(&[(value as u16 * 255 / max) as u8; 3]);
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| "frame buffer size mismatch".to_string())
}
