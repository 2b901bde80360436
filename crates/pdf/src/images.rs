//! Embedded raster image extraction.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use locker_core::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::document::{self, get, name, number};

/// Form XObjects nested deeper than this are not searched.
const MAX_FORM_DEPTH: usize = 8;

/// An image ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// File extension without the dot.
    pub ext: &'static str,
    pub data: Vec<u8>,
}

/// Extract every image on every page of `pdf_path` into `output_dir`.
///
/// Files are named `<stem>-page<N>-img<I>.<ext>` with 1-based page and
/// per-page image numbers. A PDF that cannot be opened yields an empty list;
/// an image that cannot be decoded or written is logged and skipped.
pub fn extract_images(pdf_path: &Path, output_dir: &Path) -> Vec<String> {
    let doc = match document::load(pdf_path) {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("Image extraction failed: {}", e);
            return Vec::new();
        }
    };
    let stem = file_stem(pdf_path);

    let pages = doc.get_pages();
    log::debug!("Opened PDF with {} pages", pages.len());

    let mut written = Vec::new();
    for (page_num, page_id) in pages {
        let images = page_images(&doc, page_id);
        if !images.is_empty() {
            log::debug!("Page {}: found {} images", page_num, images.len());
        }

        for (i, image_id) in images.into_iter().enumerate() {
            let result = encode_image(&doc, image_id).and_then(|image| {
                let filename = format!("{}-page{}-img{}.{}", stem, page_num, i + 1, image.ext);
                std::fs::write(output_dir.join(&filename), &image.data)?;
                Ok(filename)
            });
            match result {
                Ok(filename) => {
                    log::debug!("Saved {}", filename);
                    written.push(filename);
                }
                Err(e) => log::warn!(
                    "Skipping image {} on page {}: {}",
                    i + 1,
                    page_num,
                    e
                ),
            }
        }
    }

    written
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Image XObjects used by a page, in resource order, each listed once.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    if let Some(resources) = document::page_resources(doc, page_id) {
        collect_images(doc, resources, 0, &mut found, &mut visited);
    }
    found
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    depth: usize,
    found: &mut Vec<ObjectId>,
    visited: &mut HashSet<ObjectId>,
) {
    let Some(Object::Dictionary(xobjects)) = get(doc, resources, b"XObject") else {
        return;
    };

    for (_, entry) in xobjects.iter() {
        let Object::Reference(id) = entry else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };

        match get(doc, &stream.dict, b"Subtype").and_then(name) {
            Some(b"Image") => found.push(*id),
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                if let Some(Object::Dictionary(inner)) = get(doc, &stream.dict, b"Resources") {
                    collect_images(doc, inner, depth + 1, found, visited);
                }
            }
            _ => {}
        }
    }
}

/// Encode an image XObject in its native format when that is a standalone
/// image codec, otherwise as PNG.
pub fn encode_image(doc: &Document, image_id: ObjectId) -> Result<EncodedImage> {
    let stream = match doc.get_object(image_id) {
        Ok(Object::Stream(stream)) => stream,
        _ => {
            return Err(Error::ImageError(format!(
                "Object {:?} is not an image stream",
                image_id
            )))
        }
    };

    let filters = document::stream_filters(doc, &stream.dict);
    let native = match filters.as_slice() {
        [b"DCTDecode"] => Some("jpeg"),
        [b"JPXDecode"] => Some("jpx"),
        [b"JBIG2Decode"] => Some("jb2"),
        _ => None,
    };
    if let Some(ext) = native {
        return Ok(EncodedImage {
            ext,
            data: stream.content.clone(),
        });
    }

    let samples = decoded_samples(stream, &filters)?;
    let png = to_png(doc, &stream.dict, &samples)?;
    Ok(EncodedImage {
        ext: "png",
        data: png,
    })
}

fn decoded_samples(stream: &Stream, filters: &[&[u8]]) -> Result<Vec<u8>> {
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }
    if let Some(unsupported) = filters
        .iter()
        .find(|f| matches!(**f, b"DCTDecode" | b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode"))
    {
        return Err(Error::ImageError(format!(
            "Unsupported filter chain ending in {}",
            String::from_utf8_lossy(unsupported)
        )));
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::ImageError(format!("Failed to decompress image: {}", e)))
}

/// Color model of an image's samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup: base space and the packed palette bytes.
    Indexed(Box<ColorSpace>, Vec<u8>),
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed(..) => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn parse(doc: &Document, object: Option<&Object>) -> Result<ColorSpace> {
        let Some(object) = object else {
            return Ok(ColorSpace::Gray);
        };

        match object {
            Object::Name(n) => Self::from_name(n),
            Object::Array(parts) => {
                let family = parts
                    .first()
                    .and_then(|o| document::resolve(doc, o).ok())
                    .and_then(name)
                    .unwrap_or_default();
                match family {
                    b"ICCBased" => {
                        let n = parts
                            .get(1)
                            .and_then(|o| document::resolve(doc, o).ok())
                            .and_then(|o| match o {
                                Object::Stream(s) => get(doc, &s.dict, b"N").and_then(number),
                                _ => None,
                            })
                            .unwrap_or(3.0) as usize;
                        match n {
                            1 => Ok(ColorSpace::Gray),
                            4 => Ok(ColorSpace::Cmyk),
                            _ => Ok(ColorSpace::Rgb),
                        }
                    }
                    b"Indexed" => {
                        let base = ColorSpace::parse(
                            doc,
                            parts.get(1).and_then(|o| document::resolve(doc, o).ok()),
                        )?;
                        let palette = match parts.get(3).map(|o| document::resolve(doc, o)) {
                            Some(Ok(Object::String(bytes, _))) => bytes.clone(),
                            Some(Ok(Object::Stream(s))) => s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone()),
                            _ => {
                                return Err(Error::ImageError(
                                    "Indexed color space without palette".to_string(),
                                ))
                            }
                        };
                        Ok(ColorSpace::Indexed(Box::new(base), palette))
                    }
                    b"CalGray" => Ok(ColorSpace::Gray),
                    b"CalRGB" | b"Lab" => Ok(ColorSpace::Rgb),
                    other => Self::from_name(other),
                }
            }
            Object::Reference(_) => Self::parse(doc, document::resolve(doc, object).ok()),
            _ => Err(Error::ImageError("Unreadable color space".to_string())),
        }
    }

    fn from_name(n: &[u8]) -> Result<ColorSpace> {
        match n {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(Error::ImageError(format!(
                "Unsupported color space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

fn to_png(doc: &Document, dict: &Dictionary, samples: &[u8]) -> Result<Vec<u8>> {
    let dimension = |key: &[u8]| {
        get(doc, dict, key)
            .and_then(number)
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
            .ok_or_else(|| {
                Error::ImageError(format!("Missing {}", String::from_utf8_lossy(key)))
            })
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let is_mask = matches!(get(doc, dict, b"ImageMask"), Some(Object::Boolean(true)));
    let (color_space, bpc) = if is_mask {
        (ColorSpace::Gray, 1)
    } else {
        let bpc = get(doc, dict, b"BitsPerComponent")
            .and_then(number)
            .map(|v| v as u8)
            .unwrap_or(8);
        (ColorSpace::parse(doc, get(doc, dict, b"ColorSpace"))?, bpc)
    };

    let values = unpack_samples(samples, width, height, color_space.components(), bpc)?;
    let scale = |v: u8| -> u8 {
        match bpc {
            1 => v * 255,
            2 => v * 85,
            4 => v * 17,
            _ => v,
        }
    };

    let image = match &color_space {
        ColorSpace::Gray => {
            let pixels: Vec<u8> = values.iter().map(|v| scale(*v)).collect();
            GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
        }
        ColorSpace::Rgb => {
            let pixels: Vec<u8> = values.iter().map(|v| scale(*v)).collect();
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Cmyk => {
            let pixels: Vec<u8> = values
                .chunks_exact(4)
                .flat_map(|c| cmyk_to_rgb(scale(c[0]), scale(c[1]), scale(c[2]), scale(c[3])))
                .collect();
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed(base, palette) => {
            let stride = base.components();
            let pixels: Vec<u8> = values
                .iter()
                .flat_map(|index| {
                    let start = *index as usize * stride;
                    let entry = palette.get(start..start + stride).unwrap_or(&[]);
                    match (base.as_ref(), entry) {
                        (ColorSpace::Gray, [g]) => [*g, *g, *g],
                        (ColorSpace::Rgb, [r, g, b]) => [*r, *g, *b],
                        (ColorSpace::Cmyk, [c, m, y, k]) => cmyk_to_rgb(*c, *m, *y, *k),
                        _ => [0, 0, 0],
                    }
                })
                .collect();
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
    }
    .ok_or_else(|| Error::ImageError("Sample data does not match image size".to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::ImageError(format!("Failed to encode PNG: {}", e)))?;
    Ok(png)
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let channel = |v: u8| ((255 - v as u32) * (255 - k as u32) / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

/// Unpack rows of `bpc`-bit samples into one byte per sample. Rows are padded
/// to whole bytes; 16-bit samples keep their high byte.
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bpc: u8,
) -> Result<Vec<u8>> {
    let too_large = || Error::ImageError(format!("Image too large: {}x{}", width, height));
    let per_row = (width as usize).checked_mul(components).ok_or_else(too_large)?;
    let row_bits = match bpc {
        1 | 2 | 4 | 8 | 16 => per_row.checked_mul(bpc as usize).ok_or_else(too_large)?,
        other => {
            return Err(Error::ImageError(format!(
                "Unsupported bits per component: {}",
                other
            )))
        }
    };
    let row_bytes = row_bits.div_ceil(8);
    let total = row_bytes
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;
    if row_bytes == 0 || data.len() < total {
        return Err(Error::ImageError(format!(
            "Image data too short: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut out = Vec::with_capacity(per_row * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        match bpc {
            8 => out.extend_from_slice(&row[..per_row]),
            16 => out.extend(row.chunks_exact(2).take(per_row).map(|pair| pair[0])),
            bits => {
                let per_byte = 8 / bits as usize;
                let mask = (1u8 << bits) - 1;
                out.extend((0..per_row).map(|i| {
                    let byte = row[i / per_byte];
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    (byte >> shift) & mask
                }));
            }
        }
    }
    Ok(out)
}
