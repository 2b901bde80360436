//! Page region rendering through PDFium.

use image::{imageops, ImageFormat, RgbaImage};
use locker_core::{Error, Result};
use pdfium_render::prelude::*;
use std::path::Path;

use crate::geometry::Rect;

/// Raster access used by table extraction.
///
/// Rectangles are in displayed page points with a top-left origin, so page
/// rotation is already applied; `page_index` is 0-based.
pub trait PageRasterizer {
    /// Render a region of a page at `zoom` times 72 dpi and save it as PNG.
    fn render_region(&self, page_index: usize, region: &Rect, zoom: f32, output: &Path)
        -> Result<()>;
}

/// A bound PDFium library.
pub struct PdfiumLibrary {
    pdfium: Pdfium,
}

impl PdfiumLibrary {
    /// Bind to PDFium, trying `library_dir` first and then the system library.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let bindings = match library_dir {
            Some(dir) => {
                let dir = dir.to_string_lossy();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&*dir))
                    .or_else(|e| {
                        log::debug!("Failed to bind to pdfium in {}: {:?}", dir, e);
                        Pdfium::bind_to_system_library()
                    })
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| Error::RenderError(format!("PDFium library not available: {:?}", e)))?;

        log::debug!("Pdfium library bound successfully");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Open a document for table extraction.
    pub fn open(&self, path: &Path) -> Result<PdfiumRasterizer<'_>> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::PdfError(format!("Failed to open {}: {:?}", path.display(), e)))?;
        Ok(PdfiumRasterizer { document })
    }
}

/// Rasterizer backed by an open PDFium document.
pub struct PdfiumRasterizer<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumRasterizer<'a> {
    fn page(&self, page_index: usize) -> Result<PdfPage<'a>> {
        let index = u16::try_from(page_index)
            .map_err(|_| Error::RenderError(format!("Page index {} out of range", page_index)))?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| Error::RenderError(format!("Failed to load page {}: {:?}", page_index + 1, e)))
    }
}

impl<'a> PageRasterizer for PdfiumRasterizer<'a> {
    fn render_region(
        &self,
        page_index: usize,
        region: &Rect,
        zoom: f32,
        output: &Path,
    ) -> Result<()> {
        let page = self.page(page_index)?;
        let page_width = page.width().value;

        let config = PdfRenderConfig::new().scale_page_by_factor(zoom);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::RenderError(format!("Failed to render page: {:?}", e)))?;
        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        let rendered = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| Error::RenderError("Bitmap size mismatch".to_string()))?;

        let scale = width as f32 / page_width;
        let crop = pixel_bounds(region, scale, width, height)
            .ok_or_else(|| Error::RenderError("Table region is empty".to_string()))?;
        let (x, y, w, h) = crop;

        imageops::crop_imm(&rendered, x, y, w, h)
            .to_image()
            .save_with_format(output, ImageFormat::Png)
            .map_err(|e| Error::ImageError(format!("Failed to save {}: {}", output.display(), e)))
    }
}

/// Pixel rectangle `(x, y, width, height)` covering `region` at `scale`,
/// clipped to the bitmap.
pub fn pixel_bounds(region: &Rect, scale: f32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    if region.is_empty() || !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let clip = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
    let x0 = clip((region.x0 * scale).floor(), width);
    let y0 = clip((region.y0 * scale).floor(), height);
    let x1 = clip((region.x1 * scale).ceil(), width);
    let y1 = clip((region.y1 * scale).ceil(), height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::cell::RefCell;

    /// Rasterizer that records requested regions and writes a tiny PNG.
    #[derive(Default)]
    pub struct FakeRasterizer {
        pub fail_render: bool,
        pub rendered: RefCell<Vec<(usize, Rect)>>,
    }

    impl PageRasterizer for FakeRasterizer {
        fn render_region(
            &self,
            page_index: usize,
            region: &Rect,
            _zoom: f32,
            output: &Path,
        ) -> Result<()> {
            if self.fail_render {
                return Err(Error::RenderError("render failed".to_string()));
            }
            self.rendered.borrow_mut().push((page_index, *region));
            RgbaImage::new(2, 2)
                .save_with_format(output, ImageFormat::Png)
                .map_err(|e| Error::ImageError(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_bounds_scaled() {
        let region = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(pixel_bounds(&region, 2.0, 1224, 1584), Some((20, 40, 200, 100)));
    }

    #[test]
    fn test_pixel_bounds_clipped() {
        let region = Rect::new(500.0, 700.0, 700.0, 900.0);
        assert_eq!(pixel_bounds(&region, 2.0, 1224, 1584), Some((1000, 1400, 224, 184)));
    }

    #[test]
    fn test_pixel_bounds_empty() {
        assert_eq!(pixel_bounds(&Rect::new(5.0, 5.0, 5.0, 9.0), 2.0, 100, 100), None);
        assert_eq!(pixel_bounds(&Rect::new(200.0, 0.0, 300.0, 9.0), 2.0, 100, 100), None);
    }
}
