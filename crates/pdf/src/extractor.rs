//! Table extraction: detect ruled tables, dump them to temporary CSV, and
//! save a padded snapshot of each table.

use locker_core::Result;
use std::path::Path;

use crate::csv_export::{write_table_csv, ScratchFiles};
use crate::images::file_stem;
use crate::render::PageRasterizer;
use crate::tables::{self, DetectedTable, PageFrame, TableDetector};

/// Padding around a table snapshot, in points.
pub const TABLE_PADDING: f32 = 10.0;

/// Snapshot scale relative to 72 dpi.
pub const TABLE_ZOOM: f32 = 2.0;

/// Extracts table snapshots from a PDF.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    detector: TableDetector,
    padding: f32,
    zoom: f32,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self {
            detector: TableDetector::default(),
            padding: TABLE_PADDING,
            zoom: TABLE_ZOOM,
        }
    }
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(mut self, detector: TableDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Extract every table in `pdf_path` as a PNG in `output_dir`.
    ///
    /// Images are named `<stem>-page<N>-table<I>.png`. Each table is also
    /// written to a CSV of the same base name, and every CSV is deleted before
    /// this returns. Failures on a page or table are logged and skipped; a
    /// PDF that cannot be opened yields an empty list.
    pub fn extract_tables(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        rasterizer: &dyn PageRasterizer,
    ) -> Vec<String> {
        let pdf = match tables::open(pdf_path) {
            Ok(pdf) => pdf,
            Err(e) => {
                log::error!("Table extraction failed: {}", e);
                return Vec::new();
            }
        };

        let stem = file_stem(pdf_path);
        let mut scratch = ScratchFiles::new();
        let mut written = Vec::new();

        for page_index in 0..pdf.page_count() {
            let page_num = page_index + 1;
            let page = match self.detector.find(&pdf, page_index) {
                Ok(page) => page,
                Err(e) => {
                    log::warn!("Failed to process page {} for tables: {}", page_num, e);
                    continue;
                }
            };
            if page.tables.is_empty() {
                continue;
            }
            log::debug!("Page {}: found {} tables", page_num, page.tables.len());

            for (i, table) in page.tables.iter().enumerate() {
                let name = format!("{}-page{}-table{}", stem, page_num, i + 1);
                let target = Snapshot {
                    page_index,
                    frame: &page.frame,
                    name: &name,
                    output_dir,
                };
                match self.process_table(&target, table, rasterizer, &mut scratch) {
                    Ok(Some(image)) => {
                        log::debug!("Saved table snapshot {}", image);
                        written.push(image);
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!(
                        "Failed to capture table {} on page {}: {}",
                        i + 1,
                        page_num,
                        e
                    ),
                }
            }
        }

        drop(scratch);
        written
    }

    fn process_table(
        &self,
        target: &Snapshot<'_>,
        table: &DetectedTable,
        rasterizer: &dyn PageRasterizer,
        scratch: &mut ScratchFiles,
    ) -> Result<Option<String>> {
        if table.is_empty() {
            log::warn!("Table on page {} is empty", target.page_index + 1);
            return Ok(None);
        }

        let csv_path = target.output_dir.join(format!("{}.csv", target.name));
        scratch.track(csv_path.clone());
        write_table_csv(&csv_path, &table.rows)?;
        log::debug!("Created temporary CSV: {}", csv_path.display());

        let region = table
            .bbox
            .expand(self.padding)
            .clamp_to(target.frame.width(), target.frame.height());
        let image = format!("{}.png", target.name);
        rasterizer.render_region(
            target.page_index,
            &region,
            self.zoom,
            &target.output_dir.join(&image),
        )?;
        Ok(Some(image))
    }
}

/// Where one table snapshot goes.
struct Snapshot<'a> {
    page_index: usize,
    frame: &'a PageFrame,
    name: &'a str,
    output_dir: &'a Path,
}
