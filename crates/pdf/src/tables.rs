//! Table detection.
//!
//! Ruled tables are found with pdfplumber's lattice finder, which also fills
//! in cell text. pdfplumber keeps the MediaBox origin on everything it
//! reports; tables are moved into displayed page space here so they line up
//! with rendered page images.

use locker_core::{Error, Result};
use pdfplumber::{BBox, Pdf, TableSettings};
use std::path::Path;

use crate::geometry::Rect;

/// Cell groups smaller than this are boxes, not tables.
pub const MIN_TABLE_CELLS: usize = 2;

/// Open a PDF for table detection.
pub fn open(path: &Path) -> Result<Pdf> {
    Pdf::open_path(path, None)
        .map_err(|e| Error::PdfError(format!("Failed to open {}: {}", path.display(), e)))
}

/// Where a page's displayed area sits in pdfplumber's coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    origin: (f64, f64),
    width: f32,
    height: f32,
}

impl PageFrame {
    /// `media_box` as reported by pdfplumber, `rotation` in clockwise degrees,
    /// and the displayed (rotated) page size.
    pub fn new(media_box: BBox, rotation: i32, width: f64, height: f64) -> Self {
        let x_min = media_box.x0.min(media_box.x1);
        let y_min = media_box.top.min(media_box.bottom);
        let origin = if matches!(rotation.rem_euclid(360), 90 | 270) {
            (y_min, -x_min)
        } else {
            (x_min, -y_min)
        };
        Self {
            origin,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Frame of page `index` (0-based).
    pub fn of_page(pdf: &Pdf, index: usize) -> Option<Self> {
        let (width, height) = pdf.page_dimensions(index)?;
        Some(Self::new(
            pdf.page_media_box(index)?,
            pdf.page_rotation(index).unwrap_or(0),
            width,
            height,
        ))
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// A pdfplumber box in displayed page space.
    pub fn to_page(&self, bbox: &BBox) -> Rect {
        let (dx, dy) = self.origin;
        Rect::new(
            (bbox.x0 - dx) as f32,
            (bbox.top - dy) as f32,
            (bbox.x1 - dx) as f32,
            (bbox.bottom - dy) as f32,
        )
    }
}

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Bounds in displayed page space.
    pub bbox: Rect,
    /// Cell text by row. Positions covered by a merged cell are `None`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl DetectedTable {
    pub fn from_table(table: &pdfplumber::Table, frame: &PageFrame) -> Self {
        let rows = table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
            .collect();
        Self {
            bbox: frame.to_page(&table.bbox),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

/// The tables on one page, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTables {
    pub frame: PageFrame,
    pub tables: Vec<DetectedTable>,
}

/// Finds ruled tables page by page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    settings: TableSettings,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TableSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    /// Detect the tables on page `index` (0-based).
    pub fn find(&self, pdf: &Pdf, index: usize) -> Result<PageTables> {
        let frame = PageFrame::of_page(pdf, index)
            .ok_or_else(|| Error::PdfError(format!("Page index {} out of range", index)))?;
        let page = pdf
            .page(index)
            .map_err(|e| Error::PdfError(format!("Failed to read page {}: {}", index + 1, e)))?;

        let tables = page
            .find_tables(&self.settings)
            .iter()
            .filter(|table| table.cells.len() >= MIN_TABLE_CELLS)
            .map(|table| DetectedTable::from_table(table, &frame))
            .collect();
        Ok(PageTables { frame, tables })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{grid_ops, write_pdf};
    use super::*;
    use lopdf::{dictionary, Dictionary};
    use pdfplumber::Cell;

    const LETTER: [i64; 4] = [0, 0, 612, 792];

    fn cell(x0: f64, top: f64, x1: f64, bottom: f64, text: Option<&str>) -> Cell {
        Cell {
            bbox: BBox::new(x0, top, x1, bottom),
            text: text.map(str::to_string),
        }
    }

    fn detect(path: &Path, index: usize) -> PageTables {
        let pdf = open(path).unwrap();
        TableDetector::new().find(&pdf, index).unwrap()
    }

    #[test]
    fn test_frame_plain_page() {
        let frame = PageFrame::new(BBox::new(0.0, 0.0, 612.0, 792.0), 0, 612.0, 792.0);
        let rect = frame.to_page(&BBox::new(72.0, 92.0, 328.0, 132.0));
        assert_eq!(rect, Rect::new(72.0, 92.0, 328.0, 132.0));
        assert_eq!((frame.width(), frame.height()), (612.0, 792.0));
    }

    #[test]
    fn test_frame_offset_media_box() {
        // pdfplumber keeps the absolute x and shifts top by -y_min.
        let frame = PageFrame::new(BBox::new(100.0, 100.0, 712.0, 892.0), 0, 612.0, 792.0);
        let rect = frame.to_page(&BBox::new(172.0, -8.0, 428.0, 32.0));
        assert_eq!(rect, Rect::new(72.0, 92.0, 328.0, 132.0));
    }

    #[test]
    fn test_frame_rotated_offset() {
        let frame = PageFrame::new(BBox::new(50.0, 20.0, 662.0, 812.0), 90, 792.0, 612.0);
        let rect = frame.to_page(&BBox::new(30.0, -40.0, 70.0, 200.0));
        assert_eq!(rect, Rect::new(10.0, 10.0, 50.0, 250.0));
        assert_eq!((frame.width(), frame.height()), (792.0, 612.0));
    }

    #[test]
    fn test_rows_keep_merged_positions() {
        let table = pdfplumber::Table {
            bbox: BBox::new(0.0, 0.0, 200.0, 40.0),
            cells: vec![
                cell(0.0, 0.0, 200.0, 20.0, Some("Header")),
                cell(0.0, 20.0, 100.0, 40.0, Some("a")),
                cell(100.0, 20.0, 200.0, 40.0, Some("")),
            ],
            rows: vec![
                vec![cell(0.0, 0.0, 200.0, 20.0, Some("Header")), cell(100.0, 0.0, 200.0, 20.0, None)],
                vec![cell(0.0, 20.0, 100.0, 40.0, Some("a")), cell(100.0, 20.0, 200.0, 40.0, Some(""))],
            ],
            columns: Vec::new(),
        };
        let frame = PageFrame::new(BBox::new(0.0, 0.0, 612.0, 792.0), 0, 612.0, 792.0);

        let detected = DetectedTable::from_table(&table, &frame);
        assert_eq!(
            detected.rows,
            vec![
                vec![Some("Header".to_string()), None],
                vec![Some("a".to_string()), Some(String::new())],
            ]
        );
        assert!(!detected.is_empty());
        assert!(DetectedTable { bbox: detected.bbox, rows: Vec::new() }.is_empty());
    }

    #[test]
    fn test_detects_ruled_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pdf");
        let ops = grid_ops(&[72.0, 200.0, 328.0], &[700.0, 680.0, 660.0]);
        write_pdf(&path, LETTER, vec![(ops, Dictionary::new())]);

        let page = detect(&path, 0);
        assert_eq!(page.tables.len(), 1);
        let table = &page.tables[0];
        assert_eq!(table.bbox, Rect::new(72.0, 92.0, 328.0, 132.0));
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn test_single_box_is_not_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.pdf");
        let ops = grid_ops(&[100.0, 300.0], &[500.0, 400.0]);
        write_pdf(&path, LETTER, vec![(ops, Dictionary::new())]);

        assert!(detect(&path, 0).tables.is_empty());
    }

    #[test]
    fn test_offset_media_box_maps_to_displayed_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.pdf");
        let ops = grid_ops(&[172.0, 300.0, 428.0], &[800.0, 780.0, 760.0]);
        write_pdf(&path, [100, 100, 712, 892], vec![(ops, Dictionary::new())]);

        let page = detect(&path, 0);
        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].bbox, Rect::new(72.0, 92.0, 328.0, 132.0));
        assert_eq!((page.frame.width(), page.frame.height()), (612.0, 792.0));
    }

    #[test]
    fn test_rotated_page_maps_to_displayed_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotated.pdf");
        let ops = grid_ops(&[72.0, 200.0, 328.0], &[700.0, 680.0, 660.0]);
        write_pdf(&path, LETTER, vec![(ops, dictionary! { "Rotate" => 90 })]);

        // A quarter turn clockwise puts user (x, y) at displayed (y, x).
        let page = detect(&path, 0);
        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].bbox, Rect::new(660.0, 72.0, 700.0, 328.0));
        assert_eq!((page.frame.width(), page.frame.height()), (792.0, 612.0));
    }

    #[test]
    fn test_page_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pdf");
        write_pdf(&path, LETTER, vec![(Vec::new(), Dictionary::new())]);

        let pdf = open(&path).unwrap();
        assert!(TableDetector::new().find(&pdf, 3).is_err());
        assert!(TableDetector::new().find(&pdf, 0).unwrap().tables.is_empty());
    }
}
