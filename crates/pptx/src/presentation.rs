//! An opened presentation: the package plus its parsed slides.

use locker_core::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::package::Package;
use crate::parser::PptxParser;
use crate::slide::Slide;

/// A presentation whose slides can be edited and saved.
#[derive(Debug, Clone)]
pub struct Presentation {
    package: Package,
    slides: Vec<Slide>,
}

impl Presentation {
    pub(crate) fn new(package: Package, slides: Vec<Slide>) -> Self {
        Self { package, slides }
    }

    /// Open a .pptx file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        PptxParser::new().parse(BufReader::new(file))
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    /// Write modified slides back into the package.
    fn sync(&mut self) {
        for slide in self.slides.iter().filter(|s| s.is_modified()) {
            self.package
                .set_part(&slide.part_name, slide.xml().as_bytes().to_vec());
        }
    }

    /// Save to a file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.sync();
        self.package.save(path)
    }

    /// Serialize to .pptx bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.sync();
        self.package.to_bytes()
    }
}
