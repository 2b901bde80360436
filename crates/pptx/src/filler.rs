//! Populating a template deck with summary sections.

use locker_core::{Result, Sections};

use crate::matcher::{select_content_region, ContentTarget, SlideIndex};
use crate::presentation::Presentation;
use crate::slide::{Frame, Slide};
use crate::text::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE};

/// What happened to each heading during a fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Headings whose slide received content.
    pub filled: Vec<String>,
    /// Headings with no matching slide, or whose slide could not be edited.
    pub skipped: Vec<String>,
    /// Number of text boxes added because a slide had no content region.
    pub text_boxes_added: usize,
}

/// Writes summary bullets into the matching slides of a template.
#[derive(Debug, Clone)]
pub struct DeckFiller {
    font_size: u32,
    fallback_frame: Frame,
}

impl Default for DeckFiller {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            fallback_frame: Frame::from_inches(0.5, 1.5, 9.0, 5.0),
        }
    }
}

impl DeckFiller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bullet font size in points, limited to what DrawingML accepts.
    pub fn with_font_size(mut self, points: u32) -> Self {
        self.font_size = points.saturating_mul(100).clamp(100, MAX_FONT_SIZE);
        self
    }

    /// Position and size of text boxes added to slides without a content region.
    pub fn with_fallback_frame(mut self, frame: Frame) -> Self {
        self.fallback_frame = frame;
        self
    }

    /// Fill every section into its slide. Per-heading failures are logged and
    /// reported, never returned.
    pub fn fill(&self, presentation: &mut Presentation, sections: &Sections) -> FillReport {
        let index = SlideIndex::build(presentation.slides());
        log::debug!(
            "Template has {} slides, {} titled",
            presentation.slides().len(),
            index.len()
        );

        let mut report = FillReport::default();
        for section in sections {
            let heading = section.heading.as_str();
            log::debug!(
                "Processing heading '{}' with {} bullets",
                heading,
                section.bullets.len()
            );

            let Some(found) = index.find(heading) else {
                log::error!("No slide found for heading '{}'", heading);
                report.skipped.push(heading.to_string());
                continue;
            };

            let slide = &mut presentation.slides_mut()[found.slide];
            match self.write_section(slide, &section.bullets) {
                Ok(added_box) => {
                    if added_box {
                        report.text_boxes_added += 1;
                    }
                    log::info!(
                        "Wrote {} bullets to slide '{}'",
                        section.bullets.len(),
                        heading
                    );
                    report.filled.push(heading.to_string());
                }
                Err(e) => {
                    log::warn!("Failed to write slide '{}': {}", heading, e);
                    report.skipped.push(heading.to_string());
                }
            }
        }

        report
    }

    /// Write bullets into the slide's content region. Returns whether a text
    /// box had to be added.
    fn write_section(&self, slide: &mut Slide, bullets: &[String]) -> Result<bool> {
        let (index, added_box) = match select_content_region(slide) {
            ContentTarget::Placeholder(index) | ContentTarget::Shape(index) => (index, false),
            ContentTarget::NewTextBox => {
                log::warn!("Adding fallback text box for slide {}", slide.number);
                (slide.add_text_box(self.fallback_frame)?, true)
            }
        };

        let mut body = slide.text_body(index)?;
        body.set_bullets(bullets, self.font_size);
        slide.set_text_body(index, &body)?;
        Ok(added_box)
    }
}
