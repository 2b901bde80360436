//! Matching summary headings to template slides and content regions.

use crate::slide::{Shape, Slide};

/// How a heading was matched to a slide title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// Heading contained in the title, or the title contained in the heading.
    Fuzzy,
}

/// A slide selected for a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideMatch {
    /// Index into the presentation's slides.
    pub slide: usize,
    pub kind: MatchKind,
}

/// Lowercased slide titles, in first-seen order.
///
/// A title seen twice keeps its original position but points at the later
/// slide.
#[derive(Debug, Clone, Default)]
pub struct SlideIndex {
    entries: Vec<(String, usize)>,
}

impl SlideIndex {
    /// Index every slide with a non-empty title.
    pub fn build(slides: &[Slide]) -> Self {
        let mut index = Self::default();
        for (position, slide) in slides.iter().enumerate() {
            match slide.title() {
                Some(title) => {
                    log::debug!("Slide {} title: '{}'", slide.number, title);
                    index.insert(title.to_lowercase(), position);
                }
                None => log::debug!("Slide {} has no title", slide.number),
            }
        }
        index
    }

    fn insert(&mut self, title: String, slide: usize) {
        match self.entries.iter_mut().find(|(t, _)| *t == title) {
            Some(entry) => entry.1 = slide,
            None => self.entries.push((title, slide)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the slide for a heading: exact title first, then containment in
    /// either direction, first entry wins.
    pub fn find(&self, heading: &str) -> Option<SlideMatch> {
        let heading = heading.to_lowercase();

        if let Some((_, slide)) = self.entries.iter().find(|(t, _)| *t == heading) {
            return Some(SlideMatch {
                slide: *slide,
                kind: MatchKind::Exact,
            });
        }

        self.entries
            .iter()
            .find(|(t, _)| t.contains(&heading) || heading.contains(t.as_str()))
            .map(|(title, slide)| {
                log::debug!("Fuzzy match for '{}' -> '{}'", heading, title);
                SlideMatch {
                    slide: *slide,
                    kind: MatchKind::Fuzzy,
                }
            })
    }
}

/// Where bullets for a slide should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTarget {
    /// A non-title placeholder that holds text.
    Placeholder(usize),
    /// Some other non-title shape that holds text.
    Shape(usize),
    /// Nothing suitable; a text box must be added.
    NewTextBox,
}

/// Pick the content region of a slide.
pub fn select_content_region(slide: &Slide) -> ContentTarget {
    let title = slide.title_shape_index();
    let shapes = slide.shapes();
    log::debug!(
        "Searching for content region on slide {} ({} shapes)",
        slide.number,
        shapes.len()
    );

    let candidates = || {
        shapes
            .iter()
            .enumerate()
            .filter(move |(i, s)| Some(*i) != title && s.supports_text())
    };

    // Placeholders are tried in `idx` order, so a body placeholder wins over
    // footers and slide numbers that come earlier in the XML.
    let placeholder_idx = |shape: &Shape| shape.placeholder.as_ref().map_or(0, |p| p.idx);
    if let Some((index, shape)) = candidates()
        .filter(|(_, s)| s.is_placeholder())
        .min_by_key(|(_, s)| placeholder_idx(s))
    {
        log::debug!("Using placeholder idx={} for content", placeholder_idx(shape));
        return ContentTarget::Placeholder(index);
    }

    if let Some((index, _)) = candidates().next() {
        log::debug!("Using shape {} for content", index);
        return ContentTarget::Shape(index);
    }

    ContentTarget::NewTextBox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::fixtures::*;

    fn slide(number: usize, title: Option<&str>, shapes: &str) -> Slide {
        Slide::parse(number, format!("ppt/slides/slide{}.xml", number), slide_xml(title, shapes))
            .unwrap()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let slides = vec![
            slide(1, Some("Key Findings"), ""),
            slide(2, Some("BACKGROUND & MOTIVATION"), ""),
        ];
        let index = SlideIndex::build(&slides);
        assert_eq!(
            index.find("Background & Motivation"),
            Some(SlideMatch {
                slide: 1,
                kind: MatchKind::Exact
            })
        );
    }

    #[test]
    fn test_fuzzy_match_either_direction() {
        let slides = vec![
            slide(1, Some("Conclusion and Next Steps"), ""),
            slide(2, Some("Methods"), ""),
        ];
        let index = SlideIndex::build(&slides);
        assert_eq!(index.find("Conclusion").map(|m| m.slide), Some(0));
        let methods = index.find("Methods & Evidence").unwrap();
        assert_eq!(methods.slide, 1);
        assert_eq!(methods.kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_fuzzy_match_takes_first_in_order() {
        let slides = vec![
            slide(1, Some("Key"), ""),
            slide(2, Some("Key Findings Summary"), ""),
        ];
        let index = SlideIndex::build(&slides);
        assert_eq!(index.find("Key Findings").map(|m| m.slide), Some(0));
    }

    #[test]
    fn test_no_match() {
        let slides = vec![
            slide(1, Some("Background & Motivation"), ""),
            slide(2, Some("Other"), ""),
        ];
        let index = SlideIndex::build(&slides);
        assert_eq!(index.find("Key Findings"), None);
    }

    #[test]
    fn test_duplicate_title_later_slide_wins() {
        let slides = vec![
            slide(1, Some("Conclusion"), ""),
            slide(2, Some("Other"), ""),
            slide(3, Some("conclusion"), ""),
        ];
        let index = SlideIndex::build(&slides);
        assert_eq!(index.len(), 2);
        assert_eq!(index.find("Conclusion").map(|m| m.slide), Some(2));
    }

    #[test]
    fn test_untitled_slides_not_indexed() {
        let slides = vec![slide(1, None, ""), slide(2, Some("  "), "")];
        assert!(SlideIndex::build(&slides).is_empty());
    }

    #[test]
    fn test_region_prefers_placeholder() {
        let s = slide(
            1,
            Some("Key Findings"),
            &format!("{}{}", text_shape(3, "note"), body_placeholder(4, &["x"])),
        );
        assert_eq!(select_content_region(&s), ContentTarget::Placeholder(2));
    }

    #[test]
    fn test_region_falls_back_to_text_shape() {
        let s = slide(
            1,
            Some("Key Findings"),
            &format!("{}{}", picture(3), text_shape(4, "note")),
        );
        assert_eq!(select_content_region(&s), ContentTarget::Shape(2));
    }

    #[test]
    fn test_region_needs_new_text_box() {
        let s = slide(1, Some("Key Findings"), &picture(3));
        assert_eq!(select_content_region(&s), ContentTarget::NewTextBox);
    }

    #[test]
    fn test_region_orders_placeholders_by_idx() {
        let s = slide(
            1,
            Some("Key Findings"),
            &format!(
                "{}{}",
                typed_placeholder(3, "ftr", 11, "Footer"),
                body_placeholder(4, &["x"])
            ),
        );
        assert_eq!(select_content_region(&s), ContentTarget::Placeholder(2));
    }
}
