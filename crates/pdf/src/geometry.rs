//! Page-space geometry.
//!
//! Rectangles use the top-left corner of the displayed page as origin, with y
//! growing downwards, in PDF points. This is the orientation of rendered page
//! images, after any page rotation.

/// An axis-aligned rectangle in page points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle has no area or is not finite.
    pub fn is_empty(&self) -> bool {
        !(self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite())
            || self.width() <= 0.0
            || self.height() <= 0.0
    }

    /// Grow by `padding` on every side.
    pub fn expand(&self, padding: f32) -> Self {
        Self::new(
            self.x0 - padding,
            self.y0 - padding,
            self.x1 + padding,
            self.y1 + padding,
        )
    }

    /// Clamp to a page of the given size.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x0.max(0.0),
            self.y0.max(0.0),
            self.x1.min(width),
            self.y1.min(height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_and_clamp() {
        let table = Rect::new(5.0, 100.0, 590.0, 200.0);
        let region = table.expand(10.0).clamp_to(595.0, 842.0);
        assert_eq!(region, Rect::new(0.0, 90.0, 595.0, 210.0));
    }

    #[test]
    fn test_is_empty() {
        assert!(Rect::new(10.0, 10.0, 10.0, 20.0).is_empty());
        assert!(Rect::new(10.0, 10.0, 5.0, 20.0).is_empty());
        assert!(Rect::new(0.0, 0.0, f32::INFINITY, 20.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
