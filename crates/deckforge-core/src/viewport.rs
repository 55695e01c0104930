//! Mapping between slide coordinates and the on-screen slide container.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The slide's coordinate space as displayed on screen.
///
/// Components are stored in slide units (a fixed 1920x1080 space by
/// default). The host reports where the slide container sits on screen;
/// the viewport converts pointer positions into slide units and back.
/// The slide is letterboxed uniformly, so a single scale covers both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Size of the slide coordinate space.
    pub slide_size: Size,
    /// Slide container rectangle in screen pixels.
    pub display: Rect,
}

impl Viewport {
    /// Create a viewport for a slide container.
    ///
    /// Returns `None` for a degenerate container or slide size.
    pub fn new(slide_size: Size, display: Rect) -> Option<Self> {
        if slide_size.width <= 0.0
            || slide_size.height <= 0.0
            || display.width() <= 0.0
            || display.height() <= 0.0
        {
            return None;
        }
        Some(Self { slide_size, display })
    }

    /// Screen pixels per slide unit.
    pub fn scale(&self) -> f64 {
        self.display.width() / self.slide_size.width
    }

    /// Transform from slide units to screen pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.display.origin().to_vec2()) * Affine::scale(self.scale())
    }

    /// Convert a screen point to slide units.
    pub fn screen_to_slide(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    /// Convert a slide point to screen pixels.
    pub fn slide_to_screen(&self, slide_point: Point) -> Point {
        self.transform() * slide_point
    }

    /// Convert a screen-space delta to slide units.
    pub fn screen_delta_to_slide(&self, delta: Vec2) -> Vec2 {
        delta / self.scale()
    }

    /// Whether a screen point lies inside the slide container.
    pub fn contains_screen_point(&self, screen_point: Point) -> bool {
        self.display.contains(screen_point)
    }

    /// Express a slide point as percentages of the slide size.
    pub fn to_percent(&self, slide_point: Point) -> Point {
        Point::new(
            slide_point.x / self.slide_size.width * 100.0,
            slide_point.y / self.slide_size.height * 100.0,
        )
    }

    /// Convert percentages of the slide size back to slide units.
    pub fn from_percent(&self, percent: Point) -> Point {
        Point::new(
            percent.x / 100.0 * self.slide_size.width,
            percent.y / 100.0 * self.slide_size.height,
        )
    }
}
