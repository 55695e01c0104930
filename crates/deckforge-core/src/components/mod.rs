//! Slide component model.
//!
//! A component is pure data: an id, a kind tag from a fixed catalog, and a
//! prop bag. Position is the top-left corner of the unrotated box in slide
//! units; rotation is in degrees, clockwise, around the box center.

mod lines;

pub use lines::{AnchorSide, Connection, LineEnd, LineEndpoint, LinesProps};

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique identifier for components.
pub type ComponentId = String;

/// Unique identifier for slides.
pub type SlideId = String;

/// Component type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    TiptapTextBlock,
    TextBlock,
    Image,
    Video,
    Shape,
    Chart,
    Table,
    Icon,
    Lines,
    Group,
    Background,
    CustomComponent,
}

impl ComponentKind {
    /// Whether a double-click on this kind enters text editing.
    pub fn supports_text_editing(self) -> bool {
        matches!(self, Self::TiptapTextBlock | Self::TextBlock | Self::Shape)
    }

    /// Tag used in the collaborative document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TiptapTextBlock => "TiptapTextBlock",
            Self::TextBlock => "TextBlock",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Shape => "Shape",
            Self::Chart => "Chart",
            Self::Table => "Table",
            Self::Icon => "Icon",
            Self::Lines => "Lines",
            Self::Group => "Group",
            Self::Background => "Background",
            Self::CustomComponent => "CustomComponent",
        }
    }

    /// Parse a tag produced by [`ComponentKind::as_str`].
    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "TiptapTextBlock" => Self::TiptapTextBlock,
            "TextBlock" => Self::TextBlock,
            "Image" => Self::Image,
            "Video" => Self::Video,
            "Shape" => Self::Shape,
            "Chart" => Self::Chart,
            "Table" => Self::Table,
            "Icon" => Self::Icon,
            "Lines" => Self::Lines,
            "Group" => Self::Group,
            "Background" => Self::Background,
            "CustomComponent" => Self::CustomComponent,
            _ => return None,
        })
    }
}

/// Props shared by every component plus a bag of type-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProps {
    /// Top-left corner of the unrotated box.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_index: i64,
    /// Background components are never deleted by the selection shortcuts.
    #[serde(default)]
    pub is_background: bool,
    /// Endpoints for `Lines` components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<LinesProps>,
    /// Member ids for `Group` components.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentId>,
    /// Type-specific fields (text content, image source, chart data, ...).
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentProps {
    /// Props for an unrotated box.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            position,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
            is_background: false,
            lines: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A component placed on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub props: ComponentProps,
}

impl ComponentInstance {
    /// Create a component with an unrotated box.
    pub fn new(id: impl Into<ComponentId>, kind: ComponentKind, position: Point, size: Size) -> Self {
        Self {
            id: id.into(),
            kind,
            props: ComponentProps::new(position, size.width, size.height),
        }
    }

    /// Create a `Lines` component between two points.
    pub fn line(id: impl Into<ComponentId>, start: Point, end: Point) -> Self {
        let lines = LinesProps::new(start, end);
        let bounds = lines.bounding_rect();
        let mut props = ComponentProps::new(bounds.origin(), bounds.width(), bounds.height());
        props.lines = Some(lines);
        Self {
            id: id.into(),
            kind: ComponentKind::Lines,
            props,
        }
    }

    /// Create a `Group` component wrapping the given members.
    pub fn group(id: impl Into<ComponentId>, bounds: Rect, children: Vec<ComponentId>) -> Self {
        let mut props = ComponentProps::new(bounds.origin(), bounds.width(), bounds.height());
        props.children = children;
        Self {
            id: id.into(),
            kind: ComponentKind::Group,
            props,
        }
    }

    /// Builder-style rotation setter (degrees).
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.props.rotation = rotation;
        self
    }

    /// Builder-style z-index setter.
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.props.z_index = z_index;
        self
    }

    pub fn is_line(&self) -> bool {
        self.kind == ComponentKind::Lines
    }

    pub fn is_group(&self) -> bool {
        self.kind == ComponentKind::Group
    }

    pub fn is_background(&self) -> bool {
        self.props.is_background || self.kind == ComponentKind::Background
    }

    pub fn supports_text_editing(&self) -> bool {
        self.kind.supports_text_editing()
    }

    /// The unrotated box.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.props.position, (self.props.width, self.props.height))
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Rotation around the box center as an affine transform.
    pub fn rotation_transform(&self) -> Affine {
        Affine::rotate_about(self.props.rotation.to_radians(), self.center())
    }

    /// Map a point given relative to the center in the unrotated frame to
    /// slide coordinates.
    pub fn local_to_slide(&self, offset: Vec2) -> Point {
        self.rotation_transform() * (self.center() + offset)
    }

    /// Corners of the rotated box: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let r = self.rect();
        let t = self.rotation_transform();
        [
            t * Point::new(r.x0, r.y0),
            t * Point::new(r.x1, r.y0),
            t * Point::new(r.x1, r.y1),
            t * Point::new(r.x0, r.y1),
        ]
    }

    /// Axis-aligned bounding box of the rotated component.
    pub fn bounds(&self) -> Rect {
        if let Some(lines) = self.line_props() {
            return lines.bounding_rect();
        }
        if self.props.rotation.rem_euclid(360.0).abs() < 1e-9 {
            return self.rect();
        }
        let corners = self.corners();
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Check if a slide point hits this component.
    pub fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        if let Some(lines) = self.line_props() {
            return point_to_segment_dist(point, lines.start_point.point(), lines.end_point.point())
                <= tolerance.max(1.0);
        }
        let local = self.rotation_transform().inverse() * point;
        self.rect().inflate(tolerance, tolerance).contains(local)
    }

    /// Endpoints, if this is a `Lines` component.
    pub fn line_props(&self) -> Option<&LinesProps> {
        if self.is_line() { self.props.lines.as_ref() } else { None }
    }

    /// Apply a partial prop update.
    pub fn apply_patch(&mut self, patch: &PropsPatch) {
        patch.apply_to(&mut self.props);
    }
}

/// A partial prop update.
///
/// Present fields overwrite the component's props; absent fields are left
/// alone. The same payload is written to the local store and forwarded to
/// the collaborative document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<LineEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<LineEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ComponentId>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PropsPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// A patch that rewrites every field of `props`.
    pub fn from_props(props: &ComponentProps) -> Self {
        Self {
            position: Some(props.position),
            width: Some(props.width),
            height: Some(props.height),
            rotation: Some(props.rotation),
            z_index: Some(props.z_index),
            is_background: Some(props.is_background),
            start_point: props.lines.as_ref().map(|l| l.start_point.clone()),
            end_point: props.lines.as_ref().map(|l| l.end_point.clone()),
            children: Some(props.children.clone()),
            extra: props.extra.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Fold a later patch into this one; the later patch wins per field.
    pub fn merge(&mut self, later: &PropsPatch) {
        if later.position.is_some() {
            self.position = later.position;
        }
        if later.width.is_some() {
            self.width = later.width;
        }
        if later.height.is_some() {
            self.height = later.height;
        }
        if later.rotation.is_some() {
            self.rotation = later.rotation;
        }
        if later.z_index.is_some() {
            self.z_index = later.z_index;
        }
        if later.is_background.is_some() {
            self.is_background = later.is_background;
        }
        if later.start_point.is_some() {
            self.start_point = later.start_point.clone();
        }
        if later.end_point.is_some() {
            self.end_point = later.end_point.clone();
        }
        if later.children.is_some() {
            self.children = later.children.clone();
        }
        for (key, value) in &later.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Write the present fields into `props`.
    pub fn apply_to(&self, props: &mut ComponentProps) {
        if let Some(position) = self.position {
            props.position = position;
        }
        if let Some(width) = self.width {
            props.width = width;
        }
        if let Some(height) = self.height {
            props.height = height;
        }
        if let Some(rotation) = self.rotation {
            props.rotation = rotation;
        }
        if let Some(z_index) = self.z_index {
            props.z_index = z_index;
        }
        if let Some(is_background) = self.is_background {
            props.is_background = is_background;
        }
        if self.start_point.is_some() || self.end_point.is_some() {
            let lines = props
                .lines
                .get_or_insert_with(|| LinesProps::new(props.position, props.position));
            if let Some(start) = &self.start_point {
                lines.start_point = start.clone();
            }
            if let Some(end) = &self.end_point {
                lines.end_point = end.clone();
            }
        }
        if let Some(children) = &self.children {
            props.children = children.clone();
        }
        for (key, value) in &self.extra {
            props.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Find the topmost component under a slide point.
///
/// Higher `z_index` wins; among equal z-indices the later component in the
/// list is on top.
pub fn hit_test(components: &[ComponentInstance], point: Point, tolerance: f64) -> Option<&ComponentInstance> {
    hit_test_where(components, point, tolerance, |_| true)
}

/// [`hit_test`] restricted to components accepted by `filter`.
pub fn hit_test_where(
    components: &[ComponentInstance],
    point: Point,
    tolerance: f64,
    filter: impl Fn(&ComponentInstance) -> bool,
) -> Option<&ComponentInstance> {
    components
        .iter()
        .enumerate()
        .filter(|(_, c)| filter(c) && c.contains_point(point, tolerance))
        .max_by_key(|(index, c)| (c.props.z_index, *index))
        .map(|(_, c)| c)
}

/// Axis-aligned union of the bounds of the given components.
pub fn union_bounds<'a>(components: impl IntoIterator<Item = &'a ComponentInstance>) -> Option<Rect> {
    components.into_iter().map(ComponentInstance::bounds).reduce(|a, b| a.union(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_component(id: &str, x: f64, y: f64, w: f64, h: f64) -> ComponentInstance {
        ComponentInstance::new(id, ComponentKind::Shape, Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_bounds_unrotated() {
        let c = rect_component("a", 100.0, 100.0, 50.0, 20.0);
        assert_eq!(c.bounds(), Rect::new(100.0, 100.0, 150.0, 120.0));
    }

    #[test]
    fn test_bounds_rotated_quarter_turn() {
        let c = rect_component("a", 0.0, 0.0, 100.0, 50.0).with_rotation(90.0);
        let bounds = c.bounds();
        // Center (50, 25); a quarter turn swaps the extents.
        assert!((bounds.x0 - 25.0).abs() < 1e-9);
        assert!((bounds.x1 - 75.0).abs() < 1e-9);
        assert!((bounds.y0 + 25.0).abs() < 1e-9);
        assert!((bounds.y1 - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_point_respects_rotation() {
        let c = rect_component("a", 0.0, 0.0, 100.0, 20.0).with_rotation(90.0);
        // Inside the unrotated box but outside the rotated one.
        assert!(!c.contains_point(Point::new(5.0, 10.0), 0.0));
        // Inside the rotated box (vertical strip through the center).
        assert!(c.contains_point(Point::new(50.0, -30.0), 0.0));
    }

    #[test]
    fn test_line_hit_uses_segment_distance() {
        let line = ComponentInstance::line("l", Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.contains_point(Point::new(50.0, 3.0), 5.0));
        assert!(!line.contains_point(Point::new(50.0, 30.0), 5.0));
    }

    #[test]
    fn test_hit_test_prefers_top_z_index() {
        let low = rect_component("low", 0.0, 0.0, 100.0, 100.0).with_z_index(5);
        let high = rect_component("high", 50.0, 50.0, 100.0, 100.0).with_z_index(1);
        let components = vec![low, high];

        let hit = hit_test(&components, Point::new(75.0, 75.0), 0.0).unwrap();
        assert_eq!(hit.id, "low");

        let hit = hit_test(&components, Point::new(140.0, 140.0), 0.0).unwrap();
        assert_eq!(hit.id, "high");

        assert!(hit_test(&components, Point::new(500.0, 500.0), 0.0).is_none());
    }

    #[test]
    fn test_hit_test_later_wins_on_tie() {
        let components = vec![
            rect_component("first", 0.0, 0.0, 100.0, 100.0),
            rect_component("second", 0.0, 0.0, 100.0, 100.0),
        ];
        assert_eq!(hit_test(&components, Point::new(10.0, 10.0), 0.0).unwrap().id, "second");
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut c = rect_component("a", 10.0, 20.0, 100.0, 50.0);
        c.apply_patch(&PropsPatch::position(Point::new(30.0, 40.0)));
        assert_eq!(c.props.position, Point::new(30.0, 40.0));
        assert_eq!(c.props.width, 100.0);
        assert_eq!(c.props.height, 50.0);
    }

    #[test]
    fn test_patch_merge_later_wins() {
        let mut patch = PropsPatch::position(Point::new(1.0, 1.0));
        patch.merge(&PropsPatch::rotation(45.0));
        patch.merge(&PropsPatch::position(Point::new(2.0, 3.0)));
        assert_eq!(patch.position, Some(Point::new(2.0, 3.0)));
        assert_eq!(patch.rotation, Some(45.0));
        assert!(patch.width.is_none());
    }

    #[test]
    fn test_patch_payload_shape() {
        let json = serde_json::to_value(PropsPatch::position(Point::new(5.0, 6.0))).unwrap();
        assert_eq!(json, serde_json::json!({ "position": { "x": 5.0, "y": 6.0 } }));
    }

    #[test]
    fn test_component_json_keeps_extra_fields() {
        let json = serde_json::json!({
            "id": "t1",
            "type": "TiptapTextBlock",
            "props": {
                "position": { "x": 10.0, "y": 20.0 },
                "width": 300.0,
                "height": 80.0,
                "texts": { "type": "doc" },
                "fontSize": 24
            }
        });
        let component: ComponentInstance = serde_json::from_value(json).unwrap();
        assert_eq!(component.kind, ComponentKind::TiptapTextBlock);
        assert_eq!(component.props.rotation, 0.0);
        assert_eq!(component.props.extra.get("fontSize"), Some(&serde_json::json!(24)));
        assert!(component.supports_text_editing());
    }

    #[test]
    fn test_kind_tag_roundtrip() {
        for kind in [ComponentKind::Lines, ComponentKind::Group, ComponentKind::CustomComponent] {
            assert_eq!(ComponentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ComponentKind::parse("Nope"), None);
    }

    #[test]
    fn test_point_to_segment_dist() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 4.0), a, b) - 4.0).abs() < 1e-9);
        assert!((point_to_segment_dist(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-9);
        assert!((point_to_segment_dist(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-9);
    }
}
