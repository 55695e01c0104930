//! Single-selection overlay: handles and the gestures they start.

use crate::components::{ComponentId, ComponentInstance, LineEnd, PropsPatch};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Distance from the top edge to the rotation handle (slide units).
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;

/// Right angles the rotation snaps to. 360 is reported as 0.
const ROTATION_SNAP_TARGETS: [f64; 5] = [0.0, 90.0, 180.0, 270.0, 360.0];

/// Resize handle position, named by compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeDirection {
    pub const ALL: [ResizeDirection; 8] = [
        ResizeDirection::NW,
        ResizeDirection::N,
        ResizeDirection::NE,
        ResizeDirection::E,
        ResizeDirection::SE,
        ResizeDirection::S,
        ResizeDirection::SW,
        ResizeDirection::W,
    ];

    /// Which way each axis grows when the handle moves outward.
    /// `0` means the axis is untouched.
    pub fn signs(self) -> (f64, f64) {
        match self {
            ResizeDirection::N => (0.0, -1.0),
            ResizeDirection::S => (0.0, 1.0),
            ResizeDirection::E => (1.0, 0.0),
            ResizeDirection::W => (-1.0, 0.0),
            ResizeDirection::NE => (1.0, -1.0),
            ResizeDirection::NW => (-1.0, -1.0),
            ResizeDirection::SE => (1.0, 1.0),
            ResizeDirection::SW => (-1.0, 1.0),
        }
    }

    pub fn is_corner(self) -> bool {
        let (sx, sy) = self.signs();
        sx != 0.0 && sy != 0.0
    }

    /// Handle offset from the box center in the unrotated frame.
    pub fn local_offset(self, width: f64, height: f64) -> Vec2 {
        let (sx, sy) = self.signs();
        Vec2::new(sx * width / 2.0, sy * height / 2.0)
    }

    /// The handle on the other side of the box.
    pub fn opposite(self) -> Self {
        match self {
            ResizeDirection::N => ResizeDirection::S,
            ResizeDirection::S => ResizeDirection::N,
            ResizeDirection::E => ResizeDirection::W,
            ResizeDirection::W => ResizeDirection::E,
            ResizeDirection::NE => ResizeDirection::SW,
            ResizeDirection::NW => ResizeDirection::SE,
            ResizeDirection::SE => ResizeDirection::NW,
            ResizeDirection::SW => ResizeDirection::NE,
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Resize(ResizeDirection),
    /// Rotation handle (above the top edge).
    Rotate,
    /// Endpoint of a `Lines` component.
    LineEndpoint(LineEnd),
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in slide coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in slide coordinates) hits this handle.
    /// `tolerance` should already be divided by the viewport scale.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Get the selection handles for a component.
///
/// Groups and background components are move-only and get no handles.
/// Lines get one handle per endpoint. Everything else gets eight resize
/// handles on the rotated frame plus a rotation handle.
pub fn handles(component: &ComponentInstance) -> Vec<Handle> {
    if let Some(lines) = component.line_props() {
        return vec![
            Handle::new(lines.start_point.point(), HandleKind::LineEndpoint(LineEnd::Start)),
            Handle::new(lines.end_point.point(), HandleKind::LineEndpoint(LineEnd::End)),
        ];
    }
    if component.is_group() || component.is_background() {
        return Vec::new();
    }

    let (w, h) = (component.props.width, component.props.height);
    let mut handles: Vec<Handle> = ResizeDirection::ALL
        .iter()
        .map(|&dir| {
            Handle::new(
                component.local_to_slide(dir.local_offset(w, h)),
                HandleKind::Resize(dir),
            )
        })
        .collect();
    handles.push(Handle::new(
        component.local_to_slide(Vec2::new(0.0, -h / 2.0 - ROTATE_HANDLE_OFFSET)),
        HandleKind::Rotate,
    ));
    handles
}

/// Find the handle closest to `point` within `tolerance`.
pub fn hit_test_handles(component: &ComponentInstance, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles(component)
        .into_iter()
        .filter(|handle| handle.hit_test(point, tolerance))
        .min_by(|a, b| {
            (point - a.position)
                .hypot2()
                .total_cmp(&(point - b.position).hypot2())
        })
        .map(|handle| handle.kind)
}

/// Normalize an angle in degrees into [0, 360).
pub fn normalize_rotation(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Snap to the nearest right angle when within `threshold` degrees.
pub fn snap_rotation(degrees: f64, threshold: f64) -> f64 {
    for target in ROTATION_SNAP_TARGETS {
        if (degrees - target).abs() <= threshold {
            return target % 360.0;
        }
    }
    degrees
}

/// Rotate `v` by `degrees` (clockwise on screen).
fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// State of an active resize.
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    pub component_id: ComponentId,
    pub direction: ResizeDirection,
    start_screen: Point,
    /// Screen pixels per slide unit when the gesture began.
    pixel_ratio: f64,
    start_position: Point,
    start_width: f64,
    start_height: f64,
    rotation: f64,
    last: Option<PropsPatch>,
}

impl ResizeGesture {
    /// Record the starting geometry of `component` under the cursor.
    pub fn begin(
        component: &ComponentInstance,
        direction: ResizeDirection,
        cursor_screen: Point,
        viewport: &Viewport,
    ) -> Self {
        Self {
            component_id: component.id.clone(),
            direction,
            start_screen: cursor_screen,
            pixel_ratio: viewport.scale(),
            start_position: component.props.position,
            start_width: component.props.width,
            start_height: component.props.height,
            rotation: component.props.rotation,
            last: None,
        }
    }

    /// Compute the new box for the current cursor.
    ///
    /// The corner (or edge) opposite the dragged handle keeps its absolute
    /// position, including for rotated components. Each axis is clamped to
    /// `min_size`. With `keep_aspect_ratio`, corner handles preserve the
    /// starting width/height ratio.
    pub fn update(&mut self, cursor_screen: Point, keep_aspect_ratio: bool, min_size: f64) -> PropsPatch {
        let delta = (cursor_screen - self.start_screen) / self.pixel_ratio;
        let local = rotate_vec(delta, -self.rotation);
        let (sx, sy) = self.direction.signs();
        let (w, h) = (self.start_width, self.start_height);

        let mut new_w = if sx != 0.0 { (w + sx * local.x).max(min_size) } else { w };
        let mut new_h = if sy != 0.0 { (h + sy * local.y).max(min_size) } else { h };

        if keep_aspect_ratio && self.direction.is_corner() && w > 0.0 && h > 0.0 {
            let ratio = w / h;
            if (new_w / w - 1.0).abs() >= (new_h / h - 1.0).abs() {
                new_h = new_w / ratio;
            } else {
                new_w = new_h * ratio;
            }
            if new_w < min_size {
                new_w = min_size;
                new_h = min_size / ratio;
            }
            if new_h < min_size {
                new_h = min_size;
                new_w = min_size * ratio;
            }
        }

        // Pin the opposite corner: anchor in the local frame, then back to slide space.
        let start_center = self.start_position + Vec2::new(w / 2.0, h / 2.0);
        let anchor = start_center + rotate_vec(Vec2::new(-sx * w / 2.0, -sy * h / 2.0), self.rotation);
        let new_center = anchor - rotate_vec(Vec2::new(-sx * new_w / 2.0, -sy * new_h / 2.0), self.rotation);
        let position = new_center - Vec2::new(new_w / 2.0, new_h / 2.0);

        let patch = PropsPatch {
            position: Some(position),
            width: Some(new_w),
            height: Some(new_h),
            ..PropsPatch::default()
        };
        self.last = Some(patch.clone());
        patch
    }

    /// End the gesture. Returns the final geometry, or `None` if the
    /// pointer never moved.
    pub fn finish(self) -> Option<PropsPatch> {
        self.last
    }
}

/// State of an active rotation.
#[derive(Debug, Clone)]
pub struct RotateGesture {
    pub component_id: ComponentId,
    center: Point,
    start_rotation: f64,
    start_angle: f64,
    last: Option<f64>,
}

impl RotateGesture {
    /// `cursor` is in slide coordinates.
    pub fn begin(component: &ComponentInstance, cursor: Point) -> Self {
        let center = component.center();
        let offset = cursor - center;
        Self {
            component_id: component.id.clone(),
            center,
            start_rotation: component.props.rotation,
            start_angle: offset.y.atan2(offset.x),
            last: None,
        }
    }

    /// New rotation in degrees, in [0, 360), snapped within `threshold`.
    pub fn update(&mut self, cursor: Point, threshold: f64) -> f64 {
        let offset = cursor - self.center;
        let angle = offset.y.atan2(offset.x);
        let raw = normalize_rotation(self.start_rotation + (angle - self.start_angle).to_degrees());
        let rotation = snap_rotation(raw, threshold);
        self.last = Some(rotation);
        rotation
    }

    pub fn finish(self) -> Option<f64> {
        self.last
    }
}

/// Result of a move update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveUpdate {
    /// New top-left position.
    pub position: Point,
    /// Offset from the start position, for transient visual feedback.
    pub visual_offset: Vec2,
}

/// State of a single-component drag.
#[derive(Debug, Clone)]
pub struct MoveGesture {
    pub component_id: ComponentId,
    start_position: Point,
    start_cursor: Point,
    last: Option<MoveUpdate>,
}

impl MoveGesture {
    /// `cursor` is in slide coordinates.
    pub fn begin(component: &ComponentInstance, cursor: Point) -> Self {
        Self {
            component_id: component.id.clone(),
            start_position: component.props.position,
            start_cursor: cursor,
            last: None,
        }
    }

    pub fn start_position(&self) -> Point {
        self.start_position
    }

    pub fn update(&mut self, cursor: Point) -> MoveUpdate {
        let visual_offset = cursor - self.start_cursor;
        let update = MoveUpdate {
            position: self.start_position + visual_offset,
            visual_offset,
        };
        self.last = Some(update);
        update
    }

    pub fn finish(self) -> Option<MoveUpdate> {
        self.last
    }
}
