//! Endpoint data for `Lines` components.

use super::ComponentId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Anchor location on a component's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Top,
    Right,
    Bottom,
    Left,
    Center,
}

impl AnchorSide {
    pub const ALL: [AnchorSide; 5] = [
        AnchorSide::Top,
        AnchorSide::Right,
        AnchorSide::Bottom,
        AnchorSide::Left,
        AnchorSide::Center,
    ];

    /// Offset from the box center in the unrotated frame.
    pub fn local_offset(self, width: f64, height: f64) -> Vec2 {
        match self {
            AnchorSide::Top => Vec2::new(0.0, -height / 2.0),
            AnchorSide::Right => Vec2::new(width / 2.0, 0.0),
            AnchorSide::Bottom => Vec2::new(0.0, height / 2.0),
            AnchorSide::Left => Vec2::new(-width / 2.0, 0.0),
            AnchorSide::Center => Vec2::ZERO,
        }
    }
}

/// Attachment of a line endpoint to another component's anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub component_id: ComponentId,
    pub side: AnchorSide,
}

/// One end of a line, in absolute slide units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEndpoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

impl LineEndpoint {
    pub fn free(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            connection: None,
        }
    }

    pub fn connected(point: Point, connection: Connection) -> Self {
        Self {
            x: point.x,
            y: point.y,
            connection: Some(connection),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same endpoint moved by `delta`, connection kept.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            connection: self.connection.clone(),
        }
    }
}

/// Which end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEnd {
    Start,
    End,
}

/// Props of a `Lines` component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinesProps {
    pub start_point: LineEndpoint,
    pub end_point: LineEndpoint,
}

impl LinesProps {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start_point: LineEndpoint::free(start),
            end_point: LineEndpoint::free(end),
        }
    }

    pub fn endpoint(&self, end: LineEnd) -> &LineEndpoint {
        match end {
            LineEnd::Start => &self.start_point,
            LineEnd::End => &self.end_point,
        }
    }

    pub fn endpoint_mut(&mut self, end: LineEnd) -> &mut LineEndpoint {
        match end {
            LineEnd::Start => &mut self.start_point,
            LineEnd::End => &mut self.end_point,
        }
    }

    /// Bounding box of the two endpoints.
    pub fn bounding_rect(&self) -> Rect {
        Rect::from_points(self.start_point.point(), self.end_point.point())
    }
}
