//! Line endpoint drag and anchor snapping.

use crate::components::{
    AnchorSide, ComponentId, ComponentInstance, Connection, LineEnd, LineEndpoint, LinesProps, PropsPatch,
};
use kurbo::{Point, Rect};

/// A point a line endpoint can attach to.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapAnchor {
    pub component_id: ComponentId,
    pub side: AnchorSide,
    /// Position in slide coordinates.
    pub point: Point,
}

/// Position of one anchor on a (possibly rotated) component.
pub fn anchor_point(component: &ComponentInstance, side: AnchorSide) -> Point {
    component.local_to_slide(side.local_offset(component.props.width, component.props.height))
}

/// Side midpoints and center of a component.
pub fn anchor_points(component: &ComponentInstance) -> Vec<SnapAnchor> {
    AnchorSide::ALL
        .iter()
        .map(|&side| SnapAnchor {
            component_id: component.id.clone(),
            side,
            point: anchor_point(component, side),
        })
        .collect()
}

fn accepts_connections(component: &ComponentInstance) -> bool {
    !component.is_line() && !component.is_background()
}

/// Find the nearest anchor strictly within `tolerance` of `point`.
///
/// Lines, background components and `exclude` are never snap targets.
pub fn find_snap_anchor(
    point: Point,
    components: &[ComponentInstance],
    exclude: &str,
    tolerance: f64,
) -> Option<SnapAnchor> {
    let mut best: Option<SnapAnchor> = None;
    let mut best_dist_sq = tolerance * tolerance;

    for component in components {
        if component.id == exclude || !accepts_connections(component) {
            continue;
        }
        for anchor in anchor_points(component) {
            let dist_sq = (point - anchor.point).hypot2();
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best = Some(anchor);
            }
        }
    }
    best
}

/// Resolve where a connection currently points, if its target still exists.
fn connected_anchor(connection: &Connection, components: &[ComponentInstance]) -> Option<Point> {
    components
        .iter()
        .find(|c| c.id == connection.component_id)
        .map(|c| anchor_point(c, connection.side))
}

/// Patch that rewrites both endpoints and the bounding box of a line.
fn line_patch(lines: &LinesProps) -> PropsPatch {
    let bounds: Rect = lines.bounding_rect();
    PropsPatch {
        position: Some(bounds.origin()),
        width: Some(bounds.width()),
        height: Some(bounds.height()),
        start_point: Some(lines.start_point.clone()),
        end_point: Some(lines.end_point.clone()),
        ..PropsPatch::default()
    }
}

/// What part of the line is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDragMode {
    Endpoint(LineEnd),
    /// Translate both endpoints, keeping their connections.
    WholeLine,
}

/// State of an active line drag.
#[derive(Debug, Clone)]
pub struct LineDrag {
    pub line_id: ComponentId,
    pub mode: LineDragMode,
    start_cursor: Point,
    start: LinesProps,
    last: Option<PropsPatch>,
}

impl LineDrag {
    /// Start dragging `line`. Returns `None` if it is not a `Lines` component.
    pub fn begin(line: &ComponentInstance, mode: LineDragMode, cursor: Point) -> Option<Self> {
        let start = line.line_props()?.clone();
        Some(Self {
            line_id: line.id.clone(),
            mode,
            start_cursor: cursor,
            start,
            last: None,
        })
    }

    /// Compute the line's new endpoints for the cursor (slide coordinates).
    ///
    /// A dragged endpoint lands on the nearest anchor when `snapping` finds
    /// one and records the connection. Otherwise it follows the cursor and
    /// keeps its previous connection only while the cursor is still within
    /// `tolerance` of that anchor.
    pub fn update(
        &mut self,
        cursor: Point,
        components: &[ComponentInstance],
        snapping: bool,
        tolerance: f64,
    ) -> PropsPatch {
        let mut lines = self.start.clone();
        match self.mode {
            LineDragMode::Endpoint(end) => {
                let snapped = if snapping {
                    find_snap_anchor(cursor, components, &self.line_id, tolerance)
                } else {
                    None
                };
                let endpoint = match snapped {
                    Some(anchor) => LineEndpoint::connected(
                        anchor.point,
                        Connection {
                            component_id: anchor.component_id,
                            side: anchor.side,
                        },
                    ),
                    None => {
                        let kept = self.start.endpoint(end).connection.clone().filter(|connection| {
                            connected_anchor(connection, components)
                                .is_some_and(|anchor| (cursor - anchor).hypot() <= tolerance)
                        });
                        LineEndpoint {
                            x: cursor.x,
                            y: cursor.y,
                            connection: kept,
                        }
                    }
                };
                *lines.endpoint_mut(end) = endpoint;
            }
            LineDragMode::WholeLine => {
                let delta = cursor - self.start_cursor;
                lines.start_point = self.start.start_point.translated(delta);
                lines.end_point = self.start.end_point.translated(delta);
            }
        }

        let patch = line_patch(&lines);
        self.last = Some(patch.clone());
        patch
    }

    pub fn finish(self) -> Option<PropsPatch> {
        self.last
    }
}

/// Re-attach lines whose endpoints are connected to moved components.
///
/// `components` is the state after the move. Lines that are themselves in
/// `moved` are skipped; they were translated with everything else.
pub fn reroute_connected_lines(
    components: &[ComponentInstance],
    moved: &[ComponentId],
) -> Vec<(ComponentId, PropsPatch)> {
    let mut patches = Vec::new();
    for line in components.iter().filter(|c| c.is_line() && !moved.contains(&c.id)) {
        let Some(start) = line.line_props() else {
            continue;
        };
        let mut lines = start.clone();
        let mut changed = false;

        for end in [LineEnd::Start, LineEnd::End] {
            let endpoint = lines.endpoint_mut(end);
            let Some(connection) = endpoint.connection.as_ref() else {
                continue;
            };
            if !moved.contains(&connection.component_id) {
                continue;
            }
            if let Some(anchor) = connected_anchor(connection, components) {
                if anchor != endpoint.point() {
                    endpoint.x = anchor.x;
                    endpoint.y = anchor.y;
                    changed = true;
                }
            }
        }

        if changed {
            patches.push((line.id.clone(), line_patch(&lines)));
        }
    }
    patches
}
