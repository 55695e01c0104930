//! Multi-selection bounding box and group drag.

use crate::components::{ComponentId, ComponentInstance, LineEndpoint, PropsPatch, union_bounds};
use kurbo::{Point, Rect, Vec2};

/// Bounding box of the selected components.
///
/// Returns `None` unless at least two of `ids` resolve to components; a
/// single selection uses the per-component overlay instead.
pub fn selection_bounds(components: &[ComponentInstance], ids: &[ComponentId]) -> Option<Rect> {
    let selected: Vec<&ComponentInstance> = components.iter().filter(|c| ids.contains(&c.id)).collect();
    if selected.len() < 2 {
        return None;
    }
    union_bounds(selected)
}

/// `ids` plus the members of any group among them, recursively.
///
/// Order is preserved and every id appears once.
pub fn expand_group_members(components: &[ComponentInstance], ids: &[ComponentId]) -> Vec<ComponentId> {
    let mut result: Vec<ComponentId> = Vec::new();
    let mut pending: Vec<ComponentId> = ids.iter().rev().cloned().collect();

    while let Some(id) = pending.pop() {
        if result.contains(&id) {
            continue;
        }
        if let Some(component) = components.iter().find(|c| c.id == id) {
            if component.is_group() {
                pending.extend(component.props.children.iter().rev().cloned());
            }
        }
        result.push(id);
    }
    result
}

/// Starting geometry of one dragged member.
#[derive(Debug, Clone)]
struct MemberStart {
    id: ComponentId,
    position: Point,
    /// Line endpoints move with the line.
    line: Option<(LineEndpoint, LineEndpoint)>,
}

/// State for dragging several components at once.
///
/// Every update is computed from the start positions and the total cursor
/// delta, so replaying or duplicating an update can never apply the same
/// delta twice.
#[derive(Debug, Clone)]
pub struct GroupDrag {
    start_cursor: Point,
    members: Vec<MemberStart>,
    delta: Vec2,
}

impl GroupDrag {
    /// Capture the start position of every selected component (and group
    /// member). Ids that do not resolve are skipped.
    pub fn begin(components: &[ComponentInstance], ids: &[ComponentId], cursor: Point) -> Self {
        let members = expand_group_members(components, ids)
            .into_iter()
            .filter_map(|id| {
                let component = components.iter().find(|c| c.id == id)?;
                Some(MemberStart {
                    position: component.props.position,
                    line: component
                        .line_props()
                        .map(|l| (l.start_point.clone(), l.end_point.clone())),
                    id,
                })
            })
            .collect();
        Self {
            start_cursor: cursor,
            members,
            delta: Vec2::ZERO,
        }
    }

    pub fn member_ids(&self) -> Vec<ComponentId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Total delta of the last update.
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Absolute props for every member at the given cursor.
    pub fn update(&mut self, cursor: Point) -> Vec<(ComponentId, PropsPatch)> {
        self.delta = cursor - self.start_cursor;
        self.patches()
    }

    /// Props for the current delta without moving the cursor.
    pub fn patches(&self) -> Vec<(ComponentId, PropsPatch)> {
        self.members
            .iter()
            .map(|member| {
                let mut patch = PropsPatch::position(member.position + self.delta);
                if let Some((start, end)) = &member.line {
                    patch.start_point = Some(start.translated(self.delta));
                    patch.end_point = Some(end.translated(self.delta));
                }
                (member.id.clone(), patch)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use kurbo::Size;

    fn square(id: &str, x: f64, y: f64) -> ComponentInstance {
        ComponentInstance::new(id, ComponentKind::Shape, Point::new(x, y), Size::new(50.0, 50.0))
    }

    fn ids(list: &[&str]) -> Vec<ComponentId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selection_bounds_example() {
        let components = vec![square("a", 100.0, 100.0), square("b", 300.0, 300.0)];
        let bounds = selection_bounds(&components, &ids(&["a", "b"])).unwrap();
        assert_eq!(bounds.origin(), Point::new(100.0, 100.0));
        assert_eq!(bounds.width(), 250.0);
        assert_eq!(bounds.height(), 250.0);
    }

    #[test]
    fn test_selection_bounds_needs_two() {
        let components = vec![square("a", 100.0, 100.0), square("b", 300.0, 300.0)];
        assert!(selection_bounds(&components, &ids(&["a"])).is_none());
        assert!(selection_bounds(&components, &ids(&["a", "missing"])).is_none());
        assert!(selection_bounds(&components, &[]).is_none());
    }

    #[test]
    fn test_group_drag_applies_delta_once() {
        let components = vec![square("a", 100.0, 100.0), square("b", 300.0, 300.0)];
        let mut drag = GroupDrag::begin(&components, &ids(&["a", "b"]), Point::new(200.0, 200.0));

        drag.update(Point::new(210.0, 205.0));
        drag.update(Point::new(220.0, 210.0));
        let patches = drag.update(Point::new(230.0, 215.0));

        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].0, "a");
        assert_eq!(patches[0].1.position, Some(Point::new(130.0, 115.0)));
        assert_eq!(patches[1].1.position, Some(Point::new(330.0, 315.0)));
        assert_eq!(drag.delta(), Vec2::new(30.0, 15.0));
        // Re-reading the same state does not move anything further.
        assert_eq!(drag.patches(), patches);
    }

    #[test]
    fn test_group_drag_moves_children_and_lines() {
        let mut components = vec![
            square("a", 0.0, 0.0),
            square("b", 100.0, 0.0),
            ComponentInstance::line("l", Point::new(0.0, 200.0), Point::new(100.0, 200.0)),
        ];
        components.push(ComponentInstance::group(
            "g",
            Rect::new(0.0, 0.0, 150.0, 50.0),
            ids(&["a", "b"]),
        ));

        let mut drag = GroupDrag::begin(&components, &ids(&["g", "l"]), Point::ZERO);
        assert_eq!(drag.member_ids(), ids(&["g", "a", "b", "l"]));

        let patches = drag.update(Point::new(10.0, 10.0));
        let line_patch = &patches.iter().find(|(id, _)| id == "l").unwrap().1;
        assert_eq!(line_patch.start_point.as_ref().unwrap().point(), Point::new(10.0, 210.0));
        assert_eq!(line_patch.end_point.as_ref().unwrap().point(), Point::new(110.0, 210.0));
    }

    #[test]
    fn test_expand_group_members_nested() {
        let components = vec![
            square("a", 0.0, 0.0),
            ComponentInstance::group("inner", Rect::ZERO, ids(&["a"])),
            ComponentInstance::group("outer", Rect::ZERO, ids(&["inner", "a"])),
        ];
        assert_eq!(
            expand_group_members(&components, &ids(&["outer"])),
            ids(&["outer", "inner", "a"])
        );
    }
}
