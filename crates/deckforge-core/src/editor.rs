//! Pointer and keyboard pipeline.
//!
//! The [`Editor`] ties the gesture state machines to the store. A gesture
//! opens a transient edit on press, applies every move to the draft and
//! fans out events, then commits once on release.

use crate::collab::CollabAdapter;
use crate::components::{ComponentId, ComponentInstance, PropsPatch, SlideId, hit_test_where};
use crate::config::EditorConfig;
use crate::connectors::{LineDrag, LineDragMode, reroute_connected_lines};
use crate::error::EditorResult;
use crate::events::{EditorEvent, EventBus, Subscription};
use crate::input::{KeyEvent, Modifiers};
use crate::interaction::{ClickOutcome, DoubleClickOutcome, SelectionInteraction};
use crate::keyboard::{ShortcutAction, resolve_shortcut};
use crate::multi_selection::{GroupDrag, selection_bounds};
use crate::selection::{HandleKind, MoveGesture, ResizeGesture, RotateGesture, hit_test_handles};
use crate::slide::Slide;
use crate::store::EditorStore;
use crate::viewport::Viewport;
use kurbo::Point;

/// What lies under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    /// A handle of the single selected component.
    Handle {
        component_id: ComponentId,
        kind: HandleKind,
    },
    /// Inside the multi-selection bounding box.
    SelectionBox,
    Component(ComponentId),
    Background,
}

/// The gesture in progress, if any.
#[derive(Debug, Clone)]
enum ActiveGesture {
    Move(MoveGesture),
    GroupDrag(GroupDrag),
    Resize(ResizeGesture),
    Rotate(RotateGesture),
    Line(LineDrag),
}

/// Direct-manipulation editor for one deck view.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    store: EditorStore,
    events: EventBus,
    viewport: Option<Viewport>,
    current_slide: Option<SlideId>,
    interaction: SelectionInteraction,
    gesture: Option<ActiveGesture>,
    /// Whether the pointer moved since the gesture began.
    pointer_moved: bool,
    editing: bool,
}

impl Editor {
    /// Create an editor. The configuration is validated first.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self {
            store: EditorStore::new(&config),
            config,
            events: EventBus::new(),
            viewport: None,
            current_slide: None,
            interaction: SelectionInteraction::new(),
            gesture: None,
            pointer_moved: false,
            editing: true,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditorStore {
        &mut self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Register an event listener for as long as the guard lives.
    pub fn subscribe(&self, listener: impl Fn(&EditorEvent) + 'static) -> Subscription {
        self.events.subscribe(listener)
    }

    /// Install the outbound collaboration adapter. Slides already loaded
    /// are mirrored into it.
    pub fn set_collab_adapter(&mut self, adapter: impl CollabAdapter + 'static) {
        self.store.set_collab_adapter(adapter);
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Set or clear the on-screen slide rectangle. Losing it cancels any
    /// gesture in progress.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        if viewport.is_none() {
            self.cancel_gesture();
        }
        self.viewport = viewport;
    }

    /// Load a slide's components into the store and make it current.
    pub fn load_slide(&mut self, slide: &Slide) {
        self.store.set_draft_components(&slide.id, slide.components.clone());
        self.set_current_slide(Some(slide.id.clone()));
    }

    /// Switch slides. Selection and group edit do not carry over.
    pub fn set_current_slide(&mut self, slide_id: Option<SlideId>) {
        if self.current_slide == slide_id {
            return;
        }
        self.cancel_gesture();
        self.store.clear_selection();
        self.store.set_editing_group_id(None);
        self.interaction.reset();
        self.current_slide = slide_id;
    }

    pub fn current_slide(&self) -> Option<&str> {
        self.current_slide.as_deref()
    }

    /// Toggle between editing and presenting. Leaving edit mode drops the
    /// gesture and text editing.
    pub fn set_editing(&mut self, editing: bool) {
        if !editing {
            self.cancel_gesture();
            self.store.set_text_editing(false);
        }
        self.editing = editing;
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Viewport and slide, or `None` (logged) when either is missing.
    fn context(&self) -> Option<(Viewport, SlideId)> {
        let Some(viewport) = self.viewport else {
            log::debug!("No viewport, ignoring pointer input");
            return None;
        };
        let Some(slide_id) = self.current_slide.clone() else {
            log::debug!("No current slide, ignoring pointer input");
            return None;
        };
        Some((viewport, slide_id))
    }

    /// Hit tolerance in slide units.
    fn hit_tolerance(&self, viewport: &Viewport) -> f64 {
        self.config.handle_hit_tolerance / viewport.scale()
    }

    /// Topmost leaf component under a slide point.
    ///
    /// Groups cover their members, so they are skipped here; callers map
    /// the leaf to its group with [`SelectionInteraction::resolve_target`].
    fn leaf_at(&self, slide_id: &str, point: Point, tolerance: f64) -> Option<&ComponentInstance> {
        let components = self.store.draft_components(slide_id)?;
        hit_test_where(components, point, tolerance, |c| !c.is_group() && !c.is_background())
    }

    /// Resolve what is under a screen point.
    ///
    /// Handles of a single selection win, then the multi-selection box,
    /// then components from the top down.
    pub fn target_at(&self, screen: Point) -> PointerTarget {
        let Some((viewport, slide_id)) = self.context() else {
            return PointerTarget::Background;
        };
        let Some(components) = self.store.draft_components(&slide_id) else {
            return PointerTarget::Background;
        };
        let point = viewport.screen_to_slide(screen);
        let tolerance = self.hit_tolerance(&viewport);
        let selected = self.store.selected_ids();

        if let [only] = selected {
            if let Some(component) = self.store.component(&slide_id, only) {
                if let Some(kind) = hit_test_handles(component, point, tolerance) {
                    return PointerTarget::Handle {
                        component_id: only.clone(),
                        kind,
                    };
                }
            }
        }

        let hit = self.leaf_at(&slide_id, point, tolerance);

        if let Some(bounds) = selection_bounds(components, selected) {
            let on_selected = hit.is_some_and(|c| {
                let target = SelectionInteraction::resolve_target(&self.store, &slide_id, &c.id);
                self.store.is_component_selected(&target)
            });
            if on_selected || (hit.is_none() && bounds.contains(point)) {
                return PointerTarget::SelectionBox;
            }
        }

        match hit {
            Some(component) => PointerTarget::Component(component.id.clone()),
            None => PointerTarget::Background,
        }
    }

    // --- Pointer gestures ---

    /// Begin a gesture on `target`. Returns whether one started.
    pub fn pointer_down(&mut self, screen: Point, target: &PointerTarget) -> EditorResult<bool> {
        // A press means the click that would have followed the last drag
        // is not coming.
        self.interaction.reset();
        if self.gesture.is_some() {
            log::debug!("Pointer down during an active gesture, ignoring");
            return Ok(false);
        }
        if !self.editing || self.store.is_text_editing() {
            return Ok(false);
        }
        let Some((viewport, slide_id)) = self.context() else {
            return Ok(false);
        };
        let point = viewport.screen_to_slide(screen);

        let Some(gesture) = self.gesture_for(target, &slide_id, screen, point, &viewport) else {
            log::debug!("No gesture for target {:?}", target);
            return Ok(false);
        };

        self.store.begin_transient_edit(&slide_id)?;
        match &gesture {
            ActiveGesture::Move(g) => self.events.emit(&EditorEvent::DragStart {
                component_id: g.component_id.clone(),
            }),
            ActiveGesture::GroupDrag(g) => self.events.emit(&EditorEvent::SelectionDragStart {
                component_ids: g.member_ids(),
            }),
            ActiveGesture::Line(g) if g.mode == LineDragMode::WholeLine => {
                self.events.emit(&EditorEvent::DragStart {
                    component_id: g.line_id.clone(),
                })
            }
            _ => {}
        }
        self.gesture = Some(gesture);
        self.pointer_moved = false;
        Ok(true)
    }

    fn gesture_for(
        &self,
        target: &PointerTarget,
        slide_id: &str,
        screen: Point,
        point: Point,
        viewport: &Viewport,
    ) -> Option<ActiveGesture> {
        let components = self.store.draft_components(slide_id)?;
        match target {
            PointerTarget::Handle { component_id, kind } => {
                let component = self.store.component(slide_id, component_id)?;
                Some(match *kind {
                    HandleKind::Resize(direction) => {
                        ActiveGesture::Resize(ResizeGesture::begin(component, direction, screen, viewport))
                    }
                    HandleKind::Rotate => ActiveGesture::Rotate(RotateGesture::begin(component, point)),
                    HandleKind::LineEndpoint(end) => {
                        ActiveGesture::Line(LineDrag::begin(component, LineDragMode::Endpoint(end), point)?)
                    }
                })
            }
            PointerTarget::SelectionBox => {
                let drag = GroupDrag::begin(components, self.store.selected_ids(), point);
                (!drag.is_empty()).then_some(ActiveGesture::GroupDrag(drag))
            }
            PointerTarget::Component(id) => {
                let target = SelectionInteraction::resolve_target(&self.store, slide_id, id);
                let component = self.store.component(slide_id, &target)?;
                if component.is_background() {
                    return None;
                }
                if component.is_group() {
                    let drag = GroupDrag::begin(components, std::slice::from_ref(&target), point);
                    return (!drag.is_empty()).then_some(ActiveGesture::GroupDrag(drag));
                }
                if component.is_line() {
                    return LineDrag::begin(component, LineDragMode::WholeLine, point).map(ActiveGesture::Line);
                }
                Some(ActiveGesture::Move(MoveGesture::begin(component, point)))
            }
            PointerTarget::Background => None,
        }
    }

    /// Advance the active gesture. Returns whether anything was applied.
    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        let Some((viewport, slide_id)) = self.context() else {
            return false;
        };
        let point = viewport.screen_to_slide(screen);
        self.pointer_moved = true;

        let (updates, event) = match self.gesture.as_mut() {
            Some(ActiveGesture::Move(g)) => {
                let update = g.update(point);
                let id = g.component_id.clone();
                (
                    vec![(id.clone(), PropsPatch::position(update.position))],
                    EditorEvent::PositionUpdated {
                        component_id: id,
                        position: update.position,
                    },
                )
            }
            Some(ActiveGesture::GroupDrag(g)) => {
                let updates = g.update(point);
                (updates, EditorEvent::SelectionDragMove { delta: g.delta() })
            }
            Some(ActiveGesture::Resize(g)) => {
                let patch = g.update(screen, modifiers.shift, self.config.min_component_size);
                let event = EditorEvent::Resize {
                    component_id: g.component_id.clone(),
                    position: patch.position.unwrap_or_default(),
                    width: patch.width.unwrap_or_default(),
                    height: patch.height.unwrap_or_default(),
                };
                (vec![(g.component_id.clone(), patch)], event)
            }
            Some(ActiveGesture::Rotate(g)) => {
                let rotation = g.update(point, self.config.rotation_snap_threshold);
                let id = g.component_id.clone();
                (
                    vec![(id.clone(), PropsPatch::rotation(rotation))],
                    EditorEvent::Rotate {
                        component_id: id,
                        rotation,
                    },
                )
            }
            Some(ActiveGesture::Line(g)) => {
                let Some(components) = self.store.draft_components(&slide_id) else {
                    return false;
                };
                let patch = g.update(
                    point,
                    components,
                    self.config.snapping_enabled,
                    self.config.line_snap_tolerance,
                );
                let position = patch.position.unwrap_or_default();
                (
                    vec![(g.line_id.clone(), patch)],
                    EditorEvent::PositionUpdated {
                        component_id: g.line_id.clone(),
                        position,
                    },
                )
            }
            None => return false,
        };

        let moved: Vec<ComponentId> = updates.iter().map(|(id, _)| id.clone()).collect();
        for (id, patch) in &updates {
            if let Err(e) = self.store.update_component(&slide_id, id, patch) {
                log::warn!("Gesture update on {} failed: {}", id, e);
            }
        }
        self.reroute_lines(&slide_id, &moved);
        self.events.emit(&event);
        true
    }

    /// Lines attached to moved components follow their anchors.
    fn reroute_lines(&mut self, slide_id: &str, moved: &[ComponentId]) {
        let patches = match self.store.draft_components(slide_id) {
            Some(components) => reroute_connected_lines(components, moved),
            None => return,
        };
        for (id, patch) in &patches {
            if let Err(e) = self.store.update_component(slide_id, id, patch) {
                log::warn!("Rerouting line {} failed: {}", id, e);
            }
        }
    }

    /// Finish the active gesture: emit the end event and commit once.
    ///
    /// Returns whether a history entry was recorded. A gesture in which the
    /// pointer moved arms the just-dragged guard so the trailing click does
    /// not change the selection.
    pub fn pointer_up(&mut self) -> EditorResult<bool> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(false);
        };
        let moved = std::mem::take(&mut self.pointer_moved);

        let committed = self.store.commit_edit()?;

        match gesture {
            ActiveGesture::Move(g) => {
                let id = g.component_id.clone();
                if let Some(update) = g.finish() {
                    self.events.emit(&EditorEvent::DragEnd {
                        component_id: id,
                        position: update.position,
                    });
                }
            }
            ActiveGesture::GroupDrag(g) => {
                self.events.emit(&EditorEvent::SelectionDragEnd { delta: g.delta() });
            }
            ActiveGesture::Resize(g) => {
                let id = g.component_id.clone();
                if let Some(patch) = g.finish() {
                    self.events.emit(&EditorEvent::ResizeEnd {
                        component_id: id,
                        position: patch.position.unwrap_or_default(),
                        width: patch.width.unwrap_or_default(),
                        height: patch.height.unwrap_or_default(),
                    });
                }
            }
            ActiveGesture::Rotate(g) => {
                let id = g.component_id.clone();
                if let Some(rotation) = g.finish() {
                    self.events.emit(&EditorEvent::RotateEnd {
                        component_id: id,
                        rotation,
                    });
                }
            }
            ActiveGesture::Line(g) => {
                let id = g.line_id.clone();
                if g.mode == LineDragMode::WholeLine {
                    if let Some(patch) = g.finish() {
                        self.events.emit(&EditorEvent::DragEnd {
                            component_id: id,
                            position: patch.position.unwrap_or_default(),
                        });
                    }
                }
            }
        }

        if moved {
            self.interaction.mark_dragged();
        }
        Ok(committed)
    }

    /// Abort the active gesture and restore the draft. Returns whether a
    /// gesture was active.
    pub fn cancel_gesture(&mut self) -> bool {
        if self.gesture.take().is_none() {
            return false;
        }
        self.pointer_moved = false;
        self.store.cancel_edit();
        log::debug!("Gesture cancelled");
        true
    }

    // --- Clicks ---

    /// Route a click at a screen point to the selection logic.
    pub fn click(&mut self, screen: Point, modifiers: Modifiers) -> ClickOutcome {
        let Some((viewport, slide_id)) = self.context() else {
            return ClickOutcome::Ignored;
        };
        let point = viewport.screen_to_slide(screen);
        let tolerance = self.hit_tolerance(&viewport);
        let hit = self.leaf_at(&slide_id, point, tolerance).map(|c| c.id.clone());

        match hit {
            Some(id) => self
                .interaction
                .handle_click(&mut self.store, &slide_id, &id, modifiers, self.editing),
            None => self.interaction.handle_background_click(&mut self.store, self.editing),
        }
    }

    pub fn double_click(&mut self, screen: Point) -> DoubleClickOutcome {
        let Some((viewport, slide_id)) = self.context() else {
            return DoubleClickOutcome::Ignored;
        };
        let point = viewport.screen_to_slide(screen);
        let tolerance = self.hit_tolerance(&viewport);
        let hit = self.leaf_at(&slide_id, point, tolerance).map(|c| c.id.clone());

        match hit {
            Some(id) => self
                .interaction
                .handle_double_click(&mut self.store, &slide_id, &id, self.editing),
            None => DoubleClickOutcome::Ignored,
        }
    }

    // --- Keyboard ---

    /// Handle a key press. Returns whether it was consumed.
    ///
    /// While text editing only Escape is handled, and it leaves text
    /// editing.
    pub fn handle_key(&mut self, event: &KeyEvent) -> EditorResult<bool> {
        if !self.editing {
            return Ok(false);
        }
        let Some(action) = resolve_shortcut(&event.key, event.modifiers) else {
            return Ok(false);
        };
        if self.store.is_text_editing() {
            if action == ShortcutAction::Escape {
                self.store.set_text_editing(false);
                return Ok(true);
            }
            return Ok(false);
        }

        if action == ShortcutAction::Escape {
            return Ok(self.escape());
        }

        let Some(slide_id) = self.current_slide.clone() else {
            log::debug!("No current slide, ignoring {:?}", action);
            return Ok(false);
        };

        match action {
            ShortcutAction::Group => Ok(self.store.group_selected(&slide_id)?.is_some()),
            ShortcutAction::Ungroup => Ok(!self.store.ungroup_selected(&slide_id)?.is_empty()),
            ShortcutAction::DeleteSelection => Ok(!self.store.delete_selected(&slide_id)?.is_empty()),
            ShortcutAction::Undo => self.store.undo(&slide_id),
            ShortcutAction::Redo => self.store.redo(&slide_id),
            ShortcutAction::SelectAll => {
                self.store.select_all(&slide_id)?;
                Ok(true)
            }
            ShortcutAction::Escape => Ok(self.escape()),
        }
    }

    /// Cancel the gesture, else leave group edit, else clear the selection.
    fn escape(&mut self) -> bool {
        if self.cancel_gesture() {
            return true;
        }
        if self.store.editing_group_id().is_some() {
            self.store.set_editing_group_id(None);
            return true;
        }
        if self.store.selected_ids().is_empty() {
            return false;
        }
        self.store.clear_selection();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentInstance, ComponentKind};
    use crate::selection::ResizeDirection;
    use kurbo::{Rect, Size, Vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn square(id: &str, x: f64, y: f64) -> ComponentInstance {
        ComponentInstance::new(id, ComponentKind::Image, Point::new(x, y), Size::new(100.0, 100.0))
    }

    /// Display matches the slide, so screen and slide coordinates agree.
    fn editor(components: Vec<ComponentInstance>) -> Editor {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        let viewport = Viewport::new(Size::new(1920.0, 1080.0), Rect::new(0.0, 0.0, 1920.0, 1080.0));
        editor.set_viewport(viewport);
        editor.load_slide(&Slide::new("s1").with_components(components));
        editor
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) -> bool {
        let target = editor.target_at(from);
        assert!(editor.pointer_down(from, &target).unwrap());
        editor.pointer_move(from.midpoint(to), Modifiers::NONE);
        editor.pointer_move(to, Modifiers::NONE);
        editor.pointer_up().unwrap()
    }

    #[test]
    fn test_target_resolution() {
        let mut editor = editor(vec![square("a", 100.0, 100.0), square("b", 500.0, 500.0)]);
        assert_eq!(editor.target_at(Point::new(150.0, 150.0)), PointerTarget::Component("a".into()));
        assert_eq!(editor.target_at(Point::new(50.0, 50.0)), PointerTarget::Background);

        editor.store_mut().select_component("a", false);
        assert_eq!(
            editor.target_at(Point::new(200.0, 200.0)),
            PointerTarget::Handle {
                component_id: "a".into(),
                kind: HandleKind::Resize(ResizeDirection::SE)
            }
        );

        editor.store_mut().select_component("b", true);
        // Empty space inside the box drags the whole selection.
        assert_eq!(editor.target_at(Point::new(400.0, 300.0)), PointerTarget::SelectionBox);
    }

    #[test]
    fn test_move_records_one_history_entry() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        let positions = Rc::new(RefCell::new(Vec::new()));
        let seen = positions.clone();
        let _sub = editor.subscribe(move |event| {
            if let EditorEvent::PositionUpdated { position, .. } = event {
                seen.borrow_mut().push(*position);
            }
        });

        assert!(drag(&mut editor, Point::new(150.0, 150.0), Point::new(250.0, 170.0)));
        let a = editor.store().component("s1", "a").unwrap();
        assert_eq!(a.props.position, Point::new(200.0, 120.0));
        assert_eq!(editor.store().history().undo_depth("s1"), 1);
        assert_eq!(positions.borrow().len(), 2);
        assert!(!editor.store().is_transient_edit_active());
    }

    #[test]
    fn test_click_after_drag_is_suppressed() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        drag(&mut editor, Point::new(150.0, 150.0), Point::new(250.0, 250.0));
        assert_eq!(editor.click(Point::new(250.0, 250.0), Modifiers::NONE), ClickOutcome::Suppressed);
        assert!(editor.store().selected_ids().is_empty());
        assert_eq!(
            editor.click(Point::new(250.0, 250.0), Modifiers::NONE),
            ClickOutcome::Selected("a".into())
        );
    }

    #[test]
    fn test_press_without_move_records_nothing() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        let target = editor.target_at(Point::new(150.0, 150.0));
        editor.pointer_down(Point::new(150.0, 150.0), &target).unwrap();
        assert!(!editor.pointer_up().unwrap());
        assert_eq!(editor.store().history().undo_depth("s1"), 0);
        assert_eq!(
            editor.click(Point::new(150.0, 150.0), Modifiers::NONE),
            ClickOutcome::Selected("a".into())
        );
    }

    #[test]
    fn test_resize_and_rotate_gestures() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        editor.store_mut().select_component("a", false);

        drag(&mut editor, Point::new(200.0, 200.0), Point::new(260.0, 240.0));
        let a = editor.store().component("s1", "a").unwrap();
        assert_eq!((a.props.width, a.props.height), (160.0, 140.0));
        assert_eq!(a.props.position, Point::new(100.0, 100.0));

        // Rotate handle sits above the top-center; sweep a quarter turn.
        let center = editor.store().component("s1", "a").unwrap().center();
        let handle = Point::new(center.x, 100.0 - crate::selection::ROTATE_HANDLE_OFFSET);
        let target = editor.target_at(handle);
        assert!(matches!(target, PointerTarget::Handle { kind: HandleKind::Rotate, .. }));
        editor.pointer_down(handle, &target).unwrap();
        editor.pointer_move(center + Vec2::new(100.0, 1.0), Modifiers::NONE);
        editor.pointer_up().unwrap();
        assert_eq!(editor.store().component("s1", "a").unwrap().props.rotation, 90.0);
        assert_eq!(editor.store().history().undo_depth("s1"), 2);
    }

    #[test]
    fn test_escape_cancels_gesture_first() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        editor.store_mut().select_component("a", false);
        let target = editor.target_at(Point::new(150.0, 150.0));
        editor.pointer_down(Point::new(150.0, 150.0), &target).unwrap();
        editor.pointer_move(Point::new(400.0, 400.0), Modifiers::NONE);

        assert!(editor.handle_key(&KeyEvent::new("Escape", Modifiers::NONE)).unwrap());
        assert_eq!(editor.store().component("s1", "a").unwrap().props.position, Point::new(100.0, 100.0));
        assert_eq!(editor.store().selected_ids(), ["a".to_string()]);
        assert_eq!(editor.store().history().undo_depth("s1"), 0);

        assert!(editor.handle_key(&KeyEvent::new("Escape", Modifiers::NONE)).unwrap());
        assert!(editor.store().selected_ids().is_empty());
        assert!(!editor.handle_key(&KeyEvent::new("Escape", Modifiers::NONE)).unwrap());
    }

    #[test]
    fn test_keys_ignored_while_text_editing() {
        let mut editor = editor(vec![
            ComponentInstance::new("t", ComponentKind::TiptapTextBlock, Point::new(100.0, 100.0), Size::new(200.0, 80.0)),
        ]);
        editor.double_click(Point::new(150.0, 120.0));
        assert!(editor.store().is_text_editing());

        assert!(!editor.handle_key(&KeyEvent::new("Delete", Modifiers::NONE)).unwrap());
        assert!(editor.store().component("s1", "t").is_some());

        assert!(editor.handle_key(&KeyEvent::new("Escape", Modifiers::NONE)).unwrap());
        assert!(!editor.store().is_text_editing());
        assert_eq!(editor.store().selected_ids(), ["t".to_string()]);
    }

    #[test]
    fn test_group_shortcut_and_undo() {
        let mut editor = editor(vec![square("a", 100.0, 100.0), square("b", 300.0, 300.0)]);
        editor.store_mut().select_component("a", false);
        editor.store_mut().select_component("b", true);

        assert!(editor.handle_key(&KeyEvent::new("g", Modifiers::ctrl())).unwrap());
        assert_eq!(editor.store().draft_components("s1").unwrap().len(), 3);

        assert!(editor.handle_key(&KeyEvent::new("z", Modifiers::meta())).unwrap());
        assert_eq!(editor.store().draft_components("s1").unwrap().len(), 2);
    }

    #[test]
    fn test_no_viewport_is_noop() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        editor.set_viewport(None);
        let target = PointerTarget::Component("a".into());
        assert!(!editor.pointer_down(Point::new(150.0, 150.0), &target).unwrap());
        assert!(!editor.pointer_move(Point::new(200.0, 200.0), Modifiers::NONE));
        assert_eq!(editor.click(Point::new(150.0, 150.0), Modifiers::NONE), ClickOutcome::Ignored);
    }

    #[test]
    fn test_presenting_disables_gestures() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        editor.set_editing(false);
        let target = editor.target_at(Point::new(150.0, 150.0));
        assert!(!editor.pointer_down(Point::new(150.0, 150.0), &target).unwrap());
        assert_eq!(editor.click(Point::new(150.0, 150.0), Modifiers::NONE), ClickOutcome::Ignored);
    }

    fn grouped_editor() -> (Editor, ComponentId) {
        let mut editor = editor(vec![square("a", 100.0, 100.0), square("b", 300.0, 300.0)]);
        editor.click(Point::new(150.0, 150.0), Modifiers::NONE);
        editor.click(Point::new(350.0, 350.0), Modifiers::shift());
        assert!(editor.handle_key(&KeyEvent::new("g", Modifiers::ctrl())).unwrap());
        let group_id = editor.store().selected_ids()[0].clone();
        (editor, group_id)
    }

    #[test]
    fn test_double_click_member_enters_group() {
        let (mut editor, group_id) = grouped_editor();

        // A single click on a member selects the whole group.
        assert_eq!(
            editor.click(Point::new(150.0, 150.0), Modifiers::NONE),
            ClickOutcome::Selected(group_id.clone())
        );

        let outcome = editor.double_click(Point::new(150.0, 150.0));
        assert_eq!(
            outcome,
            DoubleClickOutcome::EnteredGroup {
                group_id: group_id.clone(),
                member_id: "a".into()
            }
        );
        assert_eq!(editor.store().editing_group_id(), Some(group_id.as_str()));

        assert_eq!(
            editor.click(Point::new(350.0, 350.0), Modifiers::NONE),
            ClickOutcome::Selected("b".into())
        );
    }

    #[test]
    fn test_drag_inside_open_group_moves_member_and_refits() {
        let (mut editor, group_id) = grouped_editor();

        // Closed group: dragging a member moves the whole group.
        drag(&mut editor, Point::new(150.0, 150.0), Point::new(160.0, 150.0));
        assert_eq!(editor.store().component("s1", "a").unwrap().props.position, Point::new(110.0, 100.0));
        assert_eq!(editor.store().component("s1", "b").unwrap().props.position, Point::new(310.0, 300.0));

        editor.double_click(Point::new(160.0, 150.0));
        assert_eq!(editor.store().editing_group_id(), Some(group_id.as_str()));

        // Open group: only the member moves, and the group follows its members.
        drag(&mut editor, Point::new(360.0, 350.0), Point::new(560.0, 350.0));
        assert_eq!(editor.store().component("s1", "a").unwrap().props.position, Point::new(110.0, 100.0));
        assert_eq!(editor.store().component("s1", "b").unwrap().props.position, Point::new(510.0, 300.0));
        assert_eq!(
            editor.store().component("s1", &group_id).unwrap().rect(),
            Rect::new(110.0, 100.0, 610.0, 400.0)
        );
    }

    #[test]
    fn test_new_press_clears_stale_drag_guard() {
        let mut editor = editor(vec![square("a", 100.0, 100.0)]);
        editor.store_mut().select_component("a", false);

        // Resize that ends off the component: no trailing click arrives.
        drag(&mut editor, Point::new(200.0, 200.0), Point::new(400.0, 400.0));

        let target = editor.target_at(Point::new(150.0, 150.0));
        editor.pointer_down(Point::new(150.0, 150.0), &target).unwrap();
        editor.pointer_up().unwrap();
        assert_eq!(
            editor.click(Point::new(150.0, 150.0), Modifiers::NONE),
            ClickOutcome::Selected("a".into())
        );
    }
}

