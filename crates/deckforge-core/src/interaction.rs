//! Click and double-click handling on top of the store.
//!
//! A component moves through `unselected -> selected -> text-editing`.
//! Group edit mode is a separate flag on the store: while it names a
//! group, clicks reach that group's members directly.

use crate::components::ComponentId;
use crate::input::Modifiers;
use crate::store::EditorStore;

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click directly after a drag was swallowed.
    Suppressed,
    /// Not in editing mode, or the target is unknown.
    Ignored,
    /// The selection now holds exactly this component.
    Selected(ComponentId),
    /// The component was added to the selection.
    Added(ComponentId),
    /// The component was removed from the selection.
    Removed(ComponentId),
}

/// What a double-click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoubleClickOutcome {
    Ignored,
    /// Group edit mode was entered for the group, with the member selected.
    EnteredGroup {
        group_id: ComponentId,
        member_id: ComponentId,
    },
    /// Text editing was switched on for the component.
    TextEditing(ComponentId),
    Selected(ComponentId),
}

/// Per-editor click state.
#[derive(Debug, Clone, Default)]
pub struct SelectionInteraction {
    just_dragged: bool,
}

impl SelectionInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the guard: the next click is the tail of a drag.
    pub fn mark_dragged(&mut self) {
        self.just_dragged = true;
    }

    pub fn just_dragged(&self) -> bool {
        self.just_dragged
    }

    /// Drop the guard without consuming a click.
    pub fn reset(&mut self) {
        self.just_dragged = false;
    }

    fn consume_guard(&mut self) -> bool {
        std::mem::take(&mut self.just_dragged)
    }

    /// The id a click or drag on `id` acts on: its outermost group, unless
    /// that group is open for editing.
    pub fn resolve_target(store: &EditorStore, slide_id: &str, id: &str) -> ComponentId {
        let mut target = id.to_string();
        let mut depth = 0;
        while let Some(parent) = store.parent_group(slide_id, &target) {
            if store.editing_group_id() == Some(parent.id.as_str()) || depth > 32 {
                break;
            }
            target = parent.id.clone();
            depth += 1;
        }
        target
    }

    /// Handle a single click on a component.
    ///
    /// A plain click replaces the selection. Shift, Ctrl or Meta toggle the
    /// component in and out of it.
    pub fn handle_click(
        &mut self,
        store: &mut EditorStore,
        slide_id: &str,
        id: &str,
        modifiers: Modifiers,
        is_editing: bool,
    ) -> ClickOutcome {
        if self.consume_guard() {
            log::debug!("Suppressed click on {} after drag", id);
            return ClickOutcome::Suppressed;
        }
        if !is_editing || store.component(slide_id, id).is_none() {
            return ClickOutcome::Ignored;
        }

        let target = Self::resolve_target(store, slide_id, id);

        // Clicking outside the open group closes it.
        if let Some(group_id) = store.editing_group_id() {
            let inside = store
                .parent_group(slide_id, &target)
                .is_some_and(|parent| parent.id == group_id);
            if !inside && target != group_id {
                store.set_editing_group_id(None);
            }
        }

        if modifiers.is_additive() {
            if store.is_component_selected(&target) {
                store.deselect_component(&target);
                ClickOutcome::Removed(target)
            } else {
                store.select_component(&target, true);
                ClickOutcome::Added(target)
            }
        } else {
            store.select_component(&target, false);
            ClickOutcome::Selected(target)
        }
    }

    /// Handle a click on empty slide area.
    pub fn handle_background_click(&mut self, store: &mut EditorStore, is_editing: bool) -> ClickOutcome {
        if self.consume_guard() {
            return ClickOutcome::Suppressed;
        }
        if !is_editing {
            return ClickOutcome::Ignored;
        }
        store.clear_selection();
        store.set_editing_group_id(None);
        ClickOutcome::Ignored
    }

    /// Handle a double-click on a component.
    ///
    /// On a member of a closed group this opens the group and selects the
    /// member. On a text-capable component it switches text editing on,
    /// without reselecting when the component is already selected.
    pub fn handle_double_click(
        &mut self,
        store: &mut EditorStore,
        slide_id: &str,
        id: &str,
        is_editing: bool,
    ) -> DoubleClickOutcome {
        if !is_editing {
            return DoubleClickOutcome::Ignored;
        }

        if let Some(parent) = store.parent_group(slide_id, id) {
            if store.editing_group_id() != Some(parent.id.as_str()) {
                let group_id = parent.id.clone();
                store.set_editing_group_id(Some(group_id.clone()));
                store.select_component(id, false);
                log::debug!("Entered group edit mode for {}", group_id);
                return DoubleClickOutcome::EnteredGroup {
                    group_id,
                    member_id: id.to_string(),
                };
            }
        }

        let Some(component) = store.component(slide_id, id) else {
            return DoubleClickOutcome::Ignored;
        };

        if component.supports_text_editing() {
            if !store.is_component_selected(id) {
                store.select_component(id, false);
            }
            store.set_text_editing(true);
            DoubleClickOutcome::TextEditing(id.to_string())
        } else {
            store.select_component(id, false);
            DoubleClickOutcome::Selected(id.to_string())
        }
    }
}
