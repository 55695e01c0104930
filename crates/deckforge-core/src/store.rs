//! Editor store: draft components, selection, history and sync.
//!
//! Mutations come in two flavours. A *committing* mutation pushes exactly
//! one history snapshot and is forwarded to collaboration. A *transient*
//! edit, opened with [`EditorStore::begin_transient_edit`], applies updates
//! locally with no history and no sync; [`EditorStore::commit_edit`] then
//! records a single snapshot and syncs the merged result, while
//! [`EditorStore::cancel_edit`] rolls everything back.

use crate::collab::{CollabAdapter, SyncBridge};
use crate::components::{ComponentId, ComponentInstance, PropsPatch, SlideId, union_bounds};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::history::HistoryStore;
use std::collections::HashMap;
use uuid::Uuid;

/// Nesting limit when walking up from a member to its enclosing groups.
const MAX_GROUP_DEPTH: usize = 32;

/// An open transient edit.
#[derive(Debug, Clone)]
struct TransientEdit {
    slide_id: SlideId,
    /// Component list when the edit began.
    baseline: Vec<ComponentInstance>,
    /// Merged patch per touched component, in first-touch order.
    patches: Vec<(ComponentId, PropsPatch)>,
}

impl TransientEdit {
    fn record(&mut self, id: &str, patch: &PropsPatch) {
        match self.patches.iter_mut().find(|(touched, _)| touched == id) {
            Some((_, merged)) => merged.merge(patch),
            None => self.patches.push((id.to_string(), patch.clone())),
        }
    }
}

/// Process-local editor state.
#[derive(Debug)]
pub struct EditorStore {
    slides: HashMap<SlideId, Vec<ComponentInstance>>,
    selection: Vec<ComponentId>,
    editing_group: Option<ComponentId>,
    text_editing: bool,
    history: HistoryStore,
    transient: Option<TransientEdit>,
    sync: SyncBridge,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EditorStore {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            slides: HashMap::new(),
            selection: Vec::new(),
            editing_group: None,
            text_editing: false,
            history: HistoryStore::new(config.max_history),
            transient: None,
            sync: SyncBridge::new(config.sync_enabled),
        }
    }

    // --- Drafts ---

    /// Replace a slide's draft components (e.g. when a slide is loaded).
    ///
    /// The components are mirrored into the collaboration adapter so later
    /// updates reach an existing entry.
    pub fn set_draft_components(&mut self, slide_id: &str, components: Vec<ComponentInstance>) {
        self.sync.seed_slide_via_sync(slide_id, &components);
        self.slides.insert(slide_id.to_string(), components);
    }

    pub fn draft_components(&self, slide_id: &str) -> Option<&[ComponentInstance]> {
        self.slides.get(slide_id).map(Vec::as_slice)
    }

    pub fn has_slide(&self, slide_id: &str) -> bool {
        self.slides.contains_key(slide_id)
    }

    pub fn component(&self, slide_id: &str, id: &str) -> Option<&ComponentInstance> {
        self.slides.get(slide_id)?.iter().find(|c| c.id == id)
    }

    fn slide(&self, slide_id: &str) -> EditorResult<&Vec<ComponentInstance>> {
        self.slides
            .get(slide_id)
            .ok_or_else(|| EditorError::SlideNotFound(slide_id.to_string()))
    }

    fn slide_mut(&mut self, slide_id: &str) -> EditorResult<&mut Vec<ComponentInstance>> {
        self.slides
            .get_mut(slide_id)
            .ok_or_else(|| EditorError::SlideNotFound(slide_id.to_string()))
    }

    fn component_mut(&mut self, slide_id: &str, id: &str) -> EditorResult<&mut ComponentInstance> {
        self.slide_mut(slide_id)?
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EditorError::ComponentNotFound(id.to_string()))
    }

    /// Push the current state of a slide onto its history.
    fn push_history(&mut self, slide_id: &str) -> EditorResult<()> {
        let snapshot = self.slide(slide_id)?.clone();
        self.history.add_to_history(slide_id, snapshot);
        Ok(())
    }

    /// Reject structural mutations while a gesture is in flight.
    fn ensure_no_transient(&self) -> EditorResult<()> {
        match &self.transient {
            Some(edit) => Err(EditorError::EditInProgress(edit.slide_id.clone())),
            None => Ok(()),
        }
    }

    // --- Transient edits ---

    /// Open a transient edit on a slide.
    pub fn begin_transient_edit(&mut self, slide_id: &str) -> EditorResult<()> {
        self.ensure_no_transient()?;
        let baseline = self.slide(slide_id)?.clone();
        log::debug!("Begin transient edit on slide {}", slide_id);
        self.transient = Some(TransientEdit {
            slide_id: slide_id.to_string(),
            baseline,
            patches: Vec::new(),
        });
        Ok(())
    }

    pub fn is_transient_edit_active(&self) -> bool {
        self.transient.is_some()
    }

    /// Slide of the open transient edit.
    pub fn transient_slide(&self) -> Option<&str> {
        self.transient.as_ref().map(|t| t.slide_id.as_str())
    }

    /// Apply a partial prop update.
    ///
    /// Inside a transient edit on the same slide this only touches the
    /// draft. Otherwise it is a committing mutation: one snapshot, then the
    /// update, then sync.
    pub fn update_component(&mut self, slide_id: &str, id: &str, patch: &PropsPatch) -> EditorResult<()> {
        let transient = self
            .transient
            .as_ref()
            .is_some_and(|t| t.slide_id == slide_id);

        if transient {
            self.component_mut(slide_id, id)?.apply_patch(patch);
            let refits = self.refit_groups(slide_id, id)?;
            if let Some(edit) = self.transient.as_mut() {
                edit.record(id, patch);
                for (group_id, group_patch) in &refits {
                    edit.record(group_id, group_patch);
                }
            }
            return Ok(());
        }

        // Resolve before recording history so a bad id leaves no entry.
        self.component_mut(slide_id, id)?;
        self.push_history(slide_id)?;
        self.component_mut(slide_id, id)?.apply_patch(patch);
        self.sync.update_component_via_sync(slide_id, id, patch);
        for (group_id, group_patch) in self.refit_groups(slide_id, id)? {
            self.sync.update_component_via_sync(slide_id, &group_id, &group_patch);
        }
        Ok(())
    }

    /// Apply several updates as one committing mutation (one snapshot).
    pub fn update_components(&mut self, slide_id: &str, updates: &[(ComponentId, PropsPatch)]) -> EditorResult<()> {
        self.ensure_no_transient()?;
        if updates.is_empty() {
            return Ok(());
        }
        for (id, _) in updates {
            self.component_mut(slide_id, id)?;
        }
        self.push_history(slide_id)?;
        for (id, patch) in updates {
            self.component_mut(slide_id, id)?.apply_patch(patch);
            self.sync.update_component_via_sync(slide_id, id, patch);
        }
        let mut refits: Vec<(ComponentId, PropsPatch)> = Vec::new();
        for (id, _) in updates {
            for (group_id, group_patch) in self.refit_groups(slide_id, id)? {
                match refits.iter_mut().find(|(fitted, _)| *fitted == group_id) {
                    Some((_, merged)) => merged.merge(&group_patch),
                    None => refits.push((group_id, group_patch)),
                }
            }
        }
        for (group_id, group_patch) in &refits {
            self.sync.update_component_via_sync(slide_id, group_id, group_patch);
        }
        Ok(())
    }

    /// Fit `group_id` to the union of its members' bounds.
    ///
    /// Returns the applied patch, or `None` when the group already fits or
    /// has no members left.
    fn fit_group(&mut self, slide_id: &str, group_id: &str) -> EditorResult<Option<PropsPatch>> {
        let components = self.slide(slide_id)?;
        let Some(group) = components.iter().find(|c| c.id == group_id && c.is_group()) else {
            return Ok(None);
        };
        let Some(bounds) = union_bounds(components.iter().filter(|c| group.props.children.contains(&c.id))) else {
            return Ok(None);
        };
        if group.rect() == bounds {
            return Ok(None);
        }
        let patch = PropsPatch {
            position: Some(bounds.origin()),
            width: Some(bounds.width()),
            height: Some(bounds.height()),
            ..PropsPatch::default()
        };
        self.component_mut(slide_id, group_id)?.apply_patch(&patch);
        Ok(Some(patch))
    }

    /// Refit every group enclosing `id`, innermost first, after `id` moved
    /// or changed size.
    fn refit_groups(&mut self, slide_id: &str, id: &str) -> EditorResult<Vec<(ComponentId, PropsPatch)>> {
        let mut patches = Vec::new();
        let mut current = id.to_string();
        for _ in 0..MAX_GROUP_DEPTH {
            let Some(parent_id) = self.parent_group(slide_id, &current).map(|g| g.id.clone()) else {
                break;
            };
            match self.fit_group(slide_id, &parent_id)? {
                Some(patch) => patches.push((parent_id.clone(), patch)),
                None => break,
            }
            current = parent_id;
        }
        Ok(patches)
    }

    /// Close the transient edit, recording one snapshot if anything changed
    /// and syncing every touched component.
    ///
    /// Returns whether a history entry was pushed.
    pub fn commit_edit(&mut self) -> EditorResult<bool> {
        let Some(edit) = self.transient.take() else {
            log::debug!("commit_edit without an open edit");
            return Ok(false);
        };
        if edit.patches.is_empty() {
            log::debug!("Transient edit on slide {} committed with no changes", edit.slide_id);
            return Ok(false);
        }

        self.history.add_to_history(&edit.slide_id, edit.baseline);
        for (id, patch) in &edit.patches {
            self.sync.update_component_via_sync(&edit.slide_id, id, patch);
        }
        log::debug!(
            "Committed transient edit on slide {} ({} components)",
            edit.slide_id,
            edit.patches.len()
        );
        Ok(true)
    }

    /// Close the transient edit and restore the draft to its baseline.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(edit) = self.transient.take() else {
            return false;
        };
        log::debug!("Cancelled transient edit on slide {}", edit.slide_id);
        self.slides.insert(edit.slide_id, edit.baseline);
        true
    }

    // --- Structural mutations ---

    pub fn add_component(&mut self, slide_id: &str, component: ComponentInstance) -> EditorResult<()> {
        self.ensure_no_transient()?;
        self.push_history(slide_id)?;
        self.sync.add_component_via_sync(slide_id, &component);
        self.slide_mut(slide_id)?.push(component);
        Ok(())
    }

    /// Remove a component, detaching it from its parent group and the
    /// selection.
    pub fn remove_component(&mut self, slide_id: &str, id: &str) -> EditorResult<ComponentInstance> {
        self.ensure_no_transient()?;
        if self.component(slide_id, id).is_none() {
            return Err(EditorError::ComponentNotFound(id.to_string()));
        }
        self.push_history(slide_id)?;
        self.remove_internal(slide_id, id)
    }

    /// Remove without recording history.
    fn remove_internal(&mut self, slide_id: &str, id: &str) -> EditorResult<ComponentInstance> {
        let components = self.slide_mut(slide_id)?;
        let index = components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EditorError::ComponentNotFound(id.to_string()))?;
        let removed = components.remove(index);

        let mut detached = Vec::new();
        for parent in components.iter_mut().filter(|c| c.props.children.iter().any(|child| child == id)) {
            parent.props.children.retain(|child| child != id);
            detached.push((parent.id.clone(), parent.props.children.clone()));
        }

        self.selection.retain(|selected| selected != id);
        if self.editing_group.as_deref() == Some(id) {
            self.editing_group = None;
        }

        self.sync.remove_component_via_sync(slide_id, id);
        for (parent_id, children) in detached {
            let mut patch = PropsPatch {
                children: Some(children),
                ..PropsPatch::default()
            };
            if let Some(fitted) = self.fit_group(slide_id, &parent_id)? {
                patch.merge(&fitted);
            }
            self.sync.update_component_via_sync(slide_id, &parent_id, &patch);
            for (group_id, group_patch) in self.refit_groups(slide_id, &parent_id)? {
                self.sync.update_component_via_sync(slide_id, &group_id, &group_patch);
            }
        }
        Ok(removed)
    }

    /// Delete the selection. Background components are skipped; deleting a
    /// group deletes its members too.
    ///
    /// Returns the ids that were removed.
    pub fn delete_selected(&mut self, slide_id: &str) -> EditorResult<Vec<ComponentId>> {
        self.ensure_no_transient()?;
        let components = self.slide(slide_id)?;
        let deletable: Vec<ComponentId> = self
            .selection
            .iter()
            .filter(|id| components.iter().any(|c| &c.id == *id && !c.is_background()))
            .cloned()
            .collect();
        let targets: Vec<ComponentId> = crate::multi_selection::expand_group_members(components, &deletable)
            .into_iter()
            .filter(|id| components.iter().any(|c| &c.id == id && !c.is_background()))
            .collect();

        if targets.is_empty() {
            return Ok(Vec::new());
        }

        self.push_history(slide_id)?;
        for id in &targets {
            // A member may already be gone if it was listed twice.
            if self.component(slide_id, id).is_some() {
                self.remove_internal(slide_id, id)?;
            }
        }
        log::debug!("Deleted {} components from slide {}", targets.len(), slide_id);
        Ok(targets)
    }

    // --- Selection ---

    /// Select a component. With `additive`, it is added to the selection;
    /// otherwise it replaces it.
    pub fn select_component(&mut self, id: &str, additive: bool) {
        if !additive {
            if self.selection.len() == 1 && self.selection[0] == id {
                return;
            }
            self.selection.clear();
            self.text_editing = false;
        }
        if !self.selection.iter().any(|selected| selected == id) {
            self.selection.push(id.to_string());
        }
    }

    pub fn deselect_component(&mut self, id: &str) {
        self.selection.retain(|selected| selected != id);
        if self.selection.is_empty() {
            self.text_editing = false;
        }
    }

    pub fn is_component_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|selected| selected == id)
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> &[ComponentId] {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.text_editing = false;
    }

    /// Select every selectable component on the slide: the members of the
    /// open group in group-edit mode, otherwise all top-level components.
    pub fn select_all(&mut self, slide_id: &str) -> EditorResult<()> {
        let components = self.slide(slide_id)?;
        let ids: Vec<ComponentId> = match &self.editing_group {
            Some(group_id) => components
                .iter()
                .find(|c| &c.id == group_id)
                .map(|g| g.props.children.clone())
                .unwrap_or_default(),
            None => components
                .iter()
                .filter(|c| !c.is_background())
                .filter(|c| !components.iter().any(|p| p.props.children.contains(&c.id)))
                .map(|c| c.id.clone())
                .collect(),
        };
        self.selection = ids;
        self.text_editing = false;
        Ok(())
    }

    pub fn set_editing_group_id(&mut self, group_id: Option<ComponentId>) {
        self.editing_group = group_id;
    }

    pub fn editing_group_id(&self) -> Option<&str> {
        self.editing_group.as_deref()
    }

    pub fn set_text_editing(&mut self, editing: bool) {
        self.text_editing = editing;
    }

    pub fn is_text_editing(&self) -> bool {
        self.text_editing
    }

    /// The group that lists `id` as a member, if any.
    pub fn parent_group(&self, slide_id: &str, id: &str) -> Option<&ComponentInstance> {
        self.slides
            .get(slide_id)?
            .iter()
            .find(|c| c.is_group() && c.props.children.iter().any(|child| child == id))
    }

    // --- Grouping ---

    /// Wrap the selected components in a new group.
    ///
    /// Needs at least two selected components; returns the new group id.
    pub fn group_selected(&mut self, slide_id: &str) -> EditorResult<Option<ComponentId>> {
        self.ensure_no_transient()?;
        let components = self.slide(slide_id)?;
        let members: Vec<&ComponentInstance> = self
            .selection
            .iter()
            .filter_map(|id| components.iter().find(|c| &c.id == id && !c.is_background()))
            .collect();
        if members.len() < 2 {
            return Ok(None);
        }

        let Some(bounds) = union_bounds(members.iter().copied()) else {
            return Ok(None);
        };
        let children: Vec<ComponentId> = members.iter().map(|c| c.id.clone()).collect();
        let z_index = members.iter().map(|c| c.props.z_index).max().unwrap_or(0);
        let group_id = Uuid::new_v4().to_string();
        let group = ComponentInstance::group(group_id.clone(), bounds, children).with_z_index(z_index);

        self.push_history(slide_id)?;
        self.sync.add_component_via_sync(slide_id, &group);
        self.slide_mut(slide_id)?.push(group);
        self.selection = vec![group_id.clone()];
        self.text_editing = false;
        log::debug!("Grouped components into {} on slide {}", group_id, slide_id);
        Ok(Some(group_id))
    }

    /// Dissolve a group, keeping its members. Returns the member ids.
    pub fn ungroup(&mut self, slide_id: &str, group_id: &str) -> EditorResult<Vec<ComponentId>> {
        self.ensure_no_transient()?;
        let group = self
            .component(slide_id, group_id)
            .ok_or_else(|| EditorError::ComponentNotFound(group_id.to_string()))?;
        if !group.is_group() {
            return Ok(Vec::new());
        }
        self.push_history(slide_id)?;
        let children = self.ungroup_internal(slide_id, group_id)?;
        self.selection = children.clone();
        Ok(children)
    }

    /// Dissolve every selected group in one history entry.
    pub fn ungroup_selected(&mut self, slide_id: &str) -> EditorResult<Vec<ComponentId>> {
        self.ensure_no_transient()?;
        let groups: Vec<ComponentId> = self
            .selection
            .iter()
            .filter(|id| self.component(slide_id, id).is_some_and(ComponentInstance::is_group))
            .cloned()
            .collect();
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        self.push_history(slide_id)?;
        let mut released = Vec::new();
        for group_id in &groups {
            released.extend(self.ungroup_internal(slide_id, group_id)?);
        }
        self.selection = released.clone();
        Ok(released)
    }

    fn ungroup_internal(&mut self, slide_id: &str, group_id: &str) -> EditorResult<Vec<ComponentId>> {
        let removed = self.remove_internal(slide_id, group_id)?;
        log::debug!("Ungrouped {} on slide {}", group_id, slide_id);
        Ok(removed.props.children)
    }

    // --- History ---

    pub fn can_undo(&self, slide_id: &str) -> bool {
        self.history.can_undo(slide_id)
    }

    pub fn can_redo(&self, slide_id: &str) -> bool {
        self.history.can_redo(slide_id)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Restore the previous snapshot. Returns `false` if there is none.
    pub fn undo(&mut self, slide_id: &str) -> EditorResult<bool> {
        self.ensure_no_transient()?;
        let current = self.slide(slide_id)?.clone();
        let Some(snapshot) = self.history.undo(slide_id, current.clone()) else {
            return Ok(false);
        };
        self.restore(slide_id, &current, snapshot);
        Ok(true)
    }

    /// Re-apply the last undone snapshot. Returns `false` if there is none.
    pub fn redo(&mut self, slide_id: &str) -> EditorResult<bool> {
        self.ensure_no_transient()?;
        let current = self.slide(slide_id)?.clone();
        let Some(snapshot) = self.history.redo(slide_id, current.clone()) else {
            return Ok(false);
        };
        self.restore(slide_id, &current, snapshot);
        Ok(true)
    }

    /// Swap in a snapshot and push the differences through sync.
    fn restore(&mut self, slide_id: &str, before: &[ComponentInstance], after: Vec<ComponentInstance>) {
        for component in &after {
            match before.iter().find(|c| c.id == component.id) {
                None => self.sync.add_component_via_sync(slide_id, component),
                Some(previous) if previous != component => {
                    let patch = PropsPatch::from_props(&component.props);
                    self.sync.update_component_via_sync(slide_id, &component.id, &patch);
                }
                Some(_) => {}
            }
        }
        for component in before {
            if !after.iter().any(|c| c.id == component.id) {
                self.sync.remove_component_via_sync(slide_id, &component.id);
            }
        }

        self.selection.retain(|id| after.iter().any(|c| &c.id == id));
        if let Some(group_id) = &self.editing_group {
            if !after.iter().any(|c| &c.id == group_id) {
                self.editing_group = None;
            }
        }
        self.slides.insert(slide_id.to_string(), after);
    }

    // --- Sync ---

    pub fn sync(&self) -> &SyncBridge {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncBridge {
        &mut self.sync
    }

    /// Install the collaboration adapter and seed it with every loaded slide.
    pub fn set_collab_adapter(&mut self, adapter: impl CollabAdapter + 'static) {
        self.sync.set_adapter(adapter);
        for (slide_id, components) in &self.slides {
            self.sync.seed_slide_via_sync(slide_id, components);
        }
    }
}
