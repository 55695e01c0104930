//! Per-slide undo/redo history.

use crate::components::{ComponentInstance, SlideId};
use crate::config::DEFAULT_MAX_HISTORY;
use std::collections::HashMap;

/// A snapshot of a slide's component list.
type Snapshot = Vec<ComponentInstance>;

#[derive(Debug, Clone, Default)]
struct SlideHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

/// Undo/redo stacks keyed by slide.
///
/// Each entry is the full component list as it was *before* a committing
/// mutation. Callers push one entry per committed change; intermediate
/// gesture updates never reach this store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    slides: HashMap<SlideId, SlideHistory>,
    max_history: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStore {
    /// Create a history store keeping at most `max_history` entries per slide.
    pub fn new(max_history: usize) -> Self {
        Self {
            slides: HashMap::new(),
            max_history: max_history.max(1),
        }
    }

    /// Push a snapshot (call before making changes).
    pub fn add_to_history(&mut self, slide_id: &str, components: Vec<ComponentInstance>) {
        let history = self.slides.entry(slide_id.to_string()).or_default();
        history.undo_stack.push(components);

        // New changes invalidate anything undone
        history.redo_stack.clear();

        if history.undo_stack.len() > self.max_history {
            history.undo_stack.remove(0);
        }
    }

    /// Pop the last snapshot, saving `current` for redo.
    ///
    /// Returns the component list to restore, or `None` if there is nothing
    /// to undo.
    pub fn undo(&mut self, slide_id: &str, current: Vec<ComponentInstance>) -> Option<Vec<ComponentInstance>> {
        let history = self.slides.get_mut(slide_id)?;
        let snapshot = history.undo_stack.pop()?;
        history.redo_stack.push(current);
        Some(snapshot)
    }

    /// Pop the last undone snapshot, saving `current` for undo.
    pub fn redo(&mut self, slide_id: &str, current: Vec<ComponentInstance>) -> Option<Vec<ComponentInstance>> {
        let history = self.slides.get_mut(slide_id)?;
        let snapshot = history.redo_stack.pop()?;
        history.undo_stack.push(current);
        Some(snapshot)
    }

    pub fn can_undo(&self, slide_id: &str) -> bool {
        self.undo_depth(slide_id) > 0
    }

    pub fn can_redo(&self, slide_id: &str) -> bool {
        self.redo_depth(slide_id) > 0
    }

    pub fn undo_depth(&self, slide_id: &str) -> usize {
        self.slides.get(slide_id).map_or(0, |h| h.undo_stack.len())
    }

    pub fn redo_depth(&self, slide_id: &str) -> usize {
        self.slides.get(slide_id).map_or(0, |h| h.redo_stack.len())
    }

    /// Drop the history of one slide.
    pub fn clear(&mut self, slide_id: &str) {
        self.slides.remove(slide_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use kurbo::{Point, Size};

    fn component(id: &str, x: f64) -> ComponentInstance {
        ComponentInstance::new(id, ComponentKind::Shape, Point::new(x, 0.0), Size::new(100.0, 100.0))
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = HistoryStore::default();
        let before = vec![component("a", 0.0)];
        let after = vec![component("a", 50.0)];

        history.add_to_history("s1", before.clone());
        assert!(history.can_undo("s1"));
        assert!(!history.can_redo("s1"));

        let restored = history.undo("s1", after.clone()).unwrap();
        assert_eq!(restored, before);
        assert!(history.can_redo("s1"));

        let redone = history.redo("s1", restored).unwrap();
        assert_eq!(redone, after);
        assert!(history.can_undo("s1"));
    }

    #[test]
    fn test_history_is_per_slide() {
        let mut history = HistoryStore::default();
        history.add_to_history("s1", vec![component("a", 0.0)]);

        assert!(history.can_undo("s1"));
        assert!(!history.can_undo("s2"));
        assert!(history.undo("s2", Vec::new()).is_none());
    }

    #[test]
    fn test_new_entry_clears_redo() {
        let mut history = HistoryStore::default();
        history.add_to_history("s1", vec![component("a", 0.0)]);
        history.undo("s1", vec![component("a", 10.0)]);
        assert!(history.can_redo("s1"));

        history.add_to_history("s1", vec![component("a", 0.0)]);
        assert!(!history.can_redo("s1"));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = HistoryStore::new(3);
        for i in 0..5 {
            history.add_to_history("s1", vec![component("a", i as f64)]);
        }
        assert_eq!(history.undo_depth("s1"), 3);

        // The oldest two entries were dropped.
        let mut last = None;
        while let Some(snapshot) = history.undo("s1", Vec::new()) {
            last = Some(snapshot);
        }
        assert_eq!(last.unwrap()[0].props.position.x, 2.0);
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = HistoryStore::default();
        assert!(!history.can_undo("s1"));
        assert!(history.undo("s1", Vec::new()).is_none());
        assert!(history.redo("s1", Vec::new()).is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryStore::default();
        history.add_to_history("s1", Vec::new());
        history.clear("s1");
        assert_eq!(history.undo_depth("s1"), 0);
    }
}
