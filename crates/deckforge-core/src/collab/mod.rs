//! Collaboration boundary.
//!
//! Local editing state is authoritative. Committed changes are pushed
//! outward through a [`CollabAdapter`]; the [`SyncBridge`] decides whether
//! a push happens at all and absorbs adapter failures so a broken remote
//! never interrupts a gesture.

mod loro_doc;

pub use loro_doc::{COMPONENTS_KEY, LoroSlideDocument, ORDER_KEY, SLIDES_KEY};

use crate::components::{ComponentInstance, PropsPatch};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised by collaboration adapters.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("CRDT error: {0}")]
    Crdt(String),
    #[error("Unknown slide: {0}")]
    UnknownSlide(String),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<loro::LoroError> for CollabError {
    fn from(e: loro::LoroError) -> Self {
        CollabError::Crdt(e.to_string())
    }
}

impl From<serde_json::Error> for CollabError {
    fn from(e: serde_json::Error) -> Self {
        CollabError::Serialization(e.to_string())
    }
}

/// Result type for collaboration operations.
pub type CollabResult<T> = Result<T, CollabError>;

/// Outbound side of a shared document.
pub trait CollabAdapter {
    /// Apply a partial prop update to an existing component.
    fn update_component(&mut self, slide_id: &str, component_id: &str, patch: &PropsPatch) -> CollabResult<()>;

    fn add_component(&mut self, slide_id: &str, component: &ComponentInstance) -> CollabResult<()>;

    fn remove_component(&mut self, slide_id: &str, component_id: &str) -> CollabResult<()>;

    /// Mirror a slide's components when the slide is loaded, so later
    /// updates have something to land on.
    fn seed_slide(&mut self, slide_id: &str, components: &[ComponentInstance]) -> CollabResult<()> {
        for component in components {
            self.add_component(slide_id, component)?;
        }
        Ok(())
    }
}

/// Shared handles let a host keep reading the adapter it installed.
impl<T: CollabAdapter> CollabAdapter for Rc<RefCell<T>> {
    fn update_component(&mut self, slide_id: &str, component_id: &str, patch: &PropsPatch) -> CollabResult<()> {
        self.borrow_mut().update_component(slide_id, component_id, patch)
    }

    fn add_component(&mut self, slide_id: &str, component: &ComponentInstance) -> CollabResult<()> {
        self.borrow_mut().add_component(slide_id, component)
    }

    fn remove_component(&mut self, slide_id: &str, component_id: &str) -> CollabResult<()> {
        self.borrow_mut().remove_component(slide_id, component_id)
    }

    fn seed_slide(&mut self, slide_id: &str, components: &[ComponentInstance]) -> CollabResult<()> {
        self.borrow_mut().seed_slide(slide_id, components)
    }
}

/// Gate between the store and the collaboration adapter.
///
/// Every `*_via_sync` call is a no-op when sync is disabled or no adapter
/// is installed. Adapter errors are logged and dropped.
#[derive(Default)]
pub struct SyncBridge {
    adapter: Option<Box<dyn CollabAdapter>>,
    enabled: bool,
}

impl std::fmt::Debug for SyncBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBridge")
            .field("has_adapter", &self.adapter.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl SyncBridge {
    pub fn new(enabled: bool) -> Self {
        Self {
            adapter: None,
            enabled,
        }
    }

    pub fn set_adapter(&mut self, adapter: impl CollabAdapter + 'static) {
        self.adapter = Some(Box::new(adapter));
    }

    pub fn clear_adapter(&mut self) {
        self.adapter = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether calls will reach an adapter.
    pub fn is_active(&self) -> bool {
        self.enabled && self.adapter.is_some()
    }

    fn active_adapter(&mut self) -> Option<&mut Box<dyn CollabAdapter>> {
        if self.enabled { self.adapter.as_mut() } else { None }
    }

    pub fn update_component_via_sync(&mut self, slide_id: &str, component_id: &str, patch: &PropsPatch) {
        let Some(adapter) = self.active_adapter() else {
            return;
        };
        if let Err(e) = adapter.update_component(slide_id, component_id, patch) {
            log::warn!("Failed to sync update of {} on slide {}: {}", component_id, slide_id, e);
        }
    }

    pub fn add_component_via_sync(&mut self, slide_id: &str, component: &ComponentInstance) {
        let Some(adapter) = self.active_adapter() else {
            return;
        };
        if let Err(e) = adapter.add_component(slide_id, component) {
            log::warn!("Failed to sync new component {} on slide {}: {}", component.id, slide_id, e);
        }
    }

    pub fn seed_slide_via_sync(&mut self, slide_id: &str, components: &[ComponentInstance]) {
        let Some(adapter) = self.active_adapter() else {
            return;
        };
        if let Err(e) = adapter.seed_slide(slide_id, components) {
            log::warn!("Failed to seed slide {}: {}", slide_id, e);
        }
    }

    pub fn remove_component_via_sync(&mut self, slide_id: &str, component_id: &str) {
        let Some(adapter) = self.active_adapter() else {
            return;
        };
        if let Err(e) = adapter.remove_component(slide_id, component_id) {
            log::warn!("Failed to sync removal of {} on slide {}: {}", component_id, slide_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use kurbo::{Point, Size};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail: bool,
    }

    impl CollabAdapter for Recorder {
        fn update_component(&mut self, slide_id: &str, component_id: &str, _patch: &PropsPatch) -> CollabResult<()> {
            if self.fail {
                return Err(CollabError::UnknownComponent(component_id.to_string()));
            }
            self.calls.push(format!("update {slide_id}/{component_id}"));
            Ok(())
        }

        fn add_component(&mut self, slide_id: &str, component: &ComponentInstance) -> CollabResult<()> {
            self.calls.push(format!("add {slide_id}/{}", component.id));
            Ok(())
        }

        fn remove_component(&mut self, slide_id: &str, component_id: &str) -> CollabResult<()> {
            self.calls.push(format!("remove {slide_id}/{component_id}"));
            Ok(())
        }
    }

    fn component() -> ComponentInstance {
        ComponentInstance::new("c1", ComponentKind::Image, Point::ZERO, Size::new(10.0, 10.0))
    }

    #[test]
    fn test_disabled_bridge_is_noop() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut bridge = SyncBridge::new(false);
        bridge.set_adapter(Rc::clone(&recorder));

        bridge.update_component_via_sync("s1", "c1", &PropsPatch::rotation(10.0));
        bridge.add_component_via_sync("s1", &component());
        assert!(recorder.borrow().calls.is_empty());
        assert!(!bridge.is_active());
    }

    #[test]
    fn test_unset_adapter_is_noop() {
        let mut bridge = SyncBridge::new(true);
        bridge.remove_component_via_sync("s1", "c1");
        assert!(!bridge.is_active());
    }

    #[test]
    fn test_enabled_bridge_forwards() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut bridge = SyncBridge::new(true);
        bridge.set_adapter(Rc::clone(&recorder));

        bridge.add_component_via_sync("s1", &component());
        bridge.update_component_via_sync("s1", "c1", &PropsPatch::rotation(10.0));
        bridge.remove_component_via_sync("s1", "c1");

        assert_eq!(
            recorder.borrow().calls,
            vec!["add s1/c1", "update s1/c1", "remove s1/c1"]
        );
    }

    #[test]
    fn test_adapter_errors_are_swallowed() {
        let recorder = Rc::new(RefCell::new(Recorder {
            fail: true,
            ..Recorder::default()
        }));
        let mut bridge = SyncBridge::new(true);
        bridge.set_adapter(Rc::clone(&recorder));

        // Must not panic or propagate.
        bridge.update_component_via_sync("s1", "c1", &PropsPatch::rotation(10.0));
        assert!(recorder.borrow().calls.is_empty());
    }

    #[test]
    fn test_seed_uses_add_by_default() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut bridge = SyncBridge::new(true);
        bridge.set_adapter(Rc::clone(&recorder));

        let mut second = component();
        second.id = "c2".to_string();
        bridge.seed_slide_via_sync("s1", &[component(), second]);
        assert_eq!(recorder.borrow().calls, vec!["add s1/c1", "add s1/c2"]);

        bridge.disable();
        bridge.seed_slide_via_sync("s2", &[component()]);
        assert_eq!(recorder.borrow().calls.len(), 2);
    }
}
