//! Typed interaction events.
//!
//! Gestures publish what they do on an [`EventBus`]; hosts (toolbars,
//! guides, the multi-selection overlay) subscribe. A subscription lives as
//! long as its [`Subscription`] guard.

use crate::components::ComponentId;
use kurbo::{Point, Vec2};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Something that happened during a pointer gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A component's position changed during a drag.
    PositionUpdated {
        component_id: ComponentId,
        position: Point,
    },
    DragStart {
        component_id: ComponentId,
    },
    DragEnd {
        component_id: ComponentId,
        position: Point,
    },
    Rotate {
        component_id: ComponentId,
        rotation: f64,
    },
    RotateEnd {
        component_id: ComponentId,
        rotation: f64,
    },
    Resize {
        component_id: ComponentId,
        position: Point,
        width: f64,
        height: f64,
    },
    ResizeEnd {
        component_id: ComponentId,
        position: Point,
        width: f64,
        height: f64,
    },
    SelectionDragStart {
        component_ids: Vec<ComponentId>,
    },
    /// Total delta since the start of the group drag.
    SelectionDragMove {
        delta: Vec2,
    },
    SelectionDragEnd {
        delta: Vec2,
    },
}

impl EditorEvent {
    /// Event name as used by the surrounding editor shell.
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::PositionUpdated { .. } => "component-position-updated",
            EditorEvent::DragStart { .. } => "component:dragstart",
            EditorEvent::DragEnd { .. } => "component:dragend",
            EditorEvent::Rotate { .. } => "component:rotate",
            EditorEvent::RotateEnd { .. } => "component:rotate-end",
            EditorEvent::Resize { .. } => "component:resize",
            EditorEvent::ResizeEnd { .. } => "component:resize-end",
            EditorEvent::SelectionDragStart { .. } => "selection:drag-start",
            EditorEvent::SelectionDragMove { .. } => "selection:drag-move",
            EditorEvent::SelectionDragEnd { .. } => "selection:drag-end",
        }
    }

    /// The component this event is about, if it concerns a single one.
    pub fn component_id(&self) -> Option<&str> {
        match self {
            EditorEvent::PositionUpdated { component_id, .. }
            | EditorEvent::DragStart { component_id }
            | EditorEvent::DragEnd { component_id, .. }
            | EditorEvent::Rotate { component_id, .. }
            | EditorEvent::RotateEnd { component_id, .. }
            | EditorEvent::Resize { component_id, .. }
            | EditorEvent::ResizeEnd { component_id, .. } => Some(component_id),
            _ => None,
        }
    }
}

type Listener = Rc<dyn Fn(&EditorEvent)>;
type Listeners = RefCell<Vec<(u64, Listener)>>;

/// Observer registry for [`EditorEvent`]s.
///
/// Single-threaded: listeners are plain closures, and delivery happens
/// synchronously in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Rc<Listeners>,
    next_id: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned guard
    /// is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&EditorEvent) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every listener registered at the time of the call.
    pub fn emit(&self, event: &EditorEvent) {
        // Listeners may subscribe or unsubscribe while we deliver.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Guard returned by [`EventBus::subscribe`].
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Unsubscribe now. Same as dropping the guard.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
