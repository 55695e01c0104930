//! DeckForge Core Library
//!
//! Platform-agnostic direct-manipulation core for the DeckForge slide
//! editor: selection handles, multi-selection drags, line connectors,
//! per-slide undo/redo and the outbound collaboration boundary.

pub mod collab;
pub mod components;
pub mod config;
pub mod connectors;
pub mod editor;
pub mod error;
pub mod events;
pub mod history;
pub mod input;
pub mod interaction;
pub mod keyboard;
pub mod multi_selection;
pub mod selection;
pub mod slide;
pub mod store;
pub mod viewport;

pub use collab::{CollabAdapter, CollabError, LoroSlideDocument, SyncBridge};
pub use components::{ComponentId, ComponentInstance, ComponentKind, PropsPatch, SlideId};
pub use config::EditorConfig;
pub use editor::{Editor, PointerTarget};
pub use error::{EditorError, EditorResult};
pub use events::{EditorEvent, EventBus, Subscription};
pub use history::HistoryStore;
pub use input::{KeyEvent, Modifiers};
pub use interaction::{ClickOutcome, DoubleClickOutcome, SelectionInteraction};
pub use keyboard::{ShortcutAction, ShortcutRegistry};
pub use selection::{HandleKind, ResizeDirection};
pub use slide::{Deck, Slide};
pub use store::EditorStore;
pub use viewport::Viewport;
