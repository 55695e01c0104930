//! Slides and decks.

use crate::components::{ComponentId, ComponentInstance, SlideId};
use crate::config::{DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Slide background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Background {
    Color { color: SerializableColor },
    Image { url: String },
}

impl Default for Background {
    fn default() -> Self {
        Background::Color {
            color: SerializableColor::white(),
        }
    }
}

/// A slide: an ordered component list plus a background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
    #[serde(default)]
    pub background: Background,
}

impl Slide {
    pub fn new(id: impl Into<SlideId>) -> Self {
        Self {
            id: id.into(),
            components: Vec::new(),
            background: Background::default(),
        }
    }

    pub fn with_components(mut self, components: Vec<ComponentInstance>) -> Self {
        self.components = components;
        self
    }

    pub fn component(&self, id: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.iter().map(|c| c.id.clone()).collect()
    }
}

/// A deck of slides sharing one coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            width: DEFAULT_SLIDE_WIDTH,
            height: DEFAULT_SLIDE_HEIGHT,
            slides: Vec::new(),
        }
    }

    pub fn slide(&self, id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    pub fn slide_mut(&mut self, id: &str) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| s.id == id)
    }

    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use kurbo::{Point, Size};

    #[test]
    fn test_deck_defaults() {
        let deck = Deck::new("Quarterly");
        assert_eq!(deck.width, 1920.0);
        assert_eq!(deck.height, 1080.0);
        assert!(deck.slides.is_empty());
        assert!(!deck.id.is_empty());
    }

    #[test]
    fn test_deck_json_roundtrip() {
        let mut deck = Deck::new("Roadmap");
        let mut slide = Slide::new("s1").with_components(vec![
            ComponentInstance::new("title", ComponentKind::TiptapTextBlock, Point::new(100.0, 80.0), Size::new(800.0, 120.0)),
            ComponentInstance::line("arrow", Point::new(100.0, 400.0), Point::new(600.0, 400.0)),
        ]);
        slide.background = Background::Image {
            url: "https://cdn.example.com/bg.png".to_string(),
        };
        deck.add_slide(slide);

        let json = deck.to_json().unwrap();
        let restored = Deck::from_json(&json).unwrap();
        assert_eq!(restored, deck);
        assert_eq!(restored.slide("s1").unwrap().component_ids(), vec!["title", "arrow"]);
    }

    #[test]
    fn test_color_conversion() {
        let color = SerializableColor::new(10, 20, 30, 255);
        let peniko_color: Color = color.into();
        assert_eq!(SerializableColor::from(peniko_color), color);
    }

    #[test]
    fn test_background_json_tag() {
        let json = serde_json::to_value(Background::default()).unwrap();
        assert_eq!(json["kind"], "color");
        assert_eq!(json["color"]["r"], 255);
    }
}
