//! Loro-backed shared slide document.
//!
//! # Schema
//!
//! ```text
//! LoroDoc
//! └── "slides": LoroMap<SlideId, LoroMap>
//!     ├── "components": LoroMap<ComponentId, LoroMap> (component fields)
//!     └── "order": LoroList<String> (component ids, back to front)
//! ```
//!
//! Component fields are stored flat (`x`, `y`, `width`, `rotation`,
//! `start_x`, ...) so that concurrent edits to different props of the same
//! component merge instead of overwriting each other. Type-specific props
//! live in a nested `extra` map as JSON strings.

use super::{CollabAdapter, CollabError, CollabResult};
use crate::components::{
    AnchorSide, ComponentId, ComponentInstance, ComponentKind, ComponentProps, Connection, LineEndpoint,
    LinesProps, PropsPatch,
};
use kurbo::Point;
use loro::{ExportMode, LoroDoc, LoroList, LoroMap, LoroMapValue, LoroValue, ValueOrContainer, VersionVector};

/// Root map of slides.
pub const SLIDES_KEY: &str = "slides";
/// Per-slide map of components.
pub const COMPONENTS_KEY: &str = "components";
/// Per-slide list of component ids.
pub const ORDER_KEY: &str = "order";

const KEY_TYPE: &str = "type";
const KEY_ID: &str = "id";
const KEY_X: &str = "x";
const KEY_Y: &str = "y";
const KEY_WIDTH: &str = "width";
const KEY_HEIGHT: &str = "height";
const KEY_ROTATION: &str = "rotation";
const KEY_Z_INDEX: &str = "z_index";
const KEY_IS_BACKGROUND: &str = "is_background";
const KEY_CHILDREN: &str = "children";
const KEY_EXTRA: &str = "extra";

struct EndpointKeys {
    x: &'static str,
    y: &'static str,
    connection_id: &'static str,
    connection_side: &'static str,
}

const START_KEYS: EndpointKeys = EndpointKeys {
    x: "start_x",
    y: "start_y",
    connection_id: "start_connection_id",
    connection_side: "start_connection_side",
};

const END_KEYS: EndpointKeys = EndpointKeys {
    x: "end_x",
    y: "end_y",
    connection_id: "end_connection_id",
    connection_side: "end_connection_side",
};

fn side_to_str(side: AnchorSide) -> &'static str {
    match side {
        AnchorSide::Top => "top",
        AnchorSide::Right => "right",
        AnchorSide::Bottom => "bottom",
        AnchorSide::Left => "left",
        AnchorSide::Center => "center",
    }
}

fn side_from_str(side: &str) -> Option<AnchorSide> {
    match side {
        "top" => Some(AnchorSide::Top),
        "right" => Some(AnchorSide::Right),
        "bottom" => Some(AnchorSide::Bottom),
        "left" => Some(AnchorSide::Left),
        "center" => Some(AnchorSide::Center),
        _ => None,
    }
}

fn get_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn get_i64(map: &LoroMapValue, key: &str) -> Option<i64> {
    match map.get(key)? {
        LoroValue::I64(i) => Some(*i),
        LoroValue::Double(d) => Some(*d as i64),
        _ => None,
    }
}

fn get_string(map: &LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn get_bool(map: &LoroMapValue, key: &str) -> Option<bool> {
    match map.get(key)? {
        LoroValue::Bool(b) => Some(*b),
        _ => None,
    }
}

fn endpoint_to_loro(endpoint: &LineEndpoint, keys: &EndpointKeys, map: &LoroMap) -> CollabResult<()> {
    map.insert(keys.x, endpoint.x)?;
    map.insert(keys.y, endpoint.y)?;
    match &endpoint.connection {
        Some(connection) => {
            map.insert(keys.connection_id, connection.component_id.clone())?;
            map.insert(keys.connection_side, side_to_str(connection.side))?;
        }
        None => {
            map.delete(keys.connection_id)?;
            map.delete(keys.connection_side)?;
        }
    }
    Ok(())
}

fn endpoint_from_loro(map: &LoroMapValue, keys: &EndpointKeys) -> Option<LineEndpoint> {
    let point = Point::new(get_double(map, keys.x)?, get_double(map, keys.y)?);
    let connection = match (
        get_string(map, keys.connection_id),
        get_string(map, keys.connection_side).as_deref().and_then(side_from_str),
    ) {
        (Some(component_id), Some(side)) => Some(Connection { component_id, side }),
        _ => None,
    };
    Some(LineEndpoint {
        x: point.x,
        y: point.y,
        connection,
    })
}

/// Write the present fields of a patch into a component map.
fn patch_to_loro(patch: &PropsPatch, map: &LoroMap) -> CollabResult<()> {
    if let Some(position) = patch.position {
        map.insert(KEY_X, position.x)?;
        map.insert(KEY_Y, position.y)?;
    }
    if let Some(width) = patch.width {
        map.insert(KEY_WIDTH, width)?;
    }
    if let Some(height) = patch.height {
        map.insert(KEY_HEIGHT, height)?;
    }
    if let Some(rotation) = patch.rotation {
        map.insert(KEY_ROTATION, rotation)?;
    }
    if let Some(z_index) = patch.z_index {
        map.insert(KEY_Z_INDEX, z_index)?;
    }
    if let Some(is_background) = patch.is_background {
        map.insert(KEY_IS_BACKGROUND, is_background)?;
    }
    if let Some(start) = &patch.start_point {
        endpoint_to_loro(start, &START_KEYS, map)?;
    }
    if let Some(end) = &patch.end_point {
        endpoint_to_loro(end, &END_KEYS, map)?;
    }
    if let Some(children) = &patch.children {
        let list = map.insert_container(KEY_CHILDREN, LoroList::new())?;
        for child in children {
            list.push(LoroValue::String(child.clone().into()))?;
        }
    }
    if !patch.extra.is_empty() {
        let extra = map.get_or_create_container(KEY_EXTRA, LoroMap::new())?;
        for (key, value) in &patch.extra {
            extra.insert(key, serde_json::to_string(value)?)?;
        }
    }
    Ok(())
}

fn component_from_loro(map: &LoroMapValue) -> Option<ComponentInstance> {
    let id = get_string(map, KEY_ID)?;
    let kind = ComponentKind::parse(&get_string(map, KEY_TYPE)?)?;

    let mut props = ComponentProps::new(
        Point::new(get_double(map, KEY_X)?, get_double(map, KEY_Y)?),
        get_double(map, KEY_WIDTH).unwrap_or(0.0),
        get_double(map, KEY_HEIGHT).unwrap_or(0.0),
    );
    props.rotation = get_double(map, KEY_ROTATION).unwrap_or(0.0);
    props.z_index = get_i64(map, KEY_Z_INDEX).unwrap_or(0);
    props.is_background = get_bool(map, KEY_IS_BACKGROUND).unwrap_or(false);

    if let (Some(start_point), Some(end_point)) = (
        endpoint_from_loro(map, &START_KEYS),
        endpoint_from_loro(map, &END_KEYS),
    ) {
        props.lines = Some(LinesProps { start_point, end_point });
    }

    if let Some(LoroValue::List(children)) = map.get(KEY_CHILDREN) {
        props.children = children
            .iter()
            .filter_map(|child| match child {
                LoroValue::String(s) => Some(s.to_string()),
                _ => None,
            })
            .collect();
    }

    if let Some(LoroValue::Map(extra)) = map.get(KEY_EXTRA) {
        for (key, value) in extra.iter() {
            if let LoroValue::String(json) = value {
                match serde_json::from_str(&json.to_string()) {
                    Ok(value) => {
                        props.extra.insert(key.clone(), value);
                    }
                    Err(e) => log::warn!("Skipping malformed prop {} on {}: {}", key, id, e),
                }
            }
        }
    }

    Some(ComponentInstance { id, kind, props })
}

/// Shared slide document backed by a Loro CRDT.
///
/// Writes are field-granular and each call commits its own transaction.
/// Reading remote changes back into the editor is left to the host.
pub struct LoroSlideDocument {
    doc: LoroDoc,
}

impl Default for LoroSlideDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LoroSlideDocument {
    pub fn new() -> Self {
        Self { doc: LoroDoc::new() }
    }

    /// Create a document from a snapshot.
    pub fn from_snapshot(bytes: &[u8]) -> CollabResult<Self> {
        let doc = LoroDoc::new();
        doc.import(bytes)?;
        Ok(Self { doc })
    }

    /// Get the underlying LoroDoc.
    pub fn loro_doc(&self) -> &LoroDoc {
        &self.doc
    }

    fn slides_map(&self) -> LoroMap {
        self.doc.get_map(SLIDES_KEY)
    }

    /// Slide map, created on first use.
    fn slide_map(&self, slide_id: &str) -> CollabResult<LoroMap> {
        Ok(self.slides_map().get_or_create_container(slide_id, LoroMap::new())?)
    }

    /// Slide map, only if the slide already exists.
    fn existing_slide_map(&self, slide_id: &str) -> CollabResult<LoroMap> {
        if self.slides_map().get(slide_id).is_none() {
            return Err(CollabError::UnknownSlide(slide_id.to_string()));
        }
        self.slide_map(slide_id)
    }

    fn components_map(slide: &LoroMap) -> CollabResult<LoroMap> {
        Ok(slide.get_or_create_container(COMPONENTS_KEY, LoroMap::new())?)
    }

    fn order_list(slide: &LoroMap) -> CollabResult<LoroList> {
        Ok(slide.get_or_create_container(ORDER_KEY, LoroList::new())?)
    }

    /// Ids of the slides present in the document.
    pub fn slide_ids(&self) -> Vec<String> {
        match self.slides_map().get_deep_value() {
            LoroValue::Map(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Read a slide's components back, in stored order.
    pub fn slide_components(&self, slide_id: &str) -> Vec<ComponentInstance> {
        let LoroValue::Map(slides) = self.slides_map().get_deep_value() else {
            return Vec::new();
        };
        let Some(LoroValue::Map(slide)) = slides.get(slide_id) else {
            return Vec::new();
        };
        let Some(LoroValue::Map(components)) = slide.get(COMPONENTS_KEY) else {
            return Vec::new();
        };
        let order: Vec<ComponentId> = match slide.get(ORDER_KEY) {
            Some(LoroValue::List(list)) => list
                .iter()
                .filter_map(|v| match v {
                    LoroValue::String(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        order
            .iter()
            .filter_map(|id| match components.get(id) {
                Some(LoroValue::Map(component)) => component_from_loro(component),
                _ => None,
            })
            .collect()
    }

    /// Read a single component.
    pub fn component(&self, slide_id: &str, component_id: &str) -> Option<ComponentInstance> {
        self.slide_components(slide_id)
            .into_iter()
            .find(|c| c.id == component_id)
    }

    /// Export the document as a snapshot (full state).
    pub fn export_snapshot(&self) -> Vec<u8> {
        self.doc.export(ExportMode::Snapshot).unwrap_or_default()
    }

    /// Export incremental updates since a version.
    pub fn export_updates(&self, since: &VersionVector) -> Vec<u8> {
        self.doc.export(ExportMode::updates(since)).unwrap_or_default()
    }

    /// Import updates from another document.
    pub fn import(&mut self, bytes: &[u8]) -> CollabResult<()> {
        self.doc.import(bytes)?;
        Ok(())
    }

    /// Get the current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }
}

/// Write a whole component, appending it to the order list if it is new.
fn write_component(components: &LoroMap, order: &LoroList, component: &ComponentInstance) -> CollabResult<()> {
    let is_new = components.get(&component.id).is_none();

    let map = components.insert_container(&component.id, LoroMap::new())?;
    map.insert(KEY_TYPE, component.kind.as_str())?;
    map.insert(KEY_ID, component.id.clone())?;
    patch_to_loro(&PropsPatch::from_props(&component.props), &map)?;

    if is_new {
        order.push(LoroValue::String(component.id.clone().into()))?;
    }
    Ok(())
}

impl CollabAdapter for LoroSlideDocument {
    fn update_component(&mut self, slide_id: &str, component_id: &str, patch: &PropsPatch) -> CollabResult<()> {
        let slide = self.existing_slide_map(slide_id)?;
        let components = Self::components_map(&slide)?;
        if components.get(component_id).is_none() {
            return Err(CollabError::UnknownComponent(component_id.to_string()));
        }
        let component = components.get_or_create_container(component_id, LoroMap::new())?;
        patch_to_loro(patch, &component)?;
        self.doc.commit();
        Ok(())
    }

    fn add_component(&mut self, slide_id: &str, component: &ComponentInstance) -> CollabResult<()> {
        let slide = self.slide_map(slide_id)?;
        let components = Self::components_map(&slide)?;
        let order = Self::order_list(&slide)?;
        write_component(&components, &order, component)?;
        self.doc.commit();
        Ok(())
    }

    /// Components already in the document are left alone: a peer may have
    /// edited them since the local copy was loaded.
    fn seed_slide(&mut self, slide_id: &str, seed: &[ComponentInstance]) -> CollabResult<()> {
        let slide = self.slide_map(slide_id)?;
        let components = Self::components_map(&slide)?;
        let order = Self::order_list(&slide)?;
        for component in seed.iter().filter(|c| components.get(&c.id).is_none()) {
            write_component(&components, &order, component)?;
        }
        self.doc.commit();
        Ok(())
    }

    fn remove_component(&mut self, slide_id: &str, component_id: &str) -> CollabResult<()> {
        let slide = self.existing_slide_map(slide_id)?;
        let components = Self::components_map(&slide)?;
        let order = Self::order_list(&slide)?;
        if components.get(component_id).is_none() {
            return Err(CollabError::UnknownComponent(component_id.to_string()));
        }

        components.delete(component_id)?;
        for i in 0..order.len() {
            if let Some(ValueOrContainer::Value(LoroValue::String(s))) = order.get(i) {
                if s.as_ref() == component_id {
                    order.delete(i, 1)?;
                    break;
                }
            }
        }

        self.doc.commit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn text_block() -> ComponentInstance {
        let mut c = ComponentInstance::new(
            "title",
            ComponentKind::TiptapTextBlock,
            Point::new(100.0, 200.0),
            Size::new(400.0, 80.0),
        )
        .with_rotation(15.0)
        .with_z_index(3);
        c.props
            .extra
            .insert("fontSize".to_string(), serde_json::json!(32));
        c
    }

    #[test]
    fn test_add_and_read_back() {
        let mut doc = LoroSlideDocument::new();
        let original = text_block();
        doc.add_component("s1", &original).unwrap();

        let components = doc.slide_components("s1");
        assert_eq!(components, vec![original]);
        assert_eq!(doc.slide_ids(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_field_granular_update() {
        let mut doc = LoroSlideDocument::new();
        doc.add_component("s1", &text_block()).unwrap();

        doc.update_component("s1", "title", &PropsPatch::position(Point::new(5.0, 6.0)))
            .unwrap();

        let updated = doc.component("s1", "title").unwrap();
        assert_eq!(updated.props.position, Point::new(5.0, 6.0));
        assert_eq!(updated.props.width, 400.0);
        assert_eq!(updated.props.rotation, 15.0);
    }

    #[test]
    fn test_line_connection_roundtrip_and_clear() {
        let mut doc = LoroSlideDocument::new();
        let mut line = ComponentInstance::line("l1", Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        if let Some(lines) = line.props.lines.as_mut() {
            lines.end_point.connection = Some(Connection {
                component_id: "box".to_string(),
                side: AnchorSide::Left,
            });
        }
        doc.add_component("s1", &line).unwrap();
        assert_eq!(doc.component("s1", "l1").unwrap(), line);

        let patch = PropsPatch {
            end_point: Some(LineEndpoint::free(Point::new(300.0, 300.0))),
            ..PropsPatch::default()
        };
        doc.update_component("s1", "l1", &patch).unwrap();

        let lines = doc.component("s1", "l1").unwrap().props.lines.unwrap();
        assert_eq!(lines.end_point.point(), Point::new(300.0, 300.0));
        assert!(lines.end_point.connection.is_none());
    }

    #[test]
    fn test_remove_component() {
        let mut doc = LoroSlideDocument::new();
        doc.add_component("s1", &text_block()).unwrap();
        doc.remove_component("s1", "title").unwrap();
        assert!(doc.slide_components("s1").is_empty());
    }

    #[test]
    fn test_unknown_targets() {
        let mut doc = LoroSlideDocument::new();
        let result = doc.update_component("nope", "x", &PropsPatch::rotation(1.0));
        assert!(matches!(result, Err(CollabError::UnknownSlide(_))));

        doc.add_component("s1", &text_block()).unwrap();
        let result = doc.update_component("s1", "missing", &PropsPatch::rotation(1.0));
        assert!(matches!(result, Err(CollabError::UnknownComponent(_))));

        let result = doc.remove_component("s1", "missing");
        assert!(matches!(result, Err(CollabError::UnknownComponent(_))));
    }

    #[test]
    fn test_group_children_roundtrip() {
        let mut doc = LoroSlideDocument::new();
        let group = ComponentInstance::group(
            "g1",
            kurbo::Rect::new(0.0, 0.0, 100.0, 100.0),
            vec!["a".to_string(), "b".to_string()],
        );
        doc.add_component("s1", &group).unwrap();
        assert_eq!(doc.component("s1", "g1").unwrap().props.children, vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_and_updates_sync_peers() {
        let mut doc = LoroSlideDocument::new();
        doc.add_component("s1", &text_block()).unwrap();

        let mut peer = LoroSlideDocument::from_snapshot(&doc.export_snapshot()).unwrap();
        assert_eq!(peer.slide_components("s1").len(), 1);

        let since = peer.version();
        doc.update_component("s1", "title", &PropsPatch::rotation(90.0)).unwrap();
        peer.import(&doc.export_updates(&since)).unwrap();

        assert_eq!(peer.component("s1", "title").unwrap().props.rotation, 90.0);
    }

    #[test]
    fn test_seed_keeps_existing_components() {
        let mut doc = LoroSlideDocument::new();
        doc.add_component("s1", &text_block()).unwrap();
        doc.update_component("s1", "title", &PropsPatch::rotation(45.0)).unwrap();

        let image = ComponentInstance::new("img", ComponentKind::Image, Point::ZERO, Size::new(10.0, 10.0));
        doc.seed_slide("s1", &[text_block(), image.clone()]).unwrap();

        let components = doc.slide_components("s1");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].props.rotation, 45.0);
        assert_eq!(components[1], image);

        // Seeded components accept field updates.
        doc.update_component("s1", "img", &PropsPatch::position(Point::new(7.0, 8.0)))
            .unwrap();
        assert_eq!(doc.component("s1", "img").unwrap().props.position, Point::new(7.0, 8.0));
    }
}
