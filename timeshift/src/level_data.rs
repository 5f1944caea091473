//! Load-time object feed.
//!
//! The authoring tool's file format is parsed elsewhere; this module only
//! models what the level core consumes: map dimensions plus ordered, named
//! groups of rectangles with names and scalar properties. The model is serde
//! friendly so fixtures and converted maps can be stored as JSON.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// A scalar property attached to an authored object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Interpret the value as an integer.
    ///
    /// Authoring tools are loose about number types, so integral floats and
    /// numeric strings are accepted too.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Raw authored rectangle in tile space (origin top-left, Y down).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl TileRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            name: String::new(),
            properties: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(PropertyValue::as_int)
    }

    /// Case-insensitive substring match against the object name.
    pub fn name_contains(&self, keyword: &str) -> bool {
        if keyword.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// A named, ordered group of authored objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroup {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<TileRect>,
}

/// Everything the level core reads from the authoring data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    #[serde(default)]
    pub object_groups: Vec<ObjectGroup>,
}

impl LevelData {
    pub fn new(width: u32, height: u32, tile_width: f32, tile_height: f32) -> Self {
        Self {
            width,
            height,
            tile_width,
            tile_height,
            object_groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, objects: Vec<TileRect>) -> Self {
        self.object_groups.push(ObjectGroup {
            name: name.into(),
            objects,
        });
        self
    }

    /// Total map size in pixels (`width * tile_width`, `height * tile_height`).
    pub fn map_pixel_size(&self) -> (f32, f32) {
        (
            self.width as f32 * self.tile_width,
            self.height as f32 * self.tile_height,
        )
    }

    /// Look up an object group by exact name. The first match wins.
    pub fn object_group(&self, name: &str) -> Option<&ObjectGroup> {
        self.object_groups.iter().find(|g| g.name == name)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load level data from a JSON file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading level data from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing level data in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_with_mixed_property_types() {
        let json = r#"{
            "width": 40,
            "height": 20,
            "tile_width": 32,
            "tile_height": 32,
            "object_groups": [
                { "name": "Past_Col", "objects": [ { "x": 0, "y": 576, "width": 1280, "height": 64 } ] },
                { "name": "Objects", "objects": [
                    { "x": 64, "y": 64, "width": 320, "height": 160, "name": "ViewZone_A",
                      "properties": { "boundID": 101, "note": "cliff", "flag": true, "scale": 1.5 } }
                ] }
            ]
        }"#;

        let data = LevelData::from_json(json).unwrap();
        assert_eq!(data.map_pixel_size(), (1280.0, 640.0));

        let past = data.object_group("Past_Col").unwrap();
        assert_eq!(past.objects.len(), 1);
        assert!(past.objects[0].name.is_empty());

        let zone = &data.object_group("Objects").unwrap().objects[0];
        assert_eq!(zone.int_property("boundID"), Some(101));
        assert_eq!(zone.int_property("note"), None);
        assert_eq!(zone.int_property("flag"), None);
        assert_eq!(zone.int_property("scale"), None);
        assert!(data.object_group("Future_Col").is_none());
    }

    #[test]
    fn loose_integer_properties() {
        assert_eq!(PropertyValue::Float(7.0).as_int(), Some(7));
        assert_eq!(PropertyValue::String(" 12 ".into()).as_int(), Some(12));
        assert_eq!(PropertyValue::Float(f64::NAN).as_int(), None);
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let rect = TileRect::new(0.0, 0.0, 1.0, 1.0).with_name("Cliff_VIEWZONE_2");
        assert!(rect.name_contains("viewzone"));
        assert!(!rect.name_contains("telescope"));
        assert!(!rect.name_contains(""));
    }

    #[test]
    fn saved_feed_loads_back_from_disk() {
        let data = LevelData::new(10, 5, 16.0, 16.0).with_group(
            "Objects",
            vec![TileRect::new(8.0, 8.0, 32.0, 16.0)
                .with_name("ViewZone")
                .with_property("boundID", PropertyValue::Int(4))],
        );
        let path = std::env::temp_dir().join(format!("timeshift_feed_{}.json", std::process::id()));
        std::fs::write(&path, data.to_json().unwrap()).unwrap();

        let loaded = LevelData::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, data);

        let err = LevelData::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("reading level data"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = LevelData::from_json("{ \"width\": 4 ").unwrap_err();
        assert!(matches!(err, LevelError::Parse(_)));
    }
}
