//! Named rectangular regions that bound the scoped camera mode.

use std::collections::HashMap;

use crate::geometry::{map_marker_to_world, map_to_world, WorldRect};
use crate::level_data::{LevelData, PropertyValue, TileRect};

/// A registered view zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewZoneEntry {
    pub id: i64,
    pub rect: WorldRect,
}

/// Id to rect lookup, filled at load time.
#[derive(Clone, Debug, Default)]
pub struct ViewZoneRegistry {
    zones: HashMap<i64, WorldRect>,
}

impl ViewZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone. An existing id is silently overwritten.
    pub fn register(&mut self, id: i64, rect: WorldRect) {
        if self.zones.insert(id, rect).is_some() {
            log::debug!("view zone {id} re-registered; keeping the latest rect");
        }
    }

    pub fn lookup(&self, id: i64) -> Option<WorldRect> {
        self.zones.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// All entries, ordered by id.
    pub fn entries(&self) -> Vec<ViewZoneEntry> {
        let mut entries: Vec<ViewZoneEntry> = self
            .zones
            .iter()
            .map(|(&id, &rect)| ViewZoneEntry { id, rect })
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }
}

/// A non-zone object from the objects group, handed to the outer game for
/// prefab instancing.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub name: String,
    pub rect: WorldRect,
    pub properties: HashMap<String, PropertyValue>,
}

/// How view-zone markers are recognised in the objects group.
#[derive(Clone, Debug)]
pub struct ZoneMarker<'a> {
    /// Case-insensitive substring of the object name.
    pub keyword: &'a str,
    /// Integer property carrying the zone id.
    pub id_property: &'a str,
}

/// Result of scanning the objects group.
#[derive(Debug, Default)]
pub struct ObjectScan {
    pub zones: ViewZoneRegistry,
    pub spawns: Vec<SpawnRequest>,
}

/// Scan `group_name` once: view-zone markers go to the registry, everything
/// else becomes a spawn request. Malformed rects are skipped either way.
pub fn scan_objects(data: &LevelData, group_name: &str, marker: &ZoneMarker<'_>) -> ObjectScan {
    let mut scan = ObjectScan::default();

    let Some(group) = data.object_group(group_name) else {
        log::warn!("object group `{group_name}` not found; no view zones or spawns");
        return scan;
    };

    let (map_w, map_h) = data.map_pixel_size();
    for object in &group.objects {
        let is_zone = object.name_contains(marker.keyword);
        // Zones need area; spawn markers may be points or lines.
        let rect = if is_zone {
            map_to_world(object, map_w, map_h)
        } else {
            map_marker_to_world(object, map_w, map_h)
        };
        let Some(rect) = rect else {
            log::debug!("skipping malformed object `{}` in `{group_name}`", object.name);
            continue;
        };

        if is_zone {
            register_marker(&mut scan.zones, object, rect, marker.id_property);
        } else {
            scan.spawns.push(SpawnRequest {
                name: object.name.clone(),
                rect,
                properties: object.properties.clone(),
            });
        }
    }

    log::info!(
        "scanned `{group_name}`: {} view zones, {} spawn requests",
        scan.zones.len(),
        scan.spawns.len()
    );
    scan
}

fn register_marker(zones: &mut ViewZoneRegistry, object: &TileRect, rect: WorldRect, key: &str) {
    match object.int_property(key) {
        Some(id) => zones.register(id, rect),
        None => log::warn!(
            "view zone `{}` has no integer `{key}` property; ignored",
            object.name
        ),
    }
}
