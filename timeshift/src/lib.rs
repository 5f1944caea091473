//! Timeshift - the core of a dual-timeline 2D platformer.
//!
//! A level exists in two timelines, Past and Future, each with its own
//! static collision geometry. The player toggles between them unless the
//! destination geometry would trap them. Around that sit the tile-to-world
//! mapping, view zones for a scoped camera, and a follow camera with shake.

pub mod camera;
pub mod collision_layer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hazards;
pub mod level;
pub mod level_data;
pub mod math;
pub mod physics;
pub mod scheduler;
pub mod stuck_guard;
pub mod telescope;
pub mod timeline;
pub mod view_zone;

pub use crate::camera::{CameraBounds, CameraMode, CameraRig, CameraSettings};
pub use crate::collision_layer::{CollisionBody, CollisionLayer, CollisionLayerBuilder, TimelineState};
pub use crate::config::LevelConfig;
pub use crate::error::LevelError;
pub use crate::geometry::{map_bounds, map_marker_to_world, map_to_tile, map_to_world, WorldRect};
pub use crate::hazards::{LaserReport, LaserTrap};
pub use crate::level::{FrameInput, Level};
pub use crate::level_data::{LevelData, ObjectGroup, PropertyValue, TileRect};
pub use crate::math::Vec2;
pub use crate::physics::{PhysicsWorld, StaticBodyId, LEVEL_GEOMETRY_GROUP};
pub use crate::scheduler::{Fired, Scheduler, TimerHandle};
pub use crate::stuck_guard::StuckGuard;
pub use crate::telescope::{PanKeys, Telescope};
pub use crate::timeline::{
    SharedListener, TimeListener, TimelineController, TimelineEvent, ToggleOutcome, VisualLayers,
};
pub use crate::view_zone::{scan_objects, ObjectScan, SpawnRequest, ViewZoneEntry, ViewZoneRegistry, ZoneMarker};
