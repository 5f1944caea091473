//! Per-timeline static collision layers built from authored object groups.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{map_to_world, WorldRect};
use crate::level_data::LevelData;
use crate::physics::{PhysicsWorld, StaticBodyId, LEVEL_GEOMETRY_GROUP};

/// One of the two mutually exclusive world variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineState {
    #[default]
    Past,
    Future,
}

impl TimelineState {
    pub fn opposite(self) -> Self {
        match self {
            TimelineState::Past => TimelineState::Future,
            TimelineState::Future => TimelineState::Past,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimelineState::Past => "Past",
            TimelineState::Future => "Future",
        }
    }
}

impl fmt::Display for TimelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A static rectangle of level geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionBody {
    pub rect: WorldRect,
    pub group: u32,
    handle: StaticBodyId,
}

impl CollisionBody {
    pub fn handle(&self) -> StaticBodyId {
        self.handle
    }
}

/// The bodies belonging to one timeline.
///
/// A layer never flips its own `active` flag; the timeline controller is the
/// only writer so that exactly one layer is active at a time.
#[derive(Debug)]
pub struct CollisionLayer {
    timeline: TimelineState,
    bodies: Vec<CollisionBody>,
    active: bool,
}

impl CollisionLayer {
    /// An empty, inactive layer.
    pub fn empty(timeline: TimelineState) -> Self {
        Self {
            timeline,
            bodies: Vec::new(),
            active: false,
        }
    }

    pub fn timeline(&self) -> TimelineState {
        self.timeline
    }

    pub(crate) fn retag(&mut self, timeline: TimelineState) {
        self.timeline = timeline;
    }

    pub fn bodies(&self) -> &[CollisionBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Any body overlapping `rect` (open intersection).
    pub fn any_intersects(&self, rect: &WorldRect) -> bool {
        self.bodies.iter().any(|b| b.rect.intersects(rect))
    }

    pub(crate) fn set_active(&mut self, active: bool, physics: &mut PhysicsWorld) {
        self.active = active;
        physics.set_enabled_all(self.bodies.iter().map(|b| b.handle), active);
    }

    /// Remove every body from the physics world, leaving an empty, inactive
    /// layer. Must be called before rebuilding the same timeline.
    pub fn discard(&mut self, physics: &mut PhysicsWorld) {
        physics.remove_all(self.bodies.drain(..).map(|b| b.handle));
        self.active = false;
    }
}

/// Builds a [`CollisionLayer`] from a named object group.
pub struct CollisionLayerBuilder<'a> {
    data: &'a LevelData,
    group: u32,
}

impl<'a> CollisionLayerBuilder<'a> {
    pub fn new(data: &'a LevelData) -> Self {
        Self {
            data,
            group: LEVEL_GEOMETRY_GROUP,
        }
    }

    /// Override the physics group tag given to every body.
    #[must_use]
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Build the layer for `timeline` from `group_name`.
    ///
    /// A missing group yields an empty layer. Malformed objects are skipped.
    /// Calling this twice for the same timeline without discarding the first
    /// layer leaves duplicate bodies in `physics`.
    pub fn build(
        &self,
        group_name: &str,
        timeline: TimelineState,
        physics: &mut PhysicsWorld,
    ) -> CollisionLayer {
        let mut layer = CollisionLayer::empty(timeline);

        let Some(group) = self.data.object_group(group_name) else {
            log::warn!(
                "object group `{group_name}` not found; {timeline} layer will have no collision"
            );
            return layer;
        };

        let (map_w, map_h) = self.data.map_pixel_size();
        let mut skipped = 0usize;
        for object in &group.objects {
            match map_to_world(object, map_w, map_h) {
                Some(rect) => {
                    let handle = physics.insert_static_box(&rect, self.group);
                    layer.bodies.push(CollisionBody {
                        rect,
                        group: self.group,
                        handle,
                    });
                }
                None => {
                    skipped += 1;
                    log::debug!(
                        "skipping malformed object `{}` in `{group_name}`: {}x{} at ({}, {})",
                        object.name,
                        object.width,
                        object.height,
                        object.x,
                        object.y
                    );
                }
            }
        }

        log::info!(
            "built {timeline} layer from `{group_name}`: {} bodies, {skipped} skipped",
            layer.bodies.len()
        );
        layer
    }
}
