// timeshift/src/physics.rs
use std::collections::HashMap;

use crate::geometry::WorldRect;
use crate::math::Vec2;

// Rapier is private implementation detail: do NOT re-export it.
use rapier2d::prelude::*;

/// Physics group id reserved for static level geometry.
pub const LEVEL_GEOMETRY_GROUP: u32 = 1 << 1;

/// Engine-facing handle for one static box owned by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticBodyId(u32);

struct StaticBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Thin wrapper over a rapier world holding the level's static geometry.
///
/// The level core never steps the simulation itself; it only inserts fixed
/// boxes, flips their enabled flag when the timeline changes and answers
/// overlap queries through rapier's query pipeline. Character movement and
/// dynamic bodies belong to the outer game.
pub struct PhysicsWorld {
    // --- rapier internals ---
    island_manager: IslandManager,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    query_pipeline: QueryPipeline,

    // --- mappings (engine <-> rapier) ---
    next_id: u32,
    bodies: HashMap<StaticBodyId, StaticBody>,
    collider_to_body: HashMap<ColliderHandle, StaticBodyId>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            island_manager: IslandManager::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            query_pipeline: QueryPipeline::new(),
            next_id: 1,
            bodies: HashMap::new(),
            collider_to_body: HashMap::new(),
        }
    }

    /// Insert a fixed box collider. New bodies start disabled.
    pub fn insert_static_box(&mut self, rect: &WorldRect, group: u32) -> StaticBodyId {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![rect.center.x, rect.center.y])
            .build();
        let body = self.rigid_bodies.insert(body);

        let collider = ColliderBuilder::cuboid(rect.half_extents.x, rect.half_extents.y)
            .user_data(group as u128)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.rigid_bodies);
        if let Some(c) = self.colliders.get_mut(collider) {
            c.set_enabled(false);
        }

        let id = StaticBodyId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.bodies.insert(id, StaticBody { body, collider });
        self.collider_to_body.insert(collider, id);
        self.update_query_pipeline();
        id
    }

    /// Remove a body (and its collider). Returns whether one existed.
    pub fn remove(&mut self, id: StaticBodyId) -> bool {
        let removed = self.detach(id);
        if removed {
            self.update_query_pipeline();
        }
        removed
    }

    /// Remove many bodies, refreshing the query pipeline once.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = StaticBodyId>) {
        let mut any = false;
        for id in ids {
            any |= self.detach(id);
        }
        if any {
            self.update_query_pipeline();
        }
    }

    pub fn set_enabled(&mut self, id: StaticBodyId, enabled: bool) {
        self.set_enabled_all([id], enabled);
    }

    /// Flip the enabled flag on many bodies, refreshing the query pipeline
    /// once.
    pub fn set_enabled_all(&mut self, ids: impl IntoIterator<Item = StaticBodyId>, enabled: bool) {
        for id in ids {
            if let Some(entry) = self.bodies.get(&id) {
                if let Some(c) = self.colliders.get_mut(entry.collider) {
                    c.set_enabled(enabled);
                }
            }
        }
        self.update_query_pipeline();
    }

    pub fn is_enabled(&self, id: StaticBodyId) -> bool {
        self.bodies
            .get(&id)
            .and_then(|entry| self.colliders.get(entry.collider))
            .map(|c| c.is_enabled())
            .unwrap_or(false)
    }

    pub fn contains(&self, id: StaticBodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.bodies.keys().filter(|id| self.is_enabled(**id)).count()
    }

    pub fn body_position(&self, id: StaticBodyId) -> Option<Vec2> {
        let entry = self.bodies.get(&id)?;
        let t = self.rigid_bodies.get(entry.body)?.translation();
        Some(Vec2::new(t.x, t.y))
    }

    /// Update the query pipeline (call after adding/removing bodies or
    /// toggling colliders).
    ///
    /// Always a full rebuild: fixed bodies never join an active island, so
    /// an incremental refit would not pick up new or removed colliders.
    pub fn update_query_pipeline(&mut self) {
        let mut pipeline = QueryPipeline::new();
        pipeline.update(&self.rigid_bodies, &self.colliders);
        self.query_pipeline = pipeline;
    }

    /// Enabled bodies of `group` whose bounds overlap `rect` with positive
    /// area, in insertion order.
    pub fn overlapping(&self, rect: &WorldRect, group: u32) -> Vec<StaticBodyId> {
        let (min, max) = (rect.min(), rect.max());
        let aabb = Aabb::new(point![min.x, min.y], point![max.x, max.y]);

        let mut hits = Vec::new();
        self.query_pipeline
            .colliders_with_aabb_intersecting_aabb(&aabb, |handle| {
                if let Some(id) = self.matching_body(*handle, rect, group) {
                    hits.push(id);
                }
                true
            });
        hits.sort();
        hits.dedup();
        hits
    }

    // The pipeline reports touching boxes too; keep only positive-area
    // overlaps.
    fn matching_body(&self, handle: ColliderHandle, rect: &WorldRect, group: u32) -> Option<StaticBodyId> {
        let c = self.colliders.get(handle)?;
        if !c.is_enabled() || (c.user_data as u32) & group == 0 {
            return None;
        }
        let aabb = c.compute_aabb();
        let bounds = WorldRect::from_corners(
            Vec2::new(aabb.mins.x, aabb.mins.y),
            Vec2::new(aabb.maxs.x, aabb.maxs.y),
        );
        if !rect.intersects(&bounds) {
            return None;
        }
        self.collider_to_body.get(&handle).copied()
    }

    fn detach(&mut self, id: StaticBodyId) -> bool {
        let Some(entry) = self.bodies.remove(&id) else {
            return false;
        };
        self.collider_to_body.remove(&entry.collider);
        self.rigid_bodies.remove(
            entry.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }
}
