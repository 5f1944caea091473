//! A running level: builds every core part at load and drives them frame by
//! frame.
//!
//! Each frame the outer game calls [`Level::simulation_tick`] after moving
//! the player, then [`Level::presentation_tick`], so the camera always reacts
//! to the frame's final player position.

use crossbeam_channel::{unbounded, Receiver};

use crate::camera::CameraRig;
use crate::collision_layer::{CollisionLayerBuilder, TimelineState};
use crate::config::LevelConfig;
use crate::error::LevelError;
use crate::geometry::{map_bounds, WorldRect};
use crate::level_data::LevelData;
use crate::math::Vec2;
use crate::physics::PhysicsWorld;
use crate::stuck_guard::StuckGuard;
use crate::timeline::{TimelineController, TimelineEvent, ToggleOutcome};
use crate::view_zone::{scan_objects, SpawnRequest, ViewZoneRegistry};

/// Per-frame input from the player object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Player world bounding box, refreshed this frame.
    pub player_bounds: Option<WorldRect>,
    pub toggle_requested: bool,
}

pub struct Level {
    config: LevelConfig,
    physics: PhysicsWorld,
    timeline: TimelineController,
    view_zones: ViewZoneRegistry,
    spawns: Vec<SpawnRequest>,
    camera: CameraRig,
    events: Receiver<TimelineEvent>,
    player_position: Option<Vec2>,
    last_toggle: Option<ToggleOutcome>,
}

impl Level {
    /// Build both timelines, the view-zone registry and the camera.
    ///
    /// Only an invalid config fails; problems in the level data degrade to
    /// skipped objects or empty layers.
    pub fn new(data: &LevelData, config: LevelConfig) -> Result<Self, LevelError> {
        config.validate()?;

        let (map_w, map_h) = data.map_pixel_size();
        let mut physics = PhysicsWorld::new();

        let builder = CollisionLayerBuilder::new(data);
        let past = builder.build(&config.past_group, TimelineState::Past, &mut physics);
        let future = builder.build(&config.future_group, TimelineState::Future, &mut physics);

        let scan = scan_objects(data, &config.objects_group, &config.zone_marker());

        let (tx, events) = unbounded();
        let timeline = TimelineController::new(
            past,
            future,
            config.initial_timeline,
            StuckGuard::new(config.stuck_forgiveness),
            &mut physics,
        )
        .with_events(tx);

        let level_area = map_bounds(map_w, map_h).unwrap_or_else(|| {
            log::warn!("map has no area ({map_w}x{map_h}); camera pinned to origin");
            WorldRect::new(Vec2::ZERO, Vec2::ZERO)
        });
        let mut camera = CameraRig::new(config.camera_settings(), level_area, level_area.center);
        if let Some(seed) = config.shake_seed {
            camera = camera.with_seed(seed);
        }

        log::info!(
            "level ready: {}x{} px, {} past bodies, {} future bodies, {} view zones",
            map_w,
            map_h,
            timeline.layer(TimelineState::Past).len(),
            timeline.layer(TimelineState::Future).len(),
            scan.zones.len()
        );

        Ok(Self {
            config,
            physics,
            timeline,
            view_zones: scan.zones,
            spawns: scan.spawns,
            camera,
            events,
            player_position: None,
            last_toggle: None,
        })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    /// Mutable access for listener registration.
    pub fn timeline_mut(&mut self) -> &mut TimelineController {
        &mut self.timeline
    }

    pub fn current_state(&self) -> TimelineState {
        self.timeline.current_state()
    }

    pub fn view_zones(&self) -> &ViewZoneRegistry {
        &self.view_zones
    }

    /// Non-zone objects for the outer game to instance.
    pub fn spawn_requests(&self) -> &[SpawnRequest] {
        &self.spawns
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    /// Camera and view zones together, for triggers that need both.
    pub fn camera_and_zones(&mut self) -> (&mut CameraRig, &ViewZoneRegistry) {
        (&mut self.camera, &self.view_zones)
    }

    /// Outcome of the most recent toggle request, if any.
    pub fn last_toggle(&self) -> Option<ToggleOutcome> {
        self.last_toggle
    }

    /// Geometry and state step. Evaluates a toggle request against this
    /// frame's player bounds and dispatches the resulting events.
    pub fn simulation_tick(&mut self, _dt: f32, input: &FrameInput) {
        self.player_position = input.player_bounds.map(|b| b.center);

        if input.toggle_requested {
            let outcome = self
                .timeline
                .request_toggle(input.player_bounds.as_ref(), &mut self.physics);
            self.last_toggle = Some(outcome);
        }

        while let Ok(event) = self.events.try_recv() {
            match event {
                TimelineEvent::SwitchRejected => self.camera.shake(
                    self.config.reject_shake_duration,
                    self.config.reject_shake_intensity,
                ),
                TimelineEvent::Switched(state) => {
                    log::debug!("frame saw switch to {state}");
                }
            }
        }
    }

    /// Camera step; runs after [`simulation_tick`](Self::simulation_tick).
    pub fn presentation_tick(&mut self, dt: f32) {
        self.camera.update(dt, self.player_position);
    }

    /// Release all collision bodies. The level is inert afterwards.
    pub fn teardown(&mut self) {
        self.timeline.teardown(&mut self.physics);
        self.camera.exit_scoped();
        log::info!("level torn down");
    }
}
