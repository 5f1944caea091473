//! Camera rig: smoothed player follow inside level bounds, scoped panning
//! inside a view zone, and screen shake.

use glam::Mat4;

use crate::geometry::WorldRect;
use crate::math::{clamp_or_center, Vec2};
use crate::scheduler::Scheduler;
use crate::view_zone::ViewZoneRegistry;

/// Camera behaviour configuration.
#[derive(Clone, Copy, Debug)]
pub struct CameraSettings {
    /// Fraction of the remaining distance covered each frame, in `(0, 1]`.
    /// Applied per frame, not scaled by elapsed time.
    pub smoothing: f32,
    /// Half of the visible world height.
    pub half_height: f32,
    /// Screen width / height.
    pub aspect_ratio: f32,
    /// World units per second while panning in scoped mode.
    pub pan_speed: f32,
}

impl CameraSettings {
    pub fn new() -> Self {
        Self {
            smoothing: 0.125,
            half_height: 360.0,
            aspect_ratio: 16.0 / 9.0,
            pan_speed: 400.0,
        }
    }

    /// Set the smoothing factor, clamped into `(0, 1]`.
    pub fn with_smoothing(mut self, factor: f32) -> Self {
        self.smoothing = if factor.is_finite() && factor > 0.0 {
            factor.min(1.0)
        } else {
            1.0
        };
        self
    }

    pub fn with_viewport(mut self, half_height: f32, aspect_ratio: f32) -> Self {
        self.half_height = half_height;
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_pan_speed(mut self, speed: f32) -> Self {
        self.pan_speed = speed;
        self
    }

    /// Viewport half extents: `half_width = half_height * aspect_ratio`.
    pub fn half_view(&self) -> Vec2 {
        Vec2::new(self.half_height * self.aspect_ratio, self.half_height)
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Allowed range for the camera center.
///
/// An axis with `max < min` means the area is narrower than the viewport on
/// that axis; the camera is pinned to its midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl CameraBounds {
    /// Center range that keeps a `half_view` viewport inside `area`.
    pub fn inside(area: &WorldRect, half_view: Vec2) -> Self {
        let (min, max) = (area.min(), area.max());
        Self {
            min_x: min.x + half_view.x,
            max_x: max.x - half_view.x,
            min_y: min.y + half_view.y,
            max_y: max.y - half_view.y,
        }
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            clamp_or_center(p.x, self.min_x, self.max_x),
            clamp_or_center(p.y, self.min_y, self.max_y),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Follow,
    Scoped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CameraTimer {
    EndShake,
}

#[derive(Clone, Copy, Debug)]
struct Shake {
    intensity: f32,
}

pub struct CameraRig {
    settings: CameraSettings,
    level_area: WorldRect,
    level_bounds: CameraBounds,
    position: Vec2,
    mode: CameraMode,
    scope: Option<WorldRect>,
    scope_input: Vec2,
    shake: Option<Shake>,
    shake_offset: Vec2,
    timers: Scheduler<CameraTimer>,
    rng: fastrand::Rng,
}

impl CameraRig {
    /// Create a rig following inside `level_area`, starting at `start`
    /// (clamped).
    pub fn new(settings: CameraSettings, level_area: WorldRect, start: Vec2) -> Self {
        let level_bounds = CameraBounds::inside(&level_area, settings.half_view());
        log::debug!(
            "camera bounds: x [{}, {}], y [{}, {}]",
            level_bounds.min_x,
            level_bounds.max_x,
            level_bounds.min_y,
            level_bounds.max_y
        );
        Self {
            settings,
            level_area,
            level_bounds,
            position: level_bounds.clamp(start),
            mode: CameraMode::Follow,
            scope: None,
            scope_input: Vec2::ZERO,
            shake: None,
            shake_offset: Vec2::ZERO,
            timers: Scheduler::new(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Use a seeded RNG for shake offsets (deterministic replays and tests).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn level_bounds(&self) -> CameraBounds {
        self.level_bounds
    }

    /// Smoothed, clamped camera center (no shake).
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Position to render from: [`position`](Self::position) plus this
    /// frame's shake offset.
    pub fn render_position(&self) -> Vec2 {
        self.position + self.shake_offset
    }

    pub fn half_view(&self) -> Vec2 {
        self.settings.half_view()
    }

    pub fn scoped_rect(&self) -> Option<WorldRect> {
        self.scope
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// React to a screen resize. Bounds are recomputed from the new viewport.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            log::warn!("ignoring invalid aspect ratio {aspect_ratio}");
            return;
        }
        self.settings.aspect_ratio = aspect_ratio;
        self.level_bounds = CameraBounds::inside(&self.level_area, self.settings.half_view());
        self.position = self.active_bounds().clamp(self.position);
    }

    /// Start (or restart) a shake. Any shake in progress is replaced.
    pub fn shake(&mut self, duration: f32, intensity: f32) {
        self.timers.cancel_all();
        if !(duration.is_finite() && duration > 0.0) {
            self.shake = None;
            self.shake_offset = Vec2::ZERO;
            return;
        }
        self.shake = Some(Shake {
            intensity: intensity.abs(),
        });
        self.timers.schedule_once(duration, CameraTimer::EndShake);
    }

    /// Enter scoped mode inside `rect`. The player is ignored until
    /// [`exit_scoped`](Self::exit_scoped).
    pub fn enter_scoped(&mut self, rect: WorldRect) {
        self.mode = CameraMode::Scoped;
        self.scope = Some(rect);
        self.scope_input = Vec2::ZERO;
        self.position = self.active_bounds().clamp(self.position);
        log::debug!("camera entered scoped mode");
    }

    /// Enter scoped mode using a registered view zone. Unknown ids leave the
    /// camera untouched and return `false`.
    pub fn enter_scoped_zone(&mut self, zone_id: i64, zones: &ViewZoneRegistry) -> bool {
        match zones.lookup(zone_id) {
            Some(rect) => {
                self.enter_scoped(rect);
                true
            }
            None => {
                log::warn!("view zone {zone_id} not registered; staying in follow mode");
                false
            }
        }
    }

    /// Return to follow mode and forget the scoped rect.
    pub fn exit_scoped(&mut self) {
        if self.mode == CameraMode::Scoped {
            log::debug!("camera left scoped mode");
        }
        self.mode = CameraMode::Follow;
        self.scope = None;
        self.scope_input = Vec2::ZERO;
    }

    /// Pan direction for scoped mode. Normalized; zero stops panning.
    pub fn set_scoped_input(&mut self, direction: Vec2) {
        self.scope_input = direction.normalized();
    }

    /// Per-frame update; run after the player has moved this frame.
    pub fn update(&mut self, dt: f32, player: Option<Vec2>) {
        match self.mode {
            CameraMode::Follow => {
                if let Some(target) = player.filter(Vec2::is_finite) {
                    self.position = self.position.lerp(target, self.settings.smoothing);
                }
                self.position = self.level_bounds.clamp(self.position);
            }
            CameraMode::Scoped => {
                let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
                self.position += self.scope_input * (self.settings.pan_speed * dt);
                self.position = self.active_bounds().clamp(self.position);
            }
        }

        self.shake_offset = match self.shake {
            Some(shake) => Vec2::new(
                self.random_offset(shake.intensity),
                self.random_offset(shake.intensity),
            ),
            None => Vec2::ZERO,
        };

        for timer in self.timers.advance(dt) {
            match timer {
                CameraTimer::EndShake => self.shake = None,
            }
        }
    }

    /// View-projection matrix centered on [`render_position`](Self::render_position)
    /// (world units, Y up).
    pub fn view_projection(&self) -> Mat4 {
        let half = self.half_view();
        let projection = Mat4::orthographic_rh_gl(-half.x, half.x, -half.y, half.y, -1.0, 1.0);
        let eye = self.render_position().to_glam();
        let translation = Mat4::from_translation((-eye).extend(0.0));
        projection * translation
    }

    fn active_bounds(&self) -> CameraBounds {
        match (self.mode, self.scope) {
            (CameraMode::Scoped, Some(rect)) => CameraBounds::inside(&rect, self.half_view()),
            _ => self.level_bounds,
        }
    }

    fn random_offset(&mut self, intensity: f32) -> f32 {
        (self.rng.f32() * 2.0 - 1.0) * intensity
    }
}
