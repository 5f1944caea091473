//! Interactive trigger that hands the camera over to a view zone.

use crate::camera::CameraRig;
use crate::math::Vec2;
use crate::view_zone::ViewZoneRegistry;

/// Directional inputs held this frame while looking through a telescope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PanKeys {
    /// Unit direction (or zero) for the held keys. Opposite keys cancel.
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y += 1.0;
        }
        if self.down {
            dir.y -= 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalized()
    }
}

pub struct Telescope {
    zone_id: i64,
    player_inside: bool,
    active: bool,
}

impl Telescope {
    pub fn new(zone_id: i64) -> Self {
        Self {
            zone_id,
            player_inside: false,
            active: false,
        }
    }

    pub fn zone_id(&self) -> i64 {
        self.zone_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn player_inside(&self) -> bool {
        self.player_inside
    }

    pub fn on_player_enter(&mut self) {
        self.player_inside = true;
    }

    /// Leaving while active is ignored: moving the camera can separate the
    /// trigger from the player without the player walking away.
    pub fn on_player_exit(&mut self) {
        if self.active {
            return;
        }
        self.player_inside = false;
    }

    /// Interact key pressed. Toggles scoped mode when the player is in range.
    /// Returns whether the telescope is active afterwards.
    pub fn interact(&mut self, camera: &mut CameraRig, zones: &ViewZoneRegistry) -> bool {
        if self.active {
            self.leave(camera);
        } else if self.player_inside {
            self.active = camera.enter_scoped_zone(self.zone_id, zones);
        }
        self.active
    }

    /// Cancel key pressed.
    pub fn cancel(&mut self, camera: &mut CameraRig) {
        if self.active {
            self.leave(camera);
        }
    }

    /// Feed held keys to the camera while active.
    pub fn steer(&self, camera: &mut CameraRig, keys: PanKeys) {
        if self.active {
            camera.set_scoped_input(keys.direction());
        }
    }

    fn leave(&mut self, camera: &mut CameraRig) {
        camera.exit_scoped();
        self.active = false;
    }
}
