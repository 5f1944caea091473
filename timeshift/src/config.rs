//! Level configuration.

use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;
use crate::collision_layer::TimelineState;
use crate::error::LevelError;
use crate::view_zone::ZoneMarker;

/// Tunables for one level instance. Every field has a default, so a config
/// file only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub initial_timeline: TimelineState,
    /// Fraction of the player's size ignored on each side by the stuck check.
    pub stuck_forgiveness: f32,
    pub camera_smoothing: f32,
    pub camera_half_height: f32,
    pub aspect_ratio: f32,
    pub scoped_pan_speed: f32,
    /// Shake played when a timeline switch is rejected.
    pub reject_shake_duration: f32,
    pub reject_shake_intensity: f32,
    /// Fixed seed for shake offsets; random when unset.
    pub shake_seed: Option<u64>,
    pub past_group: String,
    pub future_group: String,
    pub objects_group: String,
    pub view_zone_keyword: String,
    pub view_zone_id_property: String,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            initial_timeline: TimelineState::Past,
            stuck_forgiveness: 0.1,
            camera_smoothing: 0.125,
            camera_half_height: 360.0,
            aspect_ratio: 16.0 / 9.0,
            scoped_pan_speed: 400.0,
            reject_shake_duration: 0.2,
            reject_shake_intensity: 8.0,
            shake_seed: None,
            past_group: "Past_Col".into(),
            future_group: "Future_Col".into(),
            objects_group: "Objects".into(),
            view_zone_keyword: "viewzone".into(),
            view_zone_id_property: "boundID".into(),
        }
    }
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if !(0.0..=0.5).contains(&self.stuck_forgiveness) {
            return Err(LevelError::invalid(
                "stuck_forgiveness",
                format!("{} is outside [0, 0.5]", self.stuck_forgiveness),
            ));
        }
        if !(self.camera_smoothing > 0.0 && self.camera_smoothing <= 1.0) {
            return Err(LevelError::invalid(
                "camera_smoothing",
                format!("{} is outside (0, 1]", self.camera_smoothing),
            ));
        }
        positive("camera_half_height", self.camera_half_height)?;
        positive("aspect_ratio", self.aspect_ratio)?;
        non_negative("scoped_pan_speed", self.scoped_pan_speed)?;
        non_negative("reject_shake_duration", self.reject_shake_duration)?;
        non_negative("reject_shake_intensity", self.reject_shake_intensity)?;

        if self.view_zone_keyword.trim().is_empty() {
            return Err(LevelError::invalid("view_zone_keyword", "must not be empty"));
        }
        Ok(())
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings::new()
            .with_smoothing(self.camera_smoothing)
            .with_viewport(self.camera_half_height, self.aspect_ratio)
            .with_pan_speed(self.scoped_pan_speed)
    }

    pub fn zone_marker(&self) -> ZoneMarker<'_> {
        ZoneMarker {
            keyword: &self.view_zone_keyword,
            id_property: &self.view_zone_id_property,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), LevelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LevelError::invalid(field, format!("{value} must be > 0")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), LevelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LevelError::invalid(field, format!("{value} must be >= 0")))
    }
}
