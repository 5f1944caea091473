use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use timeshift::{
    map_to_world, FrameInput, LaserTrap, Level, LevelConfig, LevelData, PanKeys, PropertyValue,
    SharedListener, Telescope, TileRect, ToggleOutcome,
};

/// 40x20 tiles of 16px. The Future has a wall in the middle of the room and
/// a laser over the right half of the floor.
const LEVEL_JSON: &str = r#"{
    "width": 40,
    "height": 20,
    "tile_width": 16.0,
    "tile_height": 16.0,
    "object_groups": [
        { "name": "Past_Col", "objects": [
            { "x": 0, "y": 288, "width": 640, "height": 32, "name": "floor" }
        ]},
        { "name": "Future_Col", "objects": [
            { "x": 0, "y": 288, "width": 640, "height": 32, "name": "floor" },
            { "x": 304, "y": 192, "width": 32, "height": 96, "name": "wall" }
        ]},
        { "name": "Objects", "objects": [
            { "x": 0, "y": 0, "width": 320, "height": 160, "name": "ViewZone_Tower",
              "properties": { "boundID": 7 } },
            { "x": 64, "y": 256, "width": 16, "height": 32, "name": "Telescope",
              "properties": { "zone": 7 } },
            { "x": 400, "y": 272, "width": 96, "height": 8, "name": "Laser",
              "properties": { "active": 1.0, "inactive": 2.0 } }
        ]}
    ]
}"#;

const CONFIG_JSON: &str = r#"{ "stuck_forgiveness": 0.1, "camera_half_height": 96.0, "shake_seed": 42 }"#;

const DT: f32 = 1.0 / 60.0;

fn float_property(props: &HashMap<String, PropertyValue>, key: &str, default: f32) -> f32 {
    match props.get(key) {
        Some(PropertyValue::Float(v)) => *v as f32,
        Some(PropertyValue::Int(v)) => *v as f32,
        _ => default,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data = LevelData::from_json(LEVEL_JSON).context("parsing embedded level")?;
    let config = LevelConfig::from_json(CONFIG_JSON).context("parsing embedded config")?;
    let (map_w, map_h) = data.map_pixel_size();
    let mut level = Level::new(&data, config)?;

    let mut lasers = Vec::new();
    let mut telescopes = Vec::new();
    for spawn in level.spawn_requests().to_vec() {
        let name = spawn.name.to_lowercase();
        if name.contains("laser") {
            let trap = LaserTrap::new(
                spawn.rect,
                float_property(&spawn.properties, "active", 1.0),
                float_property(&spawn.properties, "inactive", 2.0),
            )
            .starting_in(level.current_state());
            let trap = Rc::new(RefCell::new(trap));
            level.timeline_mut().register_listener(trap.clone() as SharedListener);
            lasers.push(trap);
        } else if name.contains("telescope") {
            let zone = spawn
                .properties
                .get("zone")
                .and_then(PropertyValue::as_int)
                .unwrap_or_default();
            telescopes.push((spawn.rect, Telescope::new(zone)));
        }
    }
    log::info!("spawned {} lasers, {} telescopes", lasers.len(), telescopes.len());

    // Scripted run: walk right along the floor, toggling at fixed frames.
    let toggle_frames = [30, 240, 290, 400];
    for frame in 0..600u32 {
        let x = 40.0 + frame as f32 * 1.0;
        let player = map_to_world(&TileRect::new(x, 256.0, 16.0, 32.0), map_w, map_h)
            .context("player rect is malformed")?;
        let input = FrameInput {
            player_bounds: Some(player),
            toggle_requested: toggle_frames.contains(&frame),
        };

        level.simulation_tick(DT, &input);
        if input.toggle_requested {
            match level.last_toggle() {
                Some(ToggleOutcome::Switched(state)) => log::info!("frame {frame}: now in {state}"),
                Some(ToggleOutcome::Rejected) => log::info!("frame {frame}: toggle rejected"),
                None => {}
            }
        }

        for laser in &lasers {
            let report = laser.borrow_mut().update(DT, Some(&player));
            if report.hit_player {
                log::info!("frame {frame}: player hit by laser");
            }
        }

        for (trigger, telescope) in &mut telescopes {
            if trigger.intersects(&player) {
                telescope.on_player_enter();
            } else {
                telescope.on_player_exit();
            }
            let (camera, zones) = level.camera_and_zones();
            if frame == 60 {
                telescope.interact(camera, zones);
            }
            telescope.steer(camera, PanKeys { right: frame < 120, ..PanKeys::default() });
            if frame == 120 {
                telescope.cancel(camera);
            }
        }

        level.presentation_tick(DT);
        if frame % 60 == 0 {
            let cam = level.camera().render_position();
            log::info!(
                "frame {frame}: player ({:.0}, {:.0}) camera ({:.0}, {:.0}) {:?}",
                player.center.x,
                player.center.y,
                cam.x,
                cam.y,
                level.camera().mode()
            );
        }
    }

    level.teardown();
    Ok(())
}
