//! Timeline-aware hazards.

use crate::collision_layer::TimelineState;
use crate::geometry::WorldRect;
use crate::scheduler::Scheduler;
use crate::timeline::TimeListener;

/// Upper bound on windows processed in one update, for tiny phase times.
const MAX_TIMERS_PER_UPDATE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LaserTimer {
    TurnOn,
    TurnOff,
}

/// What a laser did during one update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaserReport {
    pub turned_on: bool,
    pub turned_off: bool,
    /// The player overlapped the beam while it was live.
    pub hit_player: bool,
}

/// A laser that only exists in the Future: it cycles between an
/// `inactive_time` safe window and an `active_time` danger window. Leaving
/// the Future cancels the cycle and switches it off.
pub struct LaserTrap {
    hit_box: WorldRect,
    active_time: f32,
    inactive_time: f32,
    timeline: TimelineState,
    on: bool,
    timers: Scheduler<LaserTimer>,
}

impl LaserTrap {
    pub fn new(hit_box: WorldRect, active_time: f32, inactive_time: f32) -> Self {
        Self {
            hit_box,
            active_time,
            inactive_time,
            timeline: TimelineState::Past,
            on: false,
            timers: Scheduler::new(),
        }
    }

    /// Sync with the timeline the level starts in.
    #[must_use]
    pub fn starting_in(mut self, state: TimelineState) -> Self {
        self.on_timeline_changed(state);
        self
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn hit_box(&self) -> WorldRect {
        self.hit_box
    }

    /// Advance timers. A player already inside the beam when it turns on is
    /// hit immediately. A long `dt` runs every on/off window it covers.
    pub fn update(&mut self, dt: f32, player: Option<&WorldRect>) -> LaserReport {
        let mut report = LaserReport::default();
        self.timers.advance_clock(dt);

        let mut fired_count = 0;
        while fired_count < MAX_TIMERS_PER_UPDATE {
            let Some(fired) = self.timers.pop_due() else {
                break;
            };
            fired_count += 1;
            match fired.payload {
                LaserTimer::TurnOn => {
                    if self.timeline != TimelineState::Future {
                        continue;
                    }
                    self.on = true;
                    report.turned_on = true;
                    self.timers
                        .schedule_after(fired.due, self.active_time, LaserTimer::TurnOff);
                }
                LaserTimer::TurnOff => {
                    self.on = false;
                    report.turned_off = true;
                    self.rearm(fired.due);
                }
            }
        }

        if self.on || report.turned_on {
            if let Some(player) = player {
                report.hit_player = self.hit_box.intersects(player);
                if report.hit_player {
                    log::debug!("laser hit the player");
                }
            }
        }
        report
    }

    fn rearm(&mut self, from: f64) {
        if self.timeline == TimelineState::Future {
            self.timers
                .schedule_after(from, self.inactive_time, LaserTimer::TurnOn);
        }
    }
}

impl TimeListener for LaserTrap {
    fn on_timeline_changed(&mut self, state: TimelineState) {
        self.timers.cancel_all();
        self.timeline = state;
        self.on = false;
        self.rearm(self.timers.now());
    }
}
