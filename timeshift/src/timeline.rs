//! Past/Future state machine.
//!
//! The controller owns both collision layers and is their only writer, so
//! exactly one layer is active at any time. A toggle either fully applies
//! (layers, visuals, state, listener fan-out) or fully aborts.

use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::Sender;

use crate::collision_layer::{CollisionLayer, TimelineState};
use crate::geometry::WorldRect;
use crate::physics::PhysicsWorld;
use crate::stuck_guard::StuckGuard;

/// Receives timeline changes. Hazards and enemies implement this.
///
/// Callbacks run synchronously inside [`TimelineController::request_toggle`].
/// A listener must not request another toggle from inside its callback; the
/// controller is mutably borrowed for the whole fan-out.
pub trait TimeListener {
    fn on_timeline_changed(&mut self, state: TimelineState);
}

/// Shared listener reference. Identity is the allocation, not the value.
pub type SharedListener = Rc<RefCell<dyn TimeListener>>;

/// Side effects emitted for other systems (camera feedback, audio, UI).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineEvent {
    Switched(TimelineState),
    SwitchRejected,
}

/// What happened to a toggle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Switched(TimelineState),
    Rejected,
}

/// Visibility of the two art layers. Updated in the same step as collision
/// activation, so visuals and collision never disagree after a toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualLayers {
    pub past_visible: bool,
    pub future_visible: bool,
}

impl VisualLayers {
    fn showing(state: TimelineState) -> Self {
        Self {
            past_visible: state == TimelineState::Past,
            future_visible: state == TimelineState::Future,
        }
    }
}

fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

pub struct TimelineController {
    current: TimelineState,
    past: CollisionLayer,
    future: CollisionLayer,
    visuals: VisualLayers,
    guard: StuckGuard,
    listeners: Vec<SharedListener>,
    events: Option<Sender<TimelineEvent>>,
}

impl TimelineController {
    /// Take ownership of both layers and activate the one for `initial`.
    ///
    /// Layers are keyed by their own [`CollisionLayer::timeline`] tag, so
    /// argument order does not matter. If both carry the same tag, the
    /// first is used as Past and the second as Future.
    pub fn new(
        first: CollisionLayer,
        second: CollisionLayer,
        initial: TimelineState,
        guard: StuckGuard,
        physics: &mut PhysicsWorld,
    ) -> Self {
        let (past, future) = match (first.timeline(), second.timeline()) {
            (TimelineState::Past, TimelineState::Future) => (first, second),
            (TimelineState::Future, TimelineState::Past) => (second, first),
            (tag, _) => {
                log::warn!("both collision layers are tagged {tag}; using argument order");
                let (mut past, mut future) = (first, second);
                past.retag(TimelineState::Past);
                future.retag(TimelineState::Future);
                (past, future)
            }
        };

        let mut controller = Self {
            current: initial,
            past,
            future,
            visuals: VisualLayers::showing(initial),
            guard,
            listeners: Vec::new(),
            events: None,
        };
        controller.apply(initial, physics);
        log::info!("timeline starts in {initial}");
        controller
    }

    /// Forward [`TimelineEvent`]s to `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<TimelineEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Current timeline. Pure read.
    pub fn current_state(&self) -> TimelineState {
        self.current
    }

    pub fn visuals(&self) -> VisualLayers {
        self.visuals
    }

    pub fn layer(&self, state: TimelineState) -> &CollisionLayer {
        match state {
            TimelineState::Past => &self.past,
            TimelineState::Future => &self.future,
        }
    }

    pub fn active_layer(&self) -> &CollisionLayer {
        self.layer(self.current)
    }

    /// Register a listener. Registering the same listener twice is a no-op.
    pub fn register_listener(&mut self, listener: SharedListener) {
        if self.listeners.iter().any(|l| same_listener(l, &listener)) {
            return;
        }
        self.listeners.push(listener);
    }

    /// Unregister a listener. Absent listeners are ignored.
    pub fn unregister_listener(&mut self, listener: &SharedListener) {
        self.listeners.retain(|l| !same_listener(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Try to switch to the other timeline.
    ///
    /// `player_bounds` is the player's world bounding box for this frame.
    /// On rejection nothing changes and only [`TimelineEvent::SwitchRejected`]
    /// is emitted; listeners are not called.
    pub fn request_toggle(
        &mut self,
        player_bounds: Option<&WorldRect>,
        physics: &mut PhysicsWorld,
    ) -> ToggleOutcome {
        let candidate = self.current.opposite();

        if self
            .guard
            .would_be_stuck(player_bounds, Some(self.layer(candidate)))
        {
            log::info!("switch to {candidate} rejected: player would be stuck");
            self.emit(TimelineEvent::SwitchRejected);
            return ToggleOutcome::Rejected;
        }

        self.apply(candidate, physics);
        log::info!("switched timeline to {candidate}");

        for listener in &self.listeners {
            listener.borrow_mut().on_timeline_changed(candidate);
        }
        self.emit(TimelineEvent::Switched(candidate));
        ToggleOutcome::Switched(candidate)
    }

    /// Discard both layers' bodies. The controller is inert afterwards.
    pub fn teardown(&mut self, physics: &mut PhysicsWorld) {
        self.past.discard(physics);
        self.future.discard(physics);
        self.listeners.clear();
    }

    fn apply(&mut self, state: TimelineState, physics: &mut PhysicsWorld) {
        // Deactivate first so both are never active together.
        match state {
            TimelineState::Past => {
                self.future.set_active(false, physics);
                self.past.set_active(true, physics);
            }
            TimelineState::Future => {
                self.past.set_active(false, physics);
                self.future.set_active(true, physics);
            }
        }
        self.visuals = VisualLayers::showing(state);
        self.current = state;
    }

    fn emit(&self, event: TimelineEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_layer::CollisionLayerBuilder;
    use crate::level_data::{LevelData, TileRect};
    use crate::math::Vec2;

    #[test]
    fn layers_are_keyed_by_their_tag() {
        let data = LevelData::new(10, 10, 10.0, 10.0)
            .with_group("Past_Col", vec![TileRect::new(0.0, 90.0, 100.0, 10.0)])
            .with_group("Future_Col", vec![TileRect::new(40.0, 40.0, 20.0, 20.0)]);
        let mut physics = PhysicsWorld::new();
        let builder = CollisionLayerBuilder::new(&data);
        let past = builder.build("Past_Col", TimelineState::Past, &mut physics);
        let future = builder.build("Future_Col", TimelineState::Future, &mut physics);
        let future_ids: Vec<_> = future.bodies().iter().map(|b| b.handle()).collect();

        let controller =
            TimelineController::new(future, past, TimelineState::Future, StuckGuard::new(0.0), &mut physics);
        let active: Vec<_> = controller.active_layer().bodies().iter().map(|b| b.handle()).collect();
        assert_eq!(active, future_ids);
        assert_eq!(controller.layer(TimelineState::Past).timeline(), TimelineState::Past);
        assert!(!controller.layer(TimelineState::Past).is_active());
    }

    #[test]
    fn duplicate_tags_fall_back_to_argument_order() {
        let data = LevelData::new(10, 10, 10.0, 10.0)
            .with_group("A", vec![TileRect::new(0.0, 0.0, 10.0, 10.0)])
            .with_group("B", vec![TileRect::new(0.0, 0.0, 10.0, 10.0), TileRect::new(20.0, 0.0, 10.0, 10.0)]);
        let mut physics = PhysicsWorld::new();
        let builder = CollisionLayerBuilder::new(&data);
        let a = builder.build("A", TimelineState::Past, &mut physics);
        let b = builder.build("B", TimelineState::Past, &mut physics);

        let controller =
            TimelineController::new(a, b, TimelineState::Past, StuckGuard::new(0.0), &mut physics);
        assert_eq!(controller.layer(TimelineState::Past).len(), 1);
        assert_eq!(controller.layer(TimelineState::Future).len(), 2);
        assert_eq!(controller.layer(TimelineState::Future).timeline(), TimelineState::Future);
        assert_eq!(physics.enabled_count(), 1);
    }

    /// 100x100 map. The Future layer has a wall at tile (40..60, 40..60).
    fn setup(initial: TimelineState) -> (TimelineController, PhysicsWorld) {
        let data = LevelData::new(10, 10, 10.0, 10.0)
            .with_group("Past_Col", vec![TileRect::new(0.0, 90.0, 100.0, 10.0)])
            .with_group("Future_Col", vec![TileRect::new(40.0, 40.0, 20.0, 20.0)]);
        let mut physics = PhysicsWorld::new();
        let builder = CollisionLayerBuilder::new(&data);
        let past = builder.build("Past_Col", TimelineState::Past, &mut physics);
        let future = builder.build("Future_Col", TimelineState::Future, &mut physics);
        let controller = TimelineController::new(past, future, initial, StuckGuard::new(0.0), &mut physics);
        (controller, physics)
    }

    /// World rect of the Future wall: tile (40,40,20,20) on a 100x100 map.
    fn inside_future_wall() -> WorldRect {
        WorldRect::new(Vec2::new(0.0, -100.0), Vec2::new(4.0, 4.0))
    }

    fn clear_of_walls() -> WorldRect {
        WorldRect::new(Vec2::new(-40.0, -60.0), Vec2::new(4.0, 4.0))
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<TimelineState>,
    }

    impl TimeListener for Recorder {
        fn on_timeline_changed(&mut self, state: TimelineState) {
            self.seen.push(state);
        }
    }

    fn exactly_one_active(c: &TimelineController) -> bool {
        c.layer(TimelineState::Past).is_active() ^ c.layer(TimelineState::Future).is_active()
    }

    #[test]
    fn starts_in_initial_state_with_one_active_layer() {
        let (c, physics) = setup(TimelineState::Past);
        assert_eq!(c.current_state(), TimelineState::Past);
        assert!(c.layer(TimelineState::Past).is_active());
        assert!(!c.layer(TimelineState::Future).is_active());
        assert_eq!(physics.enabled_count(), 1);
        assert!(c.visuals().past_visible && !c.visuals().future_visible);

        let (c, _) = setup(TimelineState::Future);
        assert_eq!(c.current_state(), TimelineState::Future);
        assert!(c.active_layer().is_active());
    }

    #[test]
    fn clear_toggle_swaps_layers_and_notifies() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        c.register_listener(recorder.clone());

        let outcome = c.request_toggle(Some(&clear_of_walls()), &mut physics);
        assert_eq!(outcome, ToggleOutcome::Switched(TimelineState::Future));
        assert_eq!(c.current_state(), TimelineState::Future);
        assert!(c.layer(TimelineState::Future).is_active());
        assert!(!c.layer(TimelineState::Past).is_active());
        assert!(c.visuals().future_visible && !c.visuals().past_visible);
        assert_eq!(recorder.borrow().seen, vec![TimelineState::Future]);
    }

    #[test]
    fn stuck_toggle_is_rejected_without_side_effects() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        c.register_listener(recorder.clone());
        let (tx, rx) = crossbeam_channel::unbounded();
        c = c.with_events(tx);

        let outcome = c.request_toggle(Some(&inside_future_wall()), &mut physics);
        assert_eq!(outcome, ToggleOutcome::Rejected);
        assert_eq!(c.current_state(), TimelineState::Past);
        assert!(c.layer(TimelineState::Past).is_active());
        assert!(recorder.borrow().seen.is_empty());
        assert_eq!(rx.try_recv(), Ok(TimelineEvent::SwitchRejected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_player_bounds_fail_open() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        assert_eq!(
            c.request_toggle(None, &mut physics),
            ToggleOutcome::Switched(TimelineState::Future)
        );
    }

    #[test]
    fn mutual_exclusion_holds_over_toggle_sequences() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        let positions = [
            clear_of_walls(),
            inside_future_wall(),
            clear_of_walls(),
            clear_of_walls(),
            inside_future_wall(),
            clear_of_walls(),
        ];
        for pos in positions.iter().cycle().take(30) {
            c.request_toggle(Some(pos), &mut physics);
            assert!(exactly_one_active(&c));
            assert!(c.active_layer().is_active());
            let v = c.visuals();
            assert!(v.past_visible ^ v.future_visible);
        }
    }

    #[test]
    fn duplicate_registration_fires_once() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let shared: SharedListener = recorder.clone();
        c.register_listener(shared.clone());
        c.register_listener(shared.clone());
        assert_eq!(c.listener_count(), 1);

        c.request_toggle(Some(&clear_of_walls()), &mut physics);
        assert_eq!(recorder.borrow().seen.len(), 1);
    }

    #[test]
    fn unregister_is_idempotent_and_stops_notifications() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let shared: SharedListener = recorder.clone();
        let stranger: SharedListener = Rc::new(RefCell::new(Recorder::default()));

        c.unregister_listener(&stranger);
        c.register_listener(shared.clone());
        c.unregister_listener(&shared);
        c.unregister_listener(&shared);
        assert_eq!(c.listener_count(), 0);

        c.request_toggle(Some(&clear_of_walls()), &mut physics);
        assert!(recorder.borrow().seen.is_empty());
    }

    #[test]
    fn listeners_run_in_registration_order() {
        struct Tagged(u8, Rc<RefCell<Vec<u8>>>);
        impl TimeListener for Tagged {
            fn on_timeline_changed(&mut self, _state: TimelineState) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let (mut c, mut physics) = setup(TimelineState::Past);
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in [3, 1, 2] {
            c.register_listener(Rc::new(RefCell::new(Tagged(tag, log.clone()))));
        }
        c.request_toggle(None, &mut physics);
        assert_eq!(*log.borrow(), vec![3, 1, 2]);
    }

    #[test]
    fn switched_event_is_emitted() {
        let (c, mut physics) = setup(TimelineState::Future);
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut c = c.with_events(tx);
        c.request_toggle(Some(&inside_future_wall()), &mut physics);
        assert_eq!(rx.try_recv(), Ok(TimelineEvent::Switched(TimelineState::Past)));
    }

    #[test]
    fn teardown_removes_all_bodies() {
        let (mut c, mut physics) = setup(TimelineState::Past);
        c.teardown(&mut physics);
        assert_eq!(physics.body_count(), 0);
        assert!(c.layer(TimelineState::Past).is_empty());
    }
}
