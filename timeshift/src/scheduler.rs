//! One-shot delayed callbacks in simulated time.
//!
//! Each owner keeps its own `Scheduler`, so timers die with their owner and a
//! torn-down object never receives a late callback. Timers fire from
//! [`Scheduler::advance`], never from wall-clock time.

/// Handle returned by [`Scheduler::schedule_once`], used to cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct PendingTimer<T> {
    handle: TimerHandle,
    due: f64,
    payload: T,
}

/// A timer that came due, with the simulated time it was due at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fired<T> {
    pub payload: T,
    pub due: f64,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    next_handle: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_handle: 1,
            pending: Vec::new(),
        }
    }

    /// Simulated seconds elapsed since creation.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Fire `payload` after `delay` seconds of simulated time. Negative or
    /// non-finite delays fire on the next `advance`.
    pub fn schedule_once(&mut self, delay: f32, payload: T) -> TimerHandle {
        self.schedule_after(self.now, delay, payload)
    }

    /// Like [`schedule_once`](Self::schedule_once) but counted from `start`
    /// instead of `now`. Chaining from a [`Fired::due`] keeps periodic
    /// timers from drifting when one `advance` covers several periods.
    pub fn schedule_after(&mut self, start: f64, delay: f32, payload: T) -> TimerHandle {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let start = if start.is_finite() { start } else { self.now };
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(PendingTimer {
            handle,
            due: start + f64::from(delay),
            payload,
        });
        handle
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Move the clock forward without firing anything. Pair with
    /// [`pop_due`](Self::pop_due).
    pub fn advance_clock(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.now += f64::from(dt);
        }
    }

    /// Remove and return the earliest timer due at or before `now` (ties in
    /// scheduling order). Timers scheduled while draining are seen too.
    pub fn pop_due(&mut self) -> Option<Fired<T>> {
        let now = self.now;
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)))
            .map(|(i, _)| i)?;
        let timer = self.pending.remove(index);
        Some(Fired {
            payload: timer.payload,
            due: timer.due,
        })
    }

    /// Advance simulated time by `dt` and return the payloads of every timer
    /// now due, earliest first (ties keep scheduling order).
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.advance_clock(dt);
        std::iter::from_fn(|| self.pop_due())
            .map(|fired| fired.payload)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule_once(0.5, "late");
        s.schedule_once(0.2, "early");
        s.schedule_once(0.2, "early-second");

        assert!(s.advance(0.1).is_empty());
        assert_eq!(s.advance(0.45), vec!["early", "early-second", "late"]);
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut s = Scheduler::new();
        let a = s.schedule_once(1.0, 1);
        let b = s.schedule_once(1.0, 2);
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert!(s.is_pending(b));
        assert_eq!(s.advance(1.0), vec![2]);
        assert!(!s.cancel(b));
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut s = Scheduler::new();
        s.schedule_once(0.1, ());
        s.schedule_once(0.2, ());
        s.cancel_all();
        assert!(s.advance(10.0).is_empty());
    }

    #[test]
    fn bad_delays_fire_next_advance() {
        let mut s = Scheduler::new();
        s.schedule_once(-3.0, 'a');
        s.schedule_once(f32::NAN, 'b');
        assert_eq!(s.advance(0.0), vec!['a', 'b']);
    }

    #[test]
    fn chained_timers_keep_their_period() {
        let mut s = Scheduler::new();
        s.schedule_once(1.0, ());
        s.advance_clock(3.5);

        let mut dues = Vec::new();
        while let Some(fired) = s.pop_due() {
            dues.push(fired.due);
            s.schedule_after(fired.due, 1.0, ());
        }
        assert_eq!(dues, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.pending_count(), 1);
        assert_eq!(s.advance(0.5), vec![()]);
    }

    #[test]
    fn time_only_moves_forward() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance(0.5);
        s.advance(-1.0);
        s.advance(f32::NAN);
        assert!((s.now() - 0.5).abs() < 1e-9);
    }
}
