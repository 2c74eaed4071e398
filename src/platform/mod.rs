//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Periodic timers driving the tick loops
//! - Input events
//! - Clock and viewport queries (browser only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use serde::{Deserialize, Serialize};

/// Which periodic loop a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopKind {
    /// Decorative obstacle stream behind the menu
    Menu,
    /// Live session simulation
    Gameplay,
}

/// Opaque id of a registered periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

/// Registers and cancels periodic timers.
///
/// Implementations call back into the owner with the `LoopKind` each period;
/// after `cancel` returns, the cancelled timer must never fire again.
pub trait Scheduler {
    fn start_interval(&mut self, kind: LoopKind, period_ms: f64) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler operations, in order, as seen by `ManualScheduler`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerOp {
    Start {
        handle: TimerHandle,
        kind: LoopKind,
        period_ms: f64,
    },
    Cancel {
        handle: TimerHandle,
    },
}

/// Deterministic scheduler: the owner pumps ticks itself.
///
/// Used by the native headless runner and by tests.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next_id: i32,
    active: Vec<(TimerHandle, LoopKind)>,
    log: Vec<SchedulerOp>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers currently registered
    pub fn active(&self) -> &[(TimerHandle, LoopKind)] {
        &self.active
    }

    /// The loop a pump would fire next, if exactly one timer is live
    pub fn due(&self) -> Option<LoopKind> {
        match self.active.as_slice() {
            [(_, kind)] => Some(*kind),
            _ => None,
        }
    }

    pub fn log(&self) -> &[SchedulerOp] {
        &self.log
    }
}

impl Scheduler for ManualScheduler {
    fn start_interval(&mut self, kind: LoopKind, period_ms: f64) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.active.push((handle, kind));
        self.log.push(SchedulerOp::Start {
            handle,
            kind,
            period_ms,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.active.retain(|(h, _)| *h != handle);
        self.log.push(SchedulerOp::Cancel { handle });
    }
}

/// Where a flap came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Keyboard,
    Pointer,
    Touch,
}

/// Play field DOM events that flap. Clicks, not presses, so a button
/// overlaid on the field never doubles as a flap.
pub const FIELD_FLAP_EVENTS: [(&str, InputSource); 2] = [
    ("click", InputSource::Pointer),
    ("touchstart", InputSource::Touch),
];

/// Keys that flap (by `KeyboardEvent.code`)
pub fn is_flap_key(code: &str) -> bool {
    matches!(code, "Space" | "ArrowUp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_tracks_live_timers() {
        let mut scheduler = ManualScheduler::new();
        let menu = scheduler.start_interval(LoopKind::Menu, 16.0);
        assert_eq!(scheduler.due(), Some(LoopKind::Menu));

        scheduler.cancel(menu);
        assert_eq!(scheduler.due(), None);
        let play = scheduler.start_interval(LoopKind::Gameplay, 16.0);
        assert_ne!(menu, play);
        assert_eq!(scheduler.due(), Some(LoopKind::Gameplay));
        assert_eq!(scheduler.log().len(), 3);
    }

    #[test]
    fn test_pointer_flaps_on_click() {
        assert!(FIELD_FLAP_EVENTS.contains(&("click", InputSource::Pointer)));
        assert!(FIELD_FLAP_EVENTS.iter().all(|(event, _)| *event != "mousedown"));
        assert!(
            FIELD_FLAP_EVENTS
                .iter()
                .all(|(_, source)| *source != InputSource::Keyboard)
        );
    }

    #[test]
    fn test_flap_keys() {
        assert!(is_flap_key("Space"));
        assert!(is_flap_key("ArrowUp"));
        assert!(!is_flap_key("ArrowDown"));
        assert!(!is_flap_key("KeyW"));
    }
}
