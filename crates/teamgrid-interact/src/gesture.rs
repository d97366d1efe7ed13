use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use teamgrid_core::{AppConfig, Clock};
use teamgrid_domain::{CellKey, DeadlineSlot};

/// An interaction surface a pointer can land on: a grid cell or one of the
/// per-day deadline slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GestureTarget {
    Cell(CellKey),
    DeadlineSlot(NaiveDate, DeadlineSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Classified gesture. The resolver only disambiguates; what a gesture
/// triggers (edit, paste, context menu) is the controller's mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    /// The pending-activation window expired with no second activation.
    SingleActivate { target: GestureTarget, kind: PointerKind },
    /// Second activation on the same target inside the window.
    DoubleActivate { target: GestureTarget },
    /// Touch held past the long-press threshold over an occupied cell.
    LongPress { target: GestureTarget },
}

/// Typed per-target state instead of ad-hoc global timers. Timeouts fire
/// from `poll`, driven by the injected clock, so tests never sleep.
#[derive(Debug, Clone)]
enum ResolverState {
    Idle,
    PendingSingle {
        target: GestureTarget,
        kind: PointerKind,
        armed_at: DateTime<Utc>,
    },
    LongPressArmed {
        target: GestureTarget,
        pressed_at: DateTime<Utc>,
    },
}

/// Disambiguates single-activation, double-activation, and long-press from
/// raw pointer downs/ups. One pending target at a time; a down on a
/// different target flushes the previous pending single first.
pub struct ClickGestureResolver {
    clock: Arc<dyn Clock>,
    double_window: Duration,
    long_press: Duration,
    state: ResolverState,
}

impl ClickGestureResolver {
    pub fn new(clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self {
            clock,
            double_window: Duration::milliseconds(config.double_tap_window_ms as i64),
            long_press: Duration::milliseconds(config.long_press_ms as i64),
            state: ResolverState::Idle,
        }
    }

    /// Feed a pointer-down. `occupied` reports whether the target currently
    /// holds an entry; a held touch on an occupied cell arms the long-press
    /// timer instead of the activation window.
    pub fn pointer_down(
        &mut self,
        target: GestureTarget,
        kind: PointerKind,
        occupied: bool,
    ) -> Vec<GestureEvent> {
        let now = self.clock.now();
        let mut events = self.expire(now);

        if let ResolverState::PendingSingle { target: pending, .. } = &self.state {
            if *pending == target {
                // Second activation inside the window: the pending timer is
                // cancelled and the pair becomes a double-activate.
                self.state = ResolverState::Idle;
                events.push(GestureEvent::DoubleActivate { target });
                return events;
            }
            // Different target: the old pending single resolves now.
            events.extend(self.flush_pending(now));
        }

        self.state = if kind == PointerKind::Touch && occupied {
            ResolverState::LongPressArmed { target, pressed_at: now }
        } else {
            ResolverState::PendingSingle { target, kind, armed_at: now }
        };
        events
    }

    /// Feed a pointer-up. Releasing an armed long-press before the threshold
    /// cancels it and falls back to normal tap handling.
    pub fn pointer_up(&mut self, target: &GestureTarget) -> Vec<GestureEvent> {
        let now = self.clock.now();
        let mut events = self.expire(now);

        if let ResolverState::LongPressArmed { target: armed, pressed_at } = &self.state {
            if armed == target {
                let pressed_at = *pressed_at;
                self.state = ResolverState::PendingSingle {
                    target: target.clone(),
                    kind: PointerKind::Touch,
                    armed_at: pressed_at,
                };
            }
        }
        events
    }

    /// Fire any timer that has expired by now. Call on every tick.
    pub fn poll(&mut self) -> Vec<GestureEvent> {
        let now = self.clock.now();
        self.expire(now)
    }

    fn expire(&mut self, now: DateTime<Utc>) -> Vec<GestureEvent> {
        match &self.state {
            ResolverState::PendingSingle { armed_at, .. }
                if now - *armed_at >= self.double_window =>
            {
                self.flush_pending(now)
            }
            ResolverState::LongPressArmed { target, pressed_at }
                if now - *pressed_at >= self.long_press =>
            {
                let target = target.clone();
                self.state = ResolverState::Idle;
                vec![GestureEvent::LongPress { target }]
            }
            _ => Vec::new(),
        }
    }

    fn flush_pending(&mut self, _now: DateTime<Utc>) -> Vec<GestureEvent> {
        match std::mem::replace(&mut self.state, ResolverState::Idle) {
            ResolverState::PendingSingle { target, kind, .. } => {
                vec![GestureEvent::SingleActivate { target, kind }]
            }
            other => {
                self.state = other;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use teamgrid_core::FixedClock;
    use teamgrid_domain::{BlockIndex, PersonId};

    fn cell(person: &str, block: u8) -> GestureTarget {
        GestureTarget::Cell(CellKey::new(
            PersonId::new(person),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            BlockIndex::new(block).unwrap(),
        ))
    }

    fn resolver() -> (Arc<FixedClock>, ClickGestureResolver) {
        let clock = Arc::new(FixedClock::at_date(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        ));
        let resolver = ClickGestureResolver::new(clock.clone(), &AppConfig::default());
        (clock, resolver)
    }

    #[test]
    fn test_double_activate_within_window() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        assert!(resolver
            .pointer_down(target.clone(), PointerKind::Mouse, false)
            .is_empty());
        clock.advance_ms(150);
        let events = resolver.pointer_down(target.clone(), PointerKind::Mouse, false);
        assert_eq!(events, vec![GestureEvent::DoubleActivate { target }]);

        // Nothing left pending.
        clock.advance_ms(1000);
        assert!(resolver.poll().is_empty());
    }

    #[test]
    fn test_single_activate_after_window_expires() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        resolver.pointer_down(target.clone(), PointerKind::Touch, false);
        clock.advance_ms(299);
        assert!(resolver.poll().is_empty());

        clock.advance_ms(1);
        let events = resolver.poll();
        assert_eq!(
            events,
            vec![GestureEvent::SingleActivate { target, kind: PointerKind::Touch }]
        );
    }

    #[test]
    fn test_second_tap_after_window_is_a_new_pending_single() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        resolver.pointer_down(target.clone(), PointerKind::Mouse, false);
        clock.advance_ms(350);
        let events = resolver.pointer_down(target.clone(), PointerKind::Mouse, false);
        // The expired first tap resolves as a single, not a double.
        assert_eq!(
            events,
            vec![GestureEvent::SingleActivate {
                target: target.clone(),
                kind: PointerKind::Mouse
            }]
        );

        clock.advance_ms(300);
        assert_eq!(
            resolver.poll(),
            vec![GestureEvent::SingleActivate { target, kind: PointerKind::Mouse }]
        );
    }

    #[test]
    fn test_down_on_other_target_flushes_pending() {
        let (clock, mut resolver) = resolver();
        let first = cell("u1", 0);
        let second = cell("u2", 1);

        resolver.pointer_down(first.clone(), PointerKind::Mouse, false);
        clock.advance_ms(100);
        let events = resolver.pointer_down(second.clone(), PointerKind::Mouse, false);
        assert_eq!(
            events,
            vec![GestureEvent::SingleActivate { target: first, kind: PointerKind::Mouse }]
        );

        clock.advance_ms(300);
        assert_eq!(
            resolver.poll(),
            vec![GestureEvent::SingleActivate { target: second, kind: PointerKind::Mouse }]
        );
    }

    #[test]
    fn test_long_press_fires_at_threshold() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        resolver.pointer_down(target.clone(), PointerKind::Touch, true);
        clock.advance_ms(799);
        assert!(resolver.poll().is_empty());

        clock.advance_ms(1);
        assert_eq!(resolver.poll(), vec![GestureEvent::LongPress { target }]);
    }

    #[test]
    fn test_release_before_threshold_is_a_normal_tap() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        resolver.pointer_down(target.clone(), PointerKind::Touch, true);
        clock.advance_ms(200);
        assert!(resolver.pointer_up(&target).is_empty());

        // No long press ever fires; the tap resolves as a single once the
        // activation window (anchored at the original down) runs out.
        clock.advance_ms(100);
        assert_eq!(
            resolver.poll(),
            vec![GestureEvent::SingleActivate { target, kind: PointerKind::Touch }]
        );
    }

    #[test]
    fn test_mouse_down_on_occupied_cell_never_arms_long_press() {
        let (clock, mut resolver) = resolver();
        let target = cell("u1", 0);

        resolver.pointer_down(target.clone(), PointerKind::Mouse, true);
        clock.advance_ms(900);
        assert_eq!(
            resolver.poll(),
            vec![GestureEvent::SingleActivate { target, kind: PointerKind::Mouse }]
        );
    }
}
