// Playback time monitor: the scheduling hot path.
// Fires at most once per contiguous dwell inside a window; leaving every
// window re-arms, so seeking back before a jumpscare warns again.

use crate::catalog::Catalog;
use crate::types::*;
use crate::window_index::WindowIndex;

/// Recipient of trigger events.
pub trait TriggerSink {
    fn on_trigger(&mut self, trigger: &TriggerEvent);
}

impl<F> TriggerSink for F
where
    F: FnMut(&TriggerEvent),
{
    fn on_trigger(&mut self, trigger: &TriggerEvent) {
        self(trigger)
    }
}

/// Catalog and the index derived from it. Swapped as one unit so the index
/// never outlives its catalog.
#[derive(Debug)]
struct Schedule {
    catalog: Catalog,
    index: WindowIndex,
}

/// Consumes playback samples and emits trigger events on window entry.
pub struct PlaybackMonitor {
    warning_window_seconds: f64,
    precision_seconds: f64,
    schedule: Option<Schedule>,
    last_triggered: Option<usize>,
    sink: Option<Box<dyn TriggerSink>>,
}

impl PlaybackMonitor {
    pub fn new(config: &EngineConfig) -> Self {
        PlaybackMonitor {
            warning_window_seconds: config.warning_window_seconds,
            precision_seconds: config.precision_seconds,
            schedule: None,
            last_triggered: None,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: impl TriggerSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Replace the catalog. The new index is built before the old one is
    /// dropped. No trigger fires from loading alone.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        let index = WindowIndex::build(&catalog, self.warning_window_seconds, self.precision_seconds);
        log::info!("loaded catalog with {} jumpscares", catalog.len());
        self.schedule = Some(Schedule { catalog, index });
        self.last_triggered = None;
    }

    /// Process one playback sample.
    ///
    /// Returns the trigger that was emitted, if this sample entered a new
    /// window. The registered sink (if any) receives the same event.
    pub fn on_time_sample(&mut self, current_time_seconds: f64) -> Option<TriggerEvent> {
        let schedule = self.schedule.as_ref()?;

        let Some(window) = schedule.index.lookup(current_time_seconds) else {
            if self.last_triggered.take().is_some() {
                log::debug!("left warning window at {:.2}s", current_time_seconds);
            }
            return None;
        };

        if self.last_triggered == Some(window.event_index) {
            return None;
        }

        let event = schedule.catalog.get(window.event_index)?.clone();
        let trigger = TriggerEvent {
            event_index: window.event_index,
            time_remaining: event.occurs_at.as_secs() - current_time_seconds,
            event,
        };

        log::info!(
            "triggering jumpscare alert #{} - {:.1}s remaining",
            trigger.event_index + 1,
            trigger.time_remaining
        );

        self.last_triggered = Some(window.event_index);
        if let Some(sink) = self.sink.as_mut() {
            sink.on_trigger(&trigger);
        }

        Some(trigger)
    }

    /// Drop catalog, index and trigger state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        if self.schedule.take().is_some() {
            log::debug!("reset scheduler state");
        }
        self.last_triggered = None;
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.schedule.as_ref().map(|s| &s.catalog)
    }

    pub fn last_triggered(&self) -> Option<usize> {
        self.last_triggered
    }

    pub fn has_catalog(&self) -> bool {
        self.schedule.is_some()
    }
}

impl std::fmt::Debug for PlaybackMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackMonitor")
            .field("warning_window_seconds", &self.warning_window_seconds)
            .field("precision_seconds", &self.precision_seconds)
            .field("schedule", &self.schedule)
            .field("last_triggered", &self.last_triggered)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn catalog_at(times: &[f64]) -> Catalog {
        Catalog::from_raw(
            times
                .iter()
                .enumerate()
                .map(|(i, &t)| RawJumpscare {
                    id: format!("js-{}", i),
                    category: if i % 2 == 0 { "minor" } else { "major" }.to_string(),
                    timestamp_minutes: 0.0,
                    timestamp_seconds: t,
                    description: None,
                })
                .collect(),
        )
    }

    fn monitor_with(times: &[f64]) -> PlaybackMonitor {
        let mut monitor = PlaybackMonitor::new(&EngineConfig::default());
        monitor.set_catalog(catalog_at(times));
        monitor
    }

    /// Feed samples and return (sample, event_index) for every trigger.
    fn run(monitor: &mut PlaybackMonitor, samples: &[f64]) -> Vec<(f64, usize)> {
        samples
            .iter()
            .filter_map(|&t| monitor.on_time_sample(t).map(|trigger| (t, trigger.event_index)))
            .collect()
    }

    #[test]
    fn triggers_in_catalog_order() {
        let mut monitor = monitor_with(&[10.0, 50.0]);
        let samples: Vec<f64> = (0..=60).map(|t| t as f64).collect();

        let fired = run(&mut monitor, &samples);
        assert_eq!(fired, vec![(2.0, 0), (42.0, 1)]);
    }

    #[test]
    fn time_remaining_uses_unrounded_sample() {
        let mut monitor = monitor_with(&[10.0]);
        let trigger = monitor.on_time_sample(2.3).expect("inside window");
        assert!((trigger.time_remaining - 7.7).abs() < 1e-9);
        assert_eq!(trigger.event.id, "js-0");
    }

    #[test]
    fn repeated_samples_in_one_dwell_fire_once() {
        let mut monitor = monitor_with(&[10.0]);
        let fired = run(&mut monitor, &[3.0, 3.0, 3.2, 2.9, 5.0, 9.9, 10.0]);
        assert_eq!(fired.len(), 1);
        assert_eq!(monitor.last_triggered(), Some(0));
    }

    #[test]
    fn re_entry_after_leaving_fires_again() {
        let mut monitor = monitor_with(&[10.0]);
        let fired = run(&mut monitor, &[4.0, 5.0, 20.0, 6.0, 7.0]);
        assert_eq!(fired, vec![(4.0, 0), (6.0, 0)]);
    }

    #[test]
    fn seeking_backward_inside_the_window_does_not_re_fire() {
        let mut monitor = monitor_with(&[10.0]);
        let fired = run(&mut monitor, &[9.0, 3.0]);
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn overlap_hands_off_to_the_later_event() {
        let mut monitor = monitor_with(&[10.0, 14.0]);
        assert_eq!(monitor.on_time_sample(7.0).map(|t| t.event_index), Some(0));
        assert_eq!(monitor.on_time_sample(10.0), None);
        // Straight from window A into window B without an exit sample.
        assert_eq!(monitor.on_time_sample(11.0).map(|t| t.event_index), Some(1));
        assert_eq!(monitor.on_time_sample(13.0), None);
    }

    #[test]
    fn leaving_all_windows_clears_trigger_state() {
        let mut monitor = monitor_with(&[10.0]);
        monitor.on_time_sample(5.0);
        assert_eq!(monitor.last_triggered(), Some(0));
        assert_eq!(monitor.on_time_sample(30.0), None);
        assert_eq!(monitor.last_triggered(), None);
        assert_eq!(monitor.on_time_sample(-5.0), None);
    }

    #[test]
    fn set_catalog_clears_trigger_state_without_firing() {
        let mut monitor = monitor_with(&[10.0]);
        monitor.on_time_sample(5.0);
        monitor.set_catalog(catalog_at(&[10.0]));
        assert_eq!(monitor.last_triggered(), None);
        // Same dwell, new catalog: fires again because state was reset.
        assert!(monitor.on_time_sample(5.0).is_some());
    }

    #[test]
    fn reset_without_catalog_is_a_no_op() {
        let mut monitor = PlaybackMonitor::new(&EngineConfig::default());
        monitor.reset();
        monitor.reset();
        assert!(!monitor.has_catalog());
        assert_eq!(monitor.on_time_sample(5.0), None);
    }

    #[test]
    fn reset_drops_the_catalog() {
        let mut monitor = monitor_with(&[10.0]);
        monitor.reset();
        assert!(monitor.catalog().is_none());
        assert_eq!(monitor.on_time_sample(5.0), None);
    }

    #[test]
    fn sink_receives_each_trigger() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&received);

        let mut monitor = monitor_with(&[10.0, 50.0]);
        monitor.set_sink(move |trigger: &TriggerEvent| seen.borrow_mut().push(trigger.event_index));

        for t in 0..=60 {
            monitor.on_time_sample(t as f64);
        }
        assert_eq!(*received.borrow(), vec![0, 1]);
    }

    #[test]
    fn missing_sink_still_advances_state() {
        let mut monitor = monitor_with(&[10.0]);
        monitor.clear_sink();
        assert!(monitor.on_time_sample(5.0).is_some());
        assert_eq!(monitor.last_triggered(), Some(0));
    }

    #[test]
    fn custom_window_and_precision() {
        let config = EngineConfig {
            warning_window_seconds: 3.0,
            precision_seconds: 0.5,
            ..Default::default()
        };
        let mut monitor = PlaybackMonitor::new(&config);
        monitor.set_catalog(catalog_at(&[10.0]));
        assert_eq!(monitor.on_time_sample(6.7), None);
        assert!(monitor.on_time_sample(6.8).is_some());
    }

    // =========================================================================
    // Property-Based Tests
    // =========================================================================

    fn catalog_times_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0u32..600, 0..8).prop_map(|mut times| {
            times.sort_unstable();
            times.dedup();
            times.into_iter().map(f64::from).collect()
        })
    }

    proptest! {
        /// Property: a monotonic sweep that stays inside one window fires once.
        #[test]
        fn monotonic_dwell_fires_exactly_once(
            event_time in 8u32..600,
            offsets in prop::collection::vec(0.0f64..8.0, 1..40)
        ) {
            let event_time = f64::from(event_time);
            let mut monitor = monitor_with(&[event_time]);

            let mut samples: Vec<f64> = offsets
                .into_iter()
                .map(|o| event_time - 8.0 + o)
                .collect();
            samples.sort_by(f64::total_cmp);

            let fired = run(&mut monitor, &samples);
            prop_assert_eq!(fired.len(), 1);
        }

        /// Property: enter, leave, re-enter fires exactly twice for one event.
        #[test]
        fn enter_leave_reenter_fires_twice(event_time in 20u32..600, inside in 0.0f64..8.0) {
            let event_time = f64::from(event_time);
            let mut monitor = monitor_with(&[event_time]);

            let sample = event_time - 8.0 + inside;
            let samples = [sample, sample, event_time + 5.0, sample, sample];
            let fired = run(&mut monitor, &samples);
            prop_assert_eq!(fired.len(), 2);
            prop_assert!(fired.iter().all(|&(_, index)| index == 0));
        }

        /// Property: reset + same catalog + same samples yields the same triggers.
        #[test]
        fn reset_then_replay_is_identical(
            times in catalog_times_strategy(),
            samples in prop::collection::vec(-10.0f64..620.0, 0..200)
        ) {
            let mut monitor = monitor_with(&times);
            let first = run(&mut monitor, &samples);

            monitor.reset();
            monitor.set_catalog(catalog_at(&times));
            let second = run(&mut monitor, &samples);

            prop_assert_eq!(first, second);
        }

        /// Property: an empty catalog never triggers.
        #[test]
        fn empty_catalog_never_triggers(samples in prop::collection::vec(any::<f64>(), 0..100)) {
            let mut monitor = monitor_with(&[]);
            let fired = run(&mut monitor, &samples);
            prop_assert!(fired.is_empty());
        }

        /// Property: consecutive triggers never repeat an index without an
        /// intervening exit from every window.
        #[test]
        fn no_duplicate_without_exit(
            times in catalog_times_strategy(),
            samples in prop::collection::vec(0.0f64..620.0, 0..200)
        ) {
            let mut monitor = monitor_with(&times);
            let mut previous: Option<usize> = None;
            for t in samples {
                let fired = monitor.on_time_sample(t);
                if let Some(trigger) = &fired {
                    prop_assert_ne!(Some(trigger.event_index), previous);
                }
                previous = monitor.last_triggered();
            }
        }
    }
}
