// Precomputed tick -> warning window lookup.
// Rule: build and lookup share one rounding function, or windows get missed.

use std::collections::HashMap;

use crate::catalog::Catalog;

/// Warning window for one catalog entry: `[occurs_at - warning, occurs_at]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub event_index: usize,
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Maps rounded playback ticks to the window that owns them.
///
/// When windows overlap, the tick goes to whichever window registered it
/// first, i.e. the earlier jumpscare. The later jumpscare keeps only the ticks
/// past the earlier one's end, so its warning can be shorter than configured.
#[derive(Debug, Clone, Default)]
pub struct WindowIndex {
    windows: Vec<Window>,
    ticks: HashMap<i64, usize>,
    precision_seconds: f64,
}

// Absorbs accumulated float error when counting ticks across a window.
const TICK_EPSILON: f64 = 1e-9;

impl WindowIndex {
    /// Build the index for `catalog`.
    ///
    /// `precision_seconds` must be positive; `EngineConfig::validate` enforces
    /// this for the engine.
    pub fn build(catalog: &Catalog, warning_window_seconds: f64, precision_seconds: f64) -> Self {
        let mut windows = Vec::with_capacity(catalog.len());
        let mut ticks = HashMap::new();

        for (event_index, event) in catalog.iter().enumerate() {
            let end = event.occurs_at.as_secs();
            let start = end - warning_window_seconds;
            windows.push(Window {
                event_index,
                start,
                end,
            });

            let steps = ((end - start) / precision_seconds + TICK_EPSILON).floor() as i64;
            for step in 0..=steps {
                let time = start + step as f64 * precision_seconds;
                if let Some(tick) = tick_of(time, precision_seconds) {
                    ticks.entry(tick).or_insert(event_index);
                }
            }
        }

        log::debug!(
            "built window index: {} windows over {} ticks",
            windows.len(),
            ticks.len()
        );

        WindowIndex {
            windows,
            ticks,
            precision_seconds,
        }
    }

    /// Window owning the tick nearest to `time`, if any.
    /// Negative and non-finite times never match.
    pub fn lookup(&self, time: f64) -> Option<&Window> {
        if !(time.is_finite() && time >= 0.0) {
            return None;
        }
        let tick = tick_of(time, self.precision_seconds)?;
        self.ticks
            .get(&tick)
            .and_then(|&event_index| self.windows.get(event_index))
    }

    /// Round `time` to the index's tick grid, in seconds.
    pub fn round(&self, time: f64) -> f64 {
        round_to_precision(time, self.precision_seconds)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn precision_seconds(&self) -> f64 {
        self.precision_seconds
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// `round(time / precision) * precision`, rounding halves up.
pub fn round_to_precision(time: f64, precision_seconds: f64) -> f64 {
    (time / precision_seconds + 0.5).floor() * precision_seconds
}

fn tick_of(time: f64, precision_seconds: f64) -> Option<i64> {
    let tick = (time / precision_seconds + 0.5).floor();
    if tick.is_finite() {
        Some(tick as i64)
    } else {
        None
    }
}
