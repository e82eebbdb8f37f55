// jumpscare_engine: Rust/WASM engine behind the jumpscare warning extension.
// Scheduling and alert lifetime live here; JS is plumbing (DOM scraping,
// toast rendering, extension messaging, storage).

mod catalog;
mod detection;
mod error;
pub mod logging;
mod monitor;
mod orchestrator;
mod presenter;
mod services;
mod session;
mod surface;
mod types;
mod window_index;

use wasm_bindgen::prelude::*;

pub use catalog::Catalog;
pub use detection::{DetectionRetry, DetectionState, RetryPolicy};
pub use error::EngineError;
pub use monitor::{PlaybackMonitor, TriggerSink};
pub use orchestrator::Orchestrator;
pub use presenter::{AlertSurface, NotificationPresenter, PresenterSettings};
pub use services::{clean_title, extract_year, reconcile_titles, ServiceRegistry, StreamingService};
pub use session::{LookupOutcome, MemoryStorage, SessionStore, SnapshotStorage, TabId, TabState};
pub use surface::JsAlertSurface;
pub use types::*;
pub use window_index::{round_to_precision, Window, WindowIndex};

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init(log::LevelFilter::Info);
}

/// Change the console log level ("off", "error", "warn", "info", "debug", "trace").
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logging::init(logging::parse_level(level));
}

/// Name of the streaming service serving `url`, if supported.
#[wasm_bindgen]
pub fn detect_service(url: &str) -> Option<String> {
    ServiceRegistry::new()
        .detect(url)
        .map(|service| service.name().to_string())
}

/// Lookup title from the scraped text title and logo alt text.
#[wasm_bindgen]
pub fn normalize_title(text_title: Option<String>, image_title: Option<String>) -> Option<String> {
    reconcile_titles(text_title.as_deref(), image_title.as_deref())
}

/// Release year found in scraped metadata text.
#[wasm_bindgen]
pub fn find_year(text: &str) -> Option<String> {
    extract_year(text)
}

/// Per-tab engine exposed to JavaScript.
/// Complex values cross the boundary as JSON strings.
#[wasm_bindgen]
pub struct JumpscareEngine {
    inner: Orchestrator<JsAlertSurface>,
}

#[wasm_bindgen]
impl JumpscareEngine {
    /// `surface` is a JS object with `show(alertJson)` and `remove(alertId)`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, surface: JsValue) -> Result<JumpscareEngine, JsValue> {
        let config = EngineConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let surface = JsAlertSurface::from_js(surface)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(JumpscareEngine {
            inner: Orchestrator::new(&config, surface),
        })
    }

    /// Movie change with full movie JSON (`MovieInfo`). Returns the number of
    /// jumpscares scheduled.
    pub fn load_movie(&mut self, movie_json: &str) -> Result<usize, JsValue> {
        let movie: MovieInfo = serde_json::from_str(movie_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid movie: {}", e)))?;
        Ok(self.inner.load_movie(movie))
    }

    /// Replace scheduling data from a raw jumpscare array. Returns the number
    /// of entries kept.
    pub fn set_jumpscares(&mut self, jumpscares_json: &str) -> Result<usize, JsValue> {
        let catalog = Catalog::from_json(jumpscares_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid jumpscares: {}", e)))?;
        let count = catalog.len();
        self.inner.set_catalog(catalog);
        Ok(count)
    }

    /// Playback tick; call only while the video is playing.
    /// Returns the trigger event JSON when a warning window was entered.
    pub fn on_time_sample(&mut self, current_time_seconds: f64) -> Option<String> {
        let trigger = self.inner.on_time_sample(current_time_seconds)?;
        match serde_json::to_string(&trigger) {
            Ok(json) => Some(json),
            Err(err) => {
                log::error!("failed to serialize trigger: {}", err);
                None
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.presenter().is_enabled()
    }

    /// Dismiss timer callback from the surface.
    pub fn alert_expired(&mut self, token: u32) -> bool {
        self.inner.alert_expired(token)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn jumpscare_count(&self) -> usize {
        self.inner.monitor().catalog().map_or(0, Catalog::len)
    }
}

/// Movie detection retry timing exposed to JavaScript. The content script
/// owns the timers and reports each extraction attempt.
#[wasm_bindgen]
pub struct MovieDetection {
    inner: DetectionRetry,
}

#[wasm_bindgen]
impl MovieDetection {
    /// `policy_json` is a `RetryPolicy`; `"{}"` uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(policy_json: &str) -> Result<MovieDetection, JsValue> {
        let policy: RetryPolicy = serde_json::from_str(policy_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid retry policy: {}", e)))?;
        Ok(MovieDetection {
            inner: DetectionRetry::new(policy),
        })
    }

    pub fn start(&mut self) {
        self.inner.start();
    }

    /// Delay in milliseconds before the next attempt, or `undefined` once
    /// detection gives up.
    pub fn on_failure(&mut self) -> Option<f64> {
        self.inner.on_failure().map(|delay| delay as f64)
    }

    pub fn on_success(&mut self) {
        self.inner.on_success();
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    /// Current state as JSON, e.g. `{"state":"retrying","attempt":2}`.
    pub fn state(&self) -> String {
        serde_json::to_string(&self.inner.state()).unwrap_or_default()
    }
}
