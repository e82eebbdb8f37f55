// Notification presenter: turns triggers into auto-expiring alerts.
// At most one alert is visible. Replacement is remove-then-show.
// Expiry is wall-clock and owned by the surface; stale expiries are ignored.

use crate::error::EngineError;
use crate::types::*;

const WELCOME_ALERT_ID: &str = "htj-welcome";

/// Rendering side of the presenter (the toast DOM in the extension).
///
/// `show` must arm a one-shot wall-clock timer for `alert.display_duration_ms`
/// and report it back through `NotificationPresenter::on_timer_expired` with
/// `alert.token`.
pub trait AlertSurface {
    fn show(&mut self, alert: &Alert) -> Result<(), EngineError>;
    fn remove(&mut self, alert_id: &str) -> Result<(), EngineError>;
}

/// Presenter timings, taken from `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterSettings {
    pub minimum_visible_seconds: f64,
    pub welcome_duration_seconds: f64,
}

impl From<&EngineConfig> for PresenterSettings {
    fn from(config: &EngineConfig) -> Self {
        PresenterSettings {
            minimum_visible_seconds: config.minimum_visible_seconds,
            welcome_duration_seconds: config.welcome_duration_seconds,
        }
    }
}

impl Default for PresenterSettings {
    fn default() -> Self {
        PresenterSettings::from(&EngineConfig::default())
    }
}

#[derive(Debug)]
pub struct NotificationPresenter<S: AlertSurface> {
    surface: S,
    settings: PresenterSettings,
    enabled: bool,
    visible: Option<Alert>,
    next_token: u32,
    movie: Option<MovieInfo>,
    welcome_shown: bool,
}

impl<S: AlertSurface> NotificationPresenter<S> {
    pub fn new(surface: S, settings: PresenterSettings) -> Self {
        NotificationPresenter {
            surface,
            settings,
            enabled: true,
            visible: None,
            next_token: 1,
            movie: None,
            welcome_shown: false,
        }
    }

    /// Show the alert for `trigger`, replacing whatever is visible.
    pub fn present(&mut self, trigger: &TriggerEvent) {
        if !self.enabled {
            return;
        }

        let category = trigger.event.category;
        let message = match category {
            JumpscareCategory::Major => "Major jumpscare incoming. Watch out!",
            JumpscareCategory::Minor => "Minor jumpscare incoming",
        };
        let visible_seconds = trigger
            .time_remaining
            .max(self.settings.minimum_visible_seconds);

        let alert = self.make_alert(
            format!("htj-{}", trigger.event_index),
            message.to_string(),
            "⚠️",
            category.into(),
            visible_seconds,
        );

        log::info!(
            "jumpscare alert #{}: {}, {:.1}s remaining",
            trigger.event_index,
            category.as_str(),
            trigger.time_remaining
        );

        self.replace_with(alert);
    }

    /// Remember the movie for the welcome alert. A new movie re-arms it.
    pub fn set_movie(&mut self, movie: MovieInfo) {
        self.movie = Some(movie);
        self.welcome_shown = false;
    }

    /// Show the per-movie welcome once. Returns whether it was shown.
    ///
    /// While disabled the welcome is consumed without showing, so re-enabling
    /// does not bring it back.
    pub fn show_welcome(&mut self) -> bool {
        if self.welcome_shown {
            return false;
        }
        let Some(movie) = self.movie.as_ref() else {
            return false;
        };
        self.welcome_shown = true;
        if !self.enabled {
            return false;
        }

        let message = welcome_message(movie);
        let alert = self.make_alert(
            WELCOME_ALERT_ID.to_string(),
            message,
            "🎬",
            AlertClass::Info,
            self.settings.welcome_duration_seconds,
        );
        log::debug!("displaying welcome message");
        self.replace_with(alert);
        self.visible.is_some()
    }

    /// Force-dismiss the visible alert, if any.
    pub fn clear(&mut self) {
        if let Some(alert) = self.visible.take() {
            self.remove_from_surface(&alert);
        }
    }

    /// Disabling clears the visible alert and suppresses future ones.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::info!("alerts {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Surface timer fired. Returns true if it dismissed the visible alert.
    pub fn on_timer_expired(&mut self, token: u32) -> bool {
        let current = self.visible.as_ref().is_some_and(|alert| alert.token == token);
        if current {
            self.clear();
        }
        current
    }

    /// Forget the movie and dismiss any alert.
    pub fn reset(&mut self) {
        self.movie = None;
        self.welcome_shown = false;
        self.clear();
        log::debug!("reset notifications");
    }

    pub fn visible(&self) -> Option<&Alert> {
        self.visible.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn movie(&self) -> Option<&MovieInfo> {
        self.movie.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn make_alert(
        &mut self,
        id: String,
        message: String,
        icon: &str,
        class: AlertClass,
        visible_seconds: f64,
    ) -> Alert {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        Alert {
            id,
            token,
            message,
            icon: icon.to_string(),
            class,
            display_duration_ms: (visible_seconds.max(0.0) * 1000.0).round() as u64,
        }
    }

    fn replace_with(&mut self, alert: Alert) {
        self.clear();
        match self.surface.show(&alert) {
            Ok(()) => self.visible = Some(alert),
            Err(err) => log::error!("failed to show alert {}: {}", alert.id, err),
        }
    }

    fn remove_from_surface(&mut self, alert: &Alert) {
        if let Err(err) = self.surface.remove(&alert.id) {
            log::error!("failed to remove alert {}: {}", alert.id, err);
        }
    }
}

fn welcome_message(movie: &MovieInfo) -> String {
    if !movie.is_in_db {
        return "This movie isn't in our database yet.\nNo jumpscare data available.".to_string();
    }

    match movie.jumpscare_count {
        0 => "This movie has\nno jumpscares.\nEnjoy watching! 🍿".to_string(),
        1 => "Found 1 jumpscare in this movie.\nYou'll get alerts before each one.\nEnjoy! 🍿"
            .to_string(),
        n => format!(
            "Found {} jumpscares in this movie.\nYou'll get alerts before each one.\nEnjoy! 🍿",
            n
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        shown: Vec<Alert>,
        removed: Vec<String>,
        fail_show: bool,
    }

    impl AlertSurface for RecordingSurface {
        fn show(&mut self, alert: &Alert) -> Result<(), EngineError> {
            if self.fail_show {
                return Err(EngineError::Render("no document body".to_string()));
            }
            self.shown.push(alert.clone());
            Ok(())
        }

        fn remove(&mut self, alert_id: &str) -> Result<(), EngineError> {
            self.removed.push(alert_id.to_string());
            Ok(())
        }
    }

    fn presenter() -> NotificationPresenter<RecordingSurface> {
        NotificationPresenter::new(RecordingSurface::default(), PresenterSettings::default())
    }

    fn trigger(index: usize, category: JumpscareCategory, remaining: f64) -> TriggerEvent {
        TriggerEvent {
            event_index: index,
            event: JumpscareEvent {
                id: format!("js-{}", index),
                category,
                occurs_at: PlaybackTime::from_secs(10.0),
                description: None,
            },
            time_remaining: remaining,
        }
    }

    #[test]
    fn present_shows_styled_alert() {
        let mut p = presenter();
        p.present(&trigger(2, JumpscareCategory::Major, 7.5));

        let alert = p.visible().expect("alert visible");
        assert_eq!(alert.id, "htj-2");
        assert_eq!(alert.class, AlertClass::Major);
        assert_eq!(alert.message, "Major jumpscare incoming. Watch out!");
        assert_eq!(alert.display_duration_ms, 7_500);
    }

    #[test]
    fn short_warnings_stay_visible_for_the_minimum() {
        let mut p = presenter();
        p.present(&trigger(0, JumpscareCategory::Minor, 0.4));
        assert_eq!(p.visible().map(|a| a.display_duration_ms), Some(3_000));
        assert_eq!(p.visible().map(|a| a.message.as_str()), Some("Minor jumpscare incoming"));
    }

    #[test]
    fn new_alert_replaces_the_visible_one() {
        let mut p = presenter();
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        p.present(&trigger(1, JumpscareCategory::Major, 4.0));

        assert_eq!(p.surface().removed, vec!["htj-0".to_string()]);
        assert_eq!(p.surface().shown.len(), 2);
        assert_eq!(p.visible().map(|a| a.id.as_str()), Some("htj-1"));
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut p = presenter();
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        let first_token = p.visible().map(|a| a.token).expect("visible");
        p.present(&trigger(1, JumpscareCategory::Minor, 8.0));

        assert!(!p.on_timer_expired(first_token));
        assert_eq!(p.visible().map(|a| a.id.as_str()), Some("htj-1"));

        let second_token = p.visible().map(|a| a.token).expect("visible");
        assert!(p.on_timer_expired(second_token));
        assert!(p.visible().is_none());
        assert!(!p.on_timer_expired(second_token));
    }

    #[test]
    fn clear_dismisses_immediately() {
        let mut p = presenter();
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        p.clear();
        assert!(p.visible().is_none());
        assert_eq!(p.surface().removed, vec!["htj-0".to_string()]);
        p.clear();
        assert_eq!(p.surface().removed.len(), 1);
    }

    #[test]
    fn disabled_presenter_shows_nothing() {
        let mut p = presenter();
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        p.set_enabled(false);
        assert!(p.visible().is_none());

        p.present(&trigger(1, JumpscareCategory::Major, 8.0));
        assert!(p.visible().is_none());

        p.set_enabled(true);
        assert!(p.visible().is_none());
        assert_eq!(p.surface().shown.len(), 1);
    }

    #[test]
    fn render_failure_is_swallowed() {
        let mut p = NotificationPresenter::new(
            RecordingSurface {
                fail_show: true,
                ..Default::default()
            },
            PresenterSettings::default(),
        );
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        assert!(p.visible().is_none());
    }

    #[test]
    fn welcome_shows_once_per_movie() {
        let mut p = presenter();
        assert!(!p.show_welcome());

        p.set_movie(MovieInfo::found(None, "Alien", Some("1979".into()), vec![]));
        assert!(p.show_welcome());
        let alert = p.visible().expect("welcome visible");
        assert_eq!(alert.id, WELCOME_ALERT_ID);
        assert_eq!(alert.class, AlertClass::Info);
        assert_eq!(alert.display_duration_ms, 10_000);
        assert!(alert.message.contains("no jumpscares"));
        assert!(!p.show_welcome());

        p.set_movie(MovieInfo::unknown("Home Movie", None));
        assert!(p.show_welcome());
        assert!(p
            .visible()
            .map(|a| a.message.contains("isn't in our database"))
            .unwrap_or(false));
    }

    #[test]
    fn jumpscare_alert_replaces_welcome() {
        let mut p = presenter();
        p.set_movie(MovieInfo::unknown("Alien", None));
        p.show_welcome();
        p.present(&trigger(0, JumpscareCategory::Major, 5.0));
        assert_eq!(p.surface().removed, vec![WELCOME_ALERT_ID.to_string()]);
        assert_eq!(p.visible().map(|a| a.id.as_str()), Some("htj-0"));
    }

    #[test]
    fn welcome_message_counts() {
        let mut movie = MovieInfo::found(None, "Alien", None, vec![]);
        movie.jumpscare_count = 1;
        assert!(welcome_message(&movie).starts_with("Found 1 jumpscare in"));
        movie.jumpscare_count = 4;
        assert!(welcome_message(&movie).starts_with("Found 4 jumpscares in"));
    }

    #[test]
    fn reset_forgets_movie_and_clears() {
        let mut p = presenter();
        p.set_movie(MovieInfo::unknown("Alien", None));
        p.present(&trigger(0, JumpscareCategory::Minor, 8.0));
        p.reset();
        assert!(p.visible().is_none());
        assert!(p.movie().is_none());
        assert!(!p.show_welcome());
    }
}
