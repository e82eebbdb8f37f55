// One tab's engine: monitor feeding presenter, plus movie-change handling.
// The orchestrator is the monitor's single trigger recipient.

use crate::catalog::Catalog;
use crate::monitor::PlaybackMonitor;
use crate::presenter::{AlertSurface, NotificationPresenter, PresenterSettings};
use crate::types::*;

#[derive(Debug)]
pub struct Orchestrator<S: AlertSurface> {
    monitor: PlaybackMonitor,
    presenter: NotificationPresenter<S>,
}

impl<S: AlertSurface> Orchestrator<S> {
    pub fn new(config: &EngineConfig, surface: S) -> Self {
        Orchestrator {
            monitor: PlaybackMonitor::new(config),
            presenter: NotificationPresenter::new(surface, PresenterSettings::from(config)),
        }
    }

    /// Movie change: rebuild scheduling from the movie's jumpscares, drop any
    /// in-flight alert and re-arm the welcome. Returns the catalog size, which
    /// is also the count the welcome reports.
    pub fn load_movie(&mut self, mut movie: MovieInfo) -> usize {
        let catalog = Catalog::from_raw(movie.jumpscares.clone());
        let count = catalog.len();
        if movie.is_in_db {
            movie.jumpscare_count = count;
        }
        self.presenter.clear();
        self.monitor.set_catalog(catalog);
        self.presenter.set_movie(movie);
        count
    }

    /// Replace only the scheduling data.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.monitor.set_catalog(catalog);
    }

    /// Playback tick. The welcome goes up on the first sample past zero; a
    /// trigger on the same sample replaces it.
    pub fn on_time_sample(&mut self, current_time_seconds: f64) -> Option<TriggerEvent> {
        if current_time_seconds > 0.0 {
            self.presenter.show_welcome();
        }

        let trigger = self.monitor.on_time_sample(current_time_seconds)?;
        self.presenter.present(&trigger);
        Some(trigger)
    }

    /// Toggle alerts. Scheduling keeps running while disabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.presenter.set_enabled(enabled);
    }

    pub fn alert_expired(&mut self, token: u32) -> bool {
        self.presenter.on_timer_expired(token)
    }

    /// Navigation away or movie cleared.
    pub fn reset(&mut self) {
        self.monitor.reset();
        self.presenter.reset();
    }

    pub fn monitor(&self) -> &PlaybackMonitor {
        &self.monitor
    }

    pub fn presenter(&self) -> &NotificationPresenter<S> {
        &self.presenter
    }
}
