// Per-tab session state with an explicit load/save boundary.
// The scheduling core never touches this; a tab's monitor is rebuilt from
// the stored movie's jumpscares on resume.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::*;

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabState {
    pub is_enabled: bool,
    pub movie: Option<MovieInfo>,
}

impl Default for TabState {
    fn default() -> Self {
        TabState {
            is_enabled: true,
            movie: None,
        }
    }
}

impl TabState {
    /// Lenient parse of a persisted snapshot. Bad fields fall back to their
    /// defaults instead of discarding the whole state.
    pub fn from_snapshot(value: &serde_json::Value) -> Self {
        let is_enabled = value
            .get("is_enabled")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);

        let movie = value
            .get("movie")
            .filter(|movie| movie.is_object())
            .and_then(|movie| match serde_json::from_value::<MovieInfo>(movie.clone()) {
                Ok(movie) => Some(movie),
                Err(err) => {
                    log::warn!("discarding persisted movie: {}", err);
                    None
                }
            });

        TabState { is_enabled, movie }
    }
}

/// Result of asking the lookup service about a detected title.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found {
        id: Option<String>,
        title: String,
        year: Option<String>,
        jumpscares: Vec<RawJumpscare>,
    },
    NotFound {
        title: String,
        year: Option<String>,
    },
}

/// Key/value snapshot storage (`chrome.storage.session` in the extension).
pub trait SnapshotStorage {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), EngineError>;
    fn remove(&mut self, key: &str) -> Result<(), EngineError>;
}

/// In-process storage; also used in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), EngineError> {
        self.entries.remove(key);
        Ok(())
    }
}

fn storage_key(tab: TabId) -> String {
    format!("tab_{}", tab)
}

/// In-memory tab map backed by snapshot storage.
#[derive(Debug)]
pub struct SessionStore<S: SnapshotStorage> {
    states: HashMap<TabId, TabState>,
    storage: S,
}

impl<S: SnapshotStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        SessionStore {
            states: HashMap::new(),
            storage,
        }
    }

    /// State for `tab`: memory first, then storage, then a fresh default.
    pub fn load(&mut self, tab: TabId) -> &mut TabState {
        if !self.states.contains_key(&tab) {
            let state = self.read_snapshot(tab).unwrap_or_default();
            self.states.insert(tab, state);
        }
        self.states.entry(tab).or_default()
    }

    pub fn save(&mut self, tab: TabId) -> Result<(), EngineError> {
        let snapshot = serde_json::to_string(self.load(tab))?;
        self.storage.set(&storage_key(tab), snapshot)?;
        log::debug!("saved state for tab {}", tab);
        Ok(())
    }

    /// Forget `tab` in memory and in storage. Storage failures are logged.
    pub fn clear(&mut self, tab: TabId) {
        self.states.remove(&tab);
        if let Err(err) = self.storage.remove(&storage_key(tab)) {
            log::error!("failed to delete state for tab {}: {}", tab, err);
        }
        log::debug!("cleared state for tab {}", tab);
    }

    pub fn set_enabled(&mut self, tab: TabId, enabled: bool) -> Result<(), EngineError> {
        self.load(tab).is_enabled = enabled;
        self.save(tab)
    }

    /// Whether a detected title needs a lookup. Unchanged title and year
    /// reuse the stored result.
    pub fn handle_movie_detected(&mut self, tab: TabId, title: &str, year: Option<&str>) -> bool {
        !self
            .load(tab)
            .movie
            .as_ref()
            .is_some_and(|movie| movie.is_same_title(title, year))
    }

    /// Store a lookup result and persist it. Returns the stored movie.
    pub fn apply_lookup(&mut self, tab: TabId, outcome: LookupOutcome) -> Result<MovieInfo, EngineError> {
        let movie = match outcome {
            LookupOutcome::Found {
                id,
                title,
                year,
                jumpscares,
            } => MovieInfo::found(id, title, year, jumpscares),
            LookupOutcome::NotFound { title, year } => MovieInfo::unknown(title, year),
        };

        log::info!(
            "loaded {} jumpscares for {:?} in tab {} (in db: {})",
            movie.jumpscare_count,
            movie.title,
            tab,
            movie.is_in_db
        );

        self.load(tab).movie = Some(movie.clone());
        self.save(tab)?;
        Ok(movie)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn read_snapshot(&self, tab: TabId) -> Option<TabState> {
        let raw = match self.storage.get(&storage_key(tab)) {
            Ok(raw) => raw?,
            Err(err) => {
                log::error!("failed to load state for tab {}: {}", tab, err);
                return None;
            }
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => {
                log::debug!("loaded state for tab {} from storage", tab);
                Some(TabState::from_snapshot(&value))
            }
            Err(err) => {
                log::warn!("ignoring unreadable state for tab {}: {}", tab, err);
                None
            }
        }
    }
}
