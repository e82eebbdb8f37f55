// Strong typing over strings. Newtypes for playback time, enums for categories.
// Wire shapes use snake_case JSON, same as the lookup payload.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Playback position in seconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PlaybackTime(f64);

impl PlaybackTime {
    pub fn from_secs(secs: f64) -> Self {
        PlaybackTime(secs)
    }

    /// Combine the lookup service's minute/second split into one offset.
    pub fn from_minutes_seconds(minutes: f64, seconds: f64) -> Self {
        PlaybackTime(minutes * 60.0 + seconds)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 * 1000.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

/// Jumpscare severity. Drives alert styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JumpscareCategory {
    Minor,
    Major,
}

impl JumpscareCategory {
    /// Parse a category label from the lookup payload (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(JumpscareCategory::Minor),
            "major" => Some(JumpscareCategory::Major),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JumpscareCategory::Minor => "minor",
            JumpscareCategory::Major => "major",
        }
    }
}

/// Jumpscare entry as delivered by the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJumpscare {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub category: String,
    pub timestamp_minutes: f64,
    pub timestamp_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// Database ids arrive as strings or integers depending on the backend.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Parse each entry of a jumpscare array on its own. Entries that fail to
/// parse are dropped and logged; their neighbours are kept.
pub fn raw_entries_from_values(values: Vec<serde_json::Value>) -> Vec<RawJumpscare> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value::<RawJumpscare>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("dropping jumpscare at position {}: {}", position, err);
                None
            }
        })
        .collect()
}

fn lenient_jumpscares<'de, D>(deserializer: D) -> Result<Vec<RawJumpscare>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw_entries_from_values(values))
}

/// A normalized jumpscare inside a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpscareEvent {
    pub id: String,
    pub category: JumpscareCategory,
    #[serde(rename = "occurs_at_seconds")]
    pub occurs_at: PlaybackTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Emitted when playback enters a jumpscare's warning window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub event_index: usize,
    pub event: JumpscareEvent,
    /// Seconds between the sample that fired and the jumpscare itself.
    pub time_remaining: f64,
}

/// Movie identity plus lookup result, as kept per tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MovieInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default, alias = "jumpscareCount")]
    pub jumpscare_count: usize,
    #[serde(default, deserialize_with = "lenient_jumpscares")]
    pub jumpscares: Vec<RawJumpscare>,
    #[serde(default, alias = "isInDb")]
    pub is_in_db: bool,
}

impl MovieInfo {
    /// Movie that the lookup service does not know about.
    pub fn unknown(title: impl Into<String>, year: Option<String>) -> Self {
        MovieInfo {
            id: None,
            title: title.into(),
            year,
            jumpscare_count: 0,
            jumpscares: Vec::new(),
            is_in_db: false,
        }
    }

    pub fn found(
        id: Option<String>,
        title: impl Into<String>,
        year: Option<String>,
        jumpscares: Vec<RawJumpscare>,
    ) -> Self {
        MovieInfo {
            id,
            title: title.into(),
            year,
            jumpscare_count: jumpscares.len(),
            jumpscares,
            is_in_db: true,
        }
    }

    pub fn is_same_title(&self, title: &str, year: Option<&str>) -> bool {
        self.title == title && self.year.as_deref() == year
    }
}

/// Alert styling class. `Info` is used for the per-movie welcome alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertClass {
    Minor,
    Major,
    Info,
}

impl From<JumpscareCategory> for AlertClass {
    fn from(category: JumpscareCategory) -> Self {
        match category {
            JumpscareCategory::Minor => AlertClass::Minor,
            JumpscareCategory::Major => AlertClass::Major,
        }
    }
}

/// A user-visible alert handed to the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// DOM id, `htj-<eventIndex>` for jumpscares, `htj-welcome` for the welcome.
    pub id: String,
    /// Unique per `show`. The surface echoes it back when its timer fires.
    pub token: u32,
    pub message: String,
    pub icon: String,
    pub class: AlertClass,
    /// Wall-clock lifetime. Playback may pause, so this is not playback time.
    pub display_duration_ms: u64,
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds of warning before each jumpscare.
    #[serde(default = "default_warning_window")]
    pub warning_window_seconds: f64,
    /// Lookup tick granularity in seconds.
    #[serde(default = "default_precision")]
    pub precision_seconds: f64,
    /// Lower bound on how long a jumpscare alert stays visible.
    #[serde(default = "default_minimum_visible")]
    pub minimum_visible_seconds: f64,
    #[serde(default = "default_welcome_duration")]
    pub welcome_duration_seconds: f64,
}

/// Upper bound on `warning_window_seconds / precision_seconds`. Each window
/// registers that many ticks when a catalog is loaded.
pub const MAX_TICKS_PER_WINDOW: f64 = 10_000.0;

fn default_warning_window() -> f64 {
    8.0
}

fn default_precision() -> f64 {
    1.0
}

fn default_minimum_visible() -> f64 {
    3.0
}

fn default_welcome_duration() -> f64 {
    10.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            warning_window_seconds: default_warning_window(),
            precision_seconds: default_precision(),
            minimum_visible_seconds: default_minimum_visible(),
            welcome_duration_seconds: default_welcome_duration(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.precision_seconds.is_finite() && self.precision_seconds > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "precision_seconds must be positive, got {}",
                self.precision_seconds
            )));
        }

        let non_negative = [
            ("warning_window_seconds", self.warning_window_seconds),
            ("minimum_visible_seconds", self.minimum_visible_seconds),
            ("welcome_duration_seconds", self.welcome_duration_seconds),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let ticks = self.warning_window_seconds / self.precision_seconds;
        if ticks > MAX_TICKS_PER_WINDOW {
            return Err(EngineError::InvalidConfig(format!(
                "warning_window_seconds / precision_seconds is {}, at most {} ticks per window",
                ticks, MAX_TICKS_PER_WINDOW
            )));
        }

        Ok(())
    }
}
