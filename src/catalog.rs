// Per-movie jumpscare catalog. Built once from the lookup payload, replaced
// wholesale on movie change, never mutated in place.

use crate::error::EngineError;
use crate::types::*;

/// Ordered, immutable list of jumpscares for one movie session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    events: Vec<JumpscareEvent>,
}

impl Catalog {
    pub fn empty() -> Self {
        Catalog { events: Vec::new() }
    }

    /// Build a catalog from raw lookup entries.
    ///
    /// Entries with a negative or non-finite time are dropped and logged. The
    /// rest are sorted ascending by time (stable, so equal-time entries keep
    /// input order); an entry landing on exactly the same time as an earlier
    /// one is dropped as well.
    pub fn from_raw(raw: Vec<RawJumpscare>) -> Self {
        let mut accepted: Vec<JumpscareEvent> = raw
            .into_iter()
            .filter_map(|entry| match normalize(entry) {
                Ok(event) => Some(event),
                Err(err) => {
                    log::warn!("dropping jumpscare: {}", err);
                    None
                }
            })
            .collect();

        accepted.sort_by(|a, b| a.occurs_at.as_secs().total_cmp(&b.occurs_at.as_secs()));

        let mut events: Vec<JumpscareEvent> = Vec::with_capacity(accepted.len());
        for event in accepted {
            if let Some(previous) = events.last() {
                if previous.occurs_at == event.occurs_at {
                    log::warn!(
                        "dropping jumpscare {}: same time as {} ({}s)",
                        event.id,
                        previous.id,
                        event.occurs_at.as_secs()
                    );
                    continue;
                }
            }
            events.push(event);
        }

        Catalog { events }
    }

    /// Parse the lookup payload's jumpscare array.
    ///
    /// Only a non-array envelope is an error. Individual entries that fail to
    /// parse are dropped without affecting their neighbours.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(Catalog::from_raw(raw_entries_from_values(values)))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&JumpscareEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JumpscareEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[JumpscareEvent] {
        &self.events
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a JumpscareEvent;
    type IntoIter = std::slice::Iter<'a, JumpscareEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn normalize(raw: RawJumpscare) -> Result<JumpscareEvent, EngineError> {
    let occurs_at = PlaybackTime::from_minutes_seconds(raw.timestamp_minutes, raw.timestamp_seconds);
    if !occurs_at.is_valid() {
        return Err(EngineError::MalformedEntry {
            id: raw.id,
            reason: format!("time {}s is not a non-negative number", occurs_at.as_secs()),
        });
    }

    let category = JumpscareCategory::from_label(&raw.category).unwrap_or_else(|| {
        log::warn!(
            "jumpscare {} has unknown category {:?}, treating as minor",
            raw.id,
            raw.category
        );
        JumpscareCategory::Minor
    });

    Ok(JumpscareEvent {
        id: raw.id,
        category,
        occurs_at,
        description: raw.description,
    })
}
