// Streaming service strategies, keyed by URL.
// DOM access stays in JS; this holds the URL rules and the text cleanup that
// turns scraped strings into a lookup key.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Supported streaming services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingService {
    Netflix,
    PrimeVideo,
}

impl StreamingService {
    pub fn name(&self) -> &'static str {
        match self {
            StreamingService::Netflix => "Netflix",
            StreamingService::PrimeVideo => "Prime Video",
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            StreamingService::Netflix => url.contains("netflix.com"),
            StreamingService::PrimeVideo => url.contains("primevideo.com"),
        }
    }

    /// Detail page for a single title.
    pub fn is_on_movie_page(&self, url: &str) -> bool {
        match self {
            StreamingService::Netflix => url.contains("/browse/") && url.contains("?jbv="),
            StreamingService::PrimeVideo => {
                url.contains("/detail/") || url.contains("/gp/video/detail/")
            }
        }
    }

    /// Whether the page is showing the video player.
    ///
    /// Prime Video keeps the URL when the player opens, so JS probes for the
    /// player container and passes the result in.
    pub fn is_in_video_player(&self, url: &str, has_player_container: bool) -> bool {
        match self {
            StreamingService::Netflix => url.contains("/watch/"),
            StreamingService::PrimeVideo => has_player_container,
        }
    }
}

/// Ordered set of services; the first match wins.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<StreamingService>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry {
            services: vec![StreamingService::PrimeVideo, StreamingService::Netflix],
        }
    }

    pub fn register(&mut self, service: StreamingService) {
        if !self.services.contains(&service) {
            self.services.push(service);
        }
    }

    pub fn detect(&self, url: &str) -> Option<StreamingService> {
        let service = self.services.iter().copied().find(|s| s.matches(url));
        if let Some(service) = service {
            log::debug!("detected service: {}", service.name());
        }
        service
    }

    pub fn is_supported(&self, url: &str) -> bool {
        self.services.iter().any(|s| s.matches(url))
    }

    pub fn services(&self) -> &[StreamingService] {
        &self.services
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static YEAR_REGEX: OnceLock<Regex> = OnceLock::new();
static TRAILING_YEAR_REGEX: OnceLock<Regex> = OnceLock::new();

fn year_regex() -> &'static Regex {
    YEAR_REGEX.get_or_init(|| Regex::new(r"\b(19\d\d|20\d\d)\b").expect("Failed to compile year regex"))
}

fn trailing_year_regex() -> &'static Regex {
    // "Movie Title (1999)" or "Movie Title (2004 Director's Cut)"
    TRAILING_YEAR_REGEX.get_or_init(|| {
        Regex::new(r"\s*\(\s*(?:19|20)\d{2}[^)]*\)\s*$").expect("Failed to compile trailing year regex")
    })
}

/// First four-digit year between 1900 and 2099 in `text`.
pub fn extract_year(text: &str) -> Option<String> {
    year_regex().find(text).map(|m| m.as_str().to_string())
}

/// Strip a trailing parenthetical year and surrounding whitespace.
pub fn clean_title(raw: &str) -> String {
    trailing_year_regex().replace(raw, "").trim().to_string()
}

/// Combine the text title and the logo image's alt text.
/// Both present and different means neither can be trusted.
pub fn reconcile_titles(text_title: Option<&str>, image_title: Option<&str>) -> Option<String> {
    let text_title = text_title.map(str::trim).filter(|t| !t.is_empty());
    let image_title = image_title.map(str::trim).filter(|t| !t.is_empty());

    match (text_title, image_title) {
        (Some(text), Some(image)) if text == image => Some(clean_title(text)),
        (Some(_), Some(_)) => None,
        (Some(title), None) | (None, Some(title)) => Some(clean_title(title)),
        (None, None) => None,
    }
}
