//! Display configuration.

use std::time::Duration;

/// Configuration for a display surface.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// How often the pause monitor checks the playback position.
    pub poll_interval: Duration,
    /// Seconds to back off when seeking to a pause point.
    pub seek_lead_in: f64,
    /// Whether this display is embedded as a preview inside the presenter.
    pub embedded_preview: bool,
    /// Translation preferences for passage lookups, most preferred first.
    pub translations: Vec<String>,
    /// Lines of passage text shown per page.
    pub verse_lines_per_page: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            seek_lead_in: 0.25,
            embedded_preview: false,
            translations: vec!["web".to_string(), "kjv".to_string()],
            verse_lines_per_page: 4,
        }
    }
}

impl DisplayConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pause monitor interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the lead-in applied when seeking to a pause point.
    pub fn with_seek_lead_in(mut self, seconds: f64) -> Self {
        self.seek_lead_in = seconds.max(0.0);
        self
    }

    /// Marks the display as an embedded preview (fullscreen is ignored).
    pub fn with_embedded_preview(mut self, embedded: bool) -> Self {
        self.embedded_preview = embedded;
        self
    }

    /// Sets the translation preferences.
    pub fn with_translations(mut self, translations: Vec<String>) -> Self {
        self.translations = translations;
        self
    }

    /// Sets how many passage lines fit on one page.
    pub fn with_verse_lines_per_page(mut self, lines: usize) -> Self {
        self.verse_lines_per_page = lines.max(1);
        self
    }
}
