//! Controller configuration

use serde::{Deserialize, Serialize};

use crate::stream::StreamSettings;

/// Configuration for a controller instance.
///
/// Supplied once at construction and immutable for the instance's life.
/// Every field has a default, so `Config::default()` (or an empty config
/// document) yields a working controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Phrases that activate transcription while listening.
    /// An empty list falls back to the defaults.
    #[serde(default = "default_wake_words")]
    pub wake_words: Vec<String>,

    /// Phrases that deactivate transcription back to listening.
    /// An empty list falls back to the defaults.
    #[serde(default = "default_sleep_words")]
    pub sleep_words: Vec<String>,

    /// Keep recognizing after each final result
    #[serde(default = "default_true")]
    pub continuous: bool,

    /// Emit interim (non-final) hypotheses
    #[serde(default = "default_true")]
    pub interim_results: bool,

    /// BCP-47 language tag for recognition
    #[serde(default = "default_language")]
    pub language: String,

    /// Results with a reported confidence below this are discarded
    /// entirely, so low-confidence noise cannot toggle the mode.
    /// Range [0, 1]; 0 accepts everything.
    #[serde(default)]
    pub wake_confidence_threshold: f32,

    /// Restart the stream automatically when it dies
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Backoff retry budget per outage
    #[serde(default = "default_max_restart_attempts")]
    pub max_restart_attempts: u32,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_max_restart_attempts() -> u32 {
    5
}

fn default_wake_words() -> Vec<String> {
    vec!["computer".to_string(), "hey computer".to_string()]
}

fn default_sleep_words() -> Vec<String> {
    vec!["stop listening".to_string(), "go to sleep".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_words: default_wake_words(),
            sleep_words: default_sleep_words(),
            continuous: true,
            interim_results: true,
            language: default_language(),
            wake_confidence_threshold: 0.0,
            auto_restart: true,
            max_restart_attempts: default_max_restart_attempts(),
        }
    }
}

impl Config {
    /// Effective wake phrase list, non-empty after defaulting.
    pub fn wake_phrases(&self) -> Vec<String> {
        if self.wake_words.is_empty() {
            default_wake_words()
        } else {
            self.wake_words.clone()
        }
    }

    /// Effective sleep phrase list, non-empty after defaulting.
    pub fn sleep_phrases(&self) -> Vec<String> {
        if self.sleep_words.is_empty() {
            default_sleep_words()
        } else {
            self.sleep_words.clone()
        }
    }

    /// Flags handed to the recognition backend when opening a stream.
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            continuous: self.continuous,
            interim_results: self.interim_results,
            language: self.language.clone(),
        }
    }
}
