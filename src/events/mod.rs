//! Events emitted by the controller to its subscribers
//!
//! Two kinds flow over one broadcast channel: transcripts for every
//! accepted recognition result, and state events for every mode
//! transition plus sub-state notices (retry countdowns and the like)
//! that do not change the mode.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::controller::Mode;
use crate::stream::ErrorCode;

/// A recognized utterance surfaced to the application.
///
/// Emitted for every accepted result, interim or final, regardless of
/// the current mode; only mode *toggling* is gated on wake/sleep
/// phrases. Never mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Raw transcript text as recognized
    pub transcript: String,
    /// Whether the recognizer will revise this result further
    pub is_final: bool,
    /// Recognizer confidence in [0, 1], when reported
    pub confidence: Option<f32>,
    /// When the controller accepted the result
    pub captured_at: SystemTime,
}

/// A mode transition or sub-state notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    /// Mode after the transition (or current mode, for notices)
    pub mode: Mode,
    /// Human-readable detail, when one helps
    pub message: Option<String>,
    /// Machine-readable error code, on failures
    pub code: Option<ErrorCode>,
}

/// Everything the controller emits, as one tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", content = "payload")]
pub enum ControllerEvent {
    /// A recognized utterance
    Transcript(TranscriptEvent),
    /// A mode transition or notice
    State(StateEvent),
}

impl std::fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerEvent::Transcript(t) => {
                let kind = if t.is_final { "final" } else { "interim" };
                write!(f, "TRANSCRIPT [{}] {:?}", kind, t.transcript)
            }
            ControllerEvent::State(s) => match (&s.code, &s.message) {
                (Some(code), _) => write!(f, "STATE {} ({})", s.mode, code),
                (None, Some(msg)) => write!(f, "STATE {} ({})", s.mode, msg),
                (None, None) => write!(f, "STATE {}", s.mode),
            },
        }
    }
}
