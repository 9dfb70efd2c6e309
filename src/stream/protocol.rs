//! Wire types exchanged between the recognition stream and the controller

use serde::{Deserialize, Serialize};

/// Flags handed to the backend when opening a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Keep recognizing after each final result
    pub continuous: bool,
    /// Emit non-final hypotheses while speech is still being processed
    pub interim_results: bool,
    /// BCP-47 language tag for recognition
    pub language: String,
}

/// One recognition hypothesis for a stretch of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Recognized text
    pub transcript: String,
    /// Recognizer confidence in [0, 1], when the engine reports one
    pub confidence: Option<f32>,
}

/// A result emitted by the stream: one or more hypotheses, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Alternative hypotheses, ordered best first
    pub hypotheses: Vec<Hypothesis>,
    /// Whether the recognizer will revise this result further
    pub is_final: bool,
}

impl RecognitionResult {
    /// Convenience constructor for a single-hypothesis result.
    pub fn single(transcript: impl Into<String>, is_final: bool, confidence: Option<f32>) -> Self {
        Self {
            hypotheses: vec![Hypothesis {
                transcript: transcript.into(),
                confidence,
            }],
            is_final,
        }
    }

    /// The best (first) hypothesis, if any.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.hypotheses.first()
    }
}

/// Events a recognition stream delivers to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The stream is up and capturing audio
    Started,
    /// A recognition result (interim or final)
    Result(RecognitionResult),
    /// The stream terminated without an error
    Ended,
    /// The stream failed
    Error(ErrorCode),
}

/// How the controller reacts to an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient; retried with exponential backoff
    Network,
    /// Microphone/permission denial; retrying cannot succeed
    Permission,
    /// Policy-level rejection; not retried
    Policy,
    /// Controller-emitted, terminal for the session
    Terminal,
}

/// Machine-readable error codes carried on `Error`-mode state events.
///
/// Serialized as their kebab-case wire strings. Codes the stream reports
/// that we do not recognize are preserved in [`ErrorCode::Other`] and
/// treated conservatively as network-class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// Environment lacks the recognition capability
    NotSupported,
    /// No network connectivity at start time
    Offline,
    /// Stream-level network failure
    Network,
    /// Network failure while the stream was connecting
    NetworkConnecting,
    /// Network went away under an established stream
    NetworkOffline,
    /// Permission to use recognition was denied
    PermissionDenied,
    /// Microphone access was denied
    MicrophoneDenied,
    /// Recognition service refused the request
    ServiceNotAllowed,
    /// Reconnection gave up after the configured attempt cap
    MaxAttemptsReached,
    /// Stream died and automatic restart is disabled
    RestartDisabled,
    /// A restart attempt itself failed
    RestartFailed,
    /// Unrecognized code reported by the stream
    Other(String),
}

impl ErrorCode {
    /// The kebab-case wire string for this code.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::NotSupported => "not-supported",
            ErrorCode::Offline => "offline",
            ErrorCode::Network => "network",
            ErrorCode::NetworkConnecting => "network-connecting",
            ErrorCode::NetworkOffline => "network-offline",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::MicrophoneDenied => "microphone-denied",
            ErrorCode::ServiceNotAllowed => "service-not-allowed",
            ErrorCode::MaxAttemptsReached => "max-attempts-reached",
            ErrorCode::RestartDisabled => "restart-disabled",
            ErrorCode::RestartFailed => "restart-failed",
            ErrorCode::Other(code) => code,
        }
    }

    /// Parse a raw code string as reported by a stream implementation.
    pub fn from_raw(code: &str) -> Self {
        match code {
            "not-supported" => ErrorCode::NotSupported,
            "offline" => ErrorCode::Offline,
            "network" => ErrorCode::Network,
            "network-connecting" => ErrorCode::NetworkConnecting,
            "network-offline" => ErrorCode::NetworkOffline,
            "permission-denied" => ErrorCode::PermissionDenied,
            "microphone-denied" => ErrorCode::MicrophoneDenied,
            "service-not-allowed" => ErrorCode::ServiceNotAllowed,
            "max-attempts-reached" => ErrorCode::MaxAttemptsReached,
            "restart-disabled" => ErrorCode::RestartDisabled,
            "restart-failed" => ErrorCode::RestartFailed,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    /// Classify this code for the controller's recovery decision.
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorCode::Network
            | ErrorCode::NetworkConnecting
            | ErrorCode::NetworkOffline
            | ErrorCode::Offline
            | ErrorCode::Other(_) => ErrorClass::Network,
            ErrorCode::PermissionDenied | ErrorCode::MicrophoneDenied => ErrorClass::Permission,
            ErrorCode::NotSupported | ErrorCode::ServiceNotAllowed => ErrorClass::Policy,
            ErrorCode::MaxAttemptsReached | ErrorCode::RestartDisabled | ErrorCode::RestartFailed => {
                ErrorClass::Terminal
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::from_raw(&code)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}
