//! voicewake: wake-word activated mode controller for continuous
//! speech recognition streams
//!
//! Sits between a recognition stream and an application and decides
//! when recognized utterances are promoted into active transcription
//! versus ignored as ambient chatter:
//! - Explicit state machine over Idle, Listening, Transcribing,
//!   Stopped, and Error modes
//! - Boundary-aware wake/sleep phrase matching over normalized text
//! - Bounded, jittered exponential-backoff reconnection when the
//!   stream dies, with a connectivity-gated fast path
//!
//! The recognition engine, microphone permissions, and network status
//! are external collaborators behind the trait seams in [`stream`];
//! transcripts and state changes reach the application over a
//! broadcast channel of [`ControllerEvent`]s.

mod config;
mod controller;
mod events;
mod phrase;
mod stream;

pub use config::Config;
pub use controller::{Mode, StartError, WakeWordListener};
pub use events::{ControllerEvent, StateEvent, TranscriptEvent};
pub use phrase::{normalize, PhraseMatcher};
pub use stream::{
    ErrorClass, ErrorCode, Hypothesis, MicPermission, MicrophoneAccess, NetworkMonitor, Platform,
    RecognitionBackend, RecognitionResult, RecognitionStream, StreamEvent, StreamSettings,
};
