//! Recognition stream seam
//!
//! The platform's continuous speech-recognition capability, microphone
//! permission source, and network status source are external collaborators
//! behind small trait seams. The controller drives them and consumes their
//! events; tests substitute scripted fakes.

mod adapter;
mod protocol;

#[cfg(test)]
pub(crate) mod fake;

pub use adapter::{
    MicPermission, MicrophoneAccess, NetworkMonitor, Platform, RecognitionBackend,
    RecognitionStream,
};
pub use protocol::{ErrorClass, ErrorCode, Hypothesis, RecognitionResult, StreamEvent, StreamSettings};
