//! Collaborator trait seams for the recognition capability
//!
//! The controller never touches platform recognition APIs directly; it
//! drives a [`RecognitionStream`] obtained from a [`RecognitionBackend`]
//! and consults [`MicrophoneAccess`] and [`NetworkMonitor`] before and
//! during a session.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::{StreamEvent, StreamSettings};

/// Outcome of a microphone permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicPermission {
    Granted,
    Denied,
}

/// Factory for recognition streams.
pub trait RecognitionBackend: Send {
    /// Whether the environment exposes the recognition capability at all.
    fn is_supported(&self) -> bool;

    /// Open a new stream. Events are delivered on `events`; the stream
    /// must not emit anything until `start()` is called on it.
    fn open(
        &self,
        settings: &StreamSettings,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Box<dyn RecognitionStream>>;
}

/// A live recognition stream.
///
/// Contract: after `abort()` returns, the stream emits no further events.
/// `stop()` and `abort()` are idempotent and must tolerate the underlying
/// platform handle already being gone; implementations log their own
/// teardown failures rather than surfacing them.
pub trait RecognitionStream: Send {
    /// Begin capturing and recognizing speech.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing, letting any buffered speech produce final results.
    fn stop(&mut self);

    /// Tear the stream down immediately, discarding buffered speech.
    fn abort(&mut self);
}

/// Microphone permission source.
#[async_trait]
pub trait MicrophoneAccess: Send {
    /// Request access to the microphone, prompting the user if needed.
    async fn request_access(&self) -> MicPermission;
}

/// Network status source.
pub trait NetworkMonitor: Send {
    /// Current connectivity, best effort.
    fn is_online(&self) -> bool;

    /// Subscribe to connectivity transitions. The channel carries the
    /// current online flag; receivers observe every change.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// The external collaborators a controller instance is built on.
pub struct Platform {
    pub backend: Box<dyn RecognitionBackend>,
    pub microphone: Box<dyn MicrophoneAccess>,
    pub network: Box<dyn NetworkMonitor>,
}
