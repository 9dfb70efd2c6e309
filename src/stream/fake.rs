//! Scripted fakes for the collaborator seams, used across unit tests

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::{
    MicPermission, MicrophoneAccess, NetworkMonitor, Platform, RecognitionBackend,
    RecognitionStream, StreamEvent, StreamSettings,
};

#[derive(Default)]
struct RecognizerInner {
    supported: bool,
    fail_open: bool,
    fail_start: bool,
    opened: usize,
    started: usize,
    stopped: usize,
    aborted: usize,
    events: Option<mpsc::Sender<StreamEvent>>,
    last_settings: Option<StreamSettings>,
}

/// Shared handle to a scripted recognition backend.
///
/// The test keeps a clone to script failures, emit stream events, and
/// inspect call counts while the controller owns the backend.
#[derive(Clone)]
pub(crate) struct FakeRecognizer {
    inner: Arc<Mutex<RecognizerInner>>,
}

impl FakeRecognizer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecognizerInner {
                supported: true,
                ..Default::default()
            })),
        }
    }

    pub fn backend(&self) -> Box<dyn RecognitionBackend> {
        Box::new(FakeBackend {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn set_supported(&self, supported: bool) {
        self.inner.lock().unwrap().supported = supported;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.inner.lock().unwrap().fail_open = fail;
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.inner.lock().unwrap().fail_start = fail;
    }

    pub fn opened(&self) -> usize {
        self.inner.lock().unwrap().opened
    }

    pub fn started(&self) -> usize {
        self.inner.lock().unwrap().started
    }

    pub fn stopped(&self) -> usize {
        self.inner.lock().unwrap().stopped
    }

    pub fn aborted(&self) -> usize {
        self.inner.lock().unwrap().aborted
    }

    pub fn last_settings(&self) -> Option<StreamSettings> {
        self.inner.lock().unwrap().last_settings.clone()
    }

    /// Emit an event as the currently open stream would.
    pub async fn emit(&self, event: StreamEvent) {
        let tx = self.inner.lock().unwrap().events.clone();
        let tx = tx.expect("no open stream to emit from");
        tx.send(event).await.expect("controller dropped stream events");
    }
}

struct FakeBackend {
    inner: Arc<Mutex<RecognizerInner>>,
}

impl RecognitionBackend for FakeBackend {
    fn is_supported(&self) -> bool {
        self.inner.lock().unwrap().supported
    }

    fn open(
        &self,
        settings: &StreamSettings,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Box<dyn RecognitionStream>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_open {
            bail!("scripted open failure");
        }
        inner.opened += 1;
        inner.events = Some(events);
        inner.last_settings = Some(settings.clone());
        Ok(Box::new(FakeStream {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FakeStream {
    inner: Arc<Mutex<RecognizerInner>>,
}

impl RecognitionStream for FakeStream {
    fn start(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_start {
            bail!("scripted start failure");
        }
        inner.started += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.inner.lock().unwrap().stopped += 1;
    }

    fn abort(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.aborted += 1;
        // honor the no-events-after-abort contract
        inner.events = None;
    }
}

/// Microphone source with a scripted answer.
pub(crate) struct FakeMicrophone {
    permission: MicPermission,
}

impl FakeMicrophone {
    pub fn granting() -> Self {
        Self {
            permission: MicPermission::Granted,
        }
    }

    pub fn denying() -> Self {
        Self {
            permission: MicPermission::Denied,
        }
    }
}

#[async_trait]
impl MicrophoneAccess for FakeMicrophone {
    async fn request_access(&self) -> MicPermission {
        self.permission
    }
}

/// Network monitor the test can flip between online and offline.
#[derive(Clone)]
pub(crate) struct FakeNetwork {
    tx: Arc<watch::Sender<bool>>,
}

impl FakeNetwork {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_replace(online);
    }
}

impl NetworkMonitor for FakeNetwork {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// A platform wired to the given fakes.
pub(crate) fn platform(
    recognizer: &FakeRecognizer,
    microphone: FakeMicrophone,
    network: &FakeNetwork,
) -> Platform {
    Platform {
        backend: recognizer.backend(),
        microphone: Box::new(microphone),
        network: Box::new(network.clone()),
    }
}
