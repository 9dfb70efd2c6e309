//! Public handle around the controller task
//!
//! The state machine runs as one spawned task processing commands,
//! stream events, and scheduler messages from a `select!` loop, so
//! every transition happens in a single dispatch turn. The handle is
//! the application-facing surface.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::events::ControllerEvent;
use crate::stream::{Platform, RecognitionBackend, StreamEvent};

use super::machine::{Mode, ModeController, SchedulerMsg, StartError};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

enum Command {
    Start(oneshot::Sender<Result<(), StartError>>),
    Stop,
}

/// Handle to a running wake-word controller.
///
/// Dropping the handle shuts the controller down, tearing down the
/// stream and any pending retry timers.
pub struct WakeWordListener {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ControllerEvent>,
    mode_rx: watch::Receiver<Mode>,
    task: JoinHandle<()>,
}

impl WakeWordListener {
    /// Spawn a controller over the given platform collaborators.
    pub fn spawn(config: Config, platform: Platform) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (mode_tx, mode_rx) = watch::channel(Mode::Idle);
        let (stream_tx, stream_rx) = mpsc::channel(EVENT_CAPACITY);
        let (sched_tx, sched_rx) = mpsc::channel(8);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let controller = ModeController::new(
            config,
            platform,
            event_tx.clone(),
            mode_tx,
            stream_tx,
            sched_tx,
        );
        let task = tokio::spawn(run(controller, cmd_rx, stream_rx, sched_rx));

        Self {
            cmd_tx,
            events: event_tx,
            mode_rx,
            task,
        }
    }

    /// Whether the environment exposes the recognition capability.
    pub fn is_supported(backend: &dyn RecognitionBackend) -> bool {
        backend.is_supported()
    }

    /// Begin a listening session. Failures are returned here and also
    /// surfaced as `Error`-mode state events to subscribers.
    pub async fn start_listening(&self) -> Result<(), StartError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Start(reply_tx))
            .map_err(|_| StartError::Closed)?;
        reply_rx.await.map_err(|_| StartError::Closed)?
    }

    /// Stop the session. Synchronous and always succeeds; the
    /// controller processes it on its next dispatch turn.
    pub fn stop_listening(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }

    /// Subscribe to transcript and state events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        *self.mode_rx.borrow()
    }

    /// Observe mode changes as they happen.
    pub fn watch_mode(&self) -> watch::Receiver<Mode> {
        self.mode_rx.clone()
    }

    /// Whether recognized speech is currently surfaced as active
    /// transcription.
    pub fn is_transcribing(&self) -> bool {
        self.mode() == Mode::Transcribing
    }

    /// Stop the controller and wait for its task to finish.
    pub async fn shutdown(self) {
        let Self { cmd_tx, task, .. } = self;
        let _ = cmd_tx.send(Command::Stop);
        drop(cmd_tx);
        let _ = task.await;
    }
}

async fn run(
    mut controller: ModeController,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut stream_rx: mpsc::Receiver<StreamEvent>,
    mut sched_rx: mpsc::Receiver<SchedulerMsg>,
) {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Start(reply)) => {
                    let result = controller.start().await;
                    let _ = reply.send(result);
                }
                Some(Command::Stop) => controller.stop(),
                None => break,
            },
            Some(event) = stream_rx.recv() => controller.handle_stream_event(event),
            Some(msg) = sched_rx.recv() => controller.handle_scheduler_msg(msg),
        }
    }

    // handle dropped: tear down the stream and pending timers
    controller.stop();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_test::assert_ok;

    use super::*;
    use crate::events::StateEvent;
    use crate::stream::fake::{self, FakeMicrophone, FakeNetwork, FakeRecognizer};
    use crate::stream::{ErrorCode, RecognitionResult};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    async fn next_event(rx: &mut broadcast::Receiver<ControllerEvent>) -> ControllerEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    fn test_config() -> Config {
        Config {
            wake_words: vec!["hey computer".to_string()],
            sleep_words: vec!["stop listening".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_wake_and_stop() {
        init_tracing();
        let recognizer = FakeRecognizer::new();
        let network = FakeNetwork::new(true);
        let platform = fake::platform(&recognizer, FakeMicrophone::granting(), &network);

        let listener = WakeWordListener::spawn(test_config(), platform);
        let mut events = listener.subscribe();

        assert_ok!(listener.start_listening().await);
        assert_eq!(listener.mode(), Mode::Listening);
        assert!(!listener.is_transcribing());

        assert!(matches!(
            next_event(&mut events).await,
            ControllerEvent::State(StateEvent {
                mode: Mode::Listening,
                ..
            })
        ));

        recognizer.emit(StreamEvent::Started).await;
        recognizer
            .emit(StreamEvent::Result(RecognitionResult::single(
                "ok hey computer",
                true,
                Some(0.9),
            )))
            .await;

        assert!(matches!(
            next_event(&mut events).await,
            ControllerEvent::Transcript(_)
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ControllerEvent::State(StateEvent {
                mode: Mode::Transcribing,
                ..
            })
        ));
        assert!(listener.is_transcribing());

        listener.stop_listening();
        assert!(matches!(
            next_event(&mut events).await,
            ControllerEvent::State(StateEvent {
                mode: Mode::Stopped,
                ..
            })
        ));
        assert_eq!(listener.mode(), Mode::Stopped);

        listener.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_failure_rejects_and_notifies() {
        let recognizer = FakeRecognizer::new();
        let network = FakeNetwork::new(true);
        let platform = fake::platform(&recognizer, FakeMicrophone::denying(), &network);

        let listener = WakeWordListener::spawn(test_config(), platform);
        let mut events = listener.subscribe();

        let err = listener.start_listening().await.unwrap_err();
        assert!(matches!(err, StartError::PermissionDenied));
        assert_eq!(listener.mode(), Mode::Error);

        assert!(matches!(
            next_event(&mut events).await,
            ControllerEvent::State(StateEvent {
                mode: Mode::Error,
                code: Some(ErrorCode::PermissionDenied),
                ..
            })
        ));

        listener.shutdown().await;
    }

    #[tokio::test]
    async fn test_watch_mode_observes_transitions() {
        let recognizer = FakeRecognizer::new();
        let network = FakeNetwork::new(true);
        let platform = fake::platform(&recognizer, FakeMicrophone::granting(), &network);

        let listener = WakeWordListener::spawn(test_config(), platform);
        let mut mode_rx = listener.watch_mode();

        listener.start_listening().await.unwrap();
        timeout(Duration::from_secs(5), mode_rx.wait_for(|m| *m == Mode::Listening))
            .await
            .expect("timed out")
            .expect("watch closed");

        listener.shutdown().await;
    }

    #[tokio::test]
    async fn test_is_supported_delegates_to_backend() {
        let recognizer = FakeRecognizer::new();
        let backend = recognizer.backend();
        assert!(WakeWordListener::is_supported(backend.as_ref()));

        recognizer.set_supported(false);
        assert!(!WakeWordListener::is_supported(backend.as_ref()));
    }
}
