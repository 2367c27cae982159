//! Payload-free cross-process wake signal.

use std::time::Duration;
use thiserror::Error;

/// Name of the event every MicMute process opens. It must be identical in all
/// instances and must not collide with other applications.
pub const INSTANCE_EVENT_NAME: &str =
    "Local\\MicMute.ShowSignal.{5D2B8C41-7A3E-4F19-9C6D-2E8B0A4F7C13}";

/// An auto-reset event: one `signal` releases at most one `wait`.
///
/// A signal raised while nobody waits stays pending until the next wait
/// consumes it; a second signal before that is absorbed.
pub trait WaitableEvent: Send + Sync {
    fn signal(&self) -> Result<(), SignalError>;

    /// Block for at most `timeout`. `Ok(true)` if signaled, `Ok(false)` on
    /// timeout.
    fn wait(&self, timeout: Duration) -> Result<bool, SignalError>;
}

/// Source of named events shared between processes.
pub trait NamedEventProvider {
    type Event: WaitableEvent + 'static;

    /// Create the named event or open it if it already exists. The flag is
    /// true when this call created it.
    fn create(&self, name: &str) -> Result<(Self::Event, bool), SignalError>;

    /// Open an existing named event.
    fn open(&self, name: &str) -> Result<Self::Event, SignalError>;

    /// Open the named event, creating it if it is missing.
    fn open_or_create(&self, name: &str) -> Result<Self::Event, SignalError> {
        match self.open(name) {
            Ok(event) => Ok(event),
            Err(_) => self.create(name).map(|(event, _)| event),
        }
    }
}

/// Signal service error types.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Failed to create named event {name}: {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Named event {name} does not exist")]
    NotFound { name: String },

    #[error("Failed to signal event: {0}")]
    SignalFailed(String),

    #[error("Failed to wait on event: {0}")]
    WaitFailed(String),
}
