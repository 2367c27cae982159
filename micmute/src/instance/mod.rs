//! Single-instance coordination.
//!
//! The first process owns a named event. Later processes find it taken, may
//! signal it once, and exit. The owner watches the event on a background
//! thread and brings its window forward when signaled.

pub mod coordinator;
pub mod listener;
#[cfg(windows)]
pub mod named_event;
pub mod signal;

pub use coordinator::{forward_to_primary, Ownership, SingletonCoordinator};
pub use listener::{
    ListenerState, ShowListener, ShowPolicy, UiDispatcher, SHOW_WAIT_TIMEOUT, STARTUP_GRACE,
};
#[cfg(windows)]
pub use named_event::{Win32Event, Win32EventProvider};
pub use signal::{NamedEventProvider, SignalError, WaitableEvent, INSTANCE_EVENT_NAME};
