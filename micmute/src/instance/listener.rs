//! Background listener for show requests from other instances.
//!
//! Runs on its own thread, waiting on the instance event with a bounded
//! timeout so it notices a stop request within one wait cycle. Signals are
//! forwarded to the UI thread through a [`UiDispatcher`].

use super::signal::{NamedEventProvider, WaitableEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Upper bound on one wait; also the worst-case latency of a stop request.
pub const SHOW_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Window after startup in which show requests are ignored when the process
/// was launched to start minimized.
pub const STARTUP_GRACE: Duration = Duration::from_secs(30);

/// Listener lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Waiting,
    Signaled,
    Dispatching,
    Stopped,
}

/// Hands the "bring the window to the foreground" action to the UI thread.
pub trait UiDispatcher: Send + 'static {
    /// Queue the action. False if the UI thread can no longer accept it.
    fn dispatch_show(&self) -> bool;
}

/// Decides whether a show request is honored at a given moment.
#[derive(Debug, Clone, Copy)]
pub struct ShowPolicy {
    started_at: Instant,
    start_minimized: bool,
    grace: Duration,
}

impl ShowPolicy {
    pub fn new(started_at: Instant, start_minimized: bool) -> Self {
        Self {
            started_at,
            start_minimized,
            grace: STARTUP_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// A process launched minimized keeps its window hidden for the grace
    /// period, so the autostart launch path cannot pop it up.
    pub fn allows_show_at(&self, now: Instant) -> bool {
        !self.start_minimized || now.saturating_duration_since(self.started_at) >= self.grace
    }
}

/// Handle to the running listener thread.
pub struct ShowListener {
    state: Arc<Mutex<ListenerState>>,
    stop: Arc<AtomicBool>,
    wake: Option<Arc<dyn WaitableEvent>>,
    thread: Option<JoinHandle<()>>,
}

impl ShowListener {
    /// Open (or create) the named event and start waiting on it.
    ///
    /// If the event cannot be opened the listener starts out `Stopped` and
    /// the process simply has no remote-show capability.
    pub fn start<P, D>(
        provider: &P,
        name: &str,
        dispatcher: D,
        policy: ShowPolicy,
        timeout: Duration,
    ) -> Self
    where
        P: NamedEventProvider,
        D: UiDispatcher,
    {
        let state = Arc::new(Mutex::new(ListenerState::Idle));
        let stop = Arc::new(AtomicBool::new(false));

        let event: Arc<P::Event> = match provider.open_or_create(name) {
            Ok(event) => Arc::new(event),
            Err(e) => {
                debug!(error = %e, "Show listener disabled");
                set_state(&state, ListenerState::Stopped);
                return Self {
                    state,
                    stop,
                    wake: None,
                    thread: None,
                };
            }
        };

        set_state(&state, ListenerState::Waiting);

        let thread = {
            let event = Arc::clone(&event);
            let state = Arc::clone(&state);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("show-listener".into())
                .spawn(move || run(&*event, &state, &stop, &dispatcher, policy, timeout))
        };

        match thread {
            Ok(handle) => {
                info!("Show listener started");
                Self {
                    state,
                    stop,
                    wake: Some(event),
                    thread: Some(handle),
                }
            }
            Err(e) => {
                debug!(error = %e, "Failed to spawn show listener thread");
                set_state(&state, ListenerState::Stopped);
                Self {
                    state,
                    stop,
                    wake: None,
                    thread: None,
                }
            }
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ListenerState::Stopped)
    }

    /// Stop the loop and wait for the thread to exit.
    ///
    /// The stop flag is checked every wait cycle; the event is also signaled
    /// so the thread does not sit out the rest of its timeout.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);

        if let Some(event) = self.wake.take() {
            let _ = event.signal();
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("Show listener thread panicked");
            }
            info!("Show listener stopped");
        }
    }
}

impl Drop for ShowListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<E, D>(
    event: &E,
    state: &Mutex<ListenerState>,
    stop: &AtomicBool,
    dispatcher: &D,
    policy: ShowPolicy,
    timeout: Duration,
) where
    E: WaitableEvent + ?Sized,
    D: UiDispatcher,
{
    while !stop.load(Ordering::SeqCst) {
        set_state(state, ListenerState::Waiting);

        match event.wait(timeout) {
            Ok(false) => continue,
            Ok(true) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                set_state(state, ListenerState::Signaled);

                if policy.allows_show_at(Instant::now()) {
                    set_state(state, ListenerState::Dispatching);
                    if !dispatcher.dispatch_show() {
                        debug!("UI thread rejected show request");
                    }
                } else {
                    debug!("Show request ignored during startup grace period");
                }
            }
            Err(e) => {
                debug!(error = %e, "Show listener wait failed");
                break;
            }
        }
    }

    set_state(state, ListenerState::Stopped);
}

fn set_state(state: &Mutex<ListenerState>, next: ListenerState) {
    if let Ok(mut current) = state.lock() {
        *current = next;
    }
}
