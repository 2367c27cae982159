//! In-memory stand-ins for the OS services, used by unit tests.

use crate::app::MuteIndicator;
use crate::audio::{AudioBackend, AudioDevice, AudioError, CaptureEndpoint};
use crate::hotkey::{HotkeyApi, HotkeyBinding, WindowHandle};
use crate::instance::{NamedEventProvider, SignalError, UiDispatcher, WaitableEvent};
use crate::platform::SoundPlayer;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FakeEndpoint {
    id: String,
    name: String,
    muted: Rc<Cell<bool>>,
    writable: bool,
}

impl FakeEndpoint {
    pub fn new(id: &str, name: &str, muted: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            muted: Rc::new(Cell::new(muted)),
            writable: true,
        }
    }

    /// Writes to this endpoint fail.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

impl CaptureEndpoint for FakeEndpoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_muted(&self) -> Result<bool, AudioError> {
        Ok(self.muted.get())
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        if !self.writable {
            return Err(AudioError::VolumeNotAvailable);
        }
        self.muted.set(muted);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeAudioBackend {
    endpoints: Vec<FakeEndpoint>,
    default_id: Option<String>,
    enumeration_fails: bool,
}

impl FakeAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: FakeEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn with_default(mut self, id: &str) -> Self {
        self.default_id = Some(id.to_string());
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.enumeration_fails = true;
        self
    }

    /// The device-side mute flag, shared with every handle opened later.
    pub fn mute_flag(&self, id: &str) -> Rc<Cell<bool>> {
        self.endpoints
            .iter()
            .find(|e| e.id == id)
            .map(|e| Rc::clone(&e.muted))
            .unwrap_or_else(|| panic!("no fake endpoint {id}"))
    }
}

impl AudioBackend for FakeAudioBackend {
    type Endpoint = FakeEndpoint;

    fn capture_devices(&self) -> Result<Vec<AudioDevice>, AudioError> {
        if self.enumeration_fails {
            return Err(AudioError::NotInitialized);
        }
        Ok(self.endpoints.iter().map(CaptureEndpoint::describe).collect())
    }

    fn default_capture_device(&self) -> Result<Option<AudioDevice>, AudioError> {
        Ok(self.default_id.as_deref().and_then(|id| {
            self.endpoints
                .iter()
                .find(|e| e.id == id)
                .map(CaptureEndpoint::describe)
        }))
    }

    fn open(&self, device_id: &str) -> Result<FakeEndpoint, AudioError> {
        self.endpoints
            .iter()
            .find(|e| e.id == device_id)
            .cloned()
            .ok_or_else(|| AudioError::DeviceNotFound {
                device_id: device_id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Hotkeys
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HotkeyTable {
    entries: Vec<(WindowHandle, i32, HotkeyBinding)>,
    claimed: Vec<HotkeyBinding>,
    calls: usize,
    max_simultaneous: usize,
}

/// A process-wide hotkey table shared between clones.
#[derive(Clone, Default)]
pub struct FakeHotkeyTable {
    inner: Rc<RefCell<HotkeyTable>>,
}

impl FakeHotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of register and unregister calls made so far.
    pub fn calls(&self) -> usize {
        self.inner.borrow().calls
    }

    pub fn registered(&self, window: WindowHandle, id: i32) -> Option<HotkeyBinding> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|(w, i, _)| *w == window && *i == id)
            .map(|(_, _, b)| *b)
    }

    pub fn max_simultaneous(&self) -> usize {
        self.inner.borrow().max_simultaneous
    }

    /// Pretend another application owns `binding`.
    pub fn claim_elsewhere(&self, binding: HotkeyBinding) {
        self.inner.borrow_mut().claimed.push(binding);
    }
}

impl HotkeyApi for FakeHotkeyTable {
    fn register(&self, window: WindowHandle, id: i32, binding: HotkeyBinding) -> bool {
        let mut table = self.inner.borrow_mut();
        table.calls += 1;

        let taken = table.claimed.contains(&binding)
            || table.entries.iter().any(|(w, i, b)| *b == binding || (*w == window && *i == id));
        if taken {
            return false;
        }

        table.entries.push((window, id, binding));
        table.max_simultaneous = table.max_simultaneous.max(table.entries.len());
        true
    }

    fn unregister(&self, window: WindowHandle, id: i32) -> bool {
        let mut table = self.inner.borrow_mut();
        table.calls += 1;

        let before = table.entries.len();
        table.entries.retain(|(w, i, _)| !(*w == window && *i == id));
        table.entries.len() != before
    }
}

// ---------------------------------------------------------------------------
// Named events
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EventInner {
    signaled: Mutex<bool>,
    cond: Condvar,
    broken: AtomicBool,
}

/// Auto-reset event backed by a condition variable.
#[derive(Clone)]
pub struct MemoryEvent {
    inner: Arc<EventInner>,
}

impl MemoryEvent {
    /// Make every subsequent wait fail.
    pub fn break_waits(&self) {
        self.inner.broken.store(true, Ordering::SeqCst);
        self.inner.cond.notify_all();
    }
}

impl WaitableEvent for MemoryEvent {
    fn signal(&self) -> Result<(), SignalError> {
        let mut signaled = self
            .inner
            .signaled
            .lock()
            .map_err(|e| SignalError::SignalFailed(e.to_string()))?;
        *signaled = true;
        self.inner.cond.notify_one();
        Ok(())
    }

    fn wait(&self, timeout: Duration) -> Result<bool, SignalError> {
        let deadline = Instant::now() + timeout;
        let mut signaled = self
            .inner
            .signaled
            .lock()
            .map_err(|e| SignalError::WaitFailed(e.to_string()))?;

        loop {
            if self.inner.broken.load(Ordering::SeqCst) {
                return Err(SignalError::WaitFailed("event broken".into()));
            }
            if *signaled {
                *signaled = false;
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let (guard, _) = self
                .inner
                .cond
                .wait_timeout(signaled, deadline - now)
                .map_err(|e| SignalError::WaitFailed(e.to_string()))?;
            signaled = guard;
        }
    }
}

/// Named-event namespace. A name stays taken while any handle to it lives.
#[derive(Clone, Default)]
pub struct MemoryEvents {
    names: Arc<Mutex<HashMap<String, Weak<EventInner>>>>,
    creation_fails: Arc<AtomicBool>,
}

impl MemoryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creation(&self) {
        self.creation_fails.store(true, Ordering::SeqCst);
    }

    fn live(&self, name: &str) -> Option<MemoryEvent> {
        let names = self.names.lock().ok()?;
        names
            .get(name)
            .and_then(Weak::upgrade)
            .map(|inner| MemoryEvent { inner })
    }
}

impl NamedEventProvider for MemoryEvents {
    type Event = MemoryEvent;

    fn create(&self, name: &str) -> Result<(MemoryEvent, bool), SignalError> {
        if self.creation_fails.load(Ordering::SeqCst) {
            return Err(SignalError::CreateFailed {
                name: name.to_string(),
                reason: "creation disabled".into(),
            });
        }

        if let Some(existing) = self.live(name) {
            return Ok((existing, false));
        }

        let inner = Arc::new(EventInner::default());
        let mut names = self.names.lock().map_err(|e| SignalError::CreateFailed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        names.insert(name.to_string(), Arc::downgrade(&inner));
        Ok((MemoryEvent { inner }, true))
    }

    fn open(&self, name: &str) -> Result<MemoryEvent, SignalError> {
        self.live(name).ok_or_else(|| SignalError::NotFound {
            name: name.to_string(),
        })
    }
}

/// Dispatcher that reports each show request on a channel.
pub struct ChannelDispatcher {
    tx: Sender<()>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch_show(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Records every mute state it is asked to display.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    states: Rc<RefCell<Vec<bool>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<bool> {
        self.states.borrow().clone()
    }
}

impl MuteIndicator for RecordingIndicator {
    fn show_mute_state(&mut self, muted: bool) {
        self.states.borrow_mut().push(muted);
    }
}

/// Records every sound it is asked to play.
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    played: Rc<RefCell<Vec<PathBuf>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.played.borrow().clone()
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play(&self, path: &Path) {
        self.played.borrow_mut().push(path.to_path_buf());
    }
}
