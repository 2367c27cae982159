//! Global hotkey registrar.
//!
//! Binds the process's single hotkey to a window handle and turns the
//! resulting `WM_HOTKEY` message back into an application event. The OS
//! calls sit behind [`HotkeyApi`] so the registrar itself is portable.

use super::binding::HotkeyBinding;
use global_hotkey::hotkey::{Code, Modifiers};
use tracing::{debug, info, warn};

/// The one hotkey identifier this process ever registers.
pub const HOTKEY_ID: i32 = 9000;

/// `WM_HOTKEY` message number.
pub const WM_HOTKEY: u32 = 0x0312;

/// An OS window handle, stored as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// OS hotkey table operations.
pub trait HotkeyApi {
    /// Register `binding` under `id` for `window`. False if the OS refuses,
    /// e.g. when another process already owns the combination.
    fn register(&self, window: WindowHandle, id: i32, binding: HotkeyBinding) -> bool;

    fn unregister(&self, window: WindowHandle, id: i32) -> bool;
}

type HotkeyListener = Box<dyn FnMut()>;

/// Owns the process's hotkey registration.
pub struct HotkeyRegistrar<A: HotkeyApi> {
    api: A,
    window: Option<WindowHandle>,
    active: Option<HotkeyBinding>,
    listeners: Vec<HotkeyListener>,
    disposed: bool,
}

impl<A: HotkeyApi> HotkeyRegistrar<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            window: None,
            active: None,
            listeners: Vec::new(),
            disposed: false,
        }
    }

    /// Set the window that receives `WM_HOTKEY`. Must be called before
    /// [`register`](Self::register).
    pub fn set_window_handle(&mut self, window: WindowHandle) {
        self.window = (!window.is_null()).then_some(window);
    }

    /// Replace the current binding with `modifiers + key`.
    ///
    /// The previous binding is always released before the new one is tried,
    /// so a failed attempt leaves no hotkey registered.
    pub fn register(&mut self, modifiers: Modifiers, key: Code) -> bool {
        if self.disposed {
            return false;
        }

        let Some(window) = self.window else {
            debug!("Hotkey registration attempted without a window handle");
            return false;
        };

        let binding = HotkeyBinding::new(modifiers, key);
        if !binding.is_set() {
            return false;
        }

        self.unregister();

        if self.api.register(window, HOTKEY_ID, binding) {
            info!(hotkey = %binding, "Global hotkey registered");
            self.active = Some(binding);
            true
        } else {
            warn!(hotkey = %binding, "Global hotkey rejected by the system");
            false
        }
    }

    /// Release the active binding, if any.
    pub fn unregister(&mut self) {
        if let (Some(binding), Some(window)) = (self.active, self.window) {
            if !self.api.unregister(window, HOTKEY_ID) {
                debug!(hotkey = %binding, "UnregisterHotKey reported failure");
            }
            self.active = None;
            debug!(hotkey = %binding, "Global hotkey unregistered");
        }
    }

    /// The binding currently held in the OS table.
    pub fn active_binding(&self) -> Option<HotkeyBinding> {
        self.active
    }

    /// Add a listener for hotkey presses. Listeners run on the message thread
    /// inside [`handle_message`](Self::handle_message) and must not block.
    pub fn on_hotkey_pressed(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Inspect a window message. Returns true if it was our hotkey, after
    /// notifying every listener.
    pub fn handle_message(&mut self, msg: u32, id: usize) -> bool {
        if msg != WM_HOTKEY || id != HOTKEY_ID as usize {
            return false;
        }

        debug!("Hotkey pressed");
        for listener in &mut self.listeners {
            listener();
        }
        true
    }

    /// Release the binding. Safe to call more than once.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.unregister();
            self.disposed = true;
        }
    }
}

impl<A: HotkeyApi> Drop for HotkeyRegistrar<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHotkeyTable;
    use std::cell::Cell;
    use std::rc::Rc;

    const WINDOW: WindowHandle = WindowHandle(0x1234);

    fn bound(table: &FakeHotkeyTable) -> HotkeyRegistrar<FakeHotkeyTable> {
        let mut registrar = HotkeyRegistrar::new(table.clone());
        registrar.set_window_handle(WINDOW);
        registrar
    }

    #[test]
    fn register_without_window_fails_without_os_call() {
        let table = FakeHotkeyTable::new();
        let mut registrar = HotkeyRegistrar::new(table.clone());

        assert!(!registrar.register(Modifiers::CONTROL, Code::KeyM));
        assert_eq!(table.calls(), 0);

        registrar.set_window_handle(WindowHandle(0));
        assert!(!registrar.register(Modifiers::CONTROL, Code::KeyM));
        assert_eq!(table.calls(), 0);
    }

    #[test]
    fn register_none_key_fails_without_os_call() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);

        let modifier_sets = [
            Modifiers::empty(),
            Modifiers::CONTROL,
            Modifiers::ALT | Modifiers::SUPER,
        ];
        for mods in modifier_sets {
            assert!(!registrar.register(mods, Code::Unidentified));
        }
        assert_eq!(table.calls(), 0);
    }

    #[test]
    fn none_key_leaves_existing_binding_alone() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);
        assert!(registrar.register(Modifiers::CONTROL, Code::KeyM));

        assert!(!registrar.register(Modifiers::SHIFT, Code::Unidentified));

        assert_eq!(
            table.registered(WINDOW, HOTKEY_ID),
            Some(HotkeyBinding::new(Modifiers::CONTROL, Code::KeyM))
        );
    }

    #[test]
    fn rebinding_never_overlaps() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);

        let sequence = [
            (Modifiers::CONTROL, Code::KeyM),
            (Modifiers::CONTROL | Modifiers::SHIFT, Code::KeyM),
            (Modifiers::empty(), Code::Pause),
            (Modifiers::empty(), Code::Pause),
            (Modifiers::ALT, Code::F9),
        ];
        for (mods, k) in sequence {
            assert!(registrar.register(mods, k));
        }

        assert_eq!(table.max_simultaneous(), 1);
        let last = HotkeyBinding::new(Modifiers::ALT, Code::F9);
        assert_eq!(table.registered(WINDOW, HOTKEY_ID), Some(last));
        assert_eq!(registrar.active_binding(), Some(last));
    }

    #[test]
    fn rejected_binding_leaves_nothing_registered() {
        let table = FakeHotkeyTable::new();
        let taken = HotkeyBinding::new(Modifiers::CONTROL, Code::KeyC);
        table.claim_elsewhere(taken);
        let mut registrar = bound(&table);
        assert!(registrar.register(Modifiers::ALT, Code::KeyM));

        assert!(!registrar.register(taken.modifiers, taken.key));

        assert_eq!(registrar.active_binding(), None);
        assert_eq!(table.registered(WINDOW, HOTKEY_ID), None);
    }

    #[test]
    fn handle_message_matches_type_and_id() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);
        let presses = Rc::new(Cell::new(0));
        let counter = Rc::clone(&presses);
        registrar.on_hotkey_pressed(move || counter.set(counter.get() + 1));

        assert!(!registrar.handle_message(0x0100, HOTKEY_ID as usize));
        assert!(!registrar.handle_message(WM_HOTKEY, 1));
        assert_eq!(presses.get(), 0);

        assert!(registrar.handle_message(WM_HOTKEY, HOTKEY_ID as usize));
        assert!(registrar.handle_message(WM_HOTKEY, HOTKEY_ID as usize));
        assert_eq!(presses.get(), 2);
    }

    #[test]
    fn all_listeners_are_notified() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);
        let first = Rc::new(Cell::new(false));
        let second = Rc::new(Cell::new(false));
        let (a, b) = (Rc::clone(&first), Rc::clone(&second));
        registrar.on_hotkey_pressed(move || a.set(true));
        registrar.on_hotkey_pressed(move || b.set(true));

        registrar.handle_message(WM_HOTKEY, HOTKEY_ID as usize);

        assert!(first.get() && second.get());
    }

    #[test]
    fn unregister_without_binding_is_noop() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);

        registrar.unregister();

        assert_eq!(table.calls(), 0);
    }

    #[test]
    fn dispose_releases_binding_once() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);
        registrar.register(Modifiers::CONTROL, Code::KeyM);
        let calls_before = table.calls();

        registrar.dispose();
        registrar.dispose();
        drop(registrar);

        assert_eq!(table.calls(), calls_before + 1);
        assert_eq!(table.registered(WINDOW, HOTKEY_ID), None);
    }

    #[test]
    fn register_after_dispose_is_refused() {
        let table = FakeHotkeyTable::new();
        let mut registrar = bound(&table);
        registrar.dispose();

        assert!(!registrar.register(Modifiers::CONTROL, Code::KeyM));
        assert_eq!(table.calls(), 0);
    }

    #[test]
    fn drop_releases_binding() {
        let table = FakeHotkeyTable::new();
        {
            let mut registrar = bound(&table);
            registrar.register(Modifiers::CONTROL, Code::KeyM);
        }

        assert_eq!(table.registered(WINDOW, HOTKEY_ID), None);
    }
}
