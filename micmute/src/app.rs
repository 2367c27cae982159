//! Application state shared by the window procedure and the tray.
//!
//! Ties the audio controller, the hotkey registrar and the user's settings
//! together. Every mute change funnels through one path so the tray icon and
//! the feedback sound always agree with the device.

use crate::audio::{AudioBackend, AudioController, AudioDevice, AudioError};
use crate::hotkey::{HotkeyApi, HotkeyBinding, HotkeyRegistrar, WindowHandle};
use crate::platform::SoundPlayer;
use crate::settings::{AppSettings, SettingsStore};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Something that displays the current mute state (the tray icon).
pub trait MuteIndicator {
    fn show_mute_state(&mut self, muted: bool);
}

/// Forwards each state to every indicator it holds.
#[derive(Default)]
pub struct IndicatorSet {
    indicators: Vec<Rc<RefCell<dyn MuteIndicator>>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, indicator: Rc<RefCell<dyn MuteIndicator>>) -> Self {
        self.indicators.push(indicator);
        self
    }
}

impl MuteIndicator for IndicatorSet {
    fn show_mute_state(&mut self, muted: bool) {
        for indicator in &self.indicators {
            indicator.borrow_mut().show_mute_state(muted);
        }
    }
}

/// Icon plus sound for a mute change.
struct MuteFeedback {
    indicator: Rc<RefCell<dyn MuteIndicator>>,
    player: Box<dyn SoundPlayer>,
    mute_sound: Option<PathBuf>,
    unmute_sound: Option<PathBuf>,
}

impl MuteFeedback {
    fn show(&self, muted: bool) {
        self.indicator.borrow_mut().show_mute_state(muted);
    }

    /// Show the new state and play its sound, if one is set.
    fn announce(&self, muted: bool) {
        self.show(muted);

        let sound = if muted {
            &self.mute_sound
        } else {
            &self.unmute_sound
        };
        if let Some(path) = sound {
            self.player.play(path);
        }
    }
}

fn toggle_and_announce<B: AudioBackend>(
    audio: &RefCell<AudioController<B>>,
    feedback: &RefCell<MuteFeedback>,
) -> Option<bool> {
    let muted = audio.borrow_mut().toggle_mute()?;
    feedback.borrow().announce(muted);
    Some(muted)
}

/// Default communications device when it is present, else the first device.
pub fn initial_device(
    devices: &[AudioDevice],
    default: Option<AudioDevice>,
) -> Option<AudioDevice> {
    default
        .filter(|d| devices.contains(d))
        .or_else(|| devices.first().cloned())
}

/// The shell's state, owned by the UI thread.
pub struct App<B: AudioBackend + 'static, H: HotkeyApi> {
    audio: Rc<RefCell<AudioController<B>>>,
    hotkeys: HotkeyRegistrar<H>,
    feedback: Rc<RefCell<MuteFeedback>>,
    settings: AppSettings,
    store: SettingsStore,
}

impl<B: AudioBackend + 'static, H: HotkeyApi> App<B, H> {
    pub fn new(
        hotkey_api: H,
        store: SettingsStore,
        settings: AppSettings,
        indicator: Rc<RefCell<dyn MuteIndicator>>,
        player: Box<dyn SoundPlayer>,
    ) -> Self {
        let audio = Rc::new(RefCell::new(AudioController::new()));
        let feedback = Rc::new(RefCell::new(MuteFeedback {
            indicator,
            player,
            mute_sound: settings.mute_sound_path.clone(),
            unmute_sound: settings.unmute_sound_path.clone(),
        }));

        let mut hotkeys = HotkeyRegistrar::new(hotkey_api);
        {
            let audio = Rc::clone(&audio);
            let feedback = Rc::clone(&feedback);
            hotkeys.on_hotkey_pressed(move || {
                toggle_and_announce(&audio, &feedback);
            });
        }

        Self {
            audio,
            hotkeys,
            feedback,
            settings,
            store,
        }
    }

    /// Bind the hotkey target window and register the saved hotkey.
    pub fn attach_window(&mut self, window: WindowHandle) {
        self.hotkeys.set_window_handle(window);

        let saved = self.settings.hotkey();
        if saved.is_set() && !self.hotkeys.register(saved.modifiers, saved.key) {
            warn!(hotkey = %saved, "Saved hotkey could not be registered");
        }
    }

    /// Connect to the audio subsystem and pick the initial device.
    pub fn connect_audio<F>(&mut self, connect: F) -> bool
    where
        F: FnOnce() -> Result<B, AudioError>,
    {
        let mut audio = self.audio.borrow_mut();
        if !audio.initialize(connect) {
            return false;
        }

        let devices = audio.list_capture_devices();
        match initial_device(&devices, audio.default_device()) {
            Some(device) => audio.select(&device),
            None => info!("No capture devices found"),
        }
        drop(audio);

        self.refresh();
        true
    }

    /// Re-read the device state and update the indicator, without sound.
    pub fn refresh(&self) {
        let muted = self.is_muted();
        self.feedback.borrow().show(muted);
    }

    pub fn devices(&self) -> Vec<AudioDevice> {
        self.audio.borrow().list_capture_devices()
    }

    pub fn selected_device(&self) -> Option<AudioDevice> {
        self.audio.borrow().selected_device()
    }

    pub fn is_muted(&self) -> bool {
        self.audio.borrow().is_muted()
    }

    pub fn select_device(&mut self, device: &AudioDevice) {
        self.audio.borrow_mut().select(device);
        self.refresh();
    }

    /// Toggle from the tray menu; same path as the hotkey.
    pub fn toggle_mute(&mut self) -> Option<bool> {
        toggle_and_announce(&self.audio, &self.feedback)
    }

    /// Offer a window message to the hotkey registrar.
    pub fn handle_message(&mut self, msg: u32, wparam: usize) -> bool {
        self.hotkeys.handle_message(msg, wparam)
    }

    pub fn active_hotkey(&self) -> Option<HotkeyBinding> {
        self.hotkeys.active_binding()
    }

    /// Register and persist a new hotkey.
    ///
    /// If the system rejects it, the previous binding is restored and the
    /// saved settings are left untouched.
    pub fn apply_hotkey(&mut self, binding: HotkeyBinding) -> bool {
        if !binding.is_set() {
            return false;
        }

        if self.hotkeys.register(binding.modifiers, binding.key) {
            self.settings.set_hotkey(binding);
            self.persist();
            return true;
        }

        let previous = self.settings.hotkey();
        if previous.is_set() && !self.hotkeys.register(previous.modifiers, previous.key) {
            warn!(hotkey = %previous, "Previous hotkey could not be restored");
        }
        false
    }

    pub fn clear_hotkey(&mut self) {
        self.hotkeys.unregister();
        self.settings.clear_hotkey();
        self.persist();
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Choose the mute sound and preview it. Refused if the file is missing.
    pub fn set_mute_sound(&mut self, path: Option<PathBuf>) -> bool {
        if !self.settings.set_mute_sound(path) {
            return false;
        }
        let path = self.settings.mute_sound_path.clone();
        self.feedback.borrow_mut().mute_sound = path.clone();
        self.sound_changed(path.as_deref());
        true
    }

    /// Unmute counterpart of [`set_mute_sound`](Self::set_mute_sound).
    pub fn set_unmute_sound(&mut self, path: Option<PathBuf>) -> bool {
        if !self.settings.set_unmute_sound(path) {
            return false;
        }
        let path = self.settings.unmute_sound_path.clone();
        self.feedback.borrow_mut().unmute_sound = path.clone();
        self.sound_changed(path.as_deref());
        true
    }

    fn sound_changed(&self, preview: Option<&Path>) {
        if let Some(path) = preview {
            self.feedback.borrow().player.play(path);
        }
        self.persist();
    }

    pub fn set_start_minimized(&mut self, value: bool) {
        self.settings.start_minimized = value;
        self.persist();
    }

    pub fn set_close_to_tray(&mut self, value: bool) {
        self.settings.close_to_tray = value;
        self.persist();
    }

    fn persist(&self) {
        match self.store.save(&self.settings) {
            Ok(()) => debug!("Settings persisted"),
            Err(e) => warn!(error = %e, "Failed to save settings"),
        }
    }

    /// Release the hotkey. Called when the window is destroyed.
    pub fn shutdown(&mut self) {
        self.hotkeys.dispose();
        info!("Application state shut down");
    }
}
