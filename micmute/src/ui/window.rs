//! The settings window and the UI thread's message loop.
//!
//! One top-level window doubles as the hotkey target and the settings UI.
//! Shell state lives in a thread-local so the window procedure can reach it.
//! Handlers never hold that borrow across calls that can re-enter the window
//! procedure (`ShowWindow`, `SetMenu`, `DestroyWindow`, message boxes).

use crate::app::{App, IndicatorSet, MuteIndicator};
use crate::audio::{AudioDevice, DeviceEnumerator};
use crate::hotkey::keycode::code_from_vk;
use crate::hotkey::win32::hwnd as to_hwnd;
use crate::hotkey::{Code, HotkeyBinding, Modifiers, Win32HotkeyApi, WindowHandle};
use crate::instance::{
    ShowListener, ShowPolicy, UiDispatcher, Win32EventProvider, INSTANCE_EVENT_NAME,
    SHOW_WAIT_TIMEOUT,
};
use crate::platform::sounds::position_of;
use crate::platform::{
    catalogue, microphone_icon, system_sounds, RunKey, SoundInfo, SystemSoundPlayer,
};
use crate::settings::SettingsStore;
use crate::ui::fault;
use crate::ui::menu::{build_menu_bar, Command, MenuModel};
use crate::ui::status::StatusView;
use crate::ui::tray::{TrayEvent, TrayManager};
use anyhow::Context;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use windows::core::{w, HSTRING};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWA_USE_IMMERSIVE_DARK_MODE};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, EndPaint, GetStockObject, InvalidateRect, SelectObject, SetBkMode, TextOutW,
    DEFAULT_GUI_FONT, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, SetFocus, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyIcon, DestroyMenu, DestroyWindow, DispatchMessageW,
    GetMenu, GetMessageW, IsIconic, LoadCursorW, MessageBoxW, PostMessageW, PostQuitMessage,
    RegisterClassExW, SendMessageW, SetForegroundWindow, SetMenu, SetWindowPos, ShowWindow,
    TranslateMessage, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, HICON, HWND_NOTOPMOST, HWND_TOPMOST,
    ICON_BIG, ICON_SMALL, IDC_ARROW, MB_ICONERROR, MB_ICONWARNING, MB_OK, MSG, SWP_NOMOVE,
    SWP_NOSIZE, SW_HIDE, SW_RESTORE, SW_SHOW, WINDOW_EX_STYLE, WM_APP, WM_CLOSE, WM_COMMAND,
    WM_DESTROY, WM_HOTKEY, WM_KEYDOWN, WM_KILLFOCUS, WM_LBUTTONDOWN, WM_PAINT, WM_SETICON,
    WM_SYSKEYDOWN, WNDCLASSEXW, WS_CAPTION, WS_MINIMIZEBOX, WS_OVERLAPPED, WS_SYSMENU,
};

/// Posted by the show listener; handled on the UI thread.
pub const WM_APP_SHOW: u32 = WM_APP + 1;

/// Posted by the panic hook from another thread; tears the window down.
const WM_APP_FATAL: u32 = WM_APP + 2;

const WINDOW_WIDTH: i32 = 460;
const WINDOW_HEIGHT: i32 = 200;

/// How the process was launched.
#[derive(Debug, Clone, Copy)]
pub struct LaunchOptions {
    pub show_requested: bool,
    pub started_at: Instant,
}

/// Forwards show requests to the window's message queue.
pub struct PostShowDispatcher {
    window: WindowHandle,
}

impl PostShowDispatcher {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            window: hwnd.into(),
        }
    }
}

impl UiDispatcher for PostShowDispatcher {
    fn dispatch_show(&self) -> bool {
        unsafe { PostMessageW(to_hwnd(self.window), WM_APP_SHOW, WPARAM(0), LPARAM(0)).is_ok() }
    }
}

/// Title-bar and taskbar icon that follows the mute state.
struct WindowIcon {
    window: WindowHandle,
    current: Option<HICON>,
}

impl WindowIcon {
    fn new(hwnd: HWND) -> Self {
        Self {
            window: hwnd.into(),
            current: None,
        }
    }
}

impl MuteIndicator for WindowIcon {
    fn show_mute_state(&mut self, muted: bool) {
        let icon = match microphone_icon(muted).to_hicon() {
            Ok(icon) => icon,
            Err(e) => {
                debug!(error = %e, "Failed to create window icon");
                return;
            }
        };

        let hwnd = to_hwnd(self.window);
        let handle = LPARAM(icon.0 as isize);
        unsafe {
            SendMessageW(hwnd, WM_SETICON, WPARAM(ICON_SMALL as usize), handle);
            SendMessageW(hwnd, WM_SETICON, WPARAM(ICON_BIG as usize), handle);
        }
        if let Some(old) = self.current.replace(icon) {
            unsafe {
                let _ = DestroyIcon(old);
            }
        }
    }
}

impl Drop for WindowIcon {
    fn drop(&mut self) {
        if let Some(icon) = self.current.take() {
            unsafe {
                let _ = DestroyIcon(icon);
            }
        }
    }
}

struct Shell {
    app: App<DeviceEnumerator, Win32HotkeyApi>,
    tray: Option<Rc<RefCell<TrayManager>>>,
    sounds: Vec<SoundInfo>,
    menu_devices: Vec<AudioDevice>,
    autostart: RunKey,
    capturing: bool,
}

thread_local! {
    static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
}

/// The settings window, readable from any thread. Zero until created.
static MAIN_WINDOW: AtomicIsize = AtomicIsize::new(0);
static UI_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Run `f` against the shell, unless it is gone or already borrowed further
/// up the stack.
fn with_shell<R>(f: impl FnOnce(&mut Shell) -> R) -> Option<R> {
    SHELL.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

impl Shell {
    fn menu_model(&mut self) -> MenuModel {
        self.menu_devices = self.app.devices();
        let selected = self.app.selected_device();
        let settings = self.app.settings();

        MenuModel {
            devices: self.menu_devices.iter().map(|d| d.name.clone()).collect(),
            selected_device: selected.and_then(|s| self.menu_devices.iter().position(|d| *d == s)),
            sounds: self.sounds.iter().map(|s| s.name.clone()).collect(),
            mute_sound: position_of(&self.sounds, settings.mute_sound_path.as_deref()),
            unmute_sound: position_of(&self.sounds, settings.unmute_sound_path.as_deref()),
            start_with_windows: self.autostart.is_enabled(),
            start_minimized: settings.start_minimized,
            close_to_tray: settings.close_to_tray,
            hotkey_set: self.app.active_hotkey().is_some(),
        }
    }

    fn status(&self) -> StatusView {
        StatusView::new(
            self.app.selected_device().as_ref(),
            self.app.is_muted(),
            self.app.active_hotkey(),
            self.capturing,
        )
    }
}

/// Sound catalogue plus any configured file it does not already list.
fn sound_choices(configured: [Option<&std::path::Path>; 2]) -> Vec<SoundInfo> {
    let mut sounds = system_sounds();
    for path in configured.into_iter().flatten() {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sounds.push(SoundInfo::new(name, path));
    }
    catalogue(sounds)
}

/// Create the window, tray, audio and listener, then pump messages until
/// the window is destroyed.
pub fn run(options: LaunchOptions) -> anyhow::Result<()> {
    let store = SettingsStore::default_location().context("Failed to locate the settings file")?;
    let settings = store.load();
    let start_hidden = settings.should_start_minimized(options.show_requested);

    let hwnd = create_window().context("Failed to create the settings window")?;
    MAIN_WINDOW.store(WindowHandle::from(hwnd).0, Ordering::Release);
    let _ = UI_THREAD.set(thread::current().id());
    apply_dark_title_bar(hwnd);

    let tray = match TrayManager::create(false) {
        Ok(tray) => Some(Rc::new(RefCell::new(tray))),
        Err(e) => {
            warn!(error = %e, "Tray icon unavailable");
            None
        }
    };
    let mut indicators = IndicatorSet::new().with(Rc::new(RefCell::new(WindowIcon::new(hwnd))));
    if let Some(tray) = &tray {
        indicators = indicators.with(Rc::clone(tray) as Rc<RefCell<dyn MuteIndicator>>);
    }

    let sounds = sound_choices([
        settings.mute_sound_path.as_deref(),
        settings.unmute_sound_path.as_deref(),
    ]);

    let mut app = App::new(
        Win32HotkeyApi,
        store,
        settings,
        Rc::new(RefCell::new(indicators)),
        Box::new(SystemSoundPlayer),
    );
    app.attach_window(hwnd.into());
    if !app.connect_audio(DeviceEnumerator::new) {
        warn!("Audio unavailable; the hotkey will have no effect");
    }

    SHELL.with(|cell| {
        *cell.borrow_mut() = Some(Shell {
            app,
            tray,
            sounds,
            menu_devices: Vec::new(),
            autostart: RunKey,
            capturing: false,
        });
    });
    refresh_menu(hwnd);

    if start_hidden {
        info!("Starting minimized to tray");
    } else {
        show_window(hwnd);
    }

    let policy = ShowPolicy::new(options.started_at, start_hidden);
    let listener = ShowListener::start(
        &Win32EventProvider,
        INSTANCE_EVENT_NAME,
        PostShowDispatcher::new(hwnd),
        policy,
        SHOW_WAIT_TIMEOUT,
    );

    run_message_loop();

    drop(listener);
    MAIN_WINDOW.store(0, Ordering::Release);
    info!("Message loop exited");
    Ok(())
}

/// Dark caption to match the system theme. Older Windows builds ignore it.
fn apply_dark_title_bar(hwnd: HWND) {
    let dark = BOOL::from(true);
    let result = unsafe {
        DwmSetWindowAttribute(
            hwnd,
            DWMWA_USE_IMMERSIVE_DARK_MODE,
            &dark as *const BOOL as *const core::ffi::c_void,
            std::mem::size_of::<BOOL>() as u32,
        )
    };
    if let Err(e) = result {
        debug!(error = %e, "Dark title bar unavailable");
    }
}

fn create_window() -> windows::core::Result<HWND> {
    unsafe {
        let instance = GetModuleHandleW(None)?;
        let class_name = w!("MicMuteSettingsWindow");

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: instance.into(),
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            lpszClassName: class_name,
            ..Default::default()
        };
        RegisterClassExW(&wc);

        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("MicMute"),
            WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            WINDOW_WIDTH,
            WINDOW_HEIGHT,
            None,
            None,
            instance,
            None,
        )
    }
}

fn run_message_loop() {
    let tray = with_shell(|shell| shell.tray.clone()).flatten();

    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);

            if let Some(tray) = &tray {
                let events = tray.borrow().poll_events();
                for event in events {
                    fault::guard((), |reason| report_intercepted("tray event", reason), || {
                        on_tray_event(event)
                    });
                }
            }
        }
    }
}

fn on_tray_event(event: TrayEvent) {
    let Some(hwnd) = main_window() else {
        return;
    };

    match event {
        TrayEvent::OpenSettings => show_window(hwnd),
        TrayEvent::ToggleMute => {
            with_shell(|shell| shell.app.toggle_mute());
            repaint(hwnd);
        }
        TrayEvent::Exit => unsafe {
            let _ = DestroyWindow(hwnd);
        },
    }
}

fn main_window() -> Option<HWND> {
    let raw = MAIN_WINDOW.load(Ordering::Acquire);
    (raw != 0).then(|| to_hwnd(WindowHandle(raw)))
}

/// Restore, activate and briefly raise the window above everything else.
pub fn show_window(hwnd: HWND) {
    unsafe {
        if IsIconic(hwnd).as_bool() {
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
        let _ = SetWindowPos(hwnd, HWND_TOPMOST, 0, 0, 0, 0, SWP_NOMOVE | SWP_NOSIZE);
        let _ = SetWindowPos(hwnd, HWND_NOTOPMOST, 0, 0, 0, 0, SWP_NOMOVE | SWP_NOSIZE);
    }
    debug!("Settings window shown");
}

/// Blocking error dialog.
pub fn show_error(message: &str) {
    unsafe {
        MessageBoxW(None, &HSTRING::from(message), w!("MicMute"), MB_OK | MB_ICONERROR);
    }
}

fn warn_user(hwnd: HWND, message: &str) {
    unsafe {
        MessageBoxW(hwnd, &HSTRING::from(message), w!("MicMute"), MB_OK | MB_ICONWARNING);
    }
}

fn repaint(hwnd: HWND) {
    unsafe {
        let _ = InvalidateRect(hwnd, None, true);
    }
}

fn refresh_menu(hwnd: HWND) {
    let Some(model) = with_shell(Shell::menu_model) else {
        return;
    };

    match build_menu_bar(&model) {
        Ok(menu) => unsafe {
            let old = GetMenu(hwnd);
            if SetMenu(hwnd, menu).is_ok() && !old.is_invalid() {
                let _ = DestroyMenu(old);
            }
        },
        Err(e) => warn!(error = %e, "Failed to build menu bar"),
    }
}

fn current_modifiers() -> Modifiers {
    let down = |vk: VIRTUAL_KEY| unsafe { GetKeyState(i32::from(vk.0)) } < 0;

    let mut modifiers = Modifiers::empty();
    if down(VK_CONTROL) {
        modifiers |= Modifiers::CONTROL;
    }
    if down(VK_MENU) {
        modifiers |= Modifiers::ALT;
    }
    if down(VK_SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if down(VK_LWIN) || down(VK_RWIN) {
        modifiers |= Modifiers::SUPER;
    }
    modifiers
}

fn start_capture(hwnd: HWND) {
    with_shell(|shell| shell.capturing = true);
    unsafe {
        let _ = SetFocus(hwnd);
    }
    repaint(hwnd);
}

/// Handle a key press while capturing. Returns false if not capturing.
fn on_key_down(hwnd: HWND, vk: u32) -> bool {
    if with_shell(|shell| shell.capturing) != Some(true) {
        return false;
    }

    let modifiers = current_modifiers();
    let key = code_from_vk(vk);

    if key == Code::Escape && modifiers.is_empty() {
        with_shell(|shell| shell.capturing = false);
        repaint(hwnd);
        return true;
    }

    let Some(binding) = HotkeyBinding::from_key_press(key, modifiers) else {
        // Only modifiers so far; wait for the primary key.
        return true;
    };

    let accepted = with_shell(|shell| {
        shell.capturing = false;
        shell.app.apply_hotkey(binding)
    })
    .unwrap_or(false);

    refresh_menu(hwnd);
    repaint(hwnd);

    if !accepted {
        warn_user(
            hwnd,
            &format!(
                "{binding} is already in use by another application. \
                 Choose a different combination."
            ),
        );
    }
    true
}

fn on_command(hwnd: HWND, command: Command) {
    match command {
        Command::SelectDevice(index) => {
            with_shell(|shell| {
                if let Some(device) = shell.menu_devices.get(index).cloned() {
                    shell.app.select_device(&device);
                }
            });
        }
        Command::MuteSound(index) | Command::UnmuteSound(index) => {
            with_shell(|shell| {
                let Some(sound) = shell.sounds.get(index) else {
                    return;
                };
                let path = sound.path.clone();
                let accepted = if matches!(command, Command::MuteSound(_)) {
                    shell.app.set_mute_sound(path)
                } else {
                    shell.app.set_unmute_sound(path)
                };
                if !accepted {
                    debug!(sound = %sound.name, "Sound choice refused");
                }
            });
        }
        Command::StartWithWindows => {
            with_shell(|shell| {
                let enable = !shell.autostart.is_enabled();
                if let Err(e) = shell.autostart.set_enabled(enable) {
                    warn!(error = %e, "Failed to change autostart");
                }
            });
        }
        Command::StartMinimized => {
            with_shell(|shell| {
                let value = !shell.app.settings().start_minimized;
                shell.app.set_start_minimized(value);
            });
        }
        Command::CloseToTray => {
            with_shell(|shell| {
                let value = !shell.app.settings().close_to_tray;
                shell.app.set_close_to_tray(value);
            });
        }
        Command::SetHotkey => start_capture(hwnd),
        Command::ClearHotkey => {
            with_shell(|shell| shell.app.clear_hotkey());
        }
        Command::ToggleMute => {
            with_shell(|shell| shell.app.toggle_mute());
        }
        Command::Exit => {
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            return;
        }
    }

    refresh_menu(hwnd);
    repaint(hwnd);
}

/// Draw the status lines. Returns false if the shell is unavailable, so the
/// default procedure validates the region instead.
fn paint(hwnd: HWND) -> bool {
    let Some(view) = with_shell(|shell| shell.status()) else {
        return false;
    };

    unsafe {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        SelectObject(hdc, GetStockObject(DEFAULT_GUI_FONT));
        SetBkMode(hdc, TRANSPARENT);

        for (row, line) in view.lines().iter().enumerate() {
            let text: Vec<u16> = line.encode_utf16().collect();
            let _ = TextOutW(hdc, 16, 16 + 28 * row as i32, &text);
        }

        let _ = EndPaint(hwnd, &ps);
    }
    true
}

fn on_close(hwnd: HWND) {
    let to_tray = with_shell(|shell| shell.app.settings().close_to_tray && shell.tray.is_some())
        .unwrap_or(false);

    unsafe {
        if to_tray {
            let _ = ShowWindow(hwnd, SW_HIDE);
            debug!("Settings window hidden to tray");
        } else {
            let _ = DestroyWindow(hwnd);
        }
    }
}

/// Release the hotkey and the tray icon. The tray icon is removed when the
/// last handle drops.
fn release_shell() {
    let shell = SHELL.with(|cell| cell.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if let Some(mut shell) = shell {
        shell.app.shutdown();
        drop(shell);
    }
}

fn on_destroy() {
    release_shell();
    unsafe { PostQuitMessage(0) };
}

/// A panic caught on the UI thread: log it, tell the user, keep running.
fn report_intercepted(context: &str, reason: &str) {
    error!(context, reason, "Panic intercepted on the UI thread");
    show_error(&format!("An unexpected error occurred:\n{reason}"));
}

/// Handle a panic that no UI guard will catch.
///
/// The user is told the application is closing. On the UI thread the hotkey
/// and tray icon are released directly; from any other thread the window is
/// asked to tear itself down.
pub fn report_fatal_panic(reason: &str) {
    if fault::is_guarded() {
        return;
    }

    show_error(&format!("MicMute hit a fatal error and will close.\n\n{reason}"));

    if UI_THREAD.get() == Some(&thread::current().id()) {
        release_shell();
    } else if let Some(hwnd) = main_window() {
        unsafe {
            let _ = PostMessageW(hwnd, WM_APP_FATAL, WPARAM(0), LPARAM(0));
        }
    }
}

fn handle_message(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_HOTKEY => {
            if with_shell(|shell| shell.app.handle_message(msg, wparam.0)) == Some(true) {
                repaint(hwnd);
                return LRESULT(0);
            }
        }
        WM_APP_SHOW => {
            show_window(hwnd);
            return LRESULT(0);
        }
        WM_APP_FATAL => {
            warn!("Closing after a fatal error on another thread");
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            return LRESULT(0);
        }
        WM_COMMAND => {
            let id = (wparam.0 & 0xFFFF) as u16;
            if let Some(command) = Command::from_id(id) {
                on_command(hwnd, command);
                return LRESULT(0);
            }
        }
        WM_KEYDOWN | WM_SYSKEYDOWN => {
            if on_key_down(hwnd, wparam.0 as u32) {
                return LRESULT(0);
            }
        }
        WM_LBUTTONDOWN => {
            start_capture(hwnd);
            return LRESULT(0);
        }
        WM_KILLFOCUS => {
            if with_shell(|shell| std::mem::take(&mut shell.capturing)) == Some(true) {
                repaint(hwnd);
            }
        }
        WM_PAINT => {
            if paint(hwnd) {
                return LRESULT(0);
            }
        }
        WM_CLOSE => {
            on_close(hwnd);
            return LRESULT(0);
        }
        WM_DESTROY => {
            on_destroy();
            return LRESULT(0);
        }
        _ => {}
    }

    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    fault::guard(
        LRESULT(0),
        |reason| report_intercepted("window procedure", reason),
        || handle_message(hwnd, msg, wparam, lparam),
    )
}
