//! System tray icon.
//!
//! Shows the mute state as the icon and tooltip, and offers a small context
//! menu. `tray-icon` delivers clicks and menu selections on global channels
//! that the message loop drains after each dispatched message.

use crate::app::MuteIndicator;
use crate::platform::microphone_icon;
use crate::ui::status;
use thiserror::Error;
use tracing::{debug, warn};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    Icon, MouseButton, TrayIcon, TrayIconBuilder, TrayIconEvent,
};

/// User actions raised from the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// Double-click on the icon or "Settings" in the menu.
    OpenSettings,
    ToggleMute,
    Exit,
}

/// Tray service error types.
#[derive(Debug, Error)]
pub enum TrayError {
    #[error("Failed to create tray icon: {0}")]
    CreateFailed(String),

    #[error("Failed to build tray icon image")]
    IconLoadFailed,

    #[error("Failed to create menu: {0}")]
    MenuFailed(String),
}

struct MenuIds {
    settings: MenuId,
    toggle: MenuId,
    exit: MenuId,
}

/// Owner of the tray icon.
pub struct TrayManager {
    tray_icon: TrayIcon,
    ids: MenuIds,
    muted: Option<bool>,
}

impl TrayManager {
    /// Create and show the tray icon.
    pub fn create(muted: bool) -> Result<Self, TrayError> {
        let menu = Menu::new();

        let settings = MenuItem::new("Settings", true, None);
        let toggle = MenuItem::new("Toggle Mute", true, None);
        let exit = MenuItem::new("Exit", true, None);
        menu.append(&settings)
            .and_then(|()| menu.append(&toggle))
            .and_then(|()| menu.append(&PredefinedMenuItem::separator()))
            .and_then(|()| menu.append(&exit))
            .map_err(|e| TrayError::MenuFailed(e.to_string()))?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(icon(muted)?)
            .with_tooltip(status::tooltip(muted))
            .with_menu(Box::new(menu))
            .build()
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

        Ok(Self {
            tray_icon,
            ids: MenuIds {
                settings: settings.id().clone(),
                toggle: toggle.id().clone(),
                exit: exit.id().clone(),
            },
            muted: Some(muted),
        })
    }

    /// Drain pending icon and menu events.
    pub fn poll_events(&self) -> Vec<TrayEvent> {
        let mut events = Vec::new();

        while let Ok(event) = TrayIconEvent::receiver().try_recv() {
            if let TrayIconEvent::DoubleClick {
                button: MouseButton::Left,
                ..
            } = event
            {
                events.push(TrayEvent::OpenSettings);
            }
        }

        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let mapped = if event.id == self.ids.settings {
                Some(TrayEvent::OpenSettings)
            } else if event.id == self.ids.toggle {
                Some(TrayEvent::ToggleMute)
            } else if event.id == self.ids.exit {
                Some(TrayEvent::Exit)
            } else {
                None
            };
            events.extend(mapped);
        }

        events
    }

    fn update(&mut self, muted: bool) -> Result<(), TrayError> {
        if self.muted == Some(muted) {
            return Ok(());
        }

        self.tray_icon
            .set_icon(Some(icon(muted)?))
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;
        self.tray_icon
            .set_tooltip(Some(status::tooltip(muted)))
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

        self.muted = Some(muted);
        debug!(muted, "Tray icon updated");
        Ok(())
    }
}

impl MuteIndicator for TrayManager {
    fn show_mute_state(&mut self, muted: bool) {
        if let Err(e) = self.update(muted) {
            warn!(error = %e, "Failed to update tray icon");
        }
    }
}

fn icon(muted: bool) -> Result<Icon, TrayError> {
    Icon::try_from(microphone_icon(muted)).map_err(|_| TrayError::IconLoadFailed)
}
