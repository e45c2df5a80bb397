//! Foreground window discovery.
//!
//! A [`FocusSource`] reports which application owns the focused window. The
//! window filter in [`admit`] is shared by every platform: only windows that
//! would show up in a task bar count as an application.

mod process;
#[cfg(target_os = "linux")]
mod x11;

pub use process::{ProcessInfo, ProcessResolver};
#[cfg(target_os = "linux")]
pub use x11::XpropSource;

/// Desktop shells whose untitled windows are the desktop itself.
const DESKTOP_SHELLS: &[&str] = &["explorer.exe", "xfdesktop", "pcmanfm"];

/// The application that currently has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Foreground {
    pub process_name: String,
    pub exe_path: String,
    pub title: String,
}

/// Something that can be asked for the focused application once per tick.
///
/// Implementations must not block for long; the monitor calls them inline.
/// Any lookup failure is `None`.
pub trait FocusSource: Send + 'static {
    fn foreground(&mut self) -> Option<Foreground>;
}

impl<S: FocusSource + ?Sized> FocusSource for Box<S> {
    fn foreground(&mut self) -> Option<Foreground> {
        (**self).foreground()
    }
}

/// Attributes of the focused window used to decide whether it counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    pub pid: Option<u32>,
    pub title: String,
    pub visible: bool,
    pub tool_window: bool,
    /// Explicitly marked as an application window.
    pub app_window: bool,
    /// Has an owner or transient parent.
    pub owned: bool,
}

impl WindowInfo {
    pub const fn is_task_bar_window(&self) -> bool {
        self.visible && (self.app_window || (!self.tool_window && !self.owned))
    }
}

/// Combines a focused window and its process into a [`Foreground`], or
/// rejects it.
pub fn admit(window: &WindowInfo, process: ProcessInfo) -> Option<Foreground> {
    if !window.is_task_bar_window() {
        return None;
    }
    if window.title.is_empty() && is_desktop_shell(&process.exe_path) {
        return None;
    }
    Some(Foreground {
        process_name: process.name,
        exe_path: process.exe_path,
        title: window.title.clone(),
    })
}

fn is_desktop_shell(exe_path: &str) -> bool {
    let file_name = exe_path
        .rsplit(['/', '\\'])
        .next()
        .map_or_else(String::new, str::to_lowercase);
    DESKTOP_SHELLS.contains(&file_name.as_str())
}

/// A source that never sees a focused application.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl FocusSource for NullSource {
    fn foreground(&mut self) -> Option<Foreground> {
        None
    }
}

/// The focus source for the current platform.
pub fn system_source() -> Box<dyn FocusSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(XpropSource::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!("no focus source for this platform, nothing will be tracked");
        Box::new(NullSource)
    }
}
