//! X11 focus lookup through `xprop`.
//!
//! ```text
//! $ xprop -root _NET_ACTIVE_WINDOW
//! _NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007
//! $ xprop -id 0x3a00007 _NET_WM_PID _NET_WM_NAME ...
//! _NET_WM_PID(CARDINAL) = 48213
//! _NET_WM_NAME(UTF8_STRING) = "Rust Book - Google Chrome"
//! _NET_WM_WINDOW_TYPE(ATOM) = _NET_WM_WINDOW_TYPE_NORMAL
//! _NET_WM_STATE(ATOM) = _NET_WM_STATE_MAXIMIZED_VERT
//! WM_TRANSIENT_FOR:  not found.
//! ```

use std::process::Command;

use super::{FocusSource, Foreground, ProcessResolver, WindowInfo, admit};

const WINDOW_PROPERTIES: &[&str] = &[
    "_NET_WM_PID",
    "_NET_WM_NAME",
    "WM_NAME",
    "_NET_WM_WINDOW_TYPE",
    "_NET_WM_STATE",
    "WM_TRANSIENT_FOR",
];

/// Window types that never appear in a task bar.
const TOOL_WINDOW_TYPES: &[&str] = &[
    "_NET_WM_WINDOW_TYPE_UTILITY",
    "_NET_WM_WINDOW_TYPE_TOOLBAR",
    "_NET_WM_WINDOW_TYPE_MENU",
    "_NET_WM_WINDOW_TYPE_SPLASH",
    "_NET_WM_WINDOW_TYPE_DOCK",
    "_NET_WM_WINDOW_TYPE_DESKTOP",
    "_NET_WM_WINDOW_TYPE_NOTIFICATION",
];

/// Reads the active window from the X server by shelling out to `xprop`.
#[derive(Default)]
pub struct XpropSource {
    resolver: ProcessResolver,
}

impl XpropSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FocusSource for XpropSource {
    fn foreground(&mut self) -> Option<Foreground> {
        let root = run_xprop(&["-root", "_NET_ACTIVE_WINDOW"])?;
        let window_id = parse_active_window(&root)?;

        let mut args = vec!["-id", window_id.as_str()];
        args.extend_from_slice(WINDOW_PROPERTIES);
        let window = parse_window(&run_xprop(&args)?);

        let process = self.resolver.lookup(window.pid?)?;
        admit(&window, process)
    }
}

fn run_xprop(args: &[&str]) -> Option<String> {
    let output = match Command::new("xprop").args(args).output() {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(error = %err, "failed to run xprop");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(status = %output.status, "xprop failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The focused window id, or `None` when nothing has focus.
fn parse_active_window(output: &str) -> Option<String> {
    let id = output.split("window id #").nth(1)?.split_whitespace().next()?;
    let value = u64::from_str_radix(id.trim_start_matches("0x"), 16).ok()?;
    (value != 0).then(|| id.to_string())
}

/// Parses the window properties. X11 has no explicit app-window marker, so
/// `app_window` stays false and owned windows are never admitted.
fn parse_window(output: &str) -> WindowInfo {
    let mut window = WindowInfo {
        visible: true,
        ..WindowInfo::default()
    };
    let mut net_title = None;
    let mut legacy_title = None;

    for (name, value) in output.lines().filter_map(split_property) {
        match name {
            "_NET_WM_PID" => window.pid = value.trim().parse().ok(),
            "_NET_WM_NAME" => net_title = Some(unquote(value)),
            "WM_NAME" => legacy_title = Some(unquote(value)),
            "_NET_WM_WINDOW_TYPE" => {
                if atoms(value).any(|atom| TOOL_WINDOW_TYPES.contains(&atom)) {
                    window.tool_window = true;
                }
            }
            "_NET_WM_STATE" => {
                for atom in atoms(value) {
                    match atom {
                        "_NET_WM_STATE_HIDDEN" => window.visible = false,
                        "_NET_WM_STATE_SKIP_TASKBAR" => window.tool_window = true,
                        _ => {}
                    }
                }
            }
            "WM_TRANSIENT_FOR" => window.owned = value.contains("window id #"),
            _ => {}
        }
    }
    window.title = net_title.or(legacy_title).unwrap_or_default();
    window
}

/// Splits `NAME(TYPE) = value` or `NAME(TYPE): value`. Missing properties
/// (`NAME:  not found.`) yield `None`.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once('(')?;
    let (_, rest) = rest.split_once(')')?;
    let value = rest.strip_prefix(" = ").or_else(|| rest.strip_prefix(": "))?;
    Some((name.trim(), value))
}

fn atoms(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|atom| !atom.is_empty())
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let inner = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
