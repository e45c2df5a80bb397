//! Application category as the single source of truth for app type strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How an application is tracked.
///
/// Browsers, chat clients and editors get per-sub-window accounting; every
/// other process is `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppType {
    Browser,
    Chat,
    Editor,
    #[default]
    Normal,
}

impl AppType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Chat => "chat",
            Self::Editor => "editor",
            Self::Normal => "normal",
        }
    }

    /// Whether windows of this type are split into sub-windows.
    #[must_use]
    pub const fn tracks_sub_windows(&self) -> bool {
        matches!(self, Self::Browser | Self::Chat | Self::Editor)
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppType {
    type Err = UnknownAppType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "browser" => Ok(Self::Browser),
            "chat" => Ok(Self::Chat),
            "editor" => Ok(Self::Editor),
            "normal" => Ok(Self::Normal),
            _ => Err(UnknownAppType(s.to_string())),
        }
    }
}

impl Serialize for AppType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Stored files may carry categories this build doesn't know about
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

/// Error type for unknown app type strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown app type: {0}")]
pub struct UnknownAppType(String);
