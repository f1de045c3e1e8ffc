use serde::{Deserialize, Serialize};
use std::fmt;

/// Power state as reported by the frame's `power` setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PowerState {
    Up,
    Down,
    /// Anything the frame reports that we don't recognize, kept verbatim.
    Other(String),
}

impl PowerState {
    pub fn as_str(&self) -> &str {
        match self {
            PowerState::Up => "up",
            PowerState::Down => "down",
            PowerState::Other(s) => s,
        }
    }
}

impl From<String> for PowerState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "up" => PowerState::Up,
            "down" => PowerState::Down,
            _ => PowerState::Other(s),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display settings mirrored from `GET /settings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameSettings {
    pub brightness: f64,
    pub contrast: f64,
    #[serde(rename = "friendly_name")]
    pub name: String,
    pub orientation: String,
    pub power: PowerState,
}

impl FrameSettings {
    pub fn is_on(&self) -> bool {
        self.power == PowerState::Up
    }
}

/// A command accepted by `POST /command/{name}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Brightness(f64),
    Contrast(f64),
    Power(PowerState),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Brightness(_) => "brightness",
            Command::Contrast(_) => "contrast",
            Command::Power(_) => "power",
        }
    }

    /// Query string pairs sent along with the command
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Command::Brightness(level) | Command::Contrast(level) => {
                vec![("level", format!("{:?}", level))]
            }
            Command::Power(state) => vec![("pwr", state.as_str().to_string())],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Media {
    #[serde(rename = "contentId")]
    pub content_id: String,
}

/// Body of the media player's `load_media` call.
#[derive(Debug, Clone, Serialize)]
pub struct LoadMediaRequest {
    pub media: Media,
    pub cmd_id: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub autoplay: bool,
}

impl LoadMediaRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            media: Media { content_id: url.into() },
            cmd_id: 0,
            kind: "LOAD",
            autoplay: true,
        }
    }
}
