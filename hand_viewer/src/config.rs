//! Viewer configuration: modes, endpoints, screen and canvas sizes, gesture
//! thresholds, reconnect policy.
//!
//! Values come from [`ViewerConfig::default`], optionally overlaid by a TOML
//! file, then by command-line flags (see `main.rs`). Every field has a
//! default, so a file only needs the keys it changes:
//!
//! ```toml
//! host = "10.0.0.5:8000"
//! mode = "cursor"
//!
//! [reconnect]
//! enabled = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use hand_core::GestureThresholds;
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

use crate::backoff::ReconnectPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("unknown mode {0:?} (expected coordinates or cursor)")]
    UnknownMode(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

/// Which visualization is active. Each mode has its own stream endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Coordinates,
    Cursor,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Coordinates, Mode::Cursor];

    /// Path segment under `/ws/`.
    pub fn path(&self) -> &'static str {
        match self {
            Mode::Coordinates => "coordinates",
            Mode::Cursor      => "cursor",
        }
    }

    // ── capabilities ──────────────────────────────────────────────────────
    pub fn draws_skeleton(&self)     -> bool { matches!(self, Mode::Coordinates) }
    pub fn shows_coordinates(&self)  -> bool { matches!(self, Mode::Coordinates) }
    pub fn shows_cursor(&self)       -> bool { matches!(self, Mode::Cursor) }
    pub fn classifies_gesture(&self) -> bool { matches!(self, Mode::Cursor) }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.path().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

// The config file accepts the same spellings as `--mode`.
impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Size: `WxH` on the command line
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width:  u32,
    pub height: u32,
}

impl FromStr for Size {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::Invalid(format!("size {s:?} is not WIDTHxHEIGHT"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(bad)?;
        Ok(Size {
            width:  w.trim().parse().map_err(|_| bad())?,
            height: h.trim().parse().map_err(|_| bad())?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ViewerConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// `host:port` of the backend.
    pub host:                String,
    /// Use `wss://` instead of `ws://`.
    pub tls:                 bool,
    /// Mode opened at startup.
    pub mode:                Mode,
    /// Screen the cursor mode maps onto.
    pub screen_width:        u32,
    pub screen_height:       u32,
    /// Skeleton canvas (and window) size.
    pub canvas_width:        u32,
    pub canvas_height:       u32,
    pub fps_interval_ms:     u64,
    /// Upper bound on transport events handled per window frame.
    pub max_events_per_pump: usize,
    pub click_threshold:     f32,
    pub fist_threshold:      f32,
    pub reconnect:           ReconnectPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let thresholds = GestureThresholds::default();
        ViewerConfig {
            host:                "127.0.0.1:8000".to_string(),
            tls:                 false,
            mode:                Mode::Coordinates,
            screen_width:        1920,
            screen_height:       1080,
            canvas_width:        640,
            canvas_height:       480,
            fps_interval_ms:     1000,
            max_events_per_pump: 64,
            click_threshold:     thresholds.click,
            fist_threshold:      thresholds.fist,
            reconnect:           ReconnectPolicy::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: ViewerConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host is empty".into()));
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::Invalid("screen size must be non-zero".into()));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::Invalid("canvas size must be non-zero".into()));
        }
        for (name, t) in [("click_threshold", self.click_threshold), ("fist_threshold", self.fist_threshold)] {
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number, got {t}")));
            }
        }
        if self.fps_interval_ms == 0 {
            return Err(ConfigError::Invalid("fps_interval_ms must be non-zero".into()));
        }
        if self.max_events_per_pump == 0 {
            return Err(ConfigError::Invalid("max_events_per_pump must be non-zero".into()));
        }
        self.reconnect.validate().map_err(ConfigError::Invalid)
    }

    /// `<ws|wss>://<host>/ws/<mode>`
    pub fn endpoint(&self, mode: Mode) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}/ws/{}", self.host.trim_end_matches('/'), mode.path())
    }

    pub fn thresholds(&self) -> GestureThresholds {
        GestureThresholds { click: self.click_threshold, fist: self.fist_threshold }
    }

    pub fn fps_interval(&self) -> Duration {
        Duration::from_millis(self.fps_interval_ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
