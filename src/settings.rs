//! Session configuration
//!
//! Persisted as JSON: a file on native, LocalStorage on the web.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// When records are forwarded to the remote sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SinkMode {
    /// Local log only
    #[default]
    Off,
    /// Forward every record as it is appended
    Immediate,
    /// Forward the whole buffer once, on close
    FinalOnClose,
}

impl SinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkMode::Off => "Off",
            SinkMode::Immediate => "Immediate",
            SinkMode::FinalOnClose => "FinalOnClose",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Some(SinkMode::Off),
            "immediate" => Some(SinkMode::Immediate),
            "final" | "finalonclose" | "final-on-close" => Some(SinkMode::FinalOnClose),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Pause between ticks (ms), measured from the end of the previous tick
    pub tick_interval_ms: u32,
    /// Edge length of both squares
    pub square_size: f32,
    /// Initial velocity of the primary square, units per tick
    pub primary_velocity: [f32; 2],
    /// Initial velocity of the secondary square, units per tick
    pub secondary_velocity: [f32; 2],
    /// Start-position RNG seed (entropy if absent)
    pub seed: Option<u64>,

    // === Log ===
    /// Records kept before the oldest are evicted
    pub max_log_size: usize,
    /// Persistent store key for the log buffer
    pub storage_key: String,
    /// Remote forwarding pattern
    pub sink_mode: SinkMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            square_size: SQUARE_SIZE,
            primary_velocity: PRIMARY_VELOCITY,
            secondary_velocity: SECONDARY_VELOCITY,
            seed: None,

            max_log_size: MAX_LOG_SIZE,
            storage_key: LOG_STORAGE_KEY.to_string(),
            sink_mode: SinkMode::Off,
        }
    }
}

impl Settings {
    /// Copy with nonsensical values replaced
    pub fn validated(mut self) -> Self {
        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = 1;
        }
        if !(self.square_size.is_finite() && self.square_size > 0.0) {
            log::warn!("Invalid square size {}, using default", self.square_size);
            self.square_size = SQUARE_SIZE;
        }
        if self.max_log_size == 0 {
            self.max_log_size = 1;
        }
        if self.storage_key.is_empty() {
            self.storage_key = LOG_STORAGE_KEY.to_string();
        }
        for v in [&mut self.primary_velocity, &mut self.secondary_velocity] {
            if !v.iter().all(|c| c.is_finite()) {
                *v = [0.0, 0.0];
            }
        }
        self
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings.validated();
                }
                Err(e) => log::warn!("Ignoring malformed settings {}: {}", path.display(), e),
            },
            Err(e) => log::info!("No settings at {} ({}), using defaults", path.display(), e),
        }
        Self::default()
    }

    /// Write settings to a JSON file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bounce_log_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings.validated();
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let s = Settings::default();
        assert_eq!(s.tick_interval_ms, 20);
        assert_eq!(s.max_log_size, 1500);
        assert_eq!(s.square_size, 15.0);
        assert_eq!(s.storage_key, "animation_logs");
        assert_eq!(s.sink_mode, SinkMode::Off);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"max_log_size": 10, "sink_mode": "Immediate"}"#).unwrap();
        assert_eq!(s.max_log_size, 10);
        assert_eq!(s.sink_mode, SinkMode::Immediate);
        assert_eq!(s.tick_interval_ms, 20);
    }

    #[test]
    fn test_validated_repairs_values() {
        let s = Settings {
            tick_interval_ms: 0,
            square_size: -3.0,
            max_log_size: 0,
            storage_key: String::new(),
            primary_velocity: [f32::NAN, 1.0],
            ..Settings::default()
        }
        .validated();
        assert_eq!(s.tick_interval_ms, 1);
        assert_eq!(s.square_size, SQUARE_SIZE);
        assert_eq!(s.max_log_size, 1);
        assert_eq!(s.storage_key, LOG_STORAGE_KEY);
        assert_eq!(s.primary_velocity, [0.0, 0.0]);
    }

    #[test]
    fn test_file_roundtrip_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        let s = Settings {
            seed: Some(42),
            sink_mode: SinkMode::FinalOnClose,
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), s);

        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_sink_mode_parse() {
        assert_eq!(SinkMode::from_str("final"), Some(SinkMode::FinalOnClose));
        assert_eq!(SinkMode::from_str("IMMEDIATE"), Some(SinkMode::Immediate));
        assert_eq!(SinkMode::from_str("sometimes"), None);
    }
}
