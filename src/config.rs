use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Camera
    pub camera_address: String,
    pub poll_interval_ms: u64,
    pub capture_timeout_ms: u64,
    pub failure_threshold: u32,

    // Backend
    pub backend_url: String,
    pub backend_timeout_secs: u64,

    // Speech
    pub transcribe_url: String,
    pub transcribe_fallback_url: String,
    pub tts_engine: String,
    pub tts_url: String,
    pub tts_voice: String,

    // Audio
    pub audio_device: Option<usize>,
    pub max_record_secs: f32,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_address: "http://192.168.137.58".to_string(),
            poll_interval_ms: 5_000,
            capture_timeout_ms: 10_000,
            failure_threshold: 5,
            backend_url: "http://localhost:8000".to_string(),
            backend_timeout_secs: 30,
            transcribe_url: "http://localhost:8000/transcribe".to_string(),
            transcribe_fallback_url: "http://localhost:8001/transcribe".to_string(),
            tts_engine: "cloud".to_string(),
            tts_url: "http://localhost:8000/synthesize".to_string(),
            tts_voice: "en-GB-standard".to_string(),
            audio_device: None,
            max_record_secs: 8.0,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from file or create default
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load config from an explicit path (used by tests)
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(config_path())
    }

    /// Save config to an explicit path (used by tests)
    pub fn save_to(&self, config_path: PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

/// Path to the config file under the platform config dir
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join("glasslink/config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_camera_contract() {
        let config = Config::default();
        assert_eq!(config.poll_interval_ms, 5_000);
        assert_eq!(config.capture_timeout_ms, 10_000);
        assert_eq!(config.failure_threshold, 5);
        assert!(config.camera_address.starts_with("http://"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.camera_address = "http://10.0.0.7".to_string();
        config.failure_threshold = 3;
        config.save_to(path.clone()).expect("save");

        let loaded = Config::load_from(path).expect("load");
        assert_eq!(loaded.camera_address, "http://10.0.0.7");
        assert_eq!(loaded.failure_threshold, 3);
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");

        let loaded = Config::load_from(path.clone()).expect("load");
        assert_eq!(loaded.poll_interval_ms, Config::default().poll_interval_ms);
        // Corrupt file is moved aside, not destroyed
        assert!(path.with_extension("json.corrupt").exists());
    }
}
