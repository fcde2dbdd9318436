use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

use crate::duration::Interval;
use crate::sound::Sound;

const FALLBACK_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Preset {
    pub task: String,
    pub interval: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub app_name: String,
    pub timeout_secs: u32,
    pub interval: String,
    pub min_interval_secs: u64,
    pub sound: String,
    pub bind: String,
    pub presets: HashMap<String, Preset>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            title: "Reminder!".to_string(),
            app_name: "nudge".to_string(),
            timeout_secs: 10,
            interval: "10s".to_string(),
            min_interval_secs: 5,
            sound: "bell".to_string(),
            bind: "127.0.0.1:5000".to_string(),
            presets: Self::default_presets(),
        }
    }
}

impl Config {
    /// Built-in defaults with the user's config file layered on top.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Config::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file");
                Config::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(contents)?;
        for (k, v) in Self::default_presets() {
            config.presets.entry(k).or_insert(v);
        }
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nudge")
            .join("config.toml")
    }

    fn default_presets() -> HashMap<String, Preset> {
        HashMap::from([
            (
                "break".to_string(),
                Preset {
                    task: "Take a break".to_string(),
                    interval: "60m".to_string(),
                },
            ),
            (
                "water".to_string(),
                Preset {
                    task: "Drink some water".to_string(),
                    interval: "30m".to_string(),
                },
            ),
        ])
    }

    pub fn resolve_preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn default_interval(&self) -> Interval {
        Interval::parse(&self.interval).unwrap_or_else(|e| {
            warn!(interval = %self.interval, error = %e, "invalid default interval, using 10s");
            Interval::from_secs(FALLBACK_INTERVAL_SECS)
        })
    }

    pub fn sound(&self) -> Sound {
        Sound::from_setting(&self.sound)
    }

    pub fn notify_settings(&self) -> crate::notify::NotifySettings {
        crate::notify::NotifySettings {
            title: self.title.clone(),
            app_name: self.app_name.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}
