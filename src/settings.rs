//! Timer settings and the JSON settings file

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading, saving or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Snapshot of everything the timer and scheduler need to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "work_minutes", with = "minutes")]
    pub work_duration: Duration,
    #[serde(rename = "break_minutes", with = "minutes")]
    pub break_duration: Duration,
    /// How long before suspension the warning fires
    #[serde(rename = "warning_minutes", with = "minutes")]
    pub warning_time: Duration,
    #[serde(rename = "extend_minutes", with = "minutes")]
    pub extend_duration: Duration,
    /// Restart a new work cycle when a break ends
    pub always_on: bool,
    pub schedule_enabled: bool,
    /// Daily window start, "HH:MM"
    pub schedule_start: String,
    /// Daily window end, "HH:MM"
    pub schedule_end: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: Duration::from_secs(50 * 60),
            break_duration: Duration::from_secs(10 * 60),
            warning_time: Duration::from_secs(5 * 60),
            extend_duration: Duration::from_secs(5 * 60),
            always_on: false,
            schedule_enabled: false,
            schedule_start: "09:00".to_string(),
            schedule_end: "18:00".to_string(),
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/pomoduru/config.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join("pomoduru").join("config.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings from `path`, writing the defaults there first if the file
    /// does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("No settings at {}, writing defaults", path.display());
            let settings = Self::default();
            settings.save(path)?;
            return Ok(settings);
        }

        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write settings as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    /// Check the duration invariants. Schedule strings are left alone: a bad
    /// window only disables scheduling at runtime.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let durations = [
            ("work duration", self.work_duration),
            ("break duration", self.break_duration),
            ("warning time", self.warning_time),
            ("extend duration", self.extend_duration),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(SettingsError::Invalid(format!("{} must be positive", name)));
            }
        }

        if self.warning_time >= self.work_duration {
            return Err(SettingsError::Invalid(
                "warning time must be shorter than the work duration".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serialize a `Duration` as whole minutes
mod minutes {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs() / 60)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let minutes = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(minutes.saturating_mul(60)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fifty_ten_cycle() {
        let settings = Settings::default();
        assert_eq!(settings.work_duration, Duration::from_secs(3000));
        assert_eq!(settings.break_duration, Duration::from_secs(600));
        assert_eq!(settings.warning_time, Duration::from_secs(300));
        assert_eq!(settings.extend_duration, Duration::from_secs(300));
        assert!(!settings.always_on);
        assert!(!settings.schedule_enabled);
        assert_eq!(settings.schedule_start, "09:00");
        assert_eq!(settings.schedule_end, "18:00");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_warning_not_before_work_end() {
        let settings = Settings {
            warning_time: Duration::from_secs(3000),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_zero_durations() {
        let settings = Settings {
            extend_duration: Duration::ZERO,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("extend duration"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let settings = Settings::load_or_create(&path).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn file_stores_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            work_duration: Duration::from_secs(45 * 60),
            always_on: true,
            ..Settings::default()
        };

        settings.save(&path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["work_minutes"], 45);
        assert_eq!(raw["always_on"], true);

        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::load_or_create(&path),
            Err(SettingsError::Parse(_))
        ));
    }
}
