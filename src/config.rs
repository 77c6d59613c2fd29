//! Configuration and CLI argument handling

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Parser, Subcommand};

use crate::{
    settings::{Settings, SettingsError},
    timer::scheduler::parse_time_of_day,
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomoduru")]
#[command(about = "A work/break timer that suspends the machine when work time is up")]
#[command(version)]
pub struct Config {
    /// Port for the control API
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Settings file [default: <config dir>/pomoduru/config.json]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or change the saved settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Change settings; omitted flags keep their current value
    Set(SetArgs),
}

/// Settings overrides. Durations are in minutes, zero means unchanged.
#[derive(Debug, Default, Args)]
pub struct SetArgs {
    /// Work duration in minutes
    #[arg(long, default_value_t = 0)]
    pub work: u64,

    /// Break duration in minutes
    #[arg(long = "break", default_value_t = 0)]
    pub break_minutes: u64,

    /// Warning time in minutes before suspend
    #[arg(long, default_value_t = 0)]
    pub warning: u64,

    /// Extension duration in minutes
    #[arg(long, default_value_t = 0)]
    pub extend: u64,

    /// Enable always-on mode
    #[arg(long)]
    pub always_on: bool,

    /// Enable the daily schedule
    #[arg(long)]
    pub schedule_enabled: bool,

    /// Schedule start time (HH:MM)
    #[arg(long)]
    pub schedule_start: Option<String>,

    /// Schedule end time (HH:MM)
    #[arg(long)]
    pub schedule_end: Option<String>,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Settings file to use, explicit or default
    pub fn settings_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Settings::default_path(),
        }
    }
}

impl SetArgs {
    /// Apply the overrides to `settings` and return a description of each
    /// change. The result is validated before anything is reported.
    pub fn apply(&self, settings: &mut Settings) -> Result<Vec<String>, SettingsError> {
        let mut changes = Vec::new();

        let minutes = [
            (self.work, &mut settings.work_duration, "Work duration"),
            (self.break_minutes, &mut settings.break_duration, "Break duration"),
            (self.warning, &mut settings.warning_time, "Warning time"),
            (self.extend, &mut settings.extend_duration, "Extend duration"),
        ];
        for (value, field, label) in minutes {
            if value > 0 {
                *field = Duration::from_secs(value.saturating_mul(60));
                changes.push(format!("{} set to {} minutes", label, value));
            }
        }

        if self.always_on {
            settings.always_on = true;
            changes.push("Always-on mode enabled".to_string());
        }
        if self.schedule_enabled {
            settings.schedule_enabled = true;
            changes.push("Schedule enabled".to_string());
        }

        let times = [
            (&self.schedule_start, &mut settings.schedule_start, "Schedule start"),
            (&self.schedule_end, &mut settings.schedule_end, "Schedule end"),
        ];
        for (value, field, label) in times {
            if let Some(value) = value {
                parse_time_of_day(value).map_err(|e| {
                    SettingsError::Invalid(format!("{} {:?} is not HH:MM: {}", label, value, e))
                })?;
                *field = value.trim().to_string();
                changes.push(format!("{} set to {}", label, field));
            }
        }

        settings.validate()?;
        Ok(changes)
    }
}

/// Human readable listing for `config show`
pub fn render_settings(settings: &Settings, path: &Path) -> String {
    let minutes = |d: Duration| d.as_secs() / 60;
    format!(
        "Pomoduru Configuration\n\
         ======================\n\
         Work Duration:    {} minutes\n\
         Break Duration:   {} minutes\n\
         Warning Time:     {} minutes\n\
         Extend Duration:  {} minutes\n\
         Always On:        {}\n\
         Schedule Enabled: {}\n\
         Schedule Start:   {}\n\
         Schedule End:     {}\n\
         \n\
         Config file: {}",
        minutes(settings.work_duration),
        minutes(settings.break_duration),
        minutes(settings.warning_time),
        minutes(settings.extend_duration),
        settings.always_on,
        settings.schedule_enabled,
        settings.schedule_start,
        settings.schedule_end,
        path.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_locally() {
        let config = Config::try_parse_from(["pomoduru"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert!(config.command.is_none());
    }

    #[test]
    fn parses_config_set() {
        let config = Config::try_parse_from([
            "pomoduru",
            "-v",
            "config",
            "set",
            "--work",
            "45",
            "--break",
            "15",
            "--schedule-start",
            "08:30",
        ])
        .unwrap();

        assert_eq!(config.log_level(), "debug");
        let Some(Command::Config(ConfigCommand::Set(args))) = config.command else {
            panic!("expected config set");
        };
        assert_eq!(args.work, 45);
        assert_eq!(args.break_minutes, 15);
        assert_eq!(args.schedule_start.as_deref(), Some("08:30"));
        assert!(!args.always_on);
    }

    #[test]
    fn apply_updates_only_given_fields() {
        let mut settings = Settings::default();
        let args = SetArgs {
            work: 45,
            always_on: true,
            schedule_end: Some("17:30".to_string()),
            ..SetArgs::default()
        };

        let changes = args.apply(&mut settings).unwrap();

        assert_eq!(settings.work_duration, Duration::from_secs(45 * 60));
        assert_eq!(settings.break_duration, Duration::from_secs(10 * 60));
        assert!(settings.always_on);
        assert_eq!(settings.schedule_end, "17:30");
        assert_eq!(
            changes,
            vec![
                "Work duration set to 45 minutes",
                "Always-on mode enabled",
                "Schedule end set to 17:30"
            ]
        );
    }

    #[test]
    fn apply_without_flags_changes_nothing() {
        let mut settings = Settings::default();
        let changes = SetArgs::default().apply(&mut settings).unwrap();
        assert!(changes.is_empty());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn apply_rejects_bad_schedule_time() {
        let mut settings = Settings::default();
        let args = SetArgs {
            schedule_start: Some("25:99".to_string()),
            ..SetArgs::default()
        };
        assert!(matches!(args.apply(&mut settings), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn apply_rejects_warning_longer_than_work() {
        let mut settings = Settings::default();
        let args = SetArgs {
            work: 5,
            warning: 10,
            ..SetArgs::default()
        };
        assert!(args.apply(&mut settings).is_err());
    }

    #[test]
    fn render_lists_every_setting() {
        let text = render_settings(&Settings::default(), Path::new("/tmp/config.json"));
        assert!(text.contains("Work Duration:    50 minutes"));
        assert!(text.contains("Schedule End:     18:00"));
        assert!(text.ends_with("Config file: /tmp/config.json"));
    }
}
