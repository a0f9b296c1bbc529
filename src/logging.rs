use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level for console output
    pub console_level: Level,
    /// Log level for file output
    pub file_level: Level,
    /// Directory where log files should be written; `None` disables file logs
    pub log_dir: Option<PathBuf>,
    /// Whether file logs are written as JSON
    pub json_format: bool,
    /// Whether to also log to stderr
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            log_dir: Some(Self::default_log_dir()),
            json_format: false,
            console: false,
        }
    }
}

impl LoggingConfig {
    /// Get the OS-appropriate default log directory
    pub fn default_log_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "tanuki-panel") {
            // On Linux: ~/.cache/tanuki-panel
            proj_dirs.cache_dir().to_path_buf()
        } else {
            PathBuf::from("tanuki-logs")
        }
    }

    /// Applies the `TANUKI_*` environment variables on top of this
    /// configuration; they take precedence over the config file.
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("TANUKI_LOG_LEVEL").and_then(|l| l.parse::<Level>().ok()) {
            self.console_level = level;
            self.file_level = level;
        }

        if let Some(log_dir) = lookup("TANUKI_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(log_dir));
        }

        if lookup("TANUKI_NO_FILE_LOGS").is_some() {
            self.log_dir = None;
        }

        self.json_format = lookup("TANUKI_JSON_LOGS").is_some();
        self.console = lookup("TANUKI_CONSOLE_LOGS").is_some();

        self
    }

    /// Applies the `log_level` setting from the config file. "Off" disables
    /// file logging; unparsable values are ignored.
    pub fn with_level_setting(mut self, log_level: Option<&str>) -> Self {
        let Some(log_level) = log_level else {
            return self;
        };

        if log_level.eq_ignore_ascii_case("off") {
            self.log_dir = None;
        } else if let Ok(level) = log_level.parse::<Level>() {
            self.console_level = level;
            self.file_level = level;
        }

        self
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(
    config: LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "tanuki.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let filter = EnvFilter::builder()
            .with_default_directive(config.file_level.into())
            .from_env_lossy();

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter)
                .boxed()
        };

        layers.push(file_layer);
    }

    if config.console {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(
                EnvFilter::builder()
                    .with_default_directive(config.console_level.into())
                    .from_env_lossy(),
            )
            .boxed();

        layers.push(console_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn apply_env(config: LoggingConfig, vars: &[(&str, &str)]) -> LoggingConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        config.with_lookup(|key| vars.get(key).cloned())
    }

    fn config_from(vars: &[(&str, &str)]) -> LoggingConfig {
        apply_env(LoggingConfig::default(), vars)
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("TANUKI_LOG_LEVEL", "trace"),
            ("TANUKI_LOG_DIR", "/tmp/tanuki"),
            ("TANUKI_JSON_LOGS", "1"),
        ]);

        assert_eq!(config.file_level, Level::TRACE);
        assert_eq!(config.console_level, Level::TRACE);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/tanuki")));
        assert!(config.json_format);
        assert!(!config.console);
    }

    #[test]
    fn test_no_file_logs_wins_over_log_dir() {
        let config = config_from(&[("TANUKI_LOG_DIR", "/tmp/tanuki"), ("TANUKI_NO_FILE_LOGS", "")]);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn test_level_setting() {
        let base = config_from(&[]);

        let off = base.clone().with_level_setting(Some("Off"));
        assert_eq!(off.log_dir, None);

        let warn = base.clone().with_level_setting(Some("warn"));
        assert_eq!(warn.file_level, Level::WARN);

        assert_eq!(base.clone().with_level_setting(Some("loud")), base);
        assert_eq!(base.clone().with_level_setting(None), base);
    }

    #[test]
    fn test_env_level_wins_over_config_file() {
        let from_file = LoggingConfig::default().with_level_setting(Some("warn"));

        let config = apply_env(from_file.clone(), &[("TANUKI_LOG_LEVEL", "trace")]);
        assert_eq!(config.file_level, Level::TRACE);
        assert_eq!(config.console_level, Level::TRACE);

        let config = apply_env(from_file, &[]);
        assert_eq!(config.file_level, Level::WARN);
    }
}
