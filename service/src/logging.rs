use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ConfigBuilder};

/// Verbose dependencies kept out of the console unless running at Trace.
/// Filters match by module path prefix.
const FILTERED_MODULES: &[&str] = &["hyper", "tower", "axum", "reqwest", "rustls", "tracing"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// Fails if a global logger is already installed.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;

        simplelog::TermLogger::init(
            level,
            Self::build_log_config(level),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    /// Dependency modules silenced at `level`; none at Trace.
    fn filtered_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            FILTERED_MODULES
        }
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        for module in Self::filtered_modules(level) {
            builder.add_filter_ignore_str(module);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_stack_is_filtered_below_trace() {
        for level in [
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            let filtered = Logger::filtered_modules(level);
            for module in ["reqwest", "rustls", "hyper"] {
                assert!(filtered.contains(&module), "{module} not filtered at {level}");
            }
        }
    }

    #[test]
    fn test_trace_shows_every_module() {
        assert!(Logger::filtered_modules(LevelFilter::Trace).is_empty());
    }

    #[test]
    fn test_own_crates_are_never_filtered() {
        for module in FILTERED_MODULES {
            for own in ["integration_auth", "service", "web", "integration_broker"] {
                assert!(!own.starts_with(module), "{module} would hide {own}");
            }
        }
    }

    #[test]
    fn test_build_log_config_at_every_level() {
        for level in LevelFilter::iter() {
            let _config = Logger::build_log_config(level);
        }
    }
}
