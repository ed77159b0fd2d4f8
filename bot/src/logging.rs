use std::fs::OpenOptions;

use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{CombinedLogger, ConfigBuilder, SharedLogger, WriteLogger};

use crate::config::Config;
use crate::error::Result;

/// Nama level gaya Python (`WARNING`, `CRITICAL`) juga diterima.
pub fn level_from_name(name: &str) -> LevelFilter {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "WARNING" | "WARN" => LevelFilter::Warn,
        "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::Error,
        "OFF" | "NONE" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn effective_level(config: &Config) -> LevelFilter {
    if config.debug {
        LevelFilter::Debug
    } else {
        level_from_name(&config.log_level)
    }
}

/// Logger konsol pretty_env_logger, dibungkus supaya bisa masuk [`CombinedLogger`].
struct Console(env_logger::Logger);

impl Log for Console {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.0.log(record)
    }

    fn flush(&self) {
        self.0.flush()
    }
}

impl SharedLogger for Console {
    fn level(&self) -> LevelFilter {
        self.0.filter()
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

fn console_logger(config: &Config) -> Console {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(effective_level(config));
    // mongodb driver terlalu cerewet di level debug
    builder.filter_module("mongodb", LevelFilter::Warn);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    Console(builder.build())
}

fn file_log_config() -> simplelog::Config {
    ConfigBuilder::new()
        .add_filter_ignore_str("mongodb")
        .set_time_format_rfc3339()
        .build()
}

/// Konsol selalu aktif; `LOG_FILE` menambah salinan ke file (append).
pub fn init(config: &Config) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![Box::new(console_logger(config))];

    if !config.log_file.is_empty() {
        let file = OpenOptions::new().create(true).append(true).open(&config.log_file)?;
        loggers.push(WriteLogger::new(effective_level(config), file_log_config(), file));
    }

    // Logger sudah terpasang (misal di test) bukan error fatal
    if let Err(e) = CombinedLogger::init(loggers) {
        log::debug!("Logger sudah diinisialisasi: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_level_names_map_to_filters() {
        assert_eq!(level_from_name("DEBUG"), LevelFilter::Debug);
        assert_eq!(level_from_name("warning"), LevelFilter::Warn);
        assert_eq!(level_from_name("CRITICAL"), LevelFilter::Error);
        assert_eq!(level_from_name("INFO"), LevelFilter::Info);
        assert_eq!(level_from_name("bogus"), LevelFilter::Info);
    }

    #[test]
    fn debug_flag_forces_debug_level() {
        let config = Config::from_lookup(|key| match key {
            "DEBUG" => Some("true".to_string()),
            "LOG_LEVEL" => Some("ERROR".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(effective_level(&config), LevelFilter::Debug);
    }

    #[test]
    fn init_copies_records_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let path_str = path.to_string_lossy().to_string();
        let config = Config::from_lookup(|key| match key {
            "LOG_FILE" => Some(path_str.clone()),
            _ => None,
        })
        .unwrap();

        init(&config).unwrap();
        log::warn!("uji salinan log ke file");
        log::logger().flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("uji salinan log ke file"));
    }
}
