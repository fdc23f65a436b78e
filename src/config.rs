// ⚙️ Configuration - environment and .env settings

use std::env;
use std::path::PathBuf;

pub use crate::error::ConfigError;

/// Default gap between the latest invoice day and the reference date
pub const DEFAULT_REFERENCE_OFFSET_DAYS: u32 = 2;

/// Settings read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub reference_offset_days: u32,
    pub segment_rules: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("RFM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let reference_offset_days = match env::var("RFM_REFERENCE_OFFSET_DAYS") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidOffset {
                    var: "RFM_REFERENCE_OFFSET_DAYS",
                    value,
                })?,
            Err(_) => DEFAULT_REFERENCE_OFFSET_DAYS,
        };

        let segment_rules = env::var("RFM_SEGMENT_RULES")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            log_level,
            reference_offset_days,
            segment_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("RFM_LOG_LEVEL");
        env::remove_var("RFM_REFERENCE_OFFSET_DAYS");
        env::remove_var("RFM_SEGMENT_RULES");
    }

    #[test]
    fn test_load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.reference_offset_days, DEFAULT_REFERENCE_OFFSET_DAYS);
        assert_eq!(config.segment_rules, None);
    }

    #[test]
    fn test_load_reads_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RFM_LOG_LEVEL", "debug");
        env::set_var("RFM_REFERENCE_OFFSET_DAYS", "7");
        env::set_var("RFM_SEGMENT_RULES", "rules/segments.json");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.reference_offset_days, 7);
        assert_eq!(config.segment_rules, Some(PathBuf::from("rules/segments.json")));
    }

    #[test]
    fn test_rejects_negative_offset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RFM_REFERENCE_OFFSET_DAYS", "-2");
        let err = AppConfig::load().unwrap_err();
        reset_env();

        assert!(err.to_string().contains("RFM_REFERENCE_OFFSET_DAYS"));
    }
}
