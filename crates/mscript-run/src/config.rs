use std::env;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Runner settings read from the environment. Command line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub optimize: bool,
    pub cache_results: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimize: true,
            cache_results: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("MSCRIPT_OPTIMIZE") {
            config.optimize = parse_bool("MSCRIPT_OPTIMIZE", &value, config.optimize);
        }

        if let Some(value) = lookup("MSCRIPT_CACHE") {
            config.cache_results = parse_bool("MSCRIPT_CACHE", &value, config.cache_results);
        }

        if let Some(log_level) = lookup("RUST_LOG") {
            config.log_level = log_level;
        } else if let Some(log_level) = lookup("MSCRIPT_LOG") {
            config.log_level = log_level;
        }

        config
    }
}

fn parse_bool(name: &str, value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            eprintln!(
                "Warning: Invalid {} value '{}', using default {}",
                name, value, default
            );
            default
        }
    }
}
