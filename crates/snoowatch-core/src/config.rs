use crate::app_config::{AppConfig, Environment, RedditCredentials};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("SNOOWATCH_ENV", "development"));
    let log_level = or_default("SNOOWATCH_LOG_LEVEL", "info");
    let lexicon_path = PathBuf::from(or_default(
        "SNOOWATCH_LEXICON_PATH",
        "./config/lexicon.yaml",
    ));

    let subreddits = split_list(&or_default("SNOOWATCH_SUBREDDITS", "all"));
    if subreddits.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "SNOOWATCH_SUBREDDITS".to_string(),
            reason: "at least one subreddit is required".to_string(),
        });
    }
    let search_terms = split_list(&or_default("SNOOWATCH_SEARCH_TERMS", ""));

    let reddit = match (
        lookup("REDDIT_CLIENT_ID"),
        lookup("REDDIT_CLIENT_SECRET"),
        lookup("REDDIT_USER_AGENT"),
    ) {
        (Ok(client_id), Ok(client_secret), Ok(user_agent)) => Some(RedditCredentials {
            client_id,
            client_secret,
            user_agent,
        }),
        _ => None,
    };

    let db_max_connections = parse_u32("SNOOWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SNOOWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SNOOWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse_u64("SNOOWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("SNOOWATCH_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("SNOOWATCH_RETRY_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        lexicon_path,
        subreddits,
        search_terms,
        reddit,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
