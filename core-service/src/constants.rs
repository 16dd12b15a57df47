//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default analysis server, only edit this file.

/// Default analysis server URL
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:5000
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default HTTP request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Project the results table every N appended records
pub const DEFAULT_TABLE_REFRESH_EVERY: u64 = 5;

/// Repaint the score series every N appended records
pub const DEFAULT_SERIES_REPAINT_EVERY: u64 = 10;

/// Hard cap on rows handed to the table renderer
pub const DEFAULT_DISPLAY_CAP: usize = 500;

/// Pause between scenario steps (milliseconds)
pub const DEFAULT_STEP_DELAY_MS: u64 = 1200;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Transaction Monitor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get analysis server URL from environment or use default
pub fn get_server_url() -> String {
    std::env::var("MONITOR_SERVER_URL")
        .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string())
}

/// Get request timeout from environment or use default
pub fn get_request_timeout() -> u64 {
    env_number("MONITOR_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT)
}

/// Get table refresh interval from environment or use default
pub fn get_table_refresh_every() -> u64 {
    env_number("MONITOR_TABLE_REFRESH_EVERY", DEFAULT_TABLE_REFRESH_EVERY)
}

/// Get series repaint interval from environment or use default
pub fn get_series_repaint_every() -> u64 {
    env_number("MONITOR_SERIES_REPAINT_EVERY", DEFAULT_SERIES_REPAINT_EVERY)
}

/// Get display cap from environment or use default (never above the default)
pub fn get_display_cap() -> usize {
    env_number("MONITOR_DISPLAY_CAP", DEFAULT_DISPLAY_CAP).min(DEFAULT_DISPLAY_CAP)
}

/// Get scenario step delay from environment or use default
pub fn get_step_delay_ms() -> u64 {
    env_number("MONITOR_STEP_DELAY_MS", DEFAULT_STEP_DELAY_MS)
}

/// Get raw duplicate policy name (`append` or `skip`)
pub fn get_duplicate_policy() -> Option<String> {
    std::env::var("MONITOR_DUPLICATE_POLICY").ok()
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
