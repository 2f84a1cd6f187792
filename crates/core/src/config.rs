use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub ingest: IngestConfig,
    pub log: LogConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CHRONOLOGICON_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CHRONOLOGICON_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            ingest: IngestConfig::from_env_profiled(p),
            log: LogConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  ingest:  batch_size={}, error_log_cap={}, progress_poll_ms={}",
            self.ingest.batch_size,
            self.ingest.error_log_cap,
            self.ingest.progress_poll_ms
        );
        tracing::info!("  log:     level={}", self.log.level);
    }
}

// ── Ingestion ─────────────────────────────────────────────────

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_ERROR_LOG_CAP: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Rows per atomic insert.
    pub batch_size: usize,
    /// Diagnostics retained on a job; the error count keeps counting past it.
    pub error_log_cap: usize,
    /// Poll interval used by callers waiting on a job.
    pub progress_poll_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            error_log_cap: DEFAULT_ERROR_LOG_CAP,
            progress_poll_ms: 100,
        }
    }
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            // A zero batch size would never flush before end of stream.
            batch_size: profiled_env_usize(p, "INGEST_BATCH_SIZE", defaults.batch_size).max(1),
            error_log_cap: profiled_env_usize(p, "INGEST_ERROR_LOG_CAP", defaults.error_log_cap),
            progress_poll_ms: profiled_env_u64(
                p,
                "INGEST_PROGRESS_POLL_MS",
                defaults.progress_poll_ms,
            ),
        }
    }
}

// ── Logging ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            level: profiled_env_or(p, "LOG_LEVEL", "info"),
        }
    }
}
