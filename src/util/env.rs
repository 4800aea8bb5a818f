//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to Cargo project root
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Common bootstrap for binaries: load env once and report which
/// credentials file the sheet adapter will use.
pub fn bootstrap_cli(bin_name: &str) {
    init_env();

    match env_opt("KEYS_PATH") {
        Some(path) if std::path::Path::new(&path).exists() => {
            info!(target = "bootstrap", bin = bin_name, keys_path = %path, "service account key found");
        }
        Some(path) => {
            warn!(target = "bootstrap", bin = bin_name, keys_path = %path, "KEYS_PATH does not exist");
        }
        None => {
            warn!(target = "bootstrap", bin = bin_name, "KEYS_PATH not set; sheet access will fail");
        }
    }
}

/// Get required env var; error if missing.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    init_env();
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Comma/space separated list, lowercased; falls back to `default` when unset or empty.
pub fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    let parsed = env_opt(key).map(|raw| split_list(&raw)).unwrap_or_default();
    if parsed.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().to_lowercase())
        .collect()
}
