//! File logging. The terminal belongs to the UI, so log lines go to a file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cache::{CacheManager, LOG_FILE};

/// Where to log, if anywhere. An explicit file always enables logging.
pub fn log_path(
    enabled: bool,
    explicit: Option<&Path>,
    cache: Option<&CacheManager>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if !enabled {
        return None;
    }
    cache.map(|c| c.cache_file(LOG_FILE))
}

/// `RUST_LOG` wins; otherwise this crate logs at `debug` or `info`.
pub fn env_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)))
}

/// Install the global subscriber, appending to `path`.
pub fn init(path: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Could not open log file {}: {}", path.display(), e))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Could not install logger: {}", e))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_always_wins() {
        let path = PathBuf::from("/tmp/x.log");
        assert_eq!(log_path(false, Some(&path), None), Some(path));
    }

    #[test]
    fn test_disabled_without_explicit_path() {
        let cache = CacheManager::with_dir(PathBuf::from("/tmp/ggcdash"));
        assert_eq!(log_path(false, None, Some(&cache)), None);
    }

    #[test]
    fn test_enabled_uses_cache_dir() {
        let cache = CacheManager::with_dir(PathBuf::from("/tmp/ggcdash"));
        assert_eq!(
            log_path(true, None, Some(&cache)),
            Some(PathBuf::from("/tmp/ggcdash/ggcdash.log"))
        );
        assert_eq!(log_path(true, None, None), None);
    }
}
