//! Small helpers for logging and file system validation.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended. Used for response-body previews in
/// debug logs, where a multi-kilobyte payload would drown the line.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", &s[..max], s.len() - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file. Run before launching the
/// browser, so an unwritable output path fails fast instead of after a full
/// scrape.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, a file occupying the path, ...).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_path() {
        let dir = std::env::temp_dir().join(format!(
            "hok_patch_scrape_probe_{}",
            std::process::id()
        ));
        let path = dir.to_string_lossy().into_owned();

        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_file_collision() {
        let blocker = std::env::temp_dir().join(format!(
            "hok_patch_scrape_collide_{}",
            std::process::id()
        ));
        tokio::fs::write(&blocker, b"in the way").await.unwrap();

        let result = ensure_writable_dir(&blocker.to_string_lossy()).await;
        assert!(result.is_err());

        tokio::fs::remove_file(&blocker).await.unwrap();
    }
}
