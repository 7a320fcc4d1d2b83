use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, warn};

/// Replace every character outside `[A-Za-z0-9.\-]` with `_`, keeping a
/// human-recognizable suffix and the original extension.
pub fn sanitize_name(original: &str) -> String {
    lazy_static! {
        static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9.\-]").unwrap();
    }
    UNSAFE_CHARS.replace_all(original, "_").into_owned()
}

/// Persist uploaded bytes into the flat content directory (created on first
/// use) under a collision-resistant generated name:
/// `<ms-timestamp>-<random in [0, 1e9)>-<sanitized original name>`.
pub async fn store(dir: &Path, bytes: &[u8], original_name: &str) -> anyhow::Result<String> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create upload dir {}", dir.display()))?;

    let millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    let noise: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let stored = format!("{}-{}-{}", millis, noise, sanitize_name(original_name));

    fs::write(dir.join(&stored), bytes)
        .await
        .with_context(|| format!("write upload {}", stored))?;

    debug!(stored = %stored, size = bytes.len(), "upload stored");
    Ok(stored)
}

/// Best-effort removal, used to take back an asset when the user insert
/// loses the duplicate-email race.
pub async fn remove(dir: &Path, stored_name: &str) {
    if let Err(e) = fs::remove_file(dir.join(stored_name)).await {
        warn!(error = %e, stored = %stored_name, "failed to remove upload");
    }
}
