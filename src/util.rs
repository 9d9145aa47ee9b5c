use anyhow::{anyhow, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// Current epoch time in milliseconds for artifact timestamps.
pub fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Show only the tail of a credential in logs and prompts.
pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "(none)".to_string();
    }
    let count = key.chars().count();
    if count <= 6 {
        return "***".to_string();
    }
    let tail: String = key.chars().skip(count - 6).collect();
    format!("...{tail}")
}

pub fn normalize_url(input: &str) -> Result<String> {
    let url = input.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(anyhow!(
            "Radarr URL must start with http:// or https:// (got {url:?})"
        ));
    }
    Ok(url)
}

/// Replace `path` with `bytes` so readers see either the old or the new file.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem; the data is synced before the rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
