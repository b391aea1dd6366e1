use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `value` as pretty JSON, replacing `path` only once the new contents
/// are fully on disk.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serialize staged JSON")?;
    write_bytes_atomic(path, &bytes)
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("stage file in {}", parent.display()))?;
    staged
        .write_all(bytes)
        .with_context(|| format!("write staged copy of {}", path.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("sync staged copy of {}", path.display()))?;
    staged
        .persist(path)
        .map_err(|err| anyhow!("publish {}: {}", path.display(), err.error))?;
    Ok(())
}
