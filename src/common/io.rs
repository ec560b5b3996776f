use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::NamedTempFile;

use crate::error::Error;

/// Write-then-rename wrapper so a failed run leaves no partial output.
/// Bytes go to a temp file beside the target; `finalize_write` moves it
/// into place atomically.
#[derive(Debug)]
pub struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

pub fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite> {
    if !force && target.exists() {
        return Err(Error::Write(format!(
            "refusing to overwrite existing file: {} (use --force)",
            target.display()
        ))
        .into());
    }
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Write(format!("cannot create directory {}: {e}", parent.display()))
            })?;
        }
    }
    let tmp = NamedTempFile::new_in(target.parent().unwrap_or(Path::new(".")))
        .map_err(|e| Error::Write(format!("cannot create temp file near {}: {e}", target.display())))?;

    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tmp.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.tmp.flush()
    }
}

pub fn finalize_write(pending: PendingWrite) -> Result<()> {
    let PendingWrite { target, tmp } = pending;
    tmp.as_file().sync_all().ok(); // best-effort fsync
    tmp.persist(&target)
        .map_err(|e| Error::Write(format!("cannot move output into {}: {e}", target.display())))?;
    if let Some(dir) = target.parent() {
        let _ = File::open(dir).and_then(|f| f.sync_all());
    }
    Ok(())
}
