use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::FileMode;

/// Atomically create `path` with `content`, never clobbering an existing file.
/// Returns false if `path` already existed, in which case it is left untouched.
pub fn write_new(path: &Path, content: &[u8], mode: FileMode) -> io::Result<bool> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".artifact")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    if mode == FileMode::Executable {
        set_executable(tmp.path())?;
    }
    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        // the temp file is removed when the returned handle is dropped.
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}

/// Set `rwxr-xr-x`; no-op where unix permissions don't exist.
pub fn set_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
