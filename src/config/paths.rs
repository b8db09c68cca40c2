//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "RESHARD_CONFIG";

/// Config file location: $RESHARD_CONFIG if set, else `<config_dir>/reshard/config.xml`.
/// A relative $RESHARD_CONFIG is resolved against the current directory.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        let p = PathBuf::from(p);
        if p.is_relative() {
            return Ok(env::current_dir()?.join(p));
        }
        return Ok(p);
    }
    let mut base = config_dir().ok_or_else(|| anyhow!("no user config directory on this platform"))?;
    base.push("reshard");
    base.push("config.xml");
    Ok(base)
}

/// OS-appropriate default log file path under the user data dir.
/// Does not create anything.
pub fn default_log_path() -> Result<PathBuf> {
    let mut base = data_dir().ok_or_else(|| anyhow!("no user data directory on this platform"))?;
    base.push("reshard");
    base.push("reshard.log");
    Ok(base)
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn env_override_wins() {
        let td = tempdir().unwrap();
        let p = td.path().join("custom.xml");
        unsafe { env::set_var(CONFIG_ENV, &p) };
        let got = default_config_path().unwrap();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(got, p);
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let real = base.join("real");
        fs::create_dir_all(&real).unwrap();
        let link = base.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("x.log")).unwrap());
    }
}
