use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Pick an unused sibling backup name for `path`.
///
/// Probes `<name>.backup`, `<name>.backup1`, `<name>.backup2`, ... so a prior
/// backup is never clobbered.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut n = 0u32;
    loop {
        let suffix = if n == 0 {
            ".backup".to_string()
        } else {
            format!(".backup{n}")
        };
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        let candidate = PathBuf::from(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn first_backup_has_plain_suffix() {
        let dir = tempdir().unwrap();
        let sav = dir.path().join("world.sav");
        fs::write(&sav, b"x").unwrap();
        assert_eq!(backup_path(&sav), dir.path().join("world.sav.backup"));
    }

    #[test]
    fn probes_past_existing_backups() {
        let dir = tempdir().unwrap();
        let sav = dir.path().join("world.sav");
        fs::write(&sav, b"x").unwrap();
        fs::write(dir.path().join("world.sav.backup"), b"x").unwrap();
        fs::write(dir.path().join("world.sav.backup1"), b"x").unwrap();
        assert_eq!(backup_path(&sav), dir.path().join("world.sav.backup2"));
    }
}
