use anyhow::{Result, bail};
use std::path::Path;

/// The project root must be an existing directory.
pub fn validate_project_root(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("project_root should be a directory: {}", path.display());
    }
    Ok(())
}

/// The index file must already exist; it is rewritten in place, never
/// created.
pub fn validate_index_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("index_file should be a file: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "autoindex-config-{}-{}-{name}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn project_root_must_be_a_directory() {
        let missing = temp_path("no-such-dir");
        assert!(validate_project_root(&missing).is_err());
        assert!(validate_project_root(&std::env::temp_dir()).is_ok());
    }

    #[test]
    fn index_file_must_exist() {
        let missing = temp_path("no-such-file.rst");
        assert!(validate_index_file(&missing).is_err());

        let existing = temp_path("index.rst");
        std::fs::write(&existing, "x").unwrap();
        assert!(validate_index_file(&existing).is_ok());
        let _ = std::fs::remove_file(existing);
    }
}
