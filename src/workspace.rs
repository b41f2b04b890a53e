use crate::diff::{split_lines, ContentResolver};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub const BACKUP_DIR: &str = ".genius-backups";

/// File access confined to one working directory.
pub struct Workspace {
    working_dir: PathBuf,
    canonical_working_dir: PathBuf,
}

impl Workspace {
    pub fn new(working_dir: PathBuf) -> Self {
        let canonical_working_dir =
            fs::canonicalize(&working_dir).unwrap_or_else(|_| working_dir.clone());
        Self {
            working_dir,
            canonical_working_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.working_dir
    }

    fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        if path.trim().is_empty() {
            bail!("Security error: empty path");
        }
        if path.starts_with('/') || path.contains('\\') {
            bail!("Security error: absolute or platform-specific path not allowed: {path}");
        }

        let relative_path = Path::new(path);
        for component in relative_path.components() {
            if matches!(component, Component::ParentDir) {
                bail!("Security error: path traversal detected: {path}");
            }
        }

        let requested = self.working_dir.join(relative_path);
        let normalized = normalize_path(&requested);
        self.ensure_path_is_within_workspace(&normalized)?;

        Ok(normalized)
    }

    fn ensure_path_is_within_workspace(&self, path: &Path) -> Result<()> {
        let guard_path = if path.exists() {
            path.to_path_buf()
        } else {
            nearest_existing_ancestor(path)
                .context("Security error: could not find an existing parent path")?
                .to_path_buf()
        };

        let canonical_guard = fs::canonicalize(&guard_path)
            .with_context(|| format!("Failed to canonicalize {}", guard_path.display()))?;
        if !canonical_guard.starts_with(&self.canonical_working_dir) {
            bail!(
                "Security error: path escapes working directory via symlink or traversal: {}",
                path.display()
            );
        }
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let resolved = self.resolve_path(path)?;
        fs::read_to_string(&resolved)
            .with_context(|| format!("Failed to read {}", resolved.display()))
    }

    /// Read a file as newline-terminated lines.
    pub fn read_lines(&self, path: &str) -> Result<Vec<String>> {
        let content = self.read_file(path)?;
        Ok(split_lines(&content)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let resolved = self.resolve_path(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&resolved, content)
            .with_context(|| format!("Failed to write {}", resolved.display()))
    }

    /// Copy the given files into a fresh timestamped backup directory.
    ///
    /// Files that do not exist are skipped. Returns the backup id.
    pub fn backup_files(&self, paths: &[&str]) -> Result<String> {
        let backup_root = self.working_dir.join(BACKUP_DIR);
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut backup_id = format!("backup_{stamp}");
        let mut attempt = 1;
        while backup_root.join(&backup_id).exists() {
            attempt += 1;
            backup_id = format!("backup_{stamp}_{attempt}");
        }
        let backup_path = backup_root.join(&backup_id);
        fs::create_dir_all(&backup_path)
            .with_context(|| format!("Failed to create {}", backup_path.display()))?;

        let mut copied = 0usize;
        for path in paths {
            let source = self.resolve_path(path)?;
            if !source.is_file() {
                debug!(path, "skipping backup of missing file");
                continue;
            }
            let target = backup_path.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target)
                .with_context(|| format!("Failed to back up {}", source.display()))?;
            copied += 1;
        }

        info!(backup_id = %backup_id, files = copied, "created backup");
        Ok(backup_id)
    }

    /// Copy every file of a backup back over the working tree.
    pub fn restore_backup(&self, backup_id: &str) -> Result<Vec<String>> {
        if backup_id.contains('/') || backup_id.contains('\\') || backup_id.starts_with('.') {
            bail!("Invalid backup id: {backup_id}");
        }
        let backup_path = self.working_dir.join(BACKUP_DIR).join(backup_id);
        if !backup_path.is_dir() {
            bail!("Backup '{backup_id}' does not exist");
        }

        let mut relative_files = Vec::new();
        collect_files(&backup_path, &backup_path, &mut relative_files)?;
        relative_files.sort();

        let mut restored = Vec::with_capacity(relative_files.len());
        for relative in relative_files {
            let display = relative.to_string_lossy().replace('\\', "/");
            let target = self.resolve_path(&display)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(backup_path.join(&relative), &target)
                .with_context(|| format!("Failed to restore {display}"))?;
            restored.push(display);
        }

        info!(backup_id, files = restored.len(), "restored backup");
        Ok(restored)
    }
}

impl ContentResolver for Workspace {
    fn resolve(&self, name: &str) -> Option<Vec<String>> {
        match self.read_lines(name) {
            Ok(lines) => Some(lines),
            Err(error) => {
                debug!(name, %error, "no canonical content, using caller original");
                None
            }
        }
    }
}

fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    let mut current = path;
    while !current.exists() {
        current = current.parent()?;
    }
    Some(current)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_drops_cur_dir() {
        assert_eq!(
            normalize_path(Path::new("/work/./src/lib.rs")),
            PathBuf::from("/work/src/lib.rs")
        );
    }

    #[test]
    fn test_resolver_falls_back_for_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(temp.path().to_path_buf());
        assert!(workspace.resolve("missing.txt").is_none());
    }

    #[test]
    fn test_resolver_reads_lines_from_disk() {
        let temp = TempDir::new().expect("temp dir");
        let workspace = Workspace::new(temp.path().to_path_buf());
        workspace
            .write_file("src/a.txt", "one\ntwo")
            .expect("seed file");
        assert_eq!(
            workspace.resolve("src/a.txt"),
            Some(vec!["one\n".to_string(), "two".to_string()])
        );
    }
}
