//! Path containment for tool calls.
//!
//! Every tool resolves its model-supplied path through [`SandboxRoot::resolve`]
//! before touching the filesystem.

use std::path::{Component, Path, PathBuf};

use super::ToolError;

/// The single directory all tool calls are confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot {
    root: PathBuf,
}

impl SandboxRoot {
    /// Anchor `path` as an absolute, normalized root.
    ///
    /// Relative roots are resolved against the current directory. The root
    /// does not have to exist yet; its nearest existing ancestor is
    /// canonicalized so it compares equal to resolved paths once created.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let normalized = normalize_lexical(&absolute);
        let root = resolve_existing_prefix(&normalized).unwrap_or(normalized);
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` under the root, rejecting anything that lands outside it.
    ///
    /// `action` names the attempted operation for the error message
    /// ("list", "read", "write to", "execute").
    pub fn resolve(&self, relative: &str, action: &'static str) -> Result<PathBuf, ToolError> {
        let escape = || ToolError::PathEscape {
            action,
            path: relative.to_string(),
        };

        let joined = normalize_lexical(&self.root.join(relative));
        let resolved = resolve_existing_prefix(&joined).ok_or_else(escape)?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(escape())
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                // Don't pop beyond root / prefix
                if !out.pop() {
                    out.push(comp);
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Canonicalize the nearest existing ancestor of `path` and re-append the
/// missing tail, so symlinks above not-yet-created files are chased too.
///
/// Returns `None` when an existing component cannot be canonicalized
/// (for example a dangling symlink).
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut ancestor = path.to_path_buf();
    let mut tail = PathBuf::new();

    while std::fs::symlink_metadata(&ancestor).is_err() {
        let name = ancestor.file_name()?.to_os_string();
        tail = PathBuf::from(name).join(&tail);
        if !ancestor.pop() {
            return Some(path.to_path_buf());
        }
    }

    let canonical = ancestor.canonicalize().ok()?;
    if tail.as_os_str().is_empty() {
        Some(canonical)
    } else {
        Some(canonical.join(tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("pkg")).expect("mkdir");
        std::fs::write(dir.path().join("pkg/main.py"), "print(1)").expect("write");
        let root = SandboxRoot::new(dir.path()).expect("sandbox root");
        (dir, root)
    }

    #[test]
    fn resolves_paths_inside_root() {
        let (_dir, root) = sandbox();

        assert_eq!(root.resolve(".", "list").unwrap(), root.path());
        assert_eq!(
            root.resolve("pkg/main.py", "read").unwrap(),
            root.path().join("pkg/main.py")
        );
        assert_eq!(
            root.resolve("pkg/../pkg/./main.py", "read").unwrap(),
            root.path().join("pkg/main.py")
        );
        assert_eq!(
            root.resolve("new/dir/file.txt", "write to").unwrap(),
            root.path().join("new/dir/file.txt")
        );
    }

    #[test]
    fn rejects_parent_traversal() {
        let (_dir, root) = sandbox();

        for path in ["..", "../etc/passwd", "pkg/../../x.py", "new/../../../y"] {
            let err = root.resolve(path, "read").unwrap_err();
            assert!(
                matches!(err, ToolError::PathEscape { path: ref p, .. } if p == path),
                "{path} should escape, got {err}"
            );
        }
    }

    #[test]
    fn rejects_absolute_override() {
        let (_dir, root) = sandbox();
        let err = root.resolve("/bin", "list").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot list \"/bin\" as it is outside the permitted working directory"
        );
    }

    #[test]
    fn rejects_sibling_with_shared_prefix() {
        let parent = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(parent.path().join("calc")).expect("mkdir");
        std::fs::create_dir_all(parent.path().join("calculator")).expect("mkdir");
        let root = SandboxRoot::new(parent.path().join("calc")).expect("sandbox root");

        assert!(root.resolve("../calculator", "list").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn root_created_later_under_symlinked_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("real")).expect("mkdir");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias"))
            .expect("symlink");

        let root = SandboxRoot::new(dir.path().join("alias/calculator")).expect("sandbox root");
        let real = dir.path().join("real").canonicalize().unwrap();
        assert_eq!(root.path(), real.join("calculator"));

        std::fs::create_dir(real.join("calculator")).expect("mkdir");
        std::fs::write(real.join("calculator/main.py"), "print(1)").expect("write");

        assert_eq!(
            root.resolve("main.py", "read").unwrap(),
            real.join("calculator/main.py")
        );
        assert_eq!(root.resolve(".", "list").unwrap(), real.join("calculator"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_pointing_outside() {
        let outside = tempfile::tempdir().expect("tempdir");
        let (dir, root) = sandbox();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).expect("symlink");

        assert!(matches!(
            root.resolve("link", "list"),
            Err(ToolError::PathEscape { .. })
        ));
        assert!(matches!(
            root.resolve("link/new.txt", "write to"),
            Err(ToolError::PathEscape { .. })
        ));
    }
}
