//! Workspace root and module specifier resolution.
//!
//! Specifiers starting with `./` or `../` resolve against the referencing
//! module's directory; every other specifier resolves against the root.
//! Candidates are tried in a fixed order:
//!
//! ```text
//! <path>            exact file
//! <path><ext>       for each extension
//! <path>/index<ext> for each extension
//! ```
//!
//! Nothing is cached: each call looks at the filesystem as it is now.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions tried when a specifier names no existing file.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs"];

const INDEX_STEM: &str = "index";

/// Root directory plus specifier-to-path resolution rules.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Workspace {
    /// Open a workspace with the default extension list.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let extensions = DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect();
        Self::with_extensions(root, extensions)
    }

    /// Open a workspace trying `extensions` in order.
    ///
    /// Fails with [`Error::WatchSetup`] when the root is missing or not a
    /// directory: a workspace that cannot be watched is useless.
    pub fn with_extensions(root: impl AsRef<Path>, extensions: Vec<String>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| Error::WatchSetup {
            root: root.to_path_buf(),
            source: notify::Error::io(e).add_path(root.to_path_buf()),
        })?;

        if !canonical.is_dir() {
            return Err(Error::WatchSetup {
                root: canonical.clone(),
                source: notify::Error::generic("workspace root is not a directory")
                    .add_path(canonical),
            });
        }

        Ok(Self {
            root: canonical,
            extensions,
        })
    }

    /// Normalized absolute watch root.
    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve a root-relative specifier (used for the entry point).
    pub fn resolve(&self, specifier: &str) -> Result<PathBuf> {
        self.resolve_in(specifier, None)
    }

    /// Resolve a specifier referenced from `referrer`.
    pub fn resolve_from(&self, specifier: &str, referrer: &Path) -> Result<PathBuf> {
        self.resolve_in(specifier, Some(referrer))
    }

    /// Root-relative, forward-slash key identifying a module in the bundle.
    pub fn module_key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        parts.join("/")
    }

    fn resolve_in(&self, specifier: &str, referrer: Option<&Path>) -> Result<PathBuf> {
        let not_found = || Error::resolution(specifier, referrer);

        if specifier.trim().is_empty() {
            return Err(not_found());
        }

        let base = match referrer {
            Some(from) if is_relative_specifier(specifier) => from.parent().unwrap_or(&self.root),
            _ => &self.root,
        };

        let target = lexical_normalize(&base.join(specifier.trim_start_matches('/')));
        if !target.starts_with(&self.root) {
            crate::debug!("resolve"; "`{}` escapes the workspace root", specifier);
            return Err(not_found());
        }

        self.candidates(&target)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(|found| found.canonicalize().unwrap_or(found))
            .ok_or_else(not_found)
    }

    fn candidates(&self, target: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(1 + self.extensions.len() * 2);
        candidates.push(target.to_path_buf());

        for ext in &self.extensions {
            let mut with_ext = OsString::from(target.as_os_str());
            with_ext.push(ext);
            candidates.push(PathBuf::from(with_ext));
        }

        for ext in &self.extensions {
            candidates.push(target.join(format!("{INDEX_STEM}{ext}")));
        }

        candidates
    }
}

#[inline]
fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Collapse `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path.canonicalize().unwrap()
    }

    #[test]
    fn test_missing_root_is_watch_setup_error() {
        let temp = TempDir::new().unwrap();
        let err = Workspace::new(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::WatchSetup { .. }));
    }

    #[test]
    fn test_file_root_is_watch_setup_error() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "file.js", "");
        assert!(matches!(
            Workspace::new(&file),
            Err(Error::WatchSetup { .. })
        ));
    }

    #[test]
    fn test_resolve_appends_extension() {
        let temp = TempDir::new().unwrap();
        let app = write(temp.path(), "app/src/ep/app.js", "");
        let ws = Workspace::new(temp.path()).unwrap();

        assert_eq!(ws.resolve("app/src/ep/app").unwrap(), app);
        assert_eq!(ws.resolve("app/src/ep/app.js").unwrap(), app);
    }

    #[test]
    fn test_resolve_order_prefers_extension_over_index() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "lib.js", "");
        write(temp.path(), "lib/index.js", "");
        let ws = Workspace::new(temp.path()).unwrap();

        assert_eq!(ws.resolve("lib").unwrap(), file);
    }

    #[test]
    fn test_resolve_index_file() {
        let temp = TempDir::new().unwrap();
        let index = write(temp.path(), "widgets/index.mjs", "");
        let ws = Workspace::new(temp.path()).unwrap();

        assert_eq!(ws.resolve("widgets").unwrap(), index);
    }

    #[test]
    fn test_resolve_relative_to_referrer() {
        let temp = TempDir::new().unwrap();
        let app = write(temp.path(), "app/main.js", "");
        let util = write(temp.path(), "app/util.js", "");
        let shared = write(temp.path(), "shared/log.js", "");
        let ws = Workspace::new(temp.path()).unwrap();

        assert_eq!(ws.resolve_from("./util", &app).unwrap(), util);
        assert_eq!(ws.resolve_from("../shared/log", &app).unwrap(), shared);
        // Bare specifiers stay root-relative even with a referrer
        assert_eq!(ws.resolve_from("shared/log", &app).unwrap(), shared);
    }

    #[test]
    fn test_resolve_rejects_escape_from_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "outside.js", "");
        let root = temp.path().join("root");
        let app = write(&root, "app.js", "");
        let ws = Workspace::new(&root).unwrap();

        let err = ws.resolve_from("../outside", &app).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_resolution_error_names_specifier_and_referrer() {
        let temp = TempDir::new().unwrap();
        let app = write(temp.path(), "app.js", "");
        let ws = Workspace::new(temp.path()).unwrap();

        match ws.resolve_from("./missing", &app).unwrap_err() {
            Error::Resolution {
                specifier,
                referrer,
            } => {
                assert_eq!(specifier, "./missing");
                assert_eq!(referrer.as_deref(), Some(app.as_path()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_reflects_filesystem_changes() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::new(temp.path()).unwrap();
        assert!(ws.resolve("late").is_err());

        let late = write(temp.path(), "late.js", "");
        assert_eq!(ws.resolve("late").unwrap(), late);

        fs::remove_file(&late).unwrap();
        assert!(ws.resolve("late").is_err());
    }

    #[test]
    fn test_module_key_uses_forward_slashes() {
        let temp = TempDir::new().unwrap();
        let app = write(temp.path(), "app/src/ep/app.js", "");
        let ws = Workspace::new(temp.path()).unwrap();

        assert_eq!(ws.module_key(&app), "app/src/ep/app.js");
    }
}
