use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::EventKind;

type Predicate = dyn Fn(EventKind, &Path) -> bool + Send + Sync;

/// Caller-supplied acceptance rule for change events.
///
/// Applied after irrelevant kinds and editor temp files have already been
/// dropped. Must be pure: it runs on the monitor loop for every event.
#[derive(Clone)]
pub struct ChangeFilter(Arc<Predicate>);

impl ChangeFilter {
    pub fn new(predicate: impl Fn(EventKind, &Path) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn accept_all() -> Self {
        Self::new(|_, _| true)
    }

    /// Reject paths ending in any of `suffixes` (e.g. `.ts` sources compiled
    /// by another tool).
    pub fn ignore_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suffixes: Vec<String> = suffixes.into_iter().map(Into::into).collect();
        if suffixes.is_empty() {
            return Self::accept_all();
        }

        Self::new(move |_, path| {
            let path = path.to_string_lossy();
            !suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
        })
    }

    #[inline]
    pub fn accepts(&self, kind: EventKind, path: &Path) -> bool {
        (self.0)(kind, path)
    }
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeFilter(..)")
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(crate) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Check if path sits inside a dot directory below `root` (`.git/index`).
///
/// Components of `root` itself are not considered, so a workspace that lives
/// under a hidden directory still works.
pub(crate) fn in_hidden_dir(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_suffixes() {
        let filter = ChangeFilter::ignore_suffixes([".ts", ".d.ts"]);
        assert!(!filter.accepts(EventKind::Written, Path::new("/w/app.ts")));
        assert!(filter.accepts(EventKind::Written, Path::new("/w/app.js")));
        assert!(filter.accepts(EventKind::Removed, Path::new("/w/ts/app.js")));
    }

    #[test]
    fn test_empty_suffix_list_accepts_everything() {
        let filter = ChangeFilter::ignore_suffixes(Vec::<String>::new());
        assert!(filter.accepts(EventKind::Written, Path::new("/w/app.ts")));
    }

    #[test]
    fn test_custom_predicate_sees_kind() {
        let filter = ChangeFilter::new(|kind, _| kind == EventKind::Removed);
        assert!(filter.accepts(EventKind::Removed, Path::new("/a.js")));
        assert!(!filter.accepts(EventKind::Written, Path::new("/a.js")));
    }

    #[test]
    fn test_temp_files() {
        for name in ["/w/.app.js.swp", "/w/app.js~", "/w/app.bak", "/w/x.tmp", "/w/.hidden"] {
            assert!(is_temp_file(Path::new(name)), "{name}");
        }
        assert!(!is_temp_file(Path::new("/w/app.js")));
    }

    #[test]
    fn test_hidden_dirs_below_root() {
        let root = Path::new("/w");
        assert!(in_hidden_dir(root, Path::new("/w/.git/index")));
        assert!(in_hidden_dir(root, Path::new("/w/app/.cache/deps/x.js")));
        assert!(!in_hidden_dir(root, Path::new("/w/app/src/util.js")));
        assert!(!in_hidden_dir(root, Path::new("/elsewhere/.git/index")));
    }

    #[test]
    fn test_hidden_root_is_not_ignored() {
        let root = Path::new("/home/dev/.work/site");
        assert!(!in_hidden_dir(root, Path::new("/home/dev/.work/site/app.js")));
        assert!(in_hidden_dir(root, Path::new("/home/dev/.work/site/.git/HEAD")));
    }
}
