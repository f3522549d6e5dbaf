use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};

/// What happened to a path, as far as rebuilds are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Created, or content changed
    Written,
    Removed,
    /// Rename whose direction could not be determined
    Renamed,
    /// Metadata, access and anything else
    Other,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::Other => "other",
        }
    }

    /// Only writes and removals can change a bundle.
    #[inline]
    pub fn is_relevant(self) -> bool {
        matches!(self, Self::Written | Self::Removed)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Split a notify event into one `(kind, path)` pair per affected path.
///
/// A rename with both sides known becomes a removal of the source and a write
/// of the target.
pub fn classify(event: &notify::Event) -> Vec<(EventKind, PathBuf)> {
    use notify::EventKind as N;

    let uniform = |kind: EventKind| -> Vec<(EventKind, PathBuf)> {
        event.paths.iter().map(|p| (kind, p.clone())).collect()
    };

    match event.kind {
        N::Create(_) => uniform(EventKind::Written),
        N::Remove(_) => uniform(EventKind::Removed),
        N::Modify(ModifyKind::Data(_) | ModifyKind::Any) => uniform(EventKind::Written),
        N::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To => uniform(EventKind::Written),
            RenameMode::From => uniform(EventKind::Removed),
            RenameMode::Both if event.paths.len() == 2 => vec![
                (EventKind::Removed, event.paths[0].clone()),
                (EventKind::Written, event.paths[1].clone()),
            ],
            _ => uniform(EventKind::Renamed),
        },
        _ => uniform(EventKind::Other),
    }
}
