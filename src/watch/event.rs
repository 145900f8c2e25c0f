// src/watch/event.rs

//! Translation of raw `notify` events into [`ChangeEvent`]s.

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::types::ChangeKind;

/// One relevant filesystem change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Map a `notify` event onto zero or more change events.
    ///
    /// Access events carry no change and are dropped. A rename reported as a
    /// single event becomes a deletion of the old path and an addition of the
    /// new one.
    pub fn from_notify(event: notify::Event) -> Vec<ChangeEvent> {
        let kind = match event.kind {
            EventKind::Access(_) => return Vec::new(),
            EventKind::Create(_) => ChangeKind::Added,
            EventKind::Remove(_) => ChangeKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Added,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                let mut changes = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    changes.push(ChangeEvent::new(ChangeKind::Deleted, from));
                }
                if let Some(to) = paths.next() {
                    changes.push(ChangeEvent::new(ChangeKind::Added, to));
                }
                return changes;
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => ChangeKind::Modified,
        };

        event
            .paths
            .into_iter()
            .map(|path| ChangeEvent::new(kind, path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut ev = notify::Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn maps_basic_kinds() {
        let added = ChangeEvent::from_notify(event(EventKind::Create(CreateKind::File), &["/r/a.rs"]));
        assert_eq!(added, vec![ChangeEvent::new(ChangeKind::Added, "/r/a.rs")]);

        let modified = ChangeEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/r/a.rs"],
        ));
        assert_eq!(modified, vec![ChangeEvent::new(ChangeKind::Modified, "/r/a.rs")]);

        let deleted = ChangeEvent::from_notify(event(EventKind::Remove(RemoveKind::File), &["/r/a.rs"]));
        assert_eq!(deleted, vec![ChangeEvent::new(ChangeKind::Deleted, "/r/a.rs")]);
    }

    #[test]
    fn access_is_ignored() {
        let changes = ChangeEvent::from_notify(event(EventKind::Access(AccessKind::Any), &["/r/a.rs"]));
        assert!(changes.is_empty());
    }

    #[test]
    fn rename_both_splits_into_delete_and_add() {
        let changes = ChangeEvent::from_notify(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/r/old.rs", "/r/new.rs"],
        ));
        assert_eq!(
            changes,
            vec![
                ChangeEvent::new(ChangeKind::Deleted, "/r/old.rs"),
                ChangeEvent::new(ChangeKind::Added, "/r/new.rs"),
            ]
        );
    }
}
