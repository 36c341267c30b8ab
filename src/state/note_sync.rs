use super::note_editor::{DeleteOutcome, NoteEditor, NoteWrite, ReadOutcome};
use super::Diagnostic;
use crate::api::{NoteGateway, SharedGateway};
use crate::models::{Note, TitleChange};
use crate::util::now_ms;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Title given to freshly created notes.
pub(crate) const NEW_NOTE_TITLE: &str = "untitled";

pub(crate) fn note_path(note_id: &str) -> String {
    format!("/{note_id}")
}

/// A new note starts with its own id as body, so it is never empty (and always deletable).
pub(crate) fn new_note(note_id: &str, now_ms: i64) -> Note {
    Note {
        title: NEW_NOTE_TITLE.to_string(),
        body: note_id.to_string(),
        last_modified: Some(now_ms),
    }
}

/// Issues the create and returns the route to open right away, without waiting for the write.
pub(crate) fn create_note(
    gateway: &dyn NoteGateway,
    uid: &str,
    note_id: &str,
    now_ms: i64,
) -> (String, LocalBoxFuture<'static, Option<Diagnostic>>) {
    let note_id = note_id.to_string();
    let write = gateway.create(uid, &note_id, &new_note(&note_id, now_ms));
    let path = note_path(&note_id);

    let done = async move {
        write
            .await
            .err()
            .map(|error| Diagnostic::CreateFailed { note_id, error })
    }
    .boxed_local();

    (path, done)
}

pub(crate) fn save_note(
    gateway: &dyn NoteGateway,
    uid: &str,
    write: NoteWrite,
) -> LocalBoxFuture<'static, Option<Diagnostic>> {
    let request = gateway.update(uid, &write.note_id, &write.note);
    let note_id = write.note_id;
    async move {
        request
            .await
            .err()
            .map(|error| Diagnostic::UpdateFailed { note_id, error })
    }
    .boxed_local()
}

/// Connects a [`NoteEditor`] signal to the store for one user.
///
/// Reads, writes and deletes run on `spawn_local`; results are folded back through
/// `try_update`, so a response arriving after the view is gone is dropped.
#[derive(Clone)]
pub(crate) struct NoteSyncController {
    uid: String,
    gateway: SharedGateway,
    editor: RwSignal<NoteEditor>,
    on_title_change: Option<Callback<TitleChange>>,
    on_deleted: Callback<()>,
    clock: fn() -> i64,
}

impl NoteSyncController {
    pub fn new(
        uid: String,
        gateway: SharedGateway,
        on_title_change: Option<Callback<TitleChange>>,
        on_deleted: Callback<()>,
    ) -> Self {
        Self {
            uid,
            gateway,
            editor: RwSignal::new(NoteEditor::new()),
            on_title_change,
            on_deleted,
            clock: now_ms,
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn editor(&self) -> RwSignal<NoteEditor> {
        self.editor
    }

    /// Called whenever the routed note id changes.
    pub fn select(&self, note_id: Option<String>) {
        let Some(token) = self.editor.try_update(|e| e.select(note_id)).flatten() else {
            return;
        };

        let read = self.gateway.read_once(&self.uid, &token.note_id);
        let editor = self.editor;
        spawn_local(async move {
            let result = read.await;
            match editor.try_update(|e| e.apply_read(&token, result)) {
                Some(ReadOutcome::Reported(d)) => d.emit(),
                Some(ReadOutcome::Discarded) => {
                    log::debug!("dropped stale read of note {}", token.note_id);
                }
                _ => {}
            }
        });
    }

    pub fn edit_title(&self, title: String) {
        let Some(write) = self
            .editor
            .try_update(|e| e.edit_title(title, (self.clock)()))
            .flatten()
        else {
            return;
        };

        if let Some(on_title_change) = self.on_title_change {
            on_title_change.run(TitleChange {
                id: write.note_id.clone(),
                title: write.note.title.clone(),
            });
        }
        self.save(write);
    }

    pub fn edit_body(&self, body: String) {
        if let Some(write) = self
            .editor
            .try_update(|e| e.edit_body(body, (self.clock)()))
            .flatten()
        {
            self.save(write);
        }
    }

    fn save(&self, write: NoteWrite) {
        let done = save_note(self.gateway.as_ref(), &self.uid, write);
        spawn_local(async move {
            if let Some(d) = done.await {
                d.emit();
            }
        });
    }

    pub fn delete(&self) {
        let Some(note_id) = self.editor.with_untracked(|e| e.begin_delete()) else {
            return;
        };

        let request = self.gateway.delete(&self.uid, &note_id);
        let editor = self.editor;
        let on_deleted = self.on_deleted;
        spawn_local(async move {
            let result = request.await;
            match editor.try_update(|e| e.apply_delete(&note_id, result)) {
                Some(DeleteOutcome::Deleted) => on_deleted.run(()),
                Some(DeleteOutcome::Failed(d)) => d.emit(),
                Some(DeleteOutcome::Discarded) | None => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, RecordingGateway};
    use crate::api::GatewayError;
    use crate::state::NoteViewKind;
    use any_spawner::Executor;
    use futures::executor::block_on;
    use std::sync::{Arc, Mutex};

    fn fixed_clock() -> i64 {
        42
    }

    fn stored(title: &str, body: &str) -> Note {
        Note {
            title: title.to_string(),
            body: body.to_string(),
            last_modified: None,
        }
    }

    /// A controller whose callbacks record into the returned vectors.
    struct Harness {
        _owner: Owner,
        gateway: Arc<RecordingGateway>,
        sync: NoteSyncController,
        titles: Arc<Mutex<Vec<TitleChange>>>,
        deleted: Arc<Mutex<usize>>,
    }

    impl Harness {
        fn new(gateway: RecordingGateway) -> Self {
            let _ = Executor::init_futures_executor();
            let owner = Owner::new();
            owner.set();

            let gateway = Arc::new(gateway);
            let titles = Arc::new(Mutex::new(Vec::new()));
            let deleted = Arc::new(Mutex::new(0));

            let on_title_change = {
                let titles = titles.clone();
                Callback::new(move |change: TitleChange| {
                    titles.lock().expect("titles lock").push(change);
                })
            };
            let on_deleted = {
                let deleted = deleted.clone();
                Callback::new(move |_: ()| *deleted.lock().expect("deleted lock") += 1)
            };
            let shared: SharedGateway = gateway.clone();
            let sync = NoteSyncController::new("uid".to_string(), shared, Some(on_title_change), on_deleted)
                .with_clock(fixed_clock);

            Self {
                _owner: owner,
                gateway,
                sync,
                titles,
                deleted,
            }
        }

        fn open(&self, note_id: &str) {
            self.sync.select(Some(note_id.to_string()));
            Executor::poll_local();
        }

        fn titles(&self) -> Vec<TitleChange> {
            self.titles.lock().expect("titles lock").clone()
        }

        fn deleted(&self) -> usize {
            *self.deleted.lock().expect("deleted lock")
        }

        fn updates(&self) -> Vec<Call> {
            self.gateway
                .calls()
                .into_iter()
                .filter(|c| matches!(c, Call::Update { .. }))
                .collect()
        }
    }

    #[test]
    fn test_new_note_shape() {
        let note = new_note("abc123", 1554907683672);
        assert_eq!(note.title, "untitled");
        assert_eq!(note.body, "abc123");
        assert_eq!(note.last_modified, Some(1554907683672));
    }

    #[test]
    fn test_create_writes_under_new_id_and_routes_immediately() {
        let gateway = RecordingGateway::default();
        let (path, done) = create_note(&gateway, "uid", "abc123", 7);

        assert_eq!(path, "/abc123");
        assert_eq!(
            gateway.calls(),
            vec![Call::Create {
                uid: "uid".to_string(),
                note_id: "abc123".to_string(),
                note: new_note("abc123", 7),
            }]
        );
        assert_eq!(block_on(done), None);
    }

    #[test]
    fn test_failed_create_is_reported() {
        let err = GatewayError::Network("offline".to_string());
        let gateway = RecordingGateway::failing_writes(err.clone());
        let (path, done) = create_note(&gateway, "uid", "abc123", 7);

        assert_eq!(path, "/abc123");
        assert_eq!(
            block_on(done),
            Some(Diagnostic::CreateFailed {
                note_id: "abc123".to_string(),
                error: err,
            })
        );
    }

    #[test]
    fn test_save_writes_full_note() {
        let gateway = RecordingGateway::default();
        let note = Note {
            title: "new title".to_string(),
            body: "body".to_string(),
            last_modified: Some(9),
        };
        let write = NoteWrite {
            note_id: "noteId".to_string(),
            note: note.clone(),
        };

        assert_eq!(block_on(save_note(&gateway, "uid", write)), None);
        assert_eq!(
            gateway.calls(),
            vec![Call::Update {
                uid: "uid".to_string(),
                note_id: "noteId".to_string(),
                note,
            }]
        );
    }

    #[test]
    fn test_failed_save_is_reported() {
        let err = GatewayError::Http {
            status: 401,
            body: "Permission denied".to_string(),
        };
        let gateway = RecordingGateway::failing_writes(err.clone());
        let write = NoteWrite {
            note_id: "noteId".to_string(),
            note: Note::default(),
        };
        let d = block_on(save_note(&gateway, "uid", write)).expect("should report");
        assert_eq!(
            d,
            Diagnostic::UpdateFailed {
                note_id: "noteId".to_string(),
                error: err,
            }
        );
        assert!(d.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_editor_read_and_edit_through_gateway() {
        let stored = Note {
            title: "title".to_string(),
            body: "body".to_string(),
            last_modified: None,
        };
        let gateway = RecordingGateway::reading(Ok(Some(stored)));
        let mut editor = NoteEditor::new();

        let token = editor.select(Some("noteId".to_string())).expect("read issued");
        let result = block_on(gateway.read_once("uid", &token.note_id));
        assert_eq!(editor.apply_read(&token, result), ReadOutcome::Applied);

        let write = editor
            .edit_title("new title".to_string(), 5)
            .expect("loaded note is editable");
        assert_eq!(block_on(save_note(&gateway, "uid", write)), None);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            Call::ReadOnce {
                uid: "uid".to_string(),
                note_id: "noteId".to_string(),
            }
        );
        let Call::Update { note, .. } = &calls[1] else {
            panic!("expected an update, got {:?}", calls[1]);
        };
        assert_eq!(note.title, "new title");
        assert_eq!(note.body, "body");
    }

    #[test]
    fn test_editor_delete_through_gateway() {
        let stored = Note {
            title: "t".to_string(),
            body: "b".to_string(),
            last_modified: None,
        };
        let gateway = RecordingGateway::reading(Ok(Some(stored)));
        let mut editor = NoteEditor::new();
        let token = editor.select(Some("abc123".to_string())).expect("read issued");
        editor.apply_read(&token, block_on(gateway.read_once("uid", "abc123")));

        let note_id = editor.begin_delete().expect("deletable");
        let result = block_on(gateway.delete("uid", &note_id));
        assert_eq!(editor.apply_delete(&note_id, result), DeleteOutcome::Deleted);
        assert_eq!(
            gateway.calls().last(),
            Some(&Call::Delete {
                uid: "uid".to_string(),
                note_id: "abc123".to_string(),
            })
        );
    }

    #[test]
    fn test_title_edit_is_forwarded_once_with_its_write() {
        let h = Harness::new(RecordingGateway::with_notes([("n1", stored("old", "body"))]));
        h.open("n1");

        h.sync.edit_title("new".to_string());
        Executor::poll_local();

        assert_eq!(
            h.titles(),
            vec![TitleChange {
                id: "n1".to_string(),
                title: "new".to_string(),
            }]
        );
        assert_eq!(
            h.updates(),
            vec![Call::Update {
                uid: "uid".to_string(),
                note_id: "n1".to_string(),
                note: Note {
                    title: "new".to_string(),
                    body: "body".to_string(),
                    last_modified: Some(42),
                },
            }]
        );
    }

    #[test]
    fn test_body_edit_writes_without_forwarding_a_title() {
        let h = Harness::new(RecordingGateway::with_notes([("n1", stored("t", "old"))]));
        h.open("n1");

        h.sync.edit_body("new body".to_string());
        Executor::poll_local();

        assert!(h.titles().is_empty());
        assert_eq!(h.updates().len(), 1);
        assert_eq!(h.sync.editor().with_untracked(|e| e.view().body().to_string()), "new body");
    }

    #[test]
    fn test_edits_before_load_are_neither_forwarded_nor_written() {
        let h = Harness::new(RecordingGateway::with_notes([("n1", stored("t", "b"))]));
        // Read issued but not yet resolved.
        h.sync.select(Some("n1".to_string()));

        h.sync.edit_title("early".to_string());
        h.sync.edit_body("early".to_string());
        Executor::poll_local();

        assert!(h.titles().is_empty());
        assert!(h.updates().is_empty());
        assert_eq!(h.sync.editor().with_untracked(|e| e.view().title().to_string()), "t");
    }

    #[test]
    fn test_edits_to_missing_note_are_dropped() {
        let h = Harness::new(RecordingGateway::default());
        h.open("gone");

        h.sync.edit_title("x".to_string());
        Executor::poll_local();

        assert_eq!(h.sync.editor().with_untracked(|e| e.view().kind()), NoteViewKind::Missing);
        assert!(h.titles().is_empty());
        assert!(h.updates().is_empty());
    }

    #[test]
    fn test_successful_delete_notifies_once() {
        let h = Harness::new(RecordingGateway::with_notes([("n1", stored("t", "b"))]));
        h.open("n1");

        h.sync.delete();
        Executor::poll_local();

        assert_eq!(h.deleted(), 1);
        assert_eq!(
            h.gateway.calls().last(),
            Some(&Call::Delete {
                uid: "uid".to_string(),
                note_id: "n1".to_string(),
            })
        );
    }

    #[test]
    fn test_failed_delete_does_not_notify() {
        let mut gateway = RecordingGateway::with_notes([("n1", stored("t", "b"))]);
        gateway.write_error = Some(GatewayError::Network("offline".to_string()));
        let h = Harness::new(gateway);
        h.open("n1");

        h.sync.delete();
        Executor::poll_local();

        assert_eq!(h.deleted(), 0);
        assert_eq!(h.sync.editor().with_untracked(|e| e.view().kind()), NoteViewKind::Loaded);
    }

    #[test]
    fn test_delete_finishing_after_navigation_does_not_notify() {
        let h = Harness::new(RecordingGateway::with_notes([
            ("n1", stored("one", "b")),
            ("n2", stored("two", "b")),
        ]));
        h.open("n1");

        h.sync.delete();
        h.open("n2");

        assert_eq!(h.deleted(), 0);
        assert_eq!(h.sync.editor().with_untracked(|e| e.view().title().to_string()), "two");
    }

    #[test]
    fn test_stale_read_is_dropped() {
        let h = Harness::new(RecordingGateway::with_notes([
            ("a", stored("note a", "body a")),
            ("b", stored("note b", "body b")),
        ]));

        h.sync.select(Some("a".to_string()));
        h.sync.select(Some("b".to_string()));
        Executor::poll_local();

        let (note_id, title) = h
            .sync
            .editor()
            .with_untracked(|e| (e.note_id().map(str::to_string), e.view().title().to_string()));
        assert_eq!(note_id.as_deref(), Some("b"));
        assert_eq!(title, "note b");

        let reads = h
            .gateway
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::ReadOnce { .. }))
            .count();
        assert_eq!(reads, 2);
    }
}
