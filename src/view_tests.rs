use super::*;
use crate::entry::{MessageCounts, NamedQuery, SAVED_SECTION, STARTUP_SECTION};
use crate::persistence::SavedSearchFile;
use crate::testing::{RecordingOpener, ScriptedBackend};
use std::fs;
use std::thread;
use tempfile::{tempdir, TempDir};

struct Fixture {
    list: SavedSearches,
    backend: Arc<ScriptedBackend>,
    path: PathBuf,
    _dir: TempDir,
}

fn fixture(document: Option<&str>, background_workers: Option<usize>) -> Fixture {
    fixture_with(ScriptedBackend::new(), document, background_workers)
}

fn fixture_with(
    backend: ScriptedBackend,
    document: Option<&str>,
    background_workers: Option<usize>,
) -> Fixture {
    let dir = tempdir().unwrap();
    let path = dir.path().join("searches.json");
    if let Some(content) = document {
        fs::write(&path, content).unwrap();
    }
    let backend = Arc::new(backend);
    let list = SavedSearches::new(
        Arc::new(vec![NamedQuery::new("inbox", "tag:inbox")]),
        path.clone(),
        CountClient::new(backend.clone(), Vec::new()),
        Viewport::default(),
        background_workers,
    );
    Fixture {
        list,
        backend,
        path,
        _dir: dir,
    }
}

fn names(list: &SavedSearches) -> Vec<String> {
    list.store().iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn test_initial_load_selects_first_query() {
    let f = fixture(Some(r#"{"none": "tag:todo"}"#), None);
    assert_eq!(
        names(&f.list),
        vec![STARTUP_SECTION, "inbox", SAVED_SECTION, ""]
    );
    assert_eq!(f.list.selected(), Some(1));
    assert_eq!(f.list.reload_count(), 1);
    assert_eq!(f.list.count_mode(), CountMode::Inline);
}

#[test]
fn test_save_query_on_empty_document_reloads_once() {
    let mut f = fixture(None, None);

    f.list.save_query("tag:later").unwrap();

    let doc = SavedSearchFile::new(&f.path).load().unwrap();
    let entries: Vec<_> = doc.iter().cloned().collect();
    assert_eq!(entries, vec![NamedQuery::new("none", "tag:later")]);

    assert!(f.list.process_pending_reload());
    assert!(!f.list.process_pending_reload());
    assert_eq!(f.list.reload_count(), 2);
    assert_eq!(f.list.store().at(3).and_then(|e| e.query_str()), Some("tag:later"));
}

#[test]
fn test_many_triggers_from_threads_rebuild_once() {
    let mut f = fixture(None, None);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let signal = f.list.reload_signal();
            thread::spawn(move || {
                for _ in 0..100 {
                    signal.trigger();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(f.list.process_pending_reload());
    assert!(!f.list.process_pending_reload());
    assert_eq!(f.list.reload_count(), 2);
}

#[test]
fn test_no_trigger_means_no_rebuild() {
    let mut f = fixture(None, None);
    assert!(!f.list.process_pending_reload());
    assert_eq!(f.list.reload_count(), 1);
}

#[test]
fn test_activate_separator_and_query() {
    let f = fixture(Some(r#"{"work": "tag:work"}"#), None);
    let mut opener = RecordingOpener::default();

    let err = f.list.activate_at(2, &mut opener).unwrap_err();
    assert!(matches!(err, SearchListError::InvalidSelection { position: 2 }));
    assert!(opener.opened.is_empty());

    f.list.activate_at(3, &mut opener).unwrap();
    assert_eq!(
        opener.opened,
        vec![("work".to_string(), "tag:work".to_string())]
    );
}

#[test]
fn test_activate_selected_opens_selection() {
    let mut f = fixture(Some(r#"{"work": "tag:work"}"#), None);
    let mut opener = RecordingOpener::default();

    f.list.move_down();
    assert_eq!(f.list.selected(), Some(3));
    f.list.activate_selected(&mut opener).unwrap();

    assert_eq!(opener.opened[0].1, "tag:work");
}

#[test]
fn test_reload_keeps_selection() {
    let mut f = fixture(Some(r#"{"a": "tag:a", "b": "tag:b"}"#), None);
    f.list.end();
    assert_eq!(f.list.selected(), Some(4));

    f.list.reload_signal().trigger();
    f.list.process_pending_reload();

    assert_eq!(f.list.selected(), Some(4));
}

#[test]
fn test_reload_clamps_selection_when_rows_disappear() {
    let mut f = fixture(Some(r#"{"a": "tag:a", "b": "tag:b"}"#), None);
    f.list.end();
    assert_eq!(f.list.selected(), Some(4));

    fs::write(&f.path, "{}").unwrap();
    f.list.reload();

    // Row 2 is now the trailing header; the cursor snaps back onto inbox
    assert_eq!(f.list.store().len(), 3);
    assert_eq!(f.list.selected(), Some(1));
}

#[test]
fn test_select_rejects_headers() {
    let mut f = fixture(Some(r#"{"a": "tag:a"}"#), None);
    assert!(f.list.select(2).is_err());
    assert_eq!(f.list.selected(), Some(1));
    f.list.select(3).unwrap();
    assert_eq!(f.list.selected_entry().map(|e| e.name()), Some("a"));
}

#[test]
fn test_malformed_document_keeps_startup_rows() {
    let mut f = fixture(Some("[1, 2"), None);
    assert_eq!(names(&f.list), vec![STARTUP_SECTION, "inbox", SAVED_SECTION]);
    assert!(f.list.last_summary().persistence_error.is_some());

    // Appending must not clobber the unreadable file
    assert!(f.list.save_query("tag:x").is_err());
    assert_eq!(fs::read_to_string(&f.path).unwrap(), "[1, 2");
    assert!(!f.list.process_pending_reload());
}

#[test]
fn test_refresh_counts_keeps_rows() {
    let mut f = fixture(Some(r#"{"none": "tag:todo"}"#), None);
    let before = f.backend.call_count();
    let rows = names(&f.list);

    f.list.refresh_counts();

    assert_eq!(names(&f.list), rows);
    assert_eq!(f.backend.call_count(), before + 4);
    assert_eq!(f.list.reload_count(), 1);
}

#[test]
fn test_background_counts_arrive() {
    let backend = ScriptedBackend::new()
        .with_count("tag:inbox", 9)
        .with_count("(tag:inbox) AND tag:unread", 4)
        .with_failure("(");
    let mut f = fixture_with(backend, Some(r#"{"broken": "("}"#), Some(2));
    assert_eq!(f.list.count_mode(), CountMode::Deferred);

    f.list.settle_counts(Duration::from_secs(5));

    assert_eq!(f.list.pending_counts(), 0);
    assert_eq!(
        f.list.store().at(1).and_then(|e| e.counts()),
        Some(Counts::Ready(MessageCounts { total: 9, unread: 4 }))
    );
    assert_eq!(
        f.list.store().at(3).and_then(|e| e.counts()),
        Some(Counts::Unavailable)
    );
}

#[test]
fn test_reload_drops_counts_queued_for_old_rows() {
    let document: String = format!(
        "{{{}}}",
        (0..20)
            .map(|i| format!("\"s{}\": \"tag:s{}\"", i, i))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let backend = ScriptedBackend::new().with_delay(Duration::from_millis(20));
    let mut f = fixture_with(backend, Some(&document), Some(1));

    f.list.reload();
    f.list.settle_counts(Duration::from_secs(10));

    assert_eq!(f.list.pending_counts(), 0);
    // 21 rows counted once, plus whatever the first generation had started
    assert!(
        f.backend.call_count() < 2 * 21 + 10,
        "ran {} calls",
        f.backend.call_count()
    );
}

#[test]
fn test_stale_count_result_is_discarded() {
    let f = fixture(Some(r#"{"none": "tag:todo"}"#), None);
    let mut store = f.list.store().clone();
    let current = store.generation();
    let counts = Counts::Ready(MessageCounts { total: 1, unread: 1 });

    let stale = CountResult {
        generation: current.wrapping_sub(1),
        position: 3,
        query: "tag:todo".to_string(),
        counts,
    };
    assert!(!apply_count_result(&mut store, &stale));

    let moved = CountResult {
        generation: current,
        position: 1,
        query: "tag:todo".to_string(),
        counts,
    };
    assert!(!apply_count_result(&mut store, &moved));

    let fresh = CountResult {
        generation: current,
        position: 3,
        query: "tag:todo".to_string(),
        counts,
    };
    assert!(apply_count_result(&mut store, &fresh));
    assert_eq!(store.at(3).and_then(|e| e.counts()), Some(counts));
}

#[test]
fn test_from_config_uses_configured_file_and_queries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mine.json");
    fs::write(&path, r#"{"none": "tag:mine"}"#).unwrap();
    let config: Config = serde_json::from_value(serde_json::json!({
        "startup": { "queries": { "flagged": "tag:flagged" } },
        "searchesFile": path.to_string_lossy(),
        "pageStep": 3
    }))
    .unwrap();

    let list = SavedSearches::from_config(&config, Arc::new(ScriptedBackend::new()));

    assert_eq!(
        names(&list),
        vec![STARTUP_SECTION, "flagged", SAVED_SECTION, ""]
    );
    assert_eq!(list.viewport().step, 3);
}
