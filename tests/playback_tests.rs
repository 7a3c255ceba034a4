// Integration tests for trace playback over a saved tracer response

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use tempfile::NamedTempFile;
use traceds::diff::StepView;
use traceds::playback::PlaybackState;
use traceds::session::{
    FileTracer, LoadOutcome, SessionError, TraceResponse, TraceSession, Tracer, TracerError,
};

/// Answers each call from the next saved response, repeating the last one
struct SequenceTracer {
    replies: Vec<FileTracer>,
    calls: Mutex<usize>,
}

impl SequenceTracer {
    fn new(replies: Vec<FileTracer>) -> Self {
        SequenceTracer {
            replies,
            calls: Mutex::new(0),
        }
    }
}

impl Tracer for SequenceTracer {
    fn trace(&self, source: &str) -> Result<TraceResponse, TracerError> {
        let mut calls = self.calls.lock().unwrap();
        let reply = &self.replies[(*calls).min(self.replies.len() - 1)];
        *calls += 1;
        reply.trace(source)
    }
}

/// Five steps of a small program touching an array, a linked list and a BST
fn sample_trace() -> serde_json::Value {
    json!({
        "complexity": "O(n)",
        "frames": [
            {
                "line_no": 1,
                "lists": { "arr": [5] },
                "linked": { "head": [1] },
                "trees": { "root": { "id": 1, "val": 50 } }
            },
            {
                "line_no": 2,
                "lists": { "arr": [5, 3] },
                "array_indices": { "arr": [["i", 1]] },
                "trees": { "root": { "id": 1, "val": 50, "left": { "id": 2, "val": 30 } } }
            },
            {
                "line_no": 3,
                "prims": { "x": 7 }
            },
            {
                "line_no": 4,
                "linked": { "head": [1, 2], "self": [1, 2] },
                "trees": {
                    "root": { "id": 1, "val": 50, "left": { "id": 2, "val": 30 } },
                    "node": { "id": 9, "val": 99 }
                }
            },
            {
                "line_no": 5,
                "trees": {
                    "root": {
                        "id": 1, "val": 50,
                        "left": { "id": 2, "val": 30 },
                        "right": { "id": 9, "val": 99 }
                    },
                    "node": { "id": 9, "val": 99 }
                }
            }
        ]
    })
}

fn write_response(body: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{}", body).expect("write response");
    file
}

fn loaded_session(file: &NamedTempFile) -> TraceSession {
    let mut session = TraceSession::new(Arc::new(FileTracer::new(file.path())));
    assert_eq!(
        session.load_trace_blocking("# traced program"),
        LoadOutcome::Loaded { frames: 5 }
    );
    session
}

fn view_at(session: &mut TraceSession, index: usize) -> StepView {
    session.seek(index);
    session.current_view().expect("view for a loaded trace")
}

#[test]
fn test_seek_matches_stepping() {
    let file = write_response(&sample_trace());

    let mut jumped = loaded_session(&file);
    let jumped_view = view_at(&mut jumped, 4);

    let mut stepped = loaded_session(&file);
    let mut stepped_view = stepped.current_view().unwrap();
    for _ in 1..=4 {
        stepped.step(1);
        stepped_view = stepped.current_view().unwrap();
    }

    assert_eq!(jumped_view, stepped_view);
    assert_eq!(jumped.cache(), stepped.cache());
}

#[test]
fn test_array_growth_and_pointer_labels() {
    let file = write_response(&sample_trace());
    let mut session = loaded_session(&file);

    let first = view_at(&mut session, 0);
    assert_eq!(first.array_entries[0].highlight_index, None);

    let grown = view_at(&mut session, 1);
    let arr = &grown.array_entries[0];
    assert_eq!(arr.values, vec![json!(5), json!(3)]);
    assert_eq!(arr.highlight_index, Some(1));
    assert_eq!(arr.labels_at(1).as_deref(), Some("i"));
    assert_eq!(grown.tree_highlight_ids, vec![2]);
}

#[test]
fn test_omitted_structures_carry_forward() {
    let file = write_response(&sample_trace());
    let mut session = loaded_session(&file);
    let view = view_at(&mut session, 2);

    assert_eq!(view.line_number, Some(3));
    assert_eq!(view.primitives.get("x"), Some(&json!(7)));

    // No arrays in the frame: last known arrays, without a highlight
    assert_eq!(view.array_entries.len(), 1);
    assert_eq!(view.array_entries[0].values, vec![json!(5), json!(3)]);
    assert_eq!(view.array_entries[0].highlight_index, None);

    assert_eq!(view.linked_list_entries[0].values, vec![json!(1)]);
    assert_eq!(view.main_tree.as_ref().map(|t| t.node_count()), Some(2));
    assert!(view.tree_highlight_ids.is_empty());
}

#[test]
fn test_detached_node_and_self_alias() {
    let file = write_response(&sample_trace());
    let mut session = loaded_session(&file);

    let view = view_at(&mut session, 3);
    let detached: Vec<&str> = view.detached_trees.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(detached, vec!["node"]);

    let lists: Vec<&str> = view
        .linked_list_entries
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(lists, vec!["head"]);
    assert_eq!(view.linked_list_entries[0].highlight_index, Some(1));

    // Linked into the tree: highlighted there, no longer detached
    let linked = view_at(&mut session, 4);
    assert!(linked.detached_trees.is_empty());
    assert_eq!(linked.tree_highlight_ids, vec![9]);
}

#[test]
fn test_seeking_back_keeps_cache() {
    let file = write_response(&sample_trace());
    let mut session = loaded_session(&file);

    view_at(&mut session, 4);
    let back = view_at(&mut session, 2);
    assert_eq!(back.index, 2);
    assert_eq!(back.linked_list_entries[0].values, vec![json!(1), json!(2)]);
}

#[test]
fn test_failed_rerun_resets_loaded_session() {
    let good = write_response(&sample_trace());
    let bad = write_response(&json!({ "error": "NameError: name 'y' is not defined", "line": 3 }));

    let tracer = Arc::new(SequenceTracer::new(vec![
        FileTracer::new(good.path()),
        FileTracer::new(bad.path()),
    ]));
    let mut session = TraceSession::new(tracer);
    assert_eq!(
        session.load_trace_blocking("# traced program"),
        LoadOutcome::Loaded { frames: 5 }
    );
    view_at(&mut session, 4);
    session.play(Instant::now());
    assert!(!session.cache().is_empty());

    assert!(session.rerun());
    let outcome = session.wait(Duration::from_secs(5));
    assert_eq!(
        outcome,
        Some(LoadOutcome::Failed(SessionError {
            message: "NameError: name 'y' is not defined".to_string(),
            line: Some(3),
        }))
    );
    assert!(session.trace().is_empty());
    assert!(session.cache().is_empty());
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.state(), PlaybackState::Stopped);
    assert!(session.current_view().is_none());
    assert_eq!(session.last_error().and_then(|e| e.line), Some(3));
}

#[test]
fn test_missing_response_file_is_unreachable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut session = TraceSession::new(Arc::new(FileTracer::new(dir.path().join("none.json"))));

    match session.load_trace_blocking("x = 1") {
        LoadOutcome::Failed(err) => assert_eq!(err.line, None),
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(session.last_error().is_some());
}

#[test]
fn test_background_load_then_play() {
    let file = write_response(&sample_trace());
    let mut session = TraceSession::new(Arc::new(FileTracer::new(file.path())));
    session.load_trace("# traced program");
    assert_eq!(
        session.wait(Duration::from_secs(5)),
        Some(LoadOutcome::Loaded { frames: 5 })
    );
    assert_eq!(session.complexity(), Some("O(n)"));

    let start = Instant::now();
    session.play(start);
    assert!(!session.tick(start + Duration::from_millis(999)));
    assert!(session.tick(start + Duration::from_secs(1)));
    assert_eq!(session.current_index(), 1);

    // Doubling the speed re-arms the next tick half a second out
    let now = start + Duration::from_secs(1);
    session.set_speed(2.0, now).unwrap();
    assert!(!session.tick(now + Duration::from_millis(499)));
    assert!(session.tick(now + Duration::from_millis(500)));
    assert_eq!(session.current_index(), 2);

    session.seek_end();
    assert!(!session.tick(now + Duration::from_secs(10)));
    assert_eq!(session.state(), PlaybackState::Playing);
}
