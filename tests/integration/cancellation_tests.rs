use mirrorclean::dedup::{DedupConfig, Deduplicator, RunState};
use mirrorclean::events::{DedupEvent, EventSink, RecordLevel};
use mirrorclean::signal::CancelToken;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records events and cancels the run once `at` files are processed.
struct CancelAt {
    token: CancelToken,
    at: u64,
    events: Mutex<Vec<DedupEvent>>,
}

impl EventSink for CancelAt {
    fn emit(&self, event: DedupEvent) {
        if matches!(event, DedupEvent::Progress { processed, .. } if processed == self.at) {
            self.token.cancel();
        }
        self.events.lock().unwrap().push(event);
    }
}

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Ten files, all with the same content.
fn identical_files(root: &Path) -> Vec<PathBuf> {
    (0..10)
        .map(|i| write(root, &format!("f{i:02}.txt"), b"same"))
        .collect()
}

#[test]
fn test_cancel_after_k_files() {
    for k in [1u64, 3, 9] {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("S");
        let files = identical_files(&source);

        let token = CancelToken::new();
        let sink = Arc::new(CancelAt {
            token: token.clone(),
            at: k,
            events: Mutex::new(Vec::new()),
        });
        let config = DedupConfig::new(temp.path().join("B"))
            .with_cancel_token(token)
            .with_events(sink.clone());

        let summary = Deduplicator::new(config).run(&source).unwrap();

        assert_eq!(summary.state, RunState::Cancelled);
        assert_eq!(summary.counters.processed, k);
        assert_eq!(summary.counters.total, 10);
        // The first file is kept; each later one up to k was moved.
        assert_eq!(summary.result(), (k - 1, 0));

        for (i, path) in files.iter().enumerate() {
            let untouched = i == 0 || i as u64 >= k;
            assert_eq!(path.exists(), untouched, "k={k} file {i}");
        }

        let events = sink.events.lock().unwrap();
        let progress = events
            .iter()
            .filter(|e| matches!(e, DedupEvent::Progress { .. }))
            .count() as u64;
        assert_eq!(progress, k);
        assert!(events.iter().any(|e| matches!(
            e,
            DedupEvent::Log(r)
                if r.level == RecordLevel::Warning && r.message == "Process cancelled by user."
        )));
    }
}

#[test]
fn test_cancelled_token_can_be_reset_for_the_next_run() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    identical_files(&source);

    let token = CancelToken::new();
    token.cancel();
    let config = DedupConfig::new(temp.path().join("B")).with_cancel_token(token.clone());
    let engine = Deduplicator::new(config);

    let first = engine.run(&source).unwrap();
    assert_eq!(first.state, RunState::Cancelled);
    assert_eq!(first.result(), (0, 0));

    token.reset();
    let second = engine.run(&source).unwrap();
    assert_eq!(second.state, RunState::Completed);
    assert_eq!(second.result(), (9, 0));
}
