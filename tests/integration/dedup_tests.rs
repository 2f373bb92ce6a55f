use mirrorclean::dedup::{run_dedup, DedupConfig, Deduplicator, RunState};
use mirrorclean::scanner::{HashAlgorithm, Hasher, WalkerConfig};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Relative path → content for every regular file under `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn visit(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        if !dir.exists() {
            return;
        }
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    visit(root, root, &mut out);
    out
}

fn digests(files: &BTreeMap<PathBuf, Vec<u8>>) -> Vec<String> {
    let hasher = Hasher::new(HashAlgorithm::Sha256);
    let mut all: Vec<_> = files
        .values()
        .map(|c| hasher.digest_bytes(c).to_hex())
        .collect();
    all.sort();
    all
}

#[test]
fn test_abc_scenario_flat() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&source, "A.txt", b"x");
    write(&source, "B.txt", b"x");
    write(&source, "C.txt", b"y");

    let result = run_dedup(&source, &backup, HashAlgorithm::Md5, false, None, None).unwrap();

    assert_eq!(result, (1, 0));
    let remaining: Vec<_> = snapshot(&source).into_keys().collect();
    assert_eq!(remaining, vec![PathBuf::from("A.txt"), PathBuf::from("C.txt")]);
    assert_eq!(fs::read(backup.join("B.txt")).unwrap(), b"x");
}

#[test]
fn test_abc_scenario_every_algorithm() {
    for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("S");
        write(&source, "A.txt", b"x");
        write(&source, "B.txt", b"x");
        write(&source, "C.txt", b"y");

        let result = run_dedup(
            &source,
            &temp.path().join("B"),
            algorithm,
            false,
            None,
            None,
        )
        .unwrap();
        assert_eq!(result, (1, 0), "algorithm {algorithm}");
    }
}

#[test]
fn test_second_run_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&source, "a/1.bin", b"one");
    write(&source, "a/2.bin", b"two");
    write(&source, "b/1.bin", b"one");
    write(&source, "b/c/3.bin", b"two");
    write(&source, "d.bin", b"one");

    let engine = Deduplicator::new(DedupConfig::new(&backup));
    let first = engine.run(&source).unwrap();
    assert_eq!(first.result(), (3, 0));

    let source_after_first = snapshot(&source);
    let backup_after_first = snapshot(&backup);

    let second = engine.run(&source).unwrap();
    assert_eq!(second.result(), (0, 0));
    assert_eq!(snapshot(&source), source_after_first);
    assert_eq!(snapshot(&backup), backup_after_first);
}

#[test]
fn test_no_content_is_lost() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    let contents: [&[u8]; 4] = [b"alpha", b"beta", b"", b"alpha"];
    for i in 0..12 {
        write(
            &source,
            &format!("dir{}/file{}.dat", i % 3, i),
            contents[i % contents.len()],
        );
    }

    let before = snapshot(&source);
    let distinct_before: BTreeSet<_> = digests(&before).into_iter().collect();

    let summary = Deduplicator::new(DedupConfig::new(&backup))
        .run(&source)
        .unwrap();
    assert_eq!(summary.counters.skipped, 0);

    let after_source = snapshot(&source);
    let after_backup = snapshot(&backup);

    // Every original byte string still exists exactly as often as before.
    let mut after_all = digests(&after_source);
    after_all.extend(digests(&after_backup));
    after_all.sort();
    assert_eq!(after_all, digests(&before));

    // The source keeps exactly one copy per distinct content.
    let source_digests = digests(&after_source);
    let distinct_after: BTreeSet<_> = source_digests.iter().cloned().collect();
    assert_eq!(distinct_after, distinct_before);
    assert_eq!(source_digests.len(), distinct_before.len());
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let first = write(&source, "a.empty", b"");
    let second = write(&source, "b.empty", b"");

    let summary = Deduplicator::new(DedupConfig::new(temp.path().join("B")))
        .run(&source)
        .unwrap();

    assert_eq!(summary.result(), (1, 0));
    assert!(first.exists());
    assert!(!second.exists());
    assert_eq!(summary.counters.bytes_relocated, 0);
}

#[test]
fn test_first_seen_follows_sorted_walk_order() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let z = write(&source, "z.txt", b"same");
    let nested = write(&source, "m/inner.txt", b"same");
    let a = write(&source, "a.txt", b"same");

    Deduplicator::new(DedupConfig::new(temp.path().join("B")))
        .run(&source)
        .unwrap();

    assert!(a.exists());
    assert!(!nested.exists());
    assert!(!z.exists());
}

#[test]
fn test_preserve_structure_mirrors_layout() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&source, "2023/img.jpg", b"pixels");
    write(&source, "2024/jan/img.jpg", b"pixels");
    write(&source, "2024/feb/copy.jpg", b"pixels");

    let summary = Deduplicator::new(DedupConfig::new(&backup).with_preserve_structure(true))
        .run(&source)
        .unwrap();

    assert_eq!(summary.result(), (2, 0));
    let backed_up: Vec<_> = snapshot(&backup).into_keys().collect();
    assert_eq!(
        backed_up,
        vec![
            PathBuf::from("2024/feb/copy.jpg"),
            PathBuf::from("2024/jan/img.jpg"),
        ]
    );
}

#[test]
fn test_backup_and_log_dirs_inside_source_are_skipped() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().to_path_buf();
    let backup = source.join("backup_duplicates");
    let logs = source.join("logs");
    let original = write(&source, "doc.txt", b"text");
    let old_backup = write(&backup, "doc.txt", b"text");
    let old_log = write(&logs, "doc.txt", b"text");

    let config = DedupConfig::new(&backup)
        .with_walker_config(WalkerConfig::default().with_excluded_dir(&logs));
    let summary = Deduplicator::new(config).run(&source).unwrap();

    assert_eq!(summary.counters.total, 1);
    assert_eq!(summary.result(), (0, 0));
    assert!(original.exists());
    assert!(old_backup.exists());
    assert!(old_log.exists());
}

#[test]
fn test_walker_options_flow_through() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let kept = write(&source, "keep.txt", b"same");
    let hidden = write(&source, ".hidden.txt", b"same");
    let ignored = write(&source, "scratch.tmp", b"same");

    let walker_config = WalkerConfig {
        skip_hidden: true,
        ignore_patterns: vec!["*.tmp".to_string()],
        ..WalkerConfig::default()
    };
    let summary = Deduplicator::new(
        DedupConfig::new(temp.path().join("B")).with_walker_config(walker_config),
    )
    .run(&source)
    .unwrap();

    assert_eq!(summary.counters.total, 1);
    assert_eq!(summary.state, RunState::Completed);
    assert!(kept.exists() && hidden.exists() && ignored.exists());
}

#[test]
fn test_empty_source_creates_no_backup_dir() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    fs::create_dir(&source).unwrap();
    let backup = temp.path().join("B");

    let result = run_dedup(&source, &backup, HashAlgorithm::Sha256, true, None, None).unwrap();

    assert_eq!(result, (0, 0));
    assert!(!backup.exists());
}

#[test]
fn test_copies_keep_modification_time() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&source, "a.txt", b"same");
    let dup = write(&source, "b.txt", b"same");
    let mtime = filetime::FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_mtime(&dup, mtime).unwrap();

    Deduplicator::new(DedupConfig::new(&backup))
        .run(&source)
        .unwrap();

    let meta = fs::metadata(backup.join("b.txt")).unwrap();
    assert_eq!(filetime::FileTime::from_last_modification_time(&meta), mtime);
}
