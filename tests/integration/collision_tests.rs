use mirrorclean::dedup::{DedupConfig, Deduplicator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_same_named_duplicates_get_numbered() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    for i in 0..5 {
        write(&source, &format!("d{i}/photo.jpg"), b"same picture");
    }

    let summary = Deduplicator::new(DedupConfig::new(&backup))
        .run(&source)
        .unwrap();

    assert_eq!(summary.result(), (4, 0));
    assert!(source.join("d0/photo.jpg").exists());
    assert_eq!(
        names_in(&backup),
        vec!["photo.jpg", "photo_1.jpg", "photo_2.jpg", "photo_3.jpg"]
    );
}

#[test]
fn test_existing_backup_files_are_never_overwritten() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&backup, "notes.txt", b"from an earlier run");
    write(&backup, "notes_1.txt", b"also earlier");
    write(&source, "a/notes.txt", b"today");
    write(&source, "b/notes.txt", b"today");

    let summary = Deduplicator::new(DedupConfig::new(&backup))
        .run(&source)
        .unwrap();

    assert_eq!(summary.result(), (1, 0));
    assert_eq!(fs::read(backup.join("notes.txt")).unwrap(), b"from an earlier run");
    assert_eq!(fs::read(backup.join("notes_1.txt")).unwrap(), b"also earlier");
    assert_eq!(fs::read(backup.join("notes_2.txt")).unwrap(), b"today");
}

#[test]
fn test_files_without_extension_are_numbered() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&source, "a/README", b"readme");
    write(&source, "b/README", b"readme");
    write(&source, "c/README", b"readme");

    Deduplicator::new(DedupConfig::new(&backup))
        .run(&source)
        .unwrap();

    assert_eq!(names_in(&backup), vec!["README", "README_1"]);
}

#[test]
fn test_preserve_structure_collision_is_numbered_in_place() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("B");
    write(&backup, "sub/copy.txt", b"left from before");
    write(&source, "keep.txt", b"data");
    write(&source, "sub/copy.txt", b"data");

    let summary = Deduplicator::new(DedupConfig::new(&backup).with_preserve_structure(true))
        .run(&source)
        .unwrap();

    assert_eq!(summary.result(), (1, 0));
    assert_eq!(names_in(&backup.join("sub")), vec!["copy.txt", "copy_1.txt"]);
    assert_eq!(
        fs::read(backup.join("sub/copy.txt")).unwrap(),
        b"left from before"
    );
    assert_eq!(fs::read(backup.join("sub/copy_1.txt")).unwrap(), b"data");
}
