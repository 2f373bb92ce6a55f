use clap::Parser;
use mirrorclean::cli::Cli;
use mirrorclean::error::ExitCode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Run `mirrorclean clean <source> <extra...>` with an empty config file.
fn clean(temp: &TempDir, source: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let config = temp.path().join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut argv: Vec<String> = vec![
        "mirrorclean".into(),
        "-q".into(),
        "clean".into(),
        source.display().to_string(),
        "--no-progress".into(),
        "--config".into(),
        config.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| (*s).to_string()));
    mirrorclean::run_app(Cli::try_parse_from(argv).unwrap())
}

fn log_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[test]
fn test_clean_with_duplicates_succeeds_and_writes_log() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    write(&source, "A.txt", b"x");
    write(&source, "B.txt", b"x");
    write(&source, "C.txt", b"y");

    let code = clean(&temp, &source, &[]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let canonical = source.canonicalize().unwrap();
    assert!(canonical.join("backup_duplicates/B.txt").exists());
    assert!(!canonical.join("B.txt").exists());

    let logs = log_files(&canonical.join("logs"));
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("duplicate_deletion_") && name.ends_with(".log"));

    let content = fs::read_to_string(&logs[0]).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" [INFO]: Duplicate removed: "));
    assert!(lines[1].ends_with(" [INFO]: Total 1 duplicates deleted, 0 skipped."));
    for line in &lines {
        // YYYY-MM-DD HH:MM:SS,mmm
        assert_eq!(&line[4..5], "-");
        assert_eq!(&line[10..11], " ");
        assert_eq!(&line[19..20], ",");
        assert_eq!(&line[23..25], " [");
    }
}

#[test]
fn test_second_clean_reports_no_duplicates() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    write(&source, "a.txt", b"same");
    write(&source, "b.txt", b"same");

    assert_eq!(clean(&temp, &source, &[]).unwrap(), ExitCode::Success);
    assert_eq!(clean(&temp, &source, &[]).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_no_log_file_flag() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    write(&source, "a.txt", b"same");
    write(&source, "b.txt", b"same");

    clean(&temp, &source, &["--no-log-file"]).unwrap();
    assert!(!source.join("logs").exists());
}

#[test]
fn test_custom_backup_and_log_dirs() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    let backup = temp.path().join("dups");
    let logs = temp.path().join("runlogs");
    write(&source, "a.txt", b"same");
    write(&source, "b.txt", b"same");

    let code = clean(
        &temp,
        &source,
        &[
            "--backup-dir",
            backup.to_str().unwrap(),
            "--log-dir",
            logs.to_str().unwrap(),
            "-a",
            "fast",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(backup.join("b.txt").exists());
    assert_eq!(log_files(&logs).len(), 1);
    assert!(!source.join("backup_duplicates").exists());
}

#[test]
fn test_empty_source_reports_no_duplicates() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    fs::create_dir(&source).unwrap();

    let code = clean(&temp, &source, &["--no-log-file"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(!source.join("backup_duplicates").exists());
}

#[test]
fn test_missing_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = clean(&temp, &temp.path().join("nope"), &[]).unwrap_err();
    assert!(err.to_string().contains("Source directory not found"));
}

#[test]
fn test_file_as_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "file.txt", b"x");
    let err = clean(&temp, &file, &[]).unwrap_err();
    assert!(err.to_string().contains("Not a directory"));
}

#[test]
fn test_backup_dir_equal_to_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    write(&source, "a.txt", b"x");
    write(&source, "sub/a.txt", b"x");
    let source_arg = source.display().to_string();

    let err = clean(&temp, &source, &["--backup-dir", source_arg.as_str()]).unwrap_err();

    assert!(err
        .to_string()
        .contains("Backup directory must differ from the source directory"));
    assert!(source.join("a.txt").exists());
    assert!(source.join("sub/a.txt").exists());
    assert!(!source.join("logs").exists());
}

#[test]
fn test_bad_config_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    fs::create_dir(&source).unwrap();
    fs::write(temp.path().join("config.toml"), "chunk_size = 0\n").unwrap();

    let err = clean(&temp, &source, &[]).unwrap_err();
    assert!(format!("{err:#}").contains("chunk_size"));
}

#[test]
fn test_config_file_settings_apply() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("S");
    write(&source, "a/x.txt", b"same");
    write(&source, "b/x.txt", b"same");
    fs::write(
        temp.path().join("config.toml"),
        "preserve_structure = true\nbackup_dir_name = \"moved\"\nwrite_log_file = false\n",
    )
    .unwrap();

    let code = clean(&temp, &source, &[]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(source.join("moved/b/x.txt").exists());
    assert!(!source.join("logs").exists());
}

#[test]
fn test_hash_command_exit_codes() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "a.txt", b"abc");
    let file_arg = file.display().to_string();

    let cli = Cli::try_parse_from(["mirrorclean", "hash", file_arg.as_str(), "-a", "md5"]).unwrap();
    assert_eq!(mirrorclean::run_app(cli).unwrap(), ExitCode::Success);

    let missing = temp.path().join("missing.txt").display().to_string();
    let cli = Cli::try_parse_from(["mirrorclean", "hash", file_arg.as_str(), missing.as_str()])
        .unwrap();
    assert_eq!(mirrorclean::run_app(cli).unwrap(), ExitCode::PartialSuccess);
}
