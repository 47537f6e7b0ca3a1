use std::fs;

use chrono::{TimeZone, Utc};
use sitemap_engine::{ensure_output_dir, AtomicFileWriter, ExportError, FileSink, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("sitemap.xml", "<urlset/>").unwrap();
    assert_eq!(first.file_name().unwrap(), "sitemap.xml");
    assert_eq!(fs::read_to_string(&first).unwrap(), "<urlset/>");

    let second = writer.write("sitemap.xml", "<urlset></urlset>").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "<urlset></urlset>");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(matches!(
        writer.write("sitemap.xml", "data"),
        Err(PersistError::NotADirectory(path)) if path == file_path
    ));
    assert!(!file_path.with_file_name("sitemap.xml").exists());
}

#[test]
fn file_sink_names_sitemap_after_base_and_time() {
    let temp = TempDir::new().unwrap();
    let sink = FileSink::new(temp.path().join("maps"));
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let path = sink
        .export("https://x.test/docs", at, "<urlset/>\n")
        .unwrap();

    assert_eq!(
        path,
        temp.path()
            .join("maps")
            .join("https___x_test_docs_sitemap_2024-01-02_030405.xml")
    );
    assert_eq!(fs::read_to_string(path).unwrap(), "<urlset/>\n");
}

#[test]
fn file_sink_rejects_names_with_separators() {
    let temp = TempDir::new().unwrap();
    let sink = FileSink::new(temp.path().to_path_buf());

    assert!(matches!(
        sink.write_named("../escape.json", "{}"),
        Err(ExportError::InvalidName(_))
    ));
    let report = sink.write_named("report.json", "{}").unwrap();
    assert_eq!(fs::read_to_string(report).unwrap(), "{}");
}

#[test]
fn staged_files_do_not_linger() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("out");
    ensure_output_dir(&dir).unwrap();
    AtomicFileWriter::new(dir.clone())
        .write("sitemap.xml", "<urlset/>")
        .unwrap();

    let names: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["sitemap.xml".to_string()]);
}
