mod common;

use std::path::Path;

use common::TempDir;
use wicket::resource::{ResourceStore, StaticFiles, media_type, strip_query};

#[test]
fn test_load_indexes_nested_files() {
    let dir = TempDir::new("nested");
    dir.write("index.html", b"<h1>home</h1>");
    dir.write("css/site.css", b"body {}");
    dir.write("img/logos/logo.png", b"\x89PNG");

    let files = StaticFiles::load(dir.path()).unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(
        files.routes(),
        vec!["/css/site.css", "/img/logos/logo.png", "/index.html"]
    );
}

#[test]
fn test_lookup_and_read() {
    let dir = TempDir::new("read");
    dir.write("index.html", b"<h1>home</h1>");

    let files = StaticFiles::load(dir.path()).unwrap();
    let resource = files.lookup(b"/index.html").unwrap();

    assert_eq!(resource.media_type, "text/html");
    assert_eq!(&files.read(resource).unwrap()[..], b"<h1>home</h1>");
}

#[test]
fn test_lookup_ignores_query_string() {
    let dir = TempDir::new("query");
    dir.write("app.js", b"run()");

    let files = StaticFiles::load(dir.path()).unwrap();

    assert!(files.lookup(b"/app.js?v=3").is_some());
    assert!(files.lookup(b"/app.js?").is_some());
    assert!(files.lookup(b"/app").is_none());
    assert!(files.lookup(b"app.js").is_none());
}

#[test]
fn test_directories_are_not_resources() {
    let dir = TempDir::new("dirs");
    dir.write("docs/readme.txt", b"hi");

    let files = StaticFiles::load(dir.path()).unwrap();

    assert!(files.lookup(b"/docs").is_none());
    assert!(files.lookup(b"/docs/readme.txt").is_some());
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = TempDir::new("missing");
    let root = dir.path().join("does-not-exist");

    assert!(StaticFiles::load(root).is_err());
}

#[test]
fn test_media_type_table() {
    assert_eq!(media_type(Path::new("a.txt")), "text/plain");
    assert_eq!(media_type(Path::new("a.htm")), "text/html");
    assert_eq!(media_type(Path::new("a.css")), "text/css");
    assert_eq!(media_type(Path::new("a.js")), "text/javascript");
    assert_eq!(media_type(Path::new("a.xml")), "text/xml");
    assert_eq!(media_type(Path::new("a.jpg")), "image/jpeg");
    assert_eq!(media_type(Path::new("a.jpeg")), "image/jpeg");
    assert_eq!(media_type(Path::new("a.png")), "image/png");
    assert_eq!(media_type(Path::new("Makefile")), "text/plain");
    assert_eq!(media_type(Path::new("a.wasm")), "text/plain");
}

#[test]
fn test_strip_query() {
    assert_eq!(strip_query(b"/a?b=c"), b"/a");
    assert_eq!(strip_query(b"/a"), b"/a");
}
