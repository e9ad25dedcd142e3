use std::{
    io::{self, Cursor, Read},
    sync::{
        Arc, Once,
        atomic::{AtomicBool, Ordering},
    },
};

use http::{
    Method, StatusCode,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    },
};
use serde_json::json;
use tempfile::TempDir;

use crate::{
    config::{Config, NotFoundPolicy},
    handlers::{Handlers, UPLOAD_OK},
    net::{Body, HttpEvent, InboundEvent, Response},
    storage::{
        Entry, MemoryProvider, RedbProvider, StorageError, StorageProvider, Store,
        api::FileReader,
    },
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).with_test_writer().init();
    });
}

fn handlers_with(provider: impl StorageProvider + 'static, not_found: NotFoundPolicy) -> Handlers {
    init_tracing();
    let config = Arc::new(Config::new_test("pastebin", not_found));
    Handlers::new(config, Arc::new(provider))
}

fn handlers(provider: impl StorageProvider + 'static) -> Handlers {
    handlers_with(provider, NotFoundPolicy::NotFound)
}

fn upload_event(body: impl Read + Send + 'static) -> InboundEvent {
    HttpEvent::new(Method::POST, "/api/upload").with_body(Body::new(body)).into()
}

fn upload_json(filename: &str, data: &str) -> InboundEvent {
    let body = json!({ "filename": filename, "data": data }).to_string();
    upload_event(Cursor::new(body.into_bytes()))
}

fn download_event(query: &str) -> InboundEvent {
    HttpEvent::new(Method::GET, "/api/download").with_query(query).into()
}

fn list_event() -> InboundEvent {
    HttpEvent::new(Method::GET, "/api/list").into()
}

fn assert_cors(response: &Response) {
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_METHODS), Some("GET, POST, PUT, DELETE, OPTIONS"));
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_HEADERS), Some("Content-Type, Authorization"));
}

fn stored(provider: &MemoryProvider, name: &str) -> Vec<u8> {
    let store = provider.open("pastebin").unwrap();
    let mut buf = Vec::new();
    store.file(name).open_read().unwrap().read_to_end(&mut buf).unwrap();
    buf
}

fn listed(response: &Response) -> Vec<String> {
    serde_json::from_slice(&response.body).expect("listing is a JSON array of strings")
}

/// Reader that records when it is dropped.
struct Tracked {
    inner: Cursor<Vec<u8>>,
    released: Arc<AtomicBool>,
}

impl Tracked {
    fn new(bytes: &[u8]) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        (Tracked { inner: Cursor::new(bytes.to_vec()), released: released.clone() }, released)
    }
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Reader that yields some bytes, then fails.
struct BrokenReader {
    sent: bool,
    released: Arc<AtomicBool>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::other("stream interrupted"));
        }
        self.sent = true;
        let chunk = b"partial";
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl Drop for BrokenReader {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Storage collaborator with switchable failures.
#[derive(Clone, Default)]
struct Faults {
    open: bool,
    write: bool,
    list: bool,
    read: bool,
    broken_stream: bool,
    entries: Vec<Entry>,
    released: Arc<AtomicBool>,
}

struct FaultyProvider(Faults);

struct FaultyStore(Faults);

impl StorageProvider for FaultyProvider {
    fn open(&self, _name: &str) -> Result<Box<dyn Store>, StorageError> {
        if self.0.open {
            return Err(StorageError::Io(io::Error::other("store unavailable")));
        }
        Ok(Box::new(FaultyStore(self.0.clone())))
    }
}

impl Store for FaultyStore {
    fn write(&self, _name: &str, _data: &[u8], _overwrite: bool) -> Result<u64, StorageError> {
        if self.0.write {
            return Err(StorageError::Io(io::Error::other("disk full")));
        }
        Ok(1)
    }

    fn open_read(&self, name: &str) -> Result<FileReader, StorageError> {
        if self.0.read {
            return Err(StorageError::Io(io::Error::other("checksum mismatch")));
        }
        if self.0.broken_stream {
            return Ok(Box::new(BrokenReader { sent: false, released: self.0.released.clone() }));
        }
        Err(StorageError::NotFound(name.to_string()))
    }

    fn list_entries(&self) -> Result<Vec<Entry>, StorageError> {
        if self.0.list {
            return Err(StorageError::Io(io::Error::other("enumeration failed")));
        }
        Ok(self.0.entries.clone())
    }
}

// upload

#[test]
fn upload_stores_content() {
    let provider = MemoryProvider::new();
    let handlers = handlers(provider.clone());

    let response = handlers.upload(upload_json("a.txt", "hello world")).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body_text(), UPLOAD_OK);
    assert_cors(&response);
    assert_eq!(stored(&provider, "a.txt"), b"hello world");
}

#[test]
fn upload_overwrites_existing_file() {
    let provider = MemoryProvider::new();
    let handlers = handlers(provider.clone());

    handlers.upload(upload_json("a.txt", "a much longer first version")).unwrap();
    let response = handlers.upload(upload_json("a.txt", "second")).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(stored(&provider, "a.txt"), b"second");
}

#[test]
fn upload_accepts_empty_data_and_empty_name() {
    let provider = MemoryProvider::new();
    let handlers = handlers(provider.clone());

    assert_eq!(handlers.upload(upload_json("empty.txt", "")).unwrap().status, StatusCode::OK);
    assert_eq!(handlers.upload(upload_json("", "nameless")).unwrap().status, StatusCode::OK);

    assert!(stored(&provider, "empty.txt").is_empty());
    assert_eq!(stored(&provider, ""), b"nameless");
}

#[test]
fn upload_rejects_invalid_json() {
    let handlers = handlers(MemoryProvider::new());

    let response = handlers.upload(upload_event(Cursor::new(b"{not json".to_vec()))).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body.is_empty());
    assert_cors(&response);
}

#[test]
fn upload_rejects_missing_or_mistyped_fields() {
    let handlers = handlers(MemoryProvider::new());

    for body in [
        json!({ "filename": "a.txt" }),
        json!({ "data": "hello" }),
        json!({ "filename": "a.txt", "data": 42 }),
        json!([]),
    ] {
        let response =
            handlers.upload(upload_event(Cursor::new(body.to_string().into_bytes()))).unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR, "body: {body}");
        assert!(response.body_text().starts_with("invalid request body"));
    }
}

#[test]
fn upload_reports_body_read_error() {
    let handlers = handlers(MemoryProvider::new());
    let event = HttpEvent::new(Method::POST, "/api/upload")
        .with_body(Body::failed(io::Error::other("connection reset")));

    let response = handlers.upload(event.into()).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body_text().contains("connection reset"));
}

#[test]
fn upload_releases_body_on_every_path() {
    let handlers = handlers(MemoryProvider::new());
    let (good, released) = Tracked::new(br#"{"filename":"a.txt","data":"x"}"#);
    handlers.upload(upload_event(good)).unwrap();
    assert!(released.load(Ordering::SeqCst));

    let (bad, released) = Tracked::new(b"garbage");
    let response = handlers.upload(upload_event(bad)).unwrap();
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn upload_reports_open_failure() {
    let handlers = handlers(FaultyProvider(Faults { open: true, ..Faults::default() }));

    let response = handlers.upload(upload_json("a.txt", "x")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body_text(), "failed to open store `pastebin`: I/O error: store unavailable");
    assert_cors(&response);
}

#[test]
fn upload_reports_write_failure() {
    let handlers = handlers(FaultyProvider(Faults { write: true, ..Faults::default() }));

    let response = handlers.upload(upload_json("a.txt", "x")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body_text(), "failed to write file: I/O error: disk full");
}

// download

#[test]
fn download_returns_uploaded_bytes() {
    let handlers = handlers(MemoryProvider::new());
    let content = "line one\nline two ünïcødé \u{1F600}";
    handlers.upload(upload_json("notes.txt", content)).unwrap();

    let response = handlers.download(download_event("filename=notes.txt")).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, content.as_bytes());
    assert_eq!(response.header(http::header::CONTENT_TYPE), None);
    assert_cors(&response);
}

#[test]
fn download_decodes_filename() {
    let handlers = handlers(MemoryProvider::new());
    handlers.upload(upload_json("Group 1.png", "img")).unwrap();

    let response = handlers.download(download_event("filename=Group%201.png")).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"img");
}

#[test]
fn download_without_filename_is_bad_request() {
    let handlers = handlers(MemoryProvider::new());

    let response = handlers.download(download_event("name=a.txt")).unwrap();

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body_text(), "query parameter `filename` not found");
    assert_cors(&response);
}

#[test]
fn download_of_unknown_file_is_not_found() {
    let handlers = handlers(MemoryProvider::new());

    let response = handlers.download(download_event("filename=missing.txt")).unwrap();

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body_text(), "failed to read file: file `missing.txt` not found");
    assert_cors(&response);
}

#[test]
fn download_not_found_status_is_configurable() {
    let handlers = handlers_with(MemoryProvider::new(), NotFoundPolicy::ServerError);

    let response = handlers.download(download_event("filename=missing.txt")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn download_reports_read_failure() {
    let handlers = handlers(FaultyProvider(Faults { read: true, ..Faults::default() }));

    let response = handlers.download(download_event("filename=a.txt")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body_text(), "failed to read file: I/O error: checksum mismatch");
}

#[test]
fn download_reports_open_failure() {
    let handlers = handlers(FaultyProvider(Faults { open: true, ..Faults::default() }));

    let response = handlers.download(download_event("filename=a.txt")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
}

#[test]
fn download_copy_failure_discards_partial_body() {
    let faults = Faults { broken_stream: true, ..Faults::default() };
    let released = faults.released.clone();
    let handlers = handlers(FaultyProvider(faults));

    let response = handlers.download(download_event("filename=a.txt")).unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body_text(), "failed to copy file content: stream interrupted");
    assert!(released.load(Ordering::SeqCst));
    assert_cors(&response);
}

// list

#[test]
fn list_of_empty_store_is_empty_array() {
    let handlers = handlers(MemoryProvider::new());

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"[]");
    assert_cors(&response);
}

#[test]
fn list_returns_uploaded_names() {
    let handlers = handlers(MemoryProvider::new());
    handlers.upload(upload_json("a.txt", "a")).unwrap();
    handlers.upload(upload_json("b.png", "b")).unwrap();

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let mut names = listed(&response);
    names.sort();
    assert_eq!(names, ["a.txt", "b.png"]);
}

#[test]
fn list_flattens_structured_records() {
    let entries = vec![
        Entry::record([("name", json!("Group 1.png")), ("version", json!(1)), ("id", json!(0))]),
        Entry::name("plain.txt"),
        Entry::record([("version", json!(2))]),
        Entry::record([("filename", json!("other.md"))]),
    ];
    let handlers = handlers(FaultyProvider(Faults { entries, ..Faults::default() }));

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(listed(&response), ["Group 1.png", "plain.txt", "other.md"]);
}

#[test]
fn list_swallows_open_failure() {
    let handlers = handlers(FaultyProvider(Faults { open: true, ..Faults::default() }));

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"[]");
    assert_cors(&response);
}

#[test]
fn list_swallows_enumeration_failure() {
    let handlers = handlers(FaultyProvider(Faults { list: true, ..Faults::default() }));

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"[]");
}

#[test]
fn list_over_redb_records() {
    let dir = TempDir::new().unwrap();
    let handlers = handlers(RedbProvider::new(dir.path()).expect("redb provider creation"));
    handlers.upload(upload_json("b.png", "b")).unwrap();
    handlers.upload(upload_json("a.txt", "a")).unwrap();
    handlers.upload(upload_json("a.txt", "aa")).unwrap();

    let response = handlers.list(list_event()).unwrap();

    assert_eq!(listed(&response), ["a.txt", "b.png"]);

    let download = handlers.download(download_event("filename=a.txt")).unwrap();
    assert_eq!(download.body, b"aa");
}

// adapter

#[test]
fn non_http_events_are_rejected_by_every_handler() {
    let handlers = handlers(MemoryProvider::new());

    assert_eq!(handlers.upload(InboundEvent::other("timer")).unwrap_err().kind, "timer");
    assert_eq!(handlers.download(InboundEvent::other("pubsub")).unwrap_err().kind, "pubsub");
    assert_eq!(handlers.list(InboundEvent::other("p2p")).unwrap_err().kind, "p2p");
}
