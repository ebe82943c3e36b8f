use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::*;
use crate::asset::{CSS_FILE_NAME, Fetch, MemoryStore, Minify, Store, UriBuilder};
use crate::cache::ReductionRepository;
use crate::error::{ReduceError, Result};
use crate::utils::hash::ContentHash;

const HOST: &str = "http://cdn.example.com";
const VPATH: &str = "/reduced";
const INPUT: &str = "http://host/css1.css::http://host/css2.css";

// ============================================================================
// Doubles
// ============================================================================

#[derive(Default)]
struct ScriptedFetcher {
    texts: FxHashMap<String, String>,
    bytes: FxHashMap<String, Vec<u8>>,
    failing: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn text(mut self, url: &str, css: &str) -> Self {
        self.texts.insert(url.to_string(), css.to_string());
        self
    }

    fn bytes(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.bytes.insert(url.to_string(), bytes);
        self
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Fetch for ScriptedFetcher {
    fn download_text(&self, url: &str) -> Result<String> {
        self.requests.lock().push(url.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReduceError::fetch(url, "connection refused"));
        }
        self.texts
            .get(url)
            .cloned()
            .ok_or_else(|| ReduceError::fetch(url, "status code 404"))
    }

    fn download_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.bytes
            .get(url)
            .cloned()
            .ok_or_else(|| ReduceError::fetch(url, "status code 404"))
    }
}

/// Maps known inputs to fixed outputs, passes everything else through.
#[derive(Default)]
struct MappingMinifier {
    outputs: FxHashMap<String, String>,
}

impl MappingMinifier {
    fn map(mut self, from: &str, to: &str) -> Self {
        self.outputs.insert(from.to_string(), to.to_string());
        self
    }
}

impl Minify for MappingMinifier {
    fn minify(&self, css: &str) -> String {
        self.outputs.get(css).cloned().unwrap_or_else(|| css.to_string())
    }
}

struct CountingReducer {
    inner: Reducer,
    calls: AtomicUsize,
}

impl Reduce for CountingReducer {
    fn reduce(&self, key: ContentHash, urls: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.reduce(key, urls)
    }
}

/// Panics on inputs containing "boom", otherwise echoes the input.
struct PanickyReducer;

impl Reduce for PanickyReducer {
    fn reduce(&self, _key: ContentHash, urls: &str) -> Result<String> {
        if urls.contains("boom") {
            panic!("bad input: {urls}");
        }
        Ok(format!("reduced:{urls}"))
    }
}

/// Blocks each job until the test releases it.
struct GatedReducer {
    gate: Receiver<()>,
}

impl Reduce for GatedReducer {
    fn reduce(&self, _key: ContentHash, urls: &str) -> Result<String> {
        let _ = self.gate.recv();
        Ok(urls.to_string())
    }
}

fn css_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::default()
        .text("http://host/css1.css", "css1")
        .text("http://host/css2.css", "css2")
}

fn reducer(
    fetcher: Arc<ScriptedFetcher>,
    minifier: MappingMinifier,
    store: Arc<MemoryStore>,
    size_limit: usize,
) -> Reducer {
    Reducer::new(
        fetcher,
        Arc::new(minifier),
        store,
        UriBuilder::new(HOST, VPATH),
        size_limit,
    )
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// ============================================================================
// Reducer
// ============================================================================

#[test]
fn test_split_urls_ignores_empty_segments() {
    let urls: Vec<_> = split_urls("::a.css::::b.css:: ::").collect();
    assert_eq!(urls, ["a.css", "b.css"]);
    assert_eq!(split_urls("").count(), 0);
}

#[test]
fn test_process_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let minifier = MappingMinifier::default().map("css1css2", "min");
    let reducer = reducer(Arc::new(css_fetcher()), minifier, store.clone(), 50_000);

    let url = reducer.process(INPUT).unwrap();

    let expected = format!(
        "{HOST}{VPATH}/{}-{}-{CSS_FILE_NAME}",
        ContentHash::of(INPUT).to_hex(),
        ContentHash::of("min").to_hex()
    );
    assert_eq!(url, expected);
    assert_eq!(store.get(&url).as_deref(), Some(&b"min"[..]));
    assert_eq!(store.source_of(&url).as_deref(), Some(INPUT));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_process_with_key_names_artifact() {
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(css_fetcher()), MappingMinifier::default(), store, 50_000);
    let key = ContentHash::of("custom key");

    let url = reducer.process_with_key(key, INPUT).unwrap();

    assert_eq!(UriBuilder::parse_key(&url), key);
    assert_eq!(UriBuilder::parse_signature(&url), ContentHash::of("css1css2").to_hex());
}

#[test]
fn test_process_fetches_each_url_once_in_order() {
    let fetcher = Arc::new(css_fetcher());
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(fetcher.clone(), MappingMinifier::default(), store, 50_000);

    reducer.process("http://host/css2.css::::http://host/css1.css::").unwrap();

    assert_eq!(
        *fetcher.requests.lock(),
        ["http://host/css2.css", "http://host/css1.css"]
    );
}

#[test]
fn test_process_sprites_background_images() {
    let css = ".a { background: url(img/a.png) no-repeat; }\n.b { background-image: url(http://img.example.com/b.png); }";
    let fetcher = ScriptedFetcher::default()
        .text("http://host/site.css", css)
        .bytes("http://host/img/a.png", png(8, 8))
        .bytes("http://img.example.com/b.png", png(4, 2));
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(fetcher), MappingMinifier::default(), store.clone(), 50_000);

    let url = reducer.process("http://host/site.css").unwrap();
    let output = String::from_utf8(store.get(&url).unwrap()).unwrap();

    assert_eq!(store.len(), 2);
    assert!(!output.contains("img/a.png"));
    assert!(!output.contains("url(http://img.example.com/b.png)"));
    assert!(output.contains(&format!("url(\"{HOST}{VPATH}/")));
    assert!(output.contains("background-position: -0px -0px;background-repeat: no-repeat;}"));
    assert!(output.contains("background-position: -8px -0px;background-repeat: no-repeat;}"));
}

#[test]
fn test_oversized_image_still_placed() {
    let css = ".a { background: url(a.png); }\n.b { background: url(b.png); }";
    let fetcher = ScriptedFetcher::default()
        .text("http://host/site.css", css)
        .bytes("http://host/a.png", png(32, 32))
        .bytes("http://host/b.png", png(30, 30));
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(fetcher), MappingMinifier::default(), store.clone(), 1);

    let url = reducer.process("http://host/site.css").unwrap();
    let output = String::from_utf8(store.get(&url).unwrap()).unwrap();

    // Two single-image sheets plus the stylesheet.
    assert_eq!(store.len(), 3);
    assert_eq!(output.matches("background-position: -0px -0px;").count(), 2);
    assert!(!output.contains("url(a.png)"));
    assert!(!output.contains("url(b.png)"));
}

#[test]
fn test_unloadable_image_leaves_rule_untouched() {
    let css = ".a { background: url(a.png); }";
    let fetcher = ScriptedFetcher::default()
        .text("http://host/site.css", css)
        .bytes("http://host/a.png", b"GIF89a garbage".to_vec());
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(fetcher), MappingMinifier::default(), store.clone(), 50_000);

    let url = reducer.process("http://host/site.css").unwrap();
    assert_eq!(store.get(&url).as_deref(), Some(css.as_bytes()));
}

#[test]
fn test_commented_rule_is_not_fetched() {
    let css = "/* .old { background: url(gone.png); } */\n.a { background: url(a.png); }";
    let fetcher = ScriptedFetcher::default()
        .text("http://host/site.css", css)
        .bytes("http://host/a.png", png(4, 4));
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(fetcher), MappingMinifier::default(), store.clone(), 50_000);

    let url = reducer.process("http://host/site.css").unwrap();
    let output = String::from_utf8(store.get(&url).unwrap()).unwrap();

    assert_eq!(store.len(), 2);
    assert!(output.starts_with("/* .old { background: url(gone.png); } */\n"));
    assert!(!output.contains("url(a.png)"));
}

#[test]
fn test_undecodable_image_in_one_sheet_keeps_other_sheet_rewrite() {
    let rule = ".x{background:url(i.png)}";
    let fetcher = ScriptedFetcher::default()
        .text("http://host/a/s.css", rule)
        .text("http://host/b/s.css", rule)
        .bytes("http://host/a/i.png", b"not an image".to_vec())
        .bytes("http://host/b/i.png", png(6, 6));
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(fetcher), MappingMinifier::default(), store.clone(), 50_000);

    let url = reducer.process("http://host/a/s.css::http://host/b/s.css").unwrap();
    let output = String::from_utf8(store.get(&url).unwrap()).unwrap();

    // Sheet a keeps its rule, sheet b's rule points into the sprite.
    let rest = output.strip_prefix(rule).unwrap();
    assert!(rest.starts_with(&format!(".x{{background:url(\"{HOST}{VPATH}/")));
    assert!(!rest.contains("url(i.png)"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_fetch_failure_propagates() {
    let store = Arc::new(MemoryStore::new());
    let reducer = reducer(Arc::new(css_fetcher()), MappingMinifier::default(), store.clone(), 50_000);

    let err = reducer.process("http://host/css1.css::http://host/missing.css").unwrap_err();

    assert!(matches!(err, ReduceError::Fetch { ref url, .. } if url == "http://host/missing.css"));
    assert!(store.is_empty());
}

// ============================================================================
// Queue
// ============================================================================

#[test]
fn test_queue_reduces_once_per_input_set() {
    let store = Arc::new(MemoryStore::new());
    let counting = Arc::new(CountingReducer {
        inner: reducer(Arc::new(css_fetcher()), MappingMinifier::default(), store.clone(), 50_000),
        calls: AtomicUsize::new(0),
    });
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(counting.clone(), repository.clone());

    queue.enqueue(INPUT);
    queue.enqueue(INPUT);

    let fingerprint = ContentHash::of(INPUT);
    assert!(wait_until(|| repository.contains(fingerprint) && queue.count() == 0));
    queue.shutdown();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_eq!(repository.len(), 1);
    assert_eq!(store.len(), 1);
    let url = repository.find(fingerprint).unwrap();
    assert!(store.get(&url).is_some());
}

#[test]
fn test_queue_with_key() {
    let store = Arc::new(MemoryStore::new());
    let reducer = Arc::new(reducer(Arc::new(css_fetcher()), MappingMinifier::default(), store, 50_000));
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(reducer, repository.clone());
    let key = ContentHash::of("page-42");

    queue.enqueue_with_key(key, INPUT);

    let fingerprint = ContentHash::of(INPUT);
    assert!(wait_until(|| repository.contains(fingerprint)));
    let url = repository.find(fingerprint).unwrap();
    assert_eq!(UriBuilder::parse_key(&url), key);
}

#[test]
fn test_failed_job_reports_and_is_retried_on_reenqueue() {
    let fetcher = Arc::new(css_fetcher());
    fetcher.fail(true);
    let store = Arc::new(MemoryStore::new());
    let reducer = Arc::new(reducer(fetcher.clone(), MappingMinifier::default(), store, 50_000));
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(reducer, repository.clone());

    let (tx, rx) = channel::unbounded();
    queue.set_error_handler(move |e| {
        let _ = tx.send(e);
    });

    queue.enqueue(INPUT);
    let err = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(err, ReduceError::Fetch { .. }));
    assert!(repository.is_empty());

    fetcher.fail(false);
    queue.enqueue(INPUT);
    assert!(wait_until(|| repository.contains(ContentHash::of(INPUT))));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_panic_is_reported_and_worker_survives() {
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(Arc::new(PanickyReducer), repository.clone());

    let (tx, rx) = channel::unbounded();
    queue.set_error_handler(move |e| {
        let _ = tx.send(e);
    });

    queue.enqueue("boom.css");
    queue.enqueue("fine.css");

    let err = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    match err {
        ReduceError::Panicked(message) => assert!(message.contains("boom.css")),
        other => panic!("expected panic error, got {other:?}"),
    }
    assert!(wait_until(|| repository.contains(ContentHash::of("fine.css"))));
    assert_eq!(
        repository.find(ContentHash::of("fine.css")).as_deref(),
        Some("reduced:fine.css")
    );
    assert!(!repository.contains(ContentHash::of("boom.css")));
}

#[test]
fn test_replacing_error_handler_discards_previous() {
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(Arc::new(PanickyReducer), repository);

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let counter = first.clone();
    queue.set_error_handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = second.clone();
    queue.set_error_handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    queue.enqueue("boom.css");
    assert!(wait_until(|| second.load(Ordering::SeqCst) == 1));
    assert_eq!(first.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cleared_error_handler_is_not_called() {
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(Arc::new(PanickyReducer), repository.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    queue.set_error_handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    queue.clear_error_handler();

    // The worker runs jobs in order, so the failing one is done first.
    queue.enqueue("boom.css");
    queue.enqueue("fine.css");
    assert!(wait_until(|| repository.contains(ContentHash::of("fine.css"))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_count_reports_waiting_jobs() {
    let (release, gate) = channel::unbounded();
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(Arc::new(GatedReducer { gate }), repository.clone());

    queue.enqueue("a.css");
    queue.enqueue("b.css");
    queue.enqueue("c.css");

    // One job is held by the worker, the rest wait.
    assert!(wait_until(|| queue.count() == 2));

    for _ in 0..3 {
        release.send(()).unwrap();
    }
    assert!(wait_until(|| repository.len() == 3));
    assert_eq!(queue.count(), 0);
}

#[test]
fn test_enqueue_from_many_threads() {
    let repository = Arc::new(ReductionRepository::new());
    let queue = Arc::new(ReducingQueue::new(Arc::new(PanickyReducer), repository.clone()));

    let callers: Vec<_> = (0..8)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for j in 0..10 {
                    queue.enqueue(format!("sheet-{i}-{j}.css"));
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }

    assert!(wait_until(|| repository.len() == 80));
}

#[test]
fn test_shutdown_is_idempotent() {
    let queue = ReducingQueue::new(Arc::new(PanickyReducer), Arc::new(ReductionRepository::new()));
    queue.shutdown();
    queue.shutdown();
    queue.enqueue("late.css");
    assert_eq!(queue.count(), 1);
}
