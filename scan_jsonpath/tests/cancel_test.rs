use scan_jsonpath::{stream, CancelHandle, Error, JsonPath};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const INPUT: &str = "[1, 2, 3, 4, 5]";

#[test]
fn cancel_before_first_result() {
    let mut matches = stream(INPUT.as_bytes(), "$[*]").unwrap();
    matches.cancel_handle().cancel();

    assert!(matches!(matches.next(), Some(Err(Error::Cancelled))));
    assert!(matches.next().is_none());
    assert!(matches.next().is_none());
}

#[test]
fn cancel_mid_iteration_keeps_earlier_results() {
    let mut matches = stream(INPUT.as_bytes(), "$[*]").unwrap();
    let handle = matches.cancel_handle();

    let first = matches.next().unwrap().unwrap();
    let second = matches.next().unwrap().unwrap();
    handle.cancel();

    assert_eq!(first.value, 1);
    assert_eq!(second.value, 2);
    assert!(matches!(matches.next(), Some(Err(Error::Cancelled))));
    assert!(matches.next().is_none());
}

#[test]
fn cancel_drops_pending_matches() {
    // the inner array is decoded once and yields four matches
    let mut matches = stream("[[1, 2, 3]]".as_bytes(), "$..*").unwrap();
    assert_eq!(matches.next().unwrap().unwrap().path, "$[0]");
    matches.cancel_handle().cancel();
    assert!(matches!(matches.next(), Some(Err(Error::Cancelled))));
    assert!(matches.next().is_none());
}

#[test]
fn cancel_after_completion_is_silent() {
    let mut matches = stream(INPUT.as_bytes(), "$[0]").unwrap();
    let handle = matches.cancel_handle();
    assert!(matches.next().unwrap().is_ok());
    assert!(matches.next().is_none());
    handle.cancel();
    assert!(matches.next().is_none());
}

#[test]
fn shared_handle_from_another_thread() {
    let handle = CancelHandle::new();
    let path = JsonPath::compile("$[*]").unwrap();
    let mut matches = path
        .stream(INPUT.as_bytes())
        .with_cancel_handle(handle.clone());

    std::thread::spawn(move || handle.cancel()).join().unwrap();

    assert!(matches!(matches.next(), Some(Err(Error::Cancelled))));
}

// Counts how many bytes were pulled from the input
struct CountingReader<'a> {
    data: &'a [u8],
    pulled: Arc<AtomicUsize>,
}

impl Read for CountingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.len().min(buf.len()).min(4);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        self.pulled.fetch_add(n, Ordering::Relaxed);
        Ok(n)
    }
}

#[test]
fn input_is_read_lazily() {
    let input = format!("[{}]", vec!["1"; 1000].join(", "));
    let pulled = Arc::new(AtomicUsize::new(0));
    let reader = CountingReader {
        data: input.as_bytes(),
        pulled: Arc::clone(&pulled),
    };

    let mut matches = stream(reader, "$[*]").unwrap();
    assert_eq!(pulled.load(Ordering::Relaxed), 0);

    matches.next().unwrap().unwrap();
    assert!(pulled.load(Ordering::Relaxed) < 64);

    matches.cancel_handle().cancel();
    assert!(matches!(matches.next(), Some(Err(Error::Cancelled))));
    assert!(pulled.load(Ordering::Relaxed) < 64);
}
