use crawl_store::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn config(dir: &TempDir, prefix: &str) -> StoreConfig {
    StoreConfig::new(dir.path().join("crawl.redb")).with_prefix(prefix)
}

#[test]
fn test_fifo_order_and_empty_queue() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    for payload in ["A", "B", "C"] {
        store.enqueue(payload.as_bytes()).unwrap();
    }
    assert_eq!(store.dequeue().unwrap(), b"A");
    assert_eq!(store.dequeue().unwrap(), b"B");
    assert_eq!(store.dequeue().unwrap(), b"C");

    let err = store.dequeue().unwrap_err();
    assert!(matches!(err, StoreError::QueueEmpty));
}

#[test]
fn test_size_tracks_enqueue_and_dequeue() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    let n = 20;
    for i in 0..n {
        store.enqueue(format!("payload-{}", i).as_bytes()).unwrap();
    }
    for k in 0..=n {
        assert_eq!(store.queue_size().unwrap(), n - k);
        if k < n {
            store.dequeue().unwrap();
        }
    }
}

#[test]
fn test_fifo_survives_more_than_255_entries() {
    // Crosses a byte boundary in the sequence key.
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    for i in 0..300u32 {
        store.enqueue(&i.to_be_bytes()).unwrap();
    }
    for i in 0..300u32 {
        assert_eq!(store.dequeue().unwrap(), i.to_be_bytes().to_vec());
    }
}

#[test]
fn test_visited_round_trip_and_idempotence() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    assert!(!store.is_visited(42).unwrap());
    store.mark_visited(42).unwrap();
    assert!(store.is_visited(42).unwrap());
    assert!(!store.is_visited(43).unwrap());

    store.mark_visited(42).unwrap();
    store.mark_visited(42).unwrap();
    assert!(store.is_visited(42).unwrap());
    assert!(!store.is_visited(43).unwrap());
}

#[test]
fn test_cookie_overwrite_and_missing_host() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    store.set_cookies("example.com", "a=1");
    store.set_cookies("example.com", "a=2");
    assert_eq!(store.cookies("example.com"), "a=2");
    assert_eq!(store.cookies("never-set.example"), "");
}

#[test]
fn test_clear_resets_all_families() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    for fp in [1u64, 2, 3] {
        store.mark_visited(fp).unwrap();
    }
    store.enqueue(b"pending").unwrap();
    store.set_cookies("example.com", "sid=1");
    store.set_cookies("go-colly.org", "sid=2");

    store.clear().unwrap();

    assert_eq!(store.queue_size().unwrap(), 0);
    for fp in [1u64, 2, 3] {
        assert!(!store.is_visited(fp).unwrap());
    }
    assert_eq!(store.cookies("example.com"), "");
    assert_eq!(store.cookies("go-colly.org"), "");

    // Still usable afterwards.
    store.enqueue(b"after").unwrap();
    assert_eq!(store.dequeue().unwrap(), b"after");
}

#[test]
fn test_prefixes_sharing_one_file_are_isolated() {
    let dir = TempDir::new().unwrap();
    let first = CrawlStore::open(&config(&dir, "alpha")).unwrap();
    let second = CrawlStore::with_database(Arc::clone(first.database()), &config(&dir, "beta"))
        .unwrap();

    first.mark_visited(7).unwrap();
    first.enqueue(b"alpha-job").unwrap();
    first.set_cookies("example.com", "who=alpha");

    assert!(!second.is_visited(7).unwrap());
    assert_eq!(second.queue_size().unwrap(), 0);
    assert!(second.try_dequeue().unwrap().is_none());
    assert_eq!(second.cookies("example.com"), "");

    second.enqueue(b"beta-job").unwrap();
    second.set_cookies("example.com", "who=beta");

    assert_eq!(first.cookies("example.com"), "who=alpha");
    assert_eq!(first.dequeue().unwrap(), b"alpha-job");
    assert_eq!(second.dequeue().unwrap(), b"beta-job");

    // Separate buckets: clearing one leaves the other alone.
    second.mark_visited(9).unwrap();
    first.clear().unwrap();
    assert!(second.is_visited(9).unwrap());
    assert_eq!(second.cookies("example.com"), "who=beta");
}

#[test]
fn test_prefixes_sharing_a_bucket_keep_separate_queues() {
    let dir = TempDir::new().unwrap();
    let shared = |prefix: &str| config(&dir, prefix).with_bucket("crawler");
    let first = CrawlStore::open(&shared("alpha")).unwrap();
    let second =
        CrawlStore::with_database(Arc::clone(first.database()), &shared("beta")).unwrap();

    first.enqueue(b"a1").unwrap();
    second.enqueue(b"b1").unwrap();
    first.enqueue(b"a2").unwrap();
    first.mark_visited(1).unwrap();

    assert_eq!(first.queue_size().unwrap(), 2);
    assert_eq!(second.queue_size().unwrap(), 1);
    assert!(!second.is_visited(1).unwrap());
    assert_eq!(first.dequeue().unwrap(), b"a1");
    assert_eq!(second.dequeue().unwrap(), b"b1");

    // One root namespace: a reset wipes every prefix inside it.
    second.enqueue(b"b2").unwrap();
    first.clear().unwrap();
    assert_eq!(second.queue_size().unwrap(), 0);
    second.enqueue(b"b3").unwrap();
    assert_eq!(second.dequeue().unwrap(), b"b3");
}

#[test]
fn test_state_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = CrawlStore::open(&config(&dir, "test")).unwrap();
        store.enqueue(b"one").unwrap();
        store.enqueue(b"two").unwrap();
        store.dequeue().unwrap();
        store.mark_visited(5).unwrap();
        store.set_cookies("example.com", "a=1");
    }

    let store = CrawlStore::open(&config(&dir, "test")).unwrap();
    assert_eq!(store.queue_size().unwrap(), 1);
    assert!(store.is_visited(5).unwrap());
    assert_eq!(store.cookies("example.com"), "a=1");

    // The counter resumes past the persisted entries, so order holds.
    store.enqueue(b"three").unwrap();
    assert_eq!(store.dequeue().unwrap(), b"two");
    assert_eq!(store.dequeue().unwrap(), b"three");
}

#[test]
fn test_concurrent_dequeuers_never_share_an_entry() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CrawlStore::open(&config(&dir, "test")).unwrap());

    let total = 400;
    for i in 0..total {
        store.enqueue(format!("job-{}", i).as_bytes()).unwrap();
    }

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(payload) = store.try_dequeue().unwrap() {
                    taken.push(String::from_utf8(payload).unwrap());
                }
                taken
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut count = 0;
    for worker in workers {
        for payload in worker.join().unwrap() {
            assert!(seen.insert(payload), "entry dequeued twice");
            count += 1;
        }
    }
    assert_eq!(count, total);
    assert_eq!(store.queue_size().unwrap(), 0);
}

#[test]
fn test_concurrent_producers_keep_per_producer_order() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CrawlStore::open(&config(&dir, "test")).unwrap());

    let producers: Vec<_> = (0..4u8)
        .map(|producer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50u8 {
                    store.enqueue(&[producer, i]).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(store.queue_size().unwrap(), 200);
    let mut last = [None::<u8>; 4];
    while let Some(payload) = store.try_dequeue().unwrap() {
        let (producer, i) = (payload[0] as usize, payload[1]);
        if let Some(prev) = last[producer] {
            assert!(i > prev);
        }
        last[producer] = Some(i);
    }
    assert_eq!(last, [Some(49); 4]);
}

#[test]
fn test_concurrent_cookie_writers() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CrawlStore::open(&config(&dir, "test")).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store.set_cookies(&format!("host{}.test", w), &format!("n={}", i));
                    let read = store.cookies(&format!("host{}.test", w));
                    assert!(read.starts_with("n="));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    for w in 0..4 {
        assert_eq!(store.cookies(&format!("host{}.test", w)), "n=24");
    }
}

#[test]
fn test_typed_requests_through_queue_and_visited_set() {
    let dir = TempDir::new().unwrap();
    let store = CrawlStore::open(&config(&dir, "test")).unwrap();

    let request = QueuedRequest::new("https://example.com/", 1).with_ctx("origin", "seed");
    store.enqueue_request(&request).unwrap();

    let popped = store.dequeue_request().unwrap();
    assert_eq!(popped, request);

    assert!(!store.is_visited(popped.fingerprint()).unwrap());
    store.mark_visited(popped.fingerprint()).unwrap();
    assert!(store.is_visited(request.fingerprint()).unwrap());
}

#[test]
fn test_open_fails_when_path_is_a_directory() {
    let dir = TempDir::new().unwrap();
    let err = CrawlStore::open(&StoreConfig::new(dir.path())).err().unwrap();
    assert!(err.is_unavailable());
}

#[test]
fn test_invalid_bucket_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = CrawlStore::open(&config(&dir, "test").with_bucket("a/b")).err().unwrap();
    assert!(matches!(err, StoreError::Config(_)));
}
