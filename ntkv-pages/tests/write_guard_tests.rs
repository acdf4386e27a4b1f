//! Lifecycle and error-path checks of the sink and source.

use std::sync::Arc;

use ntkv_pages::{
    ClusterIndex, Page, PageSink, PageSource, ReadOptions, SealedPage, WriteOptions,
};
use ntkv_result::Error;
use ntkv_store::MemStore;

const URI: &str = "daos://guard-pool/guard-cont";

fn sink(store: &Arc<MemStore>) -> PageSink<MemStore> {
    PageSink::new(Arc::clone(store), "guarded", URI, WriteOptions::default()).unwrap()
}

#[test]
fn bad_uris_are_rejected_up_front() {
    let store = Arc::new(MemStore::new());
    for bad in ["guard-pool/guard-cont", "daos://only-pool", "daos://"] {
        assert!(matches!(
            PageSink::new(Arc::clone(&store), "x", bad, WriteOptions::default()),
            Err(Error::BadUri(_))
        ));
        assert!(matches!(
            PageSource::open(Arc::clone(&store), "x", bad, ReadOptions::default()),
            Err(Error::BadUri(_))
        ));
    }
}

#[test]
fn unknown_object_class_fails_at_create() {
    let store = Arc::new(MemStore::new());
    let options = WriteOptions {
        object_class: "NOPE".to_string(),
        ..WriteOptions::default()
    };
    let mut sink = PageSink::new(Arc::clone(&store), "guarded", URI, options).unwrap();
    match sink.create(b"header") {
        Err(Error::UnknownObjectClass(name)) => assert_eq!(name, "NOPE"),
        other => panic!("expected UnknownObjectClass, got {other:?}"),
    }
}

#[test]
fn commits_before_create_are_bad_state() {
    let store = Arc::new(MemStore::new());
    let mut sink = sink(&store);
    let sealed = SealedPage::new(b"p".to_vec(), 1);
    assert!(matches!(
        sink.commit_sealed_page(1, &sealed),
        Err(Error::BadState(_))
    ));
    assert!(matches!(sink.commit_cluster(0), Err(Error::BadState(_))));
    assert!(matches!(
        sink.commit_cluster_group(b"pl"),
        Err(Error::BadState(_))
    ));
    assert!(matches!(
        sink.commit_dataset(b"footer"),
        Err(Error::BadState(_))
    ));
}

#[test]
fn create_twice_is_bad_state() {
    let store = Arc::new(MemStore::new());
    let mut sink = sink(&store);
    sink.create(b"header").unwrap();
    assert!(matches!(sink.create(b"header"), Err(Error::BadState(_))));
}

#[test]
fn commit_dataset_straight_after_create_is_bad_state() {
    let store = Arc::new(MemStore::new());
    let mut sink = sink(&store);
    sink.create(b"header").unwrap();
    assert!(matches!(
        sink.commit_dataset(b"footer"),
        Err(Error::BadState(_))
    ));
}

#[test]
fn closed_sink_rejects_further_commits() {
    let store = Arc::new(MemStore::new());
    let mut sink = sink(&store);
    sink.create(b"header").unwrap();
    sink.commit_page(1, &Page::new(b"data".to_vec(), 4)).unwrap();
    sink.commit_cluster(4).unwrap();
    sink.commit_dataset(b"footer").unwrap();

    assert!(matches!(
        sink.commit_page(1, &Page::new(b"more".to_vec(), 4)),
        Err(Error::BadState(_))
    ));
    assert!(matches!(
        sink.commit_dataset(b"footer"),
        Err(Error::BadState(_))
    ));
}

#[test]
fn source_requires_attach_before_page_reads() {
    let store = Arc::new(MemStore::new());
    let mut sink = sink(&store);
    sink.create(b"header").unwrap();
    sink.commit_page(1, &Page::new(b"data".to_vec(), 4)).unwrap();
    sink.commit_cluster(4).unwrap();
    sink.commit_dataset(b"footer").unwrap();

    let source =
        PageSource::open(Arc::clone(&store), "guarded", URI, ReadOptions::default()).unwrap();
    let at = ClusterIndex {
        cluster_id: 0,
        index: 0,
    };
    assert!(matches!(source.descriptor(), Err(Error::BadState(_))));
    assert!(matches!(
        source.load_sealed_page(1, at),
        Err(Error::BadState(_))
    ));
}

#[test]
fn source_open_fails_without_container() {
    let store = Arc::new(MemStore::new());
    let result = PageSource::open(
        Arc::clone(&store),
        "guarded",
        "daos://guard-pool/missing",
        ReadOptions::default(),
    );
    assert!(matches!(result, Err(Error::IoOpen { .. })));
}

#[test]
fn attach_without_anchor_is_a_read_error() {
    let store = Arc::new(MemStore::new());
    // Create the container but never write a dataset into it.
    let mut sink = sink(&store);
    sink.create(b"header").unwrap();

    let source =
        PageSource::open(Arc::clone(&store), "guarded", URI, ReadOptions::default()).unwrap();
    assert!(matches!(source.attach(), Err(Error::IoRead { .. })));
}
