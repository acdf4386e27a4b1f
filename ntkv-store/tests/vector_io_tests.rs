use std::sync::Arc;

use ntkv_store::{Container, MemStore, Pool, ReadOp, WriteOp};
use ntkv_types::errno::ERR_NONEXIST;
use ntkv_types::ObjectId;

fn open_container(store: &Arc<MemStore>) -> Container<MemStore> {
    let pool = Pool::connect(Arc::clone(store), "pool-v").expect("pool connect");
    Container::open(pool, "cont-v", true).expect("container open")
}

#[test]
fn write_v_then_read_v_roundtrip_across_objects() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);

    let payloads: [(&[u8], ObjectId, u64, u64); 3] = [
        (b"alpha", ObjectId::new(1, 0), 10, 100),
        (b"bravo-123", ObjectId::new(2, 0), 20, 200),
        (b"c", ObjectId::new(3, 0), 30, 300),
    ];

    let mut writes = Vec::new();
    for (bytes, oid, dkey, akey) in payloads {
        let mut op = WriteOp::new(oid, dkey);
        op.push(akey, bytes);
        writes.push(op);
    }
    assert_eq!(container.write_v(writes), 0);

    let mut bufs: Vec<Vec<u8>> = payloads.iter().map(|(b, ..)| vec![0u8; b.len()]).collect();
    let mut reads = Vec::new();
    for (buf, &(_, oid, dkey, akey)) in bufs.iter_mut().zip(payloads.iter()) {
        let mut op = ReadOp::new(oid, dkey);
        op.push(akey, buf.as_mut_slice());
        reads.push(op);
    }
    assert_eq!(container.read_v(reads), 0);

    // The batch returned, so every child completed: all buffers filled.
    for (buf, (bytes, ..)) in bufs.iter().zip(payloads.iter()) {
        assert_eq!(buf.as_slice(), *bytes);
    }
    assert_eq!(store.live_events(), 0, "all events finalized");
    assert_eq!(store.live_objects(), 0, "all object handles closed");
}

#[test]
fn coalesced_ops_preserve_per_entry_ordering() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);

    let oid = ObjectId::new(7, 0);
    let mut write = WriteOp::new(oid, 5);
    write.push(1, b"one");
    write.push(2, b"two!!");
    write.push(3, b"three--");
    assert_eq!(container.write_v(vec![write]), 0);

    let mut b1 = [0u8; 3];
    let mut b2 = [0u8; 5];
    let mut b3 = [0u8; 7];
    let mut read = ReadOp::new(oid, 5);
    read.push(1, &mut b1);
    read.push(2, &mut b2);
    read.push(3, &mut b3);
    assert_eq!(container.read_v(vec![read]), 0);

    assert_eq!(&b1, b"one");
    assert_eq!(&b2, b"two!!");
    assert_eq!(&b3, b"three--");
}

#[test]
fn empty_batch_is_a_no_op() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);
    assert_eq!(container.read_v(Vec::new()), 0);
    assert_eq!(container.write_v(Vec::new()), 0);
    assert_eq!(store.live_events(), 0);
}

#[test]
fn read_v_of_missing_record_fails_whole_batch() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);
    assert_eq!(container.write_single(b"x", ObjectId::new(1, 0), 1, 1), 0);

    let mut b1 = [0u8; 1];
    let mut b2 = [0u8; 1];
    let mut op1 = ReadOp::new(ObjectId::new(1, 0), 1);
    op1.push(1, &mut b1);
    let mut op2 = ReadOp::new(ObjectId::new(1, 0), 1);
    op2.push(99, &mut b2);
    let rc = container.read_v(vec![op1, op2]);
    assert_eq!(rc, ERR_NONEXIST);
    assert_eq!(store.live_events(), 0);
    assert_eq!(store.live_objects(), 0);
}

#[test]
fn failed_submission_aborts_batch_and_drains() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);

    let injected = -42;
    store.inject_failure(1, 101, injected);

    let ops: Vec<WriteOp<'_>> = vec![
        (100u64, b"first".as_slice()),
        (101u64, b"second".as_slice()),
        (102u64, b"third".as_slice()),
    ]
    .into_iter()
    .map(|(akey, bytes)| {
        let mut op = WriteOp::new(ObjectId::new(1, 0), 1);
        op.push(akey, bytes);
        op
    })
    .collect();

    let rc = container.write_v(ops);
    assert_eq!(rc, injected, "the injected status bubbles up unchanged");

    // The first submission completed before the abort; the failed one left
    // nothing behind and the third was never issued.
    store.clear_failures();
    let mut buf = [0u8; 5];
    assert_eq!(container.read_single(&mut buf, ObjectId::new(1, 0), 1, 100), 0);
    assert_eq!(&buf, b"first");
    let mut buf = [0u8; 6];
    assert_eq!(
        container.read_single(&mut buf, ObjectId::new(1, 0), 1, 101),
        ERR_NONEXIST
    );
    let mut buf = [0u8; 5];
    assert_eq!(
        container.read_single(&mut buf, ObjectId::new(1, 0), 1, 102),
        ERR_NONEXIST
    );

    // Nothing leaked: every event finalized, every object handle closed.
    assert_eq!(store.live_events(), 0);
    assert_eq!(store.live_objects(), 0);
}

#[test]
fn batches_against_one_object_and_many_dkeys() {
    let store = Arc::new(MemStore::new());
    let container = open_container(&store);

    let oid = ObjectId::new(4, 0);
    let mut writes = Vec::new();
    for dkey in 0u64..8 {
        let mut op = WriteOp::new(oid, dkey);
        op.push(0, b"payload");
        writes.push(op);
    }
    assert_eq!(container.write_v(writes), 0);

    for dkey in 0u64..8 {
        let mut buf = [0u8; 7];
        assert_eq!(container.read_single(&mut buf, oid, dkey, 0), 0);
        assert_eq!(&buf, b"payload");
    }
}
