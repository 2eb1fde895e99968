//! Lifecycle round-trips through file-backed segments: cold create,
//! flush, drop, warm resume, plus the rejection paths for segments that
//! are missing, damaged or formatted for a different node geometry.

use grove::prelude::*;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::tempdir;

fn corrupt_at(path: &Path, offset: u64, bytes: &[u8]) {
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

#[test]
fn tree_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(64);

    let id;
    let pos_of_30;
    {
        let mut tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 64).unwrap();
        id = tree.segment_id();
        tree.insert_many_unique([50u64, 10, 30, 20, 40]);
        pos_of_30 = tree.find(&30).unwrap();
        tree.flush().unwrap();
    }

    let mut tree: OrdTree<u64> = OrdTree::resume_in(Segment::open(&path).unwrap()).unwrap();
    tree.check_invariants().unwrap();

    // Identity, contents and positions all came back.
    assert_eq!(tree.segment_id(), id);
    assert_eq!(tree.len(), 5);
    let all: Vec<u64> = tree.iter().copied().collect();
    assert_eq!(all, vec![10, 20, 30, 40, 50]);
    assert_eq!(*tree.get(pos_of_30).unwrap(), 30);

    // And the resumed engine is fully writable.
    tree.erase(&30);
    tree.insert_unique(35).unwrap();
    tree.check_invariants().unwrap();
    let all: Vec<u64> = tree.iter().copied().collect();
    assert_eq!(all, vec![10, 20, 35, 40, 50]);
}

#[test]
fn multiple_restarts_accumulate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u32>::segment_bytes(256);

    {
        let tree: OrdTree<u32> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 256).unwrap();
        tree.flush().unwrap();
    }

    for round in 0u32..5 {
        let mut tree: OrdTree<u32> = OrdTree::resume_in(Segment::open(&path).unwrap()).unwrap();
        assert_eq!(tree.len(), round * 10);
        for v in round * 10..(round + 1) * 10 {
            tree.insert_unique(v).unwrap();
        }
        tree.check_invariants().unwrap();
        tree.flush().unwrap();
    }

    let tree: OrdTree<u32> = OrdTree::resume_in(Segment::open(&path).unwrap()).unwrap();
    assert_eq!(tree.len(), 50);
    let all: Vec<u32> = tree.iter().copied().collect();
    assert_eq!(all, (0..50).collect::<Vec<_>>());
}

#[test]
fn create_in_reformats_an_existing_segment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    {
        let mut tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        tree.insert_many_unique([1u64, 2, 3]);
        tree.flush().unwrap();
    }

    // Cold creation never inspects what the segment held before: it
    // reformats unconditionally, so the previous contents are gone.
    let tree: OrdTree<u64> =
        OrdTree::create_in(Segment::open(&path).unwrap(), 16).unwrap();
    assert_eq!(tree.len(), 0);
    tree.check_invariants().unwrap();
    tree.flush().unwrap();
    drop(tree);

    let tree: OrdTree<u64> = OrdTree::resume_in(Segment::open(&path).unwrap()).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn resume_rejects_unformatted_segment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blank.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    // A segment that was mapped but never cold-created is all zeroes.
    Segment::create(&path, bytes).unwrap().flush().unwrap();

    let err = OrdTree::<u64>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E004");
}

#[test]
fn resume_rejects_bad_magic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    {
        let mut tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        tree.insert_unique(1).unwrap();
        tree.flush().unwrap();
    }

    // The magic number is the first header field.
    corrupt_at(&path, 0, &[0xFF; 8]);

    let err = OrdTree::<u64>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E004");
    assert!(err.is_segment_error());
}

#[test]
fn resume_rejects_live_count_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    {
        let mut tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        tree.insert_many_unique([1u64, 2, 3]);
        tree.flush().unwrap();
    }

    // Overwrite the header's element count (offset 52) with a wrong but
    // in-capacity value; the slot walk must notice the disagreement.
    corrupt_at(&path, 52, &7u32.to_ne_bytes());

    let err = OrdTree::<u64>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E004");
}

#[test]
fn resume_rejects_different_element_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    {
        let tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        tree.flush().unwrap();
    }

    // A wider element changes the node size recorded in the header.
    let err = OrdTree::<[u64; 4]>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E003");
}

#[test]
fn plain_and_lru_segments_are_mutually_exclusive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(16);

    {
        let tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        tree.flush().unwrap();
    }

    // The list-augmented node is wider, so the geometry check refuses.
    let err = LruOrdTree::<u64>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E003");
}

#[test]
fn resume_rejects_truncated_segment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tree.seg");
    let bytes = OrdTree::<u64>::segment_bytes(64);

    {
        let tree: OrdTree<u64> =
            OrdTree::create_in(Segment::create(&path, bytes).unwrap(), 64).unwrap();
        tree.flush().unwrap();
    }

    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len((bytes / 2) as u64).unwrap();
    file.sync_all().unwrap();
    drop(file);

    let err = OrdTree::<u64>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E003");
}

#[test]
fn undersized_segment_rejected_at_create() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("small.seg");
    let bytes = OrdTree::<u64>::segment_bytes(64) - 1;

    let err = OrdTree::<u64>::create_in(Segment::create(&path, bytes).unwrap(), 64).unwrap_err();
    assert_eq!(err.code(), "E003");
}

#[test]
fn lru_list_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lru.seg");
    let bytes = LruOrdTree::<u32>::segment_bytes(32);

    {
        let mut cache: LruOrdTree<u32> =
            LruOrdTree::create_in(Segment::create(&path, bytes).unwrap(), 32).unwrap();
        cache.set_lru(true);
        cache.insert_many_unique([1u32, 2, 3, 4]);
        cache.find(&2).unwrap();
        cache.find(&1).unwrap();
        cache.flush().unwrap();
    }

    let cache: LruOrdTree<u32> = LruOrdTree::resume_in(Segment::open(&path).unwrap()).unwrap();
    cache.check_invariants().unwrap();
    assert!(cache.lru_enabled());

    // Recency order from before the restart: 3, 4, then the refreshed
    // 2 and 1. The eviction candidate is still 3.
    let order: Vec<u32> = cache.list_iter().copied().collect();
    assert_eq!(order, vec![3, 4, 2, 1]);
    assert_eq!(*cache.get(cache.list_first()).unwrap(), 3);
}

#[test]
fn resume_rejects_damaged_list_threading() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lru.seg");
    let bytes = LruOrdTree::<u32>::segment_bytes(16);

    {
        let mut cache: LruOrdTree<u32> =
            LruOrdTree::create_in(Segment::create(&path, bytes).unwrap(), 16).unwrap();
        cache.insert_many_unique([1u32, 2, 3]);
        cache.flush().unwrap();
    }

    // Point the list head (offset 56) at an in-range slot that is on
    // the free chain, not at a live element.
    corrupt_at(&path, 56, &5u32.to_ne_bytes());

    let err = LruOrdTree::<u32>::resume_in(Segment::open(&path).unwrap()).unwrap_err();
    assert_eq!(err.code(), "E004");
}
